use crate::db::new_ulid;
use crate::pipeline::{self, PipelineDeps};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roadwatch_core::{
    now_ms, HazardRecord, HazardStatus, ImageRef, Location, RetryResponse, SubmitReportRequest,
    SubmitReportResponse,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub deps: PipelineDeps,
}

impl AppState {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }
}

/// Accept a new hazard report and kick off verification.
///
/// Requires coordinates plus at least one of inline image data or an
/// image URL; anything less is rejected before the pipeline sees it.
pub async fn submit_report(
    State(state): State<AppState>,
    Json(req): Json<SubmitReportRequest>,
) -> Result<Json<SubmitReportResponse>, StatusCode> {
    let (Some(lat), Some(lng)) = (req.lat, req.lng) else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let inline = req
        .image_data
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let url = req
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    if inline.is_none() && url.is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let id = new_ulid();

    // A URL wins as the durable reference; otherwise the inline bytes
    // are persisted to the object store so retries have something to
    // resolve. If persisting fails the raw inline data is kept on the
    // record instead.
    let image_ref = match (&url, &inline) {
        (Some(u), _) => ImageRef::from_url(u),
        (None, Some(data)) => persist_inline(&state, &id, data).await,
        (None, None) => unreachable!("validated above"),
    };

    let record = HazardRecord::new(
        id.clone(),
        Location { lat, lng },
        image_ref,
        req.detection_label,
        req.detection_confidence,
        now_ms(),
    );

    state.deps.db.create_hazard(&record).await.map_err(|e| {
        warn!("creating hazard record failed: {e:?}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("report {id} accepted");

    let deps = state.deps.clone();
    let spawn_id = id.clone();
    tokio::spawn(async move {
        pipeline::verify_hazard(&deps, &spawn_id, inline).await;
    });

    Ok(Json(SubmitReportResponse {
        accepted: true,
        record_id: id,
    }))
}

/// Re-run verification for an existing record.
///
/// Errored records go back to pending first; success-terminal records
/// are left alone (the pipeline guard would skip them anyway).
pub async fn retry_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RetryResponse>, StatusCode> {
    let record = state
        .deps
        .db
        .get_hazard(&id)
        .await
        .map_err(|e| {
            warn!("loading hazard {id} failed: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    match record.status {
        HazardStatus::Error => {
            state.deps.db.reset_to_pending(&id).await.map_err(|e| {
                warn!("resetting hazard {id} failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        }
        HazardStatus::Pending => {}
        status => {
            return Ok(Json(RetryResponse { ok: false, status }));
        }
    }

    info!("retrying verification for {id}");

    let deps = state.deps.clone();
    let spawn_id = id.clone();
    tokio::spawn(async move {
        pipeline::verify_hazard(&deps, &spawn_id, None).await;
    });

    Ok(Json(RetryResponse {
        ok: true,
        status: HazardStatus::Pending,
    }))
}

/// Fetch a hazard record. Clients watch `status` move from pending to a
/// terminal value.
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HazardRecord>, StatusCode> {
    let record = state
        .deps
        .db
        .get_hazard(&id)
        .await
        .map_err(|e| {
            warn!("loading hazard {id} failed: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(record))
}

async fn persist_inline(state: &AppState, id: &str, data: &str) -> ImageRef {
    let Ok(bytes) = BASE64.decode(data) else {
        return ImageRef::Inline {
            data: data.to_string(),
        };
    };
    let path = format!("hazards/{id}.jpg");
    match state.deps.store.upload(&path, &bytes).await {
        Ok(()) => ImageRef::Storage {
            uri: format!("store://media/{path}"),
        },
        Err(e) => {
            warn!("persisting inline image for {id} failed: {e:?}");
            ImageRef::Inline {
                data: data.to_string(),
            }
        }
    }
}
