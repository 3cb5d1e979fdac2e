use crate::db::{self, Db};
use crate::oracle::Oracle;
use crate::resolver::{self, ObjectStore};
use anyhow::{anyhow, Result};
use roadwatch_core::{
    build_prompt, now_ms, parse_judgment, ErrorOutcome, HazardRecord, HazardStatus, ImageRef,
    Judgment, RejectedOutcome, VerifiedOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Everything one pipeline invocation needs. Cheap to clone; the API
/// handlers and the watcher each hold one.
#[derive(Clone)]
pub struct PipelineDeps {
    pub db: Db,
    pub store: Arc<dyn ObjectStore>,
    pub oracle: Arc<dyn Oracle>,
    pub http: reqwest::Client,
    pub labels: Arc<Vec<String>>,
    pub min_confidence: f64,
    pub oracle_timeout: Duration,
}

/// Drive one hazard record through verification to a terminal status.
///
/// Safe under at-least-once triggering: any record not in `pending` is
/// skipped. `inline` carries image bytes straight from a submission,
/// bypassing the resolver's network paths on the first run.
pub async fn verify_hazard(deps: &PipelineDeps, hazard_id: &str, inline: Option<String>) {
    let record = match deps.db.get_hazard(hazard_id).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            warn!("hazard {hazard_id} not found; skipping");
            return;
        }
        Err(e) => {
            warn!("hazard {hazard_id} load failed: {e:?}");
            return;
        }
    };

    if record.status != HazardStatus::Pending {
        info!("hazard {hazard_id} already terminal; skipping");
        return;
    }

    info!(
        "verifying hazard {} (detected as: {})",
        record.id, record.detection_label
    );

    if let Err(e) = run_stages(deps, &record, inline).await {
        record_failure(deps, &record, &e).await;
    }
}

async fn run_stages(
    deps: &PipelineDeps,
    record: &HazardRecord,
    inline: Option<String>,
) -> Result<()> {
    let (image, mime) = match inline {
        Some(data) => {
            resolver::resolve(&ImageRef::Inline { data }, deps.store.as_ref(), &deps.http).await?
        }
        None => resolver::resolve(&record.image_ref, deps.store.as_ref(), &deps.http).await?,
    };

    let prompt = build_prompt(
        &record.detection_label,
        record.detection_confidence,
        &deps.labels,
    );

    let raw = timeout(deps.oracle_timeout, deps.oracle.generate(&prompt, &image, mime))
        .await
        .map_err(|_| {
            anyhow!(
                "oracle call timed out after {}s",
                deps.oracle_timeout.as_secs()
            )
        })??;

    let parsed = parse_judgment(&raw, &deps.labels);
    if parsed.is_fallback() {
        warn!("hazard {} judgment unparsable, using fallback; raw: {raw}", record.id);
    }

    apply_transition(deps, record, parsed.into_judgment(), raw).await
}

/// Map a judgment to a terminal status and persist the outcome row plus
/// the status flip.
///
/// The two writes are not atomic. The outcome row goes first: a crash in
/// between leaves the record pending, the watcher re-runs it, and at
/// worst a second outcome row is appended next to the first.
async fn apply_transition(
    deps: &PipelineDeps,
    record: &HazardRecord,
    judgment: Judgment,
    raw: String,
) -> Result<()> {
    let now = now_ms();
    let confirmed = judgment.is_hazard && judgment.confidence >= deps.min_confidence;

    if confirmed {
        let row = VerifiedOutcome {
            id: db::new_ulid(),
            hazard_id: record.id.clone(),
            location: record.location,
            image_ref: record.image_ref.clone(),
            verified_label: judgment.verified_label.clone(),
            severity: judgment.severity,
            confidence: judgment.confidence,
            reason: judgment.reason.clone(),
            original_detection: record.detection_label.clone(),
            original_confidence: record.detection_confidence,
            raw_response: raw,
            verified_ms: now,
        };
        deps.db.append_verified(&row).await?;
        deps.db.mark_verified(&record.id, &judgment, now).await?;
        info!(
            "hazard {} verified as {}",
            record.id, judgment.verified_label
        );
    } else {
        let row = RejectedOutcome {
            id: db::new_ulid(),
            hazard_id: record.id.clone(),
            location: record.location,
            image_ref: record.image_ref.clone(),
            reason: judgment.reason.clone(),
            original_detection: record.detection_label.clone(),
            original_confidence: record.detection_confidence,
            rejected_ms: now,
        };
        deps.db.append_rejected(&row).await?;
        deps.db.mark_rejected(&record.id, &judgment, now).await?;
        info!("hazard {} rejected ({})", record.id, judgment.reason);
    }

    Ok(())
}

/// Error recorder: mark the record errored and append a diagnostic row.
/// Both writes are attempted independently; a failure of either is only
/// logged, never re-raised.
async fn record_failure(deps: &PipelineDeps, record: &HazardRecord, err: &anyhow::Error) {
    let now = now_ms();
    let message = format!("{err:#}");
    warn!("hazard {} verification failed: {message}", record.id);

    if let Err(e) = deps.db.mark_error(&record.id, &message, now).await {
        warn!("hazard {} error-status update failed: {e:?}", record.id);
    }

    let row = ErrorOutcome {
        id: db::new_ulid(),
        hazard_id: record.id.clone(),
        record: record.clone(),
        error: message,
        trace: format!("{err:?}"),
        error_ms: now,
    };
    if let Err(e) = deps.db.append_error(&row).await {
        warn!("hazard {} error-log append failed: {e:?}", record.id);
    }
}
