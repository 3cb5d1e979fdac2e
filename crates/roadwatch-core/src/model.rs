use crate::judgment::{Judgment, Severity};
use crate::time::EpochMs;
use serde::{Deserialize, Serialize};

/// A globally unique identifier (ULID as string by convention).
pub type Id = String;

/// WGS84 coordinates of a report. Immutable after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Where the hazard image lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageRef {
    /// Object-store reference, e.g. "store://media/hazards/abc.jpg".
    Storage { uri: String },
    /// Plain HTTP(S) URL fetched with a GET.
    Http { url: String },
    /// Base64-encoded bytes submitted inline with the report.
    Inline { data: String },
    /// A reference whose scheme we do not understand. Kept on the record
    /// so the pipeline can fail it explicitly instead of dropping it.
    Unsupported { uri: String },
    /// No image reference at all.
    Missing,
}

impl ImageRef {
    /// Classify a submitted URL string by scheme.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("store://") {
            Self::Storage {
                uri: url.to_string(),
            }
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Self::Http {
                url: url.to_string(),
            }
        } else {
            Self::Unsupported {
                uri: url.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HazardStatus {
    Pending,
    Verified,
    Rejected,
    Error,
}

impl HazardStatus {
    /// The pipeline performs no further processing past a terminal status.
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// The mutable record for one submitted hazard report.
///
/// Only the pipeline writes `status`, `verification` and `error_log`
/// after creation. `verification` is set exactly when the record reaches
/// `Verified` or `Rejected`; `error_log` exactly when it reaches `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardRecord {
    pub id: Id,
    pub location: Location,
    pub image_ref: ImageRef,
    pub detection_label: String,
    pub detection_confidence: f64,
    pub status: HazardStatus,
    pub verification: Option<Judgment>,
    pub error_log: Option<String>,
    pub created_ms: EpochMs,
    pub verified_ms: Option<EpochMs>,
    pub error_ms: Option<EpochMs>,
}

impl HazardRecord {
    pub fn new(
        id: Id,
        location: Location,
        image_ref: ImageRef,
        detection_label: Option<String>,
        detection_confidence: Option<f64>,
        created_ms: EpochMs,
    ) -> Self {
        Self {
            id,
            location,
            image_ref,
            detection_label: detection_label.unwrap_or_else(|| "unknown".to_string()),
            detection_confidence: detection_confidence.unwrap_or(0.0),
            status: HazardStatus::Pending,
            verification: None,
            error_log: None,
            created_ms,
            verified_ms: None,
            error_ms: None,
        }
    }
}

/// Append-only row written when a hazard is confirmed. Never mutated;
/// a retried verification appends a new row alongside the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedOutcome {
    pub id: Id,
    pub hazard_id: Id,
    pub location: Location,
    pub image_ref: ImageRef,
    pub verified_label: String,
    pub severity: Severity,
    pub confidence: f64,
    pub reason: String,
    pub original_detection: String,
    pub original_confidence: f64,
    pub raw_response: String,
    pub verified_ms: EpochMs,
}

/// Append-only row written when a hazard claim is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedOutcome {
    pub id: Id,
    pub hazard_id: Id,
    pub location: Location,
    pub image_ref: ImageRef,
    pub reason: String,
    pub original_detection: String,
    pub original_confidence: f64,
    pub rejected_ms: EpochMs,
}

/// Append-only diagnostic row written when the pipeline fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutcome {
    pub id: Id,
    pub hazard_id: Id,
    pub record: HazardRecord,
    pub error: String,
    pub trace: String,
    pub error_ms: EpochMs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReportRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub detection_label: Option<String>,
    #[serde(default)]
    pub detection_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReportResponse {
    pub accepted: bool,
    pub record_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryResponse {
    /// False when the record is already in a success-terminal status and
    /// the retry was a guarded no-op.
    pub ok: bool,
    pub status: HazardStatus,
}
