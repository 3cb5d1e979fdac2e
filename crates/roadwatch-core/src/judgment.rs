use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a confirmed hazard. Wire form is upper-case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn from_value(v: Option<&Value>) -> Self {
        match v.and_then(Value::as_str) {
            Some("LOW") => Self::Low,
            Some("MEDIUM") => Self::Medium,
            Some("HIGH") => Self::High,
            _ => Self::Low,
        }
    }
}

/// Label stored when the oracle's label is absent or outside the
/// configured vocabulary.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// The validated judgment derived from the oracle's raw text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Judgment {
    pub is_hazard: bool,
    pub verified_label: String,
    pub severity: Severity,
    pub confidence: f64,
    pub reason: String,
}

impl Judgment {
    /// Conservative default used when the oracle's text is present but
    /// not usable as a judgment.
    pub fn fallback() -> Self {
        Self {
            is_hazard: false,
            verified_label: UNKNOWN_LABEL.to_string(),
            severity: Severity::Low,
            confidence: 0.0,
            reason: "parse error - manual review required".to_string(),
        }
    }
}

/// Outcome of parsing the oracle's raw text.
///
/// `Fallback` means the text could not be parsed; the pipeline still
/// reaches a terminal status instead of erroring out.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedJudgment {
    Parsed(Judgment),
    Fallback(Judgment),
}

impl ParsedJudgment {
    pub fn into_judgment(self) -> Judgment {
        match self {
            Self::Parsed(j) | Self::Fallback(j) => j,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Strip the markdown code fences the prompt forbids but the oracle
/// sometimes emits anyway.
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse the oracle's raw text into a judgment. Total over all inputs.
///
/// The boolean verdict is the one field we refuse to guess at: if
/// `isHazard` is missing or not an actual boolean, the whole document is
/// treated as unparsable. Every other field recovers per-field:
/// confidence is clamped into [0,1] (0 when non-numeric), severity falls
/// back to `LOW`, a label outside `labels` becomes `UNKNOWN`, and the
/// reason is coerced to a string.
pub fn parse_judgment(raw: &str, labels: &[String]) -> ParsedJudgment {
    let cleaned = strip_fences(raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(_) => return ParsedJudgment::Fallback(Judgment::fallback()),
    };

    let is_hazard = match value.get("isHazard") {
        Some(Value::Bool(b)) => *b,
        _ => return ParsedJudgment::Fallback(Judgment::fallback()),
    };

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let verified_label = match value.get("verifiedLabel").and_then(Value::as_str) {
        Some(l) if labels.iter().any(|known| known == l) => l.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    };

    let severity = Severity::from_value(value.get("severity"));

    let reason = value
        .get("reason")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    ParsedJudgment::Parsed(Judgment {
        is_hazard,
        verified_label,
        severity,
        confidence,
        reason,
    })
}
