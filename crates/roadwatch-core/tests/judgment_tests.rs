//! Parsing tests for the untrusted oracle output.

use roadwatch_core::judgment::{parse_judgment, Judgment, ParsedJudgment, Severity};
use roadwatch_core::prompt::default_labels;

fn parse(raw: &str) -> ParsedJudgment {
    parse_judgment(raw, &default_labels())
}

#[test]
fn parses_well_formed_judgment() {
    let raw = r#"{"isHazard":true,"verifiedLabel":"POTHOLE","severity":"HIGH","confidence":0.92,"reason":"large pothole visible"}"#;
    let parsed = parse(raw);
    assert!(!parsed.is_fallback());
    let j = parsed.into_judgment();
    assert!(j.is_hazard);
    assert_eq!(j.verified_label, "POTHOLE");
    assert_eq!(j.severity, Severity::High);
    assert!((j.confidence - 0.92).abs() < 1e-9);
    assert_eq!(j.reason, "large pothole visible");
}

#[test]
fn strips_markdown_fences() {
    let fenced = "```json\n{\"isHazard\":true}\n```";
    let bare = "{\"isHazard\":true}";
    assert_eq!(parse(fenced), parse(bare));
    assert!(!parse(fenced).is_fallback());
}

#[test]
fn non_json_text_falls_back() {
    let parsed = parse("I think this might be a pothole, hard to say.");
    assert!(parsed.is_fallback());
    assert_eq!(parsed.into_judgment(), Judgment::fallback());
}

#[test]
fn missing_verdict_falls_back() {
    assert!(parse(r#"{"severity":"HIGH","confidence":0.9}"#).is_fallback());
}

#[test]
fn non_boolean_verdict_falls_back() {
    // A stringly "true" is not a verdict.
    assert!(parse(r#"{"isHazard":"true"}"#).is_fallback());
    assert!(parse(r#"{"isHazard":1}"#).is_fallback());
}

#[test]
fn confidence_is_clamped_into_unit_interval() {
    let over = parse(r#"{"isHazard":true,"confidence":3.5}"#).into_judgment();
    assert_eq!(over.confidence, 1.0);

    let under = parse(r#"{"isHazard":true,"confidence":-0.2}"#).into_judgment();
    assert_eq!(under.confidence, 0.0);

    let non_numeric = parse(r#"{"isHazard":true,"confidence":"high"}"#).into_judgment();
    assert_eq!(non_numeric.confidence, 0.0);

    let absent = parse(r#"{"isHazard":true}"#).into_judgment();
    assert_eq!(absent.confidence, 0.0);
}

#[test]
fn unknown_severity_falls_back_to_low() {
    let j = parse(r#"{"isHazard":true,"severity":"CATASTROPHIC"}"#).into_judgment();
    assert_eq!(j.severity, Severity::Low);

    // Case matters on the wire.
    let j = parse(r#"{"isHazard":true,"severity":"high"}"#).into_judgment();
    assert_eq!(j.severity, Severity::Low);
}

#[test]
fn label_outside_vocabulary_becomes_unknown() {
    let j = parse(r#"{"isHazard":true,"verifiedLabel":"SINKHOLE"}"#).into_judgment();
    assert_eq!(j.verified_label, "UNKNOWN");
}

#[test]
fn reason_is_coerced_to_string() {
    let absent = parse(r#"{"isHazard":false}"#).into_judgment();
    assert_eq!(absent.reason, "");

    let numeric = parse(r#"{"isHazard":false,"reason":42}"#).into_judgment();
    assert_eq!(numeric.reason, "42");
}

#[test]
fn fallback_is_conservative() {
    let j = Judgment::fallback();
    assert!(!j.is_hazard);
    assert_eq!(j.confidence, 0.0);
    assert_eq!(j.severity, Severity::Low);
    assert!(j.reason.contains("manual review"));
}
