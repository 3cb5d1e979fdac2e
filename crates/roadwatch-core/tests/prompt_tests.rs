use roadwatch_core::prompt::{build_prompt, default_labels};

#[test]
fn prompt_is_deterministic() {
    let a = build_prompt("pothole", 0.87, &default_labels());
    let b = build_prompt("pothole", 0.87, &default_labels());
    assert_eq!(a, b);
}

#[test]
fn prompt_embeds_detection_hint_as_percentage() {
    let prompt = build_prompt("pothole", 0.87, &default_labels());
    assert!(prompt.contains("\"pothole\""));
    assert!(prompt.contains("87%"));
}

#[test]
fn prompt_mandates_schema_and_forbids_markdown() {
    let prompt = build_prompt("debris", 0.5, &default_labels());
    assert!(prompt.contains("no markdown"));
    assert!(prompt.contains("\"isHazard\""));
    assert!(prompt.contains("\"verifiedLabel\""));
    assert!(prompt.contains("\"severity\""));
    assert!(prompt.contains("\"confidence\""));
    assert!(prompt.contains("\"reason\""));
    for label in default_labels() {
        assert!(prompt.contains(&format!("\"{label}\"")));
    }
    assert!(prompt.contains("\"LOW\" or \"MEDIUM\" or \"HIGH\""));
}

#[test]
fn prompt_rounds_confidence() {
    let prompt = build_prompt("flood", 0.666, &default_labels());
    assert!(prompt.contains("67%"));
}
