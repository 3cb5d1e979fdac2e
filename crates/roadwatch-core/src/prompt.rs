/// Default label vocabulary the oracle may verify against.
pub const DEFAULT_LABELS: &[&str] = &["POTHOLE", "ACCIDENT", "FLOOD", "DEBRIS"];

pub fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

/// Render the verification instruction for one hazard record.
///
/// Pure function of the detection hint; the same inputs always produce
/// the same text. The response schema mandated here is what
/// `parse_judgment` expects, but the validator still defends against
/// violations.
pub fn build_prompt(detection_label: &str, detection_confidence: f64, labels: &[String]) -> String {
    let pct = (detection_confidence * 100.0).round() as i64;
    let label_list = labels
        .iter()
        .map(|l| format!("\"{l}\""))
        .collect::<Vec<_>>()
        .join(" or ");

    format!(
        "You are an expert road safety inspector.\n\
         An on-device detector has flagged a potential \"{detection_label}\" \
         with {pct}% confidence.\n\
         \n\
         Analyze the provided image and verify the claim.\n\
         Return ONLY a JSON object with this exact structure (no markdown, no extra text):\n\
         {{\n\
         \x20 \"isHazard\": true or false,\n\
         \x20 \"verifiedLabel\": {label_list},\n\
         \x20 \"severity\": \"LOW\" or \"MEDIUM\" or \"HIGH\",\n\
         \x20 \"confidence\": 0.0 to 1.0,\n\
         \x20 \"reason\": \"short explanation of what you see\"\n\
         }}\n\
         \n\
         Confidence scoring guide:\n\
         - 0.0-0.49: the claim is not supported by the image\n\
         - 0.50-0.79: moderate damage or hazard visible\n\
         - 0.80-1.00: severe, clearly dangerous hazard"
    )
}
