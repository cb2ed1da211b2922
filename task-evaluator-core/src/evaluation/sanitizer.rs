//! Cleaning model text so it can be handed straight to a JSON parser.

use regex::Regex;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z]*\n?((?s:.*?))```").expect("static regex"));

/// Returns the trimmed interior of the first fenced block, or the trimmed input.
///
/// A fence with an empty interior counts as no fence.
pub fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|interior| interior.as_str())
        .filter(|interior| !interior.is_empty())
        .unwrap_or(raw)
        .trim()
}

/// Returns the inclusive span from the first `{` to the last `}`, or the
/// input unchanged when there is no such span.
pub fn extract_json_object(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

/// Strips prose and code fences around a JSON object.
pub fn sanitize(raw: &str) -> String {
    extract_json_object(strip_code_fence(raw)).to_string()
}
