//! Coercing parsed model output into an [`EvaluationResult`].

use serde_json::{Map, Value};

use super::sanitizer::sanitize;
use super::EvaluationResult;

/// Short feedback used when the model omits one or sends a non-string.
pub const FALLBACK_SHORT_FEEDBACK: &str = "Report ready";

/// Short feedback used when the model output is not JSON at all.
pub const INVALID_JSON_FEEDBACK: &str = "Invalid JSON response";

/// Parses sanitized model text field by field, substituting defaults for
/// anything of the wrong type. Never fails.
pub fn normalize(raw: &str) -> EvaluationResult {
    let sanitized = sanitize(raw);

    let parsed = match serde_json::from_str::<Value>(&sanitized) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "model output is not valid JSON");
            return EvaluationResult::invalid(raw);
        }
    };

    // `null` has no fields to read; scalars and arrays simply have none set.
    let fields: Option<&Map<String, Value>> = match &parsed {
        Value::Null => return EvaluationResult::invalid(raw),
        Value::Object(map) => Some(map),
        _ => None,
    };
    let field = |name: &str| fields.and_then(|map| map.get(name));

    let short_feedback = field("short_feedback")
        .and_then(Value::as_str)
        .unwrap_or(FALLBACK_SHORT_FEEDBACK)
        .to_string();

    let full_report = field("full_report")
        .and_then(Value::as_str)
        .filter(|report| !report.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| sanitized.clone());

    EvaluationResult {
        score: field("score").and_then(to_score),
        strengths: to_list(field("strengths")),
        improvements: to_list(field("improvements")),
        short_feedback,
        full_report,
    }
}

/// Any JSON number, rounded and clamped to the 0–100 scale.
fn to_score(value: &Value) -> Option<i32> {
    let number = value.as_f64()?;
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as i32)
}

/// Arrays keep their string elements; a string is split into non-blank lines.
fn to_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_rounded_and_clamped() {
        assert_eq!(normalize(r#"{"score": 87.6}"#).score, Some(88));
        assert_eq!(normalize(r#"{"score": 140}"#).score, Some(100));
        assert_eq!(normalize(r#"{"score": -3}"#).score, Some(0));
        assert_eq!(normalize(r#"{"score": "90"}"#).score, None);
    }

    #[test]
    fn test_null_document_is_invalid() {
        assert_eq!(normalize("null"), EvaluationResult::invalid("null"));
    }

    #[test]
    fn test_scalar_document_uses_defaults() {
        let result = normalize("42");
        assert_eq!(result.score, None);
        assert_eq!(result.short_feedback, FALLBACK_SHORT_FEEDBACK);
        assert_eq!(result.full_report, "42");
    }

    #[test]
    fn test_crlf_lines_are_split() {
        let result = normalize("{\"improvements\": \"one\\r\\ntwo\\r\\n\"}");
        assert_eq!(result.improvements, vec!["one", "two"]);
    }
}
