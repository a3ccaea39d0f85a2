//! Helpers for pulling JSON out of model output.

use super::{AiError, AiResult};

/// Strip markdown code fences and surrounding prose, returning the JSON
/// payload. Grounded (search) responses are not guaranteed to honor the JSON
/// mime type, so the outermost array or object is located by hand.
pub fn extract_json_payload(raw: &str) -> AiResult<&str> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    let start = unfenced
        .find(|c| c == '[' || c == '{')
        .ok_or_else(|| AiError::InvalidResponse("No JSON found in response".to_string()))?;
    let closing = if unfenced[start..].starts_with('[') {
        ']'
    } else {
        '}'
    };
    let end = unfenced
        .rfind(closing)
        .filter(|&end| end > start)
        .ok_or_else(|| AiError::InvalidResponse("Unterminated JSON in response".to_string()))?;

    Ok(&unfenced[start..=end])
}
