//! Coerce raw backend output into a JSON record

use serde_json::Value;

/// Parse a backend's raw text output into a JSON object.
///
/// Backends sometimes wrap JSON in markdown code fences or surround it
/// with prose. Strips fences first, then narrows to the span from the
/// first `{` to the last `}` before parsing.
pub fn parse_record(response: &str) -> Result<Value, String> {
    let stripped = strip_code_fence(response)?;
    let json_str = locate_object(&stripped)?;

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {}", e))?;

    if !value.is_object() {
        return Err("Expected a JSON object".to_string());
    }

    Ok(value)
}

/// Strip a markdown code fence wrapper if present
fn strip_code_fence(response: &str) -> Result<String, String> {
    let trimmed = response.trim();

    if trimmed.starts_with("```json") || trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err("Empty code block".to_string());
        }

        // Skip first line (```json or ```) and last line (```)
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Narrow to the outermost `{...}` span
fn locate_object(text: &str) -> Result<&str, String> {
    let start = text
        .find('{')
        .ok_or_else(|| "No JSON object in response".to_string())?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| "Unterminated JSON object in response".to_string())?;
    Ok(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let record = parse_record(r#"{"purchase_price": "450000"}"#).unwrap();
        assert_eq!(record["purchase_price"], "450000");
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "```json\n{\"a\": 1}\n```";
        let record = parse_record(response).unwrap();
        assert_eq!(record["a"], 1);
    }

    #[test]
    fn test_parse_fence_without_language() {
        let response = "```\n{\"a\": 1}\n```";
        let record = parse_record(response).unwrap();
        assert_eq!(record["a"], 1);
    }

    #[test]
    fn test_parse_json_surrounded_by_prose() {
        let response = "Here is the extracted data:\n{\"closing_date\": \"2026-09-01\"} Hope that helps!";
        let record = parse_record(response).unwrap();
        assert_eq!(record["closing_date"], "2026-09-01");
    }

    #[test]
    fn test_parse_nested_object_uses_outermost_braces() {
        let response = r#"{"parties": {"buyer": "Jane Doe"}}"#;
        let record = parse_record(response).unwrap();
        assert_eq!(record["parties"]["buyer"], "Jane Doe");
    }

    #[test]
    fn test_parse_non_json_fails() {
        assert!(parse_record("This is not JSON").is_err());
    }

    #[test]
    fn test_parse_array_is_rejected() {
        assert!(parse_record(r#"["a", "b"]"#).is_err());
    }

    #[test]
    fn test_parse_empty_fence_fails() {
        assert!(parse_record("```").is_err());
    }

    #[test]
    fn test_parse_truncated_object_fails() {
        assert!(parse_record(r#"{"purchase_price": "45"#).is_err());
    }
}
