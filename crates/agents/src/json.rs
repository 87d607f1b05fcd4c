//! Lenient JSON extraction from LLM output.

/// Extract the first balanced-looking JSON object from free text.
///
/// LLMs routinely wrap JSON in prose or code fences; taking the span from
/// the first '{' to the last '}' recovers the object in those cases.
pub(crate) fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_fenced_object() {
        let text = "Here you go:\n```json\n{\"agents\": []}\n```";
        assert_eq!(extract_object(text), Some("{\"agents\": []}"));
    }

    #[test]
    fn test_extract_missing_object() {
        assert_eq!(extract_object("no json here"), None);
        assert_eq!(extract_object("} backwards {"), None);
    }
}
