//! Source file parsing and text extraction.

use agrimind_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Csv,
    Json,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            Some("txt") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let cleaned = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Csv => flatten_csv(&raw),
        ContentType::Json => flatten_json(&raw)?,
        ContentType::PlainText => raw,
        ContentType::Unknown => {
            if is_likely_text(&raw) {
                raw
            } else {
                tracing::warn!("Skipping likely binary file: {:?}", path);
                return Err(AppError::Knowledge("Binary file not supported".to_string()));
            }
        }
    };

    Ok(cleaned)
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Flatten CSV rows into "column: value" lines, one record per paragraph.
fn flatten_csv(text: &str) -> String {
    let mut lines = text.lines();

    let header: Vec<&str> = match lines.next() {
        Some(h) => h.split(',').map(str::trim).collect(),
        None => return String::new(),
    };

    let mut result = String::with_capacity(text.len());

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        for (col, value) in header.iter().zip(fields.iter()) {
            if !value.is_empty() {
                result.push_str(col);
                result.push_str(": ");
                result.push_str(value);
                result.push('\n');
            }
        }
        result.push('\n');
    }

    result.trim().to_string()
}

/// Pretty-print JSON so nested records read as text.
fn flatten_json(text: &str) -> AppResult<String> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| AppError::Knowledge(format!("Invalid JSON source: {}", e)))?;

    serde_json::to_string_pretty(&value)
        .map_err(|e| AppError::Knowledge(format!("Failed to render JSON source: {}", e)))
}

/// Check if text is likely UTF-8 text (not binary).
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("file.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("file.csv")),
            ContentType::Csv
        );
        assert_eq!(
            ContentType::from_path(Path::new("file.txt")),
            ContentType::PlainText
        );
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_flatten_csv() {
        let input = "crop,season,yield\nwheat,winter,high\nrice,kharif,medium";
        let output = flatten_csv(input);
        assert!(output.contains("crop: wheat"));
        assert!(output.contains("season: kharif"));
        assert!(!output.contains("crop: crop"));
    }

    #[test]
    fn test_flatten_json() {
        let input = r#"{"crop": "rice", "rainfall": "high"}"#;
        let output = flatten_json(input).unwrap();
        assert!(output.contains("\"crop\""));
        assert!(output.contains("rice"));
    }
}
