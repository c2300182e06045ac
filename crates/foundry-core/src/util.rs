//! Small helpers shared across the workspace

/// Truncate `text` for log output, appending `...` when cut.
///
/// Cuts on a char boundary so multi-byte input never panics.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello", 50), "hello");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(80);
        let result = preview(&long, 50);
        assert_eq!(result.len(), 53);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_preview_multibyte_boundary() {
        let text = "ありがとうございました";
        let result = preview(text, 5);
        assert_eq!(result, "ありがとう...");
    }
}
