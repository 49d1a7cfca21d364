//! Shared utility functions used across multiple modules.

const HTML_ENTITIES: [(&str, &str); 5] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Take at most `max_chars` characters of `value`.
pub fn take_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Whether `value` contains one of the HTML entities the API escapes tags with.
pub fn contains_html_chars(value: &str) -> bool {
    HTML_ENTITIES
        .iter()
        .any(|(entity, _)| value.contains(entity))
}

/// Replace the HTML entities the API uses with their literal characters.
///
/// `&amp;` is replaced last so `&amp;lt;` decodes to `&lt;`, not `<`.
pub fn unescape_html(value: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(value.to_string(), |acc, (entity, literal)| {
            acc.replace(entity, literal)
        })
}

/// Current UTC time in the API's timestamp format (`2024-01-31T12:00:00Z`).
pub fn now_as_tz_format() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" https://example.com ".to_string())),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn unescape_html_decodes_entities() {
        assert_eq!(unescape_html("cats&amp;dogs"), "cats&dogs");
        assert_eq!(unescape_html("&lt;b&gt; &quot;q&quot; it&#39;s"), "<b> \"q\" it's");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn contains_html_chars_detects_entities() {
        assert!(contains_html_chars("a&amp;b"));
        assert!(!contains_html_chars("a&b"));
    }

    #[test]
    fn take_chars_respects_multibyte() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("hi", 10), "hi");
    }

    #[test]
    fn now_as_tz_format_shape() {
        let now = now_as_tz_format();
        assert_eq!(now.len(), 20);
        assert!(now.ends_with('Z'));
        assert_eq!(&now[10..11], "T");
    }
}
