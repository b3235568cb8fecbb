//! Markup escaping
//!
//! Every value interpolated into HTML by the admin and public surfaces
//! goes through one of these.

/// Schemes a link may carry
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "mailto", "tel"];

/// Escape text for an element body or a quoted attribute value
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Clean a URL for an `href` or `src` attribute
///
/// Whitespace, control characters and anything outside the URL
/// character set are dropped. A URL with a scheme not in the allow list
/// (`javascript:` and friends) becomes empty.
#[must_use]
pub fn escape_url(url: &str) -> String {
    let cleaned: String = url
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(*c))
        .collect();
    if cleaned.is_empty() {
        return cleaned;
    }
    if let Some((scheme, _)) = cleaned.split_once(':') {
        let has_scheme = !scheme.contains(['/', '?', '#']);
        if has_scheme && !ALLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            tracing::debug!(scheme, "dropped url with disallowed scheme");
            return String::new();
        }
    }
    escape(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b class="x">Tom & 'Jerry'</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn urls_keep_query_and_lose_quotes() {
        assert_eq!(
            escape_url(" https://example.test/tag/a?x=1&y=2 "),
            "https://example.test/tag/a?x=1&amp;y=2"
        );
        assert_eq!(
            escape_url("https://example.test/\"><script>"),
            "https://example.test/script"
        );
        assert_eq!(escape_url("/relative/path:colon"), "/relative/path:colon");
    }

    #[test]
    fn unsafe_schemes_dropped() {
        assert_eq!(escape_url("javascript:alert(1)"), "");
        assert_eq!(escape_url("JavaScript:alert(1)"), "");
        assert_eq!(escape_url("data:text/html,x"), "");
        assert_eq!(escape_url(""), "");
    }
}
