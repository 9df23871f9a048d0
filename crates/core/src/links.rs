//! Validation for URLs taken from webhook payloads (item links, redirects).

use url::Url;

/// Accepted URL schemes for links surfaced to the rendering layer.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Return the trimmed URL when it is a usable http(s) link.
///
/// The link must parse as an absolute URL with an http(s) scheme and a
/// non-empty host. Whitespace, control, quote and angle-bracket characters
/// are rejected even where the parser would percent-encode them.
pub fn safe_link(raw: &str) -> Option<String> {
    let link = raw.trim();

    let forbidden = |c: char| {
        c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '`')
    };
    if link.is_empty() || link.chars().any(forbidden) {
        return None;
    }

    let parsed = Url::parse(link).ok()?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return None;
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Some(link.to_string()),
        _ => None,
    }
}
