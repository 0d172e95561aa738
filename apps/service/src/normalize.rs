//! Canonicalization of user-supplied URLs and intervals.

use thiserror::Error;
use url::Url;

use crate::database::models::MAX_INTERVAL_MS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("url is required")]
    MissingUrl,
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("interval must be a positive number of seconds")]
    InvalidInterval,
}

/// Make sure `input` carries an explicit `http://` or `https://` scheme.
///
/// Schemeless input gets `https://`; input that already has one of the two
/// schemes (in any letter case) is kept verbatim apart from surrounding
/// whitespace. The result must parse as an absolute URL with a host.
pub fn normalize_url(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let normalized = if has_http_scheme(trimmed) { trimmed.to_owned() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&normalized)
        .map_err(|e| ValidationError::InvalidUrl { url: normalized.clone(), reason: e.to_string() })?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::InvalidUrl { url: normalized, reason: "missing host".into() });
    }

    Ok(normalized)
}

fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.get(..scheme.len()).is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme)))
}

/// Turn an operator-facing interval in seconds into the stored milliseconds.
pub fn interval_seconds_to_ms(seconds: u64) -> Result<u64, ValidationError> {
    match seconds.checked_mul(1000) {
        Some(ms) if ms > 0 && ms <= MAX_INTERVAL_MS => Ok(ms),
        _ => Err(ValidationError::InvalidInterval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_https_when_missing() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(normalize_url("  example.com/status  ").unwrap(), "https://example.com/status");
    }

    #[test]
    fn test_keeps_existing_scheme() {
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com");
        assert_eq!(normalize_url("https://example.com").unwrap(), "https://example.com");
        assert_eq!(normalize_url("HTTP://example.com").unwrap(), "HTTP://example.com");
    }

    #[test]
    fn test_normalizing_twice_is_stable() {
        let once = normalize_url("example.com").unwrap();
        assert_eq!(normalize_url(&once).unwrap(), once);
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert_eq!(normalize_url(""), Err(ValidationError::MissingUrl));
        assert_eq!(normalize_url("   "), Err(ValidationError::MissingUrl));
        assert!(matches!(normalize_url("exa mple.com"), Err(ValidationError::InvalidUrl { .. })));
        assert!(matches!(normalize_url("http://"), Err(ValidationError::InvalidUrl { .. })));
    }

    #[test]
    fn test_interval_seconds() {
        assert_eq!(interval_seconds_to_ms(30), Ok(30_000));
        assert_eq!(interval_seconds_to_ms(0), Err(ValidationError::InvalidInterval));
        assert_eq!(interval_seconds_to_ms(u64::MAX), Err(ValidationError::InvalidInterval));
        assert_eq!(interval_seconds_to_ms(10_000_000_000_000_000), Err(ValidationError::InvalidInterval));
        assert_eq!(interval_seconds_to_ms(MAX_INTERVAL_MS / 1000), Ok(MAX_INTERVAL_MS / 1000 * 1000));
    }
}
