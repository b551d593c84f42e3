//! Source-domain derivation for story URLs.

use crate::error::DomainError;
use url::Url;

/// Reduce an absolute URL to its host.
///
/// The host is returned the way [`Url`] normalizes it: lowercased, without
/// port or credentials. Relative or otherwise unparseable URLs, and URLs
/// without a host (`mailto:`, `data:`), fail with a [`DomainError`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_domain("http://a.com/x").unwrap(), "a.com");
/// assert!(extract_domain("badurl").is_err());
/// ```
pub fn extract_domain(url: &str) -> Result<String, DomainError> {
    let parsed = Url::parse(url).map_err(|source| DomainError::Parse {
        url: url.to_string(),
        source,
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(DomainError::MissingHost {
            url: url.to_string(),
        }),
    }
}
