use thiserror::Error;
use url::Url;

/// Reasons a string was refused as a deck URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL is empty")]
    Empty,
    /// The string could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Parse and check a URL for the deck.
///
/// Input is trimmed first. Only absolute `http`/`https` URLs with a
/// non-empty host are accepted; relative references, `file:`, `ftp:`,
/// `javascript:` and friends are refused.
///
/// ```
/// use cuedeck::util::validate_url;
///
/// let url = validate_url("  https://example.com/watch?v=1 ").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("ftp://example.com").is_err());
/// assert!(validate_url("not a url").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url("https://example.com/watch?v=42").is_ok());
        assert!(validate_url("http://news.example.org").is_ok());
        assert!(validate_url("https://example.com:8443/a?b=c#d").is_ok());
    }

    #[test]
    fn test_local_hosts_allowed() {
        // the deck is a personal list; a LAN media server is a fine target
        assert!(validate_url("http://localhost:8080/").is_ok());
        assert!(validate_url("http://192.168.1.20/stream").is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(validate_url("   "), Err(UrlValidationError::Empty));
    }

    #[test]
    fn test_relative_rejected() {
        assert!(matches!(
            validate_url("/just/a/path"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("example.com"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_schemes() {
        assert_eq!(
            validate_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme("ftp".into()))
        );
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }
}
