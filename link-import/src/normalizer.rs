//! URL Normalizer
//!
//! Reduces a candidate link to the key used for duplicate comparison:
//! `scheme://host/path`, with credentials, port, query and fragment dropped
//! and trailing slashes removed from the path.

use outreach_core::{Result, ValidationError};
use url::Url;

/// Whether the input parses as a URL.
///
/// Any scheme is accepted, so `mailto:` or `ftp://` links pass.
pub fn is_valid_url(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

/// Canonicalise `raw`, returning the input unchanged when it does not parse.
///
/// Callers must not assume the output is a valid URL; use
/// [`try_normalize_url`] where a parse failure has to surface.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => canonical_form(&parsed),
        Err(_) => raw.to_string(),
    }
}

/// Strict variant of [`normalize_url`]
pub fn try_normalize_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl {
        url: raw.to_string(),
    })?;
    Ok(canonical_form(&parsed))
}

fn canonical_form(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');

    // Opaque URLs (mailto:, tel:) have no authority to rebuild
    if url.cannot_be_a_base() {
        return format!("{}:{}", url.scheme(), path);
    }

    format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or(""), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_and_fragment_are_dropped() {
        assert_eq!(normalize_url("https://x.com/a?x=1"), normalize_url("https://x.com/a"));
        assert_eq!(normalize_url("https://x.com/a#top"), "https://x.com/a");
        assert_eq!(
            normalize_url("https://www.instagram.com/someone/?igshid=abc&utm_source=ig#bio"),
            "https://www.instagram.com/someone"
        );
    }

    #[test]
    fn test_trailing_slash_removed() {
        assert_eq!(normalize_url("https://x.com/a/"), normalize_url("https://x.com/a"));
        assert_eq!(normalize_url("https://x.com/"), "https://x.com");
        assert_eq!(normalize_url("https://x.com"), "https://x.com");
    }

    #[test]
    fn test_host_case_folded_path_case_kept() {
        assert_eq!(normalize_url("HTTPS://X.COM/UserName"), "https://x.com/UserName");
    }

    #[test]
    fn test_port_and_credentials_dropped() {
        assert_eq!(normalize_url("http://user:pw@x.com:8080/a"), "http://x.com/a");
    }

    #[test]
    fn test_unparsable_input_passes_through() {
        assert_eq!(normalize_url("instagram.com/someone"), "instagram.com/someone");
        assert_eq!(normalize_url("not a url"), "not a url");
        assert!(try_normalize_url("not a url").is_err());
    }

    #[test]
    fn test_validity_accepts_any_scheme() {
        assert!(is_valid_url("https://x.com"));
        assert!(is_valid_url("ftp://files.example.org/pub"));
        assert!(is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("x.com/a"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_opaque_urls_are_stable() {
        let once = normalize_url("mailto:someone@example.com?subject=hi");
        assert_eq!(once, "mailto:someone@example.com");
        assert_eq!(normalize_url(&once), once);
    }
}
