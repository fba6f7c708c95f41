//! Platform detection from a link's host

use outreach_core::{PlatformConfig, Settings, DEFAULT_PLATFORM};
use std::borrow::Cow;
use url::Url;

/// Maps links onto configured platforms by domain suffix
#[derive(Debug, Clone, Default)]
pub struct PlatformDetector {
    platforms: Vec<PlatformConfig>,
}

impl PlatformDetector {
    /// Create a detector; platforms are tried in the given order
    pub fn new(platforms: Vec<PlatformConfig>) -> Self {
        Self { platforms }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.platforms.clone())
    }

    pub fn platforms(&self) -> &[PlatformConfig] {
        &self.platforms
    }

    /// Name of the first platform whose domain matches the link's host.
    ///
    /// Matching is exact or on a `.`-separated suffix, so `m.tiktok.com`
    /// matches `tiktok.com` but `notinstagram.com` does not match
    /// `instagram.com`. A leading `www.` is ignored on both sides.
    pub fn detect(&self, link: &str) -> Option<&str> {
        let host = extract_host(link)?;

        self.platforms
            .iter()
            .find(|platform| {
                let domain = strip_www(platform.domain.trim()).to_lowercase();
                !domain.is_empty()
                    && (host == domain || host.ends_with(&format!(".{}", domain)))
            })
            .map(|platform| platform.name.as_str())
    }

    /// Detected platform name, or `"Other"`
    pub fn detect_or_default(&self, link: &str) -> String {
        self.detect(link).unwrap_or(DEFAULT_PLATFORM).to_string()
    }

    /// Names offered for manual selection: configured platforms then `"Other"`
    pub fn choices(&self) -> Vec<String> {
        self.platforms
            .iter()
            .map(|p| p.name.clone())
            .chain(std::iter::once(DEFAULT_PLATFORM.to_string()))
            .collect()
    }
}

/// Lowercased host of `link` without a leading `www.`.
///
/// Scheme-less input such as `instagram.com/someone` is read as https.
pub fn extract_host(link: &str) -> Option<String> {
    let parsed = Url::parse(&with_scheme(link.trim())).ok()?;
    let host = parsed.host_str()?;
    Some(strip_www(&host.to_lowercase()).to_string())
}

fn with_scheme(link: &str) -> Cow<'_, str> {
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme {
        Cow::Borrowed(link)
    } else {
        Cow::Owned(format!("https://{}", link))
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
