//! URL allow-list matching.
//!
//! Matching is advisory. The extractor is the real authority on which sites
//! work, so anything that looks like a web URL is let through even when it is
//! not on the list. An entry matches when its host fragment is a
//! case-insensitive substring of the URL host: `youtube.com` also matches
//! `notyoutube.com.evil.test`.

use url::Url;

/// How a URL relates to the allow-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SiteMatch {
    /// Host contains the given allow-list fragment
    Listed(String),
    /// Not listed, but an http(s) URL the extractor may still handle
    Permissive,
    /// Empty input
    Unsupported,
}

impl SiteMatch {
    pub fn is_supported(&self) -> bool {
        !matches!(self, SiteMatch::Unsupported)
    }
}

/// Whether `url` is supported by `allow_list`.
pub fn is_supported<S: AsRef<str>>(url: &str, allow_list: &[S]) -> bool {
    classify(url, allow_list).is_supported()
}

/// Classify `url` against `allow_list`.
pub fn classify<S: AsRef<str>>(url: &str, allow_list: &[S]) -> SiteMatch {
    let url = url.trim();
    if url.is_empty() {
        return SiteMatch::Unsupported;
    }

    let normalized = normalize(url);

    let Some(host) = host_of(&normalized) else {
        return permissive(&normalized);
    };

    allow_list
        .iter()
        .filter_map(|entry| host_fragment(entry.as_ref()))
        .find(|fragment| host.contains(fragment.as_str()))
        .map(SiteMatch::Listed)
        .unwrap_or_else(|| permissive(&normalized))
}

/// Prefix `https://` unless the URL already has an http(s) scheme.
pub fn normalize(url: &str) -> String {
    if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn permissive(normalized: &str) -> SiteMatch {
    if has_http_scheme(normalized) {
        SiteMatch::Permissive
    } else {
        SiteMatch::Unsupported
    }
}

/// Lowercased, non-empty host of `url`.
fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim().to_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Host fragment of an allow-list entry; entries with a scheme contribute
/// their host, anything else is used as written.
fn host_fragment(entry: &str) -> Option<String> {
    let entry = entry.trim().to_lowercase();
    if entry.is_empty() {
        return None;
    }

    if entry.contains("://")
        && let Some(host) = host_of(&entry)
    {
        return Some(host);
    }

    Some(entry)
}
