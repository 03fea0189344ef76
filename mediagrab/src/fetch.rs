//! Metadata-only lookups for pre-download display.

use crate::error::catch_panic;
use mediagrab_dl::{DownloadOptions, Extractor, ExtractorOptions, MediaInfo};

/// Result of a best-effort metadata lookup.
///
/// Failures land in `error` instead of propagating; callers display them and
/// move on. Nothing here should decide whether a download is attempted.
#[derive(Clone, Debug, Default)]
pub struct FetchedInfo {
    pub metadata: MediaInfo,
    pub error: Option<String>,
}

impl FetchedInfo {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetch metadata for `url` without downloading.
pub fn fetch_info(extractor: &dyn Extractor, url: &str) -> FetchedInfo {
    let options = ExtractorOptions::new(DownloadOptions::default());

    let result = catch_panic(|| extractor.extract(url, &options, false));

    match result {
        Ok(Ok(metadata)) => {
            tracing::debug!(url, title = metadata.title(), "metadata fetched");
            FetchedInfo {
                metadata,
                error: None,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(url, error = %e, "metadata fetch failed");
            FetchedInfo {
                metadata: MediaInfo::default(),
                error: Some(e.to_string()),
            }
        }
        Err(error) => {
            tracing::warn!(url, error = %error, "metadata fetch panicked");
            FetchedInfo {
                metadata: MediaInfo::default(),
                error: Some(error.to_string()),
            }
        }
    }
}
