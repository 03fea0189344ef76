//! Extractor abstraction.
//!
//! The download pipeline only needs two things from an extractor: run
//! `extract_info` for a URL (with or without downloading), and predict the
//! filename an output template produces for a given info dict. [`YtDlp`]
//! implements both against the real yt-dlp; tests substitute scripted
//! implementations.
//!
//! [`YtDlp`]: crate::dl::YtDlp

use crate::dl::DownloadOptions;
use crate::error::ExtractorError;
use crate::info::MediaInfo;
use crate::progress::ProgressLog;
use crate::template;
use std::path::PathBuf;

/// Options for a single extractor invocation.
///
/// Rebuilt for every attempt; nothing carries over between calls except the
/// progress log handle.
#[derive(Clone, Debug, Default)]
pub struct ExtractorOptions {
    /// Parameters forwarded to `YoutubeDL(params)`
    pub params: DownloadOptions,
    /// Receives one entry per progress hook event
    pub progress: Option<ProgressLog>,
}

impl ExtractorOptions {
    pub fn new(params: DownloadOptions) -> Self {
        Self {
            params,
            progress: None,
        }
    }

    pub fn with_progress(mut self, log: ProgressLog) -> Self {
        self.progress = Some(log);
        self
    }

    /// The `default` output template, if set.
    pub fn output_template(&self) -> Option<&str> {
        self.params.outtmpl.as_ref()?.default_template()
    }

    /// Report a progress event to the registered log.
    pub fn report_progress(&self, event: impl Into<String>) {
        if let Some(log) = &self.progress {
            log.push(event);
        }
    }
}

/// Black-box media extractor.
pub trait Extractor: Send + Sync {
    /// Extract metadata for `url`, downloading the selected formats when
    /// `download` is set.
    fn extract(
        &self,
        url: &str,
        options: &ExtractorOptions,
        download: bool,
    ) -> Result<MediaInfo, ExtractorError>;

    /// Path that `outtmpl` produces for `info`.
    fn prepare_filename(&self, info: &MediaInfo, outtmpl: &str) -> Option<PathBuf> {
        Some(PathBuf::from(template::render(outtmpl, info)))
    }
}
