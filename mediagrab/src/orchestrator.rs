//! Download state machine.
//!
//! One [`Orchestrator::run`] takes a [`JobRequest`] through
//! `Idle → Preparing → Downloading → Resolving` to a terminal
//! [`DownloadOutcome`]. Merging happens inside the extractor once both
//! streams are on disk.
//!
//! Downloading makes at most two extractor calls. The first asks for the best
//! video and best audio streams merged; if that fails, one retry asks for the
//! best single pre-muxed file. Both failures are reported together when the
//! retry fails as well.

use crate::error::{AttemptFailure, JobError, ValidationError, catch_panic};
use crate::job::JobRequest;
use crate::outcome::DownloadOutcome;
use crate::settings::Settings;
use crate::tools::{self, MERGER, PROBE, ToolLocation, ToolLocator};
use mediagrab_dl::{
    DownloadOptions, Extractor, ExtractorError, ExtractorOptions, MediaInfo, OutputTemplates,
    ProgressLog,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress events retained per job.
pub const PROGRESS_CAPACITY: usize = 200;

/// Progress events attached to the primary attempt failure.
pub const PRIMARY_EVENT_TAIL: usize = 25;

/// Progress events attached to the final failure report.
pub const FINAL_EVENT_TAIL: usize = 50;

/// Sites that refuse media requests without their own referer.
const REFERER_SITES: &[(&str, &str)] = &[("instagram.com", "https://www.instagram.com/")];

/// Format selection for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatPolicy {
    /// Best video stream plus best audio stream, merged
    Merged,
    /// Best single pre-muxed stream
    SingleFile,
}

impl FormatPolicy {
    /// yt-dlp format selector.
    pub fn selector(self) -> &'static str {
        match self {
            FormatPolicy::Merged => "bestvideo+bestaudio",
            FormatPolicy::SingleFile => "best",
        }
    }
}

/// Job lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Preparing,
    Downloading,
    Resolving,
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl JobState {
    fn of(outcome: &DownloadOutcome) -> Self {
        match outcome {
            DownloadOutcome::Success { .. } => JobState::Succeeded,
            DownloadOutcome::PartialSuccess { .. } => JobState::PartiallySucceeded,
            DownloadOutcome::Failure(_) => JobState::Failed,
        }
    }
}

/// Referer to send for `url`, if it belongs to a site that needs one.
pub fn referer_for(url: &str) -> Option<&'static str> {
    let url = url.to_lowercase();
    REFERER_SITES
        .iter()
        .find(|(site, _)| url.contains(site))
        .map(|(_, referer)| *referer)
}

/// Runs download jobs against an extractor.
///
/// Holds no per-job state, so one orchestrator can serve concurrent jobs.
#[derive(Clone)]
pub struct Orchestrator {
    extractor: Arc<dyn Extractor>,
    settings: Settings,
    locator: ToolLocator,
}

impl Orchestrator {
    pub fn new(extractor: Arc<dyn Extractor>, settings: Settings) -> Self {
        Self {
            extractor,
            settings,
            locator: ToolLocator::new(),
        }
    }

    /// Replace the tool locator (e.g., to search a bundled tools directory).
    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    /// Execute `request` to a terminal outcome. Never panics.
    pub fn run(&self, request: &JobRequest) -> DownloadOutcome {
        let span = tracing::info_span!("download", url = %request.source_url);
        let _enter = span.enter();

        let outcome = match catch_panic(|| self.execute(request)) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) | Err(e) => DownloadOutcome::Failure(e),
        };

        match &outcome {
            DownloadOutcome::Success { path, recovered_from } => tracing::info!(
                path = ?path.display(),
                fallback = recovered_from.is_some(),
                "download complete"
            ),
            DownloadOutcome::PartialSuccess { message } => {
                tracing::info!(note = %message, "download finished, file not located")
            }
            DownloadOutcome::Failure(e) => {
                tracing::error!(category = ?e.category(), error = %e, "download failed")
            }
        }

        tracing::debug!(state = ?JobState::of(&outcome), "terminal state");
        outcome
    }

    fn execute(&self, request: &JobRequest) -> Result<DownloadOutcome, JobError> {
        let mut state = JobState::Idle;

        // Preparing
        advance(&mut state, JobState::Preparing);

        if request.source_url.trim().is_empty() {
            return Err(ValidationError::MissingUrl.into());
        }

        let outtmpl = request.output_template(&self.settings.filename_template)?;

        if let Some(cookies) = &request.credential_file
            && !cookies.exists()
        {
            return Err(ValidationError::CredentialFileNotFound(cookies.clone()).into());
        }

        let merger = self.check_tools()?;
        let ffmpeg_location = tools::merger_location(&merger);

        let destination = &request.destination_directory;
        std::fs::create_dir_all(destination).map_err(|source| ValidationError::Destination {
            path: destination.clone(),
            source,
        })?;

        let progress = ProgressLog::with_capacity(PROGRESS_CAPACITY);

        // Downloading
        advance(&mut state, JobState::Downloading);

        let primary = self.attempt(
            request,
            &outtmpl,
            FormatPolicy::Merged,
            ffmpeg_location.as_deref(),
            &progress,
        );

        let (info, recovered_from) = match primary {
            Ok(info) => (info, None),
            Err(error) => {
                let primary = AttemptFailure {
                    policy: FormatPolicy::Merged,
                    error,
                    recent_events: progress.tail(PRIMARY_EVENT_TAIL),
                };

                tracing::warn!(
                    error = %primary.error,
                    "merged format failed, retrying with single file"
                );

                match self.attempt(
                    request,
                    &outtmpl,
                    FormatPolicy::SingleFile,
                    ffmpeg_location.as_deref(),
                    &progress,
                ) {
                    Ok(info) => (info, Some(primary)),
                    Err(error) => {
                        return Err(JobError::Extraction {
                            primary,
                            retry: AttemptFailure {
                                policy: FormatPolicy::SingleFile,
                                error,
                                recent_events: Vec::new(),
                            },
                            recent_events: progress.tail(FINAL_EVENT_TAIL),
                        });
                    }
                }
            }
        };

        // Resolving
        advance(&mut state, JobState::Resolving);

        let outcome = match self.resolve_output(&info, &outtmpl) {
            Some(path) => DownloadOutcome::Success {
                path,
                recovered_from,
            },
            None => DownloadOutcome::PartialSuccess {
                message: format!("Download finished. Saved to {}", destination.display()),
            },
        };

        Ok(outcome)
    }

    /// Fail with [`JobError::ToolMissing`] unless both ffmpeg and ffprobe resolve.
    ///
    /// Returns where ffmpeg was found.
    fn check_tools(&self) -> Result<ToolLocation, JobError> {
        let configured = Some(self.settings.ffmpeg_path.as_str());

        let merger = self.locator.locate(configured, MERGER);
        if !merger.is_available() {
            return Err(JobError::ToolMissing {
                tool: "FFmpeg",
                hint: "A full FFmpeg build (with ffprobe) is required to merge audio and video.",
            });
        }

        let probe = self.locator.locate(configured, PROBE);
        if !probe.is_available() {
            return Err(JobError::ToolMissing {
                tool: "ffprobe",
                hint: "ffprobe (part of FFmpeg) is required for post-processing and merging.",
            });
        }

        tracing::debug!(
            ffmpeg = ?merger.resolved_path,
            ffprobe = ?probe.resolved_path,
            "merge tools found"
        );

        Ok(merger)
    }

    fn attempt(
        &self,
        request: &JobRequest,
        outtmpl: &str,
        policy: FormatPolicy,
        ffmpeg_location: Option<&Path>,
        progress: &ProgressLog,
    ) -> Result<MediaInfo, ExtractorError> {
        tracing::info!(format = policy.selector(), "downloading");

        let options = self.build_options(
            request,
            outtmpl,
            policy,
            ffmpeg_location,
            progress.clone(),
        );
        self.extractor.extract(&request.source_url, &options, true)
    }

    /// Fresh extractor options for one attempt.
    ///
    /// `ffmpeg_location` is the directory of the merge binary that passed the
    /// tool check, or `None` to let the extractor search for it.
    pub fn build_options(
        &self,
        request: &JobRequest,
        outtmpl: &str,
        policy: FormatPolicy,
        ffmpeg_location: Option<&Path>,
        progress: ProgressLog,
    ) -> ExtractorOptions {
        let mut params = DownloadOptions {
            format: Some(policy.selector().to_string()),
            outtmpl: Some(OutputTemplates::simple(outtmpl.to_string())),
            noplaylist: Some(true),
            cookiefile: request
                .credential_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            ffmpeg_location: ffmpeg_location.map(|p| p.to_string_lossy().into_owned()),
            ..Default::default()
        };

        let referer = request
            .referer_override
            .as_deref()
            .or_else(|| referer_for(&request.source_url));

        if let Some(referer) = referer {
            params = params.with_header("Referer", referer);
        }

        ExtractorOptions::new(params).with_progress(progress)
    }

    /// Locate the saved file.
    ///
    /// Candidates in order: the first requested download, the reported
    /// filename, then the output template applied to `info`. Later candidates
    /// are only computed when earlier ones are missing on disk.
    fn resolve_output(&self, info: &MediaInfo, outtmpl: &str) -> Option<PathBuf> {
        let existing = |path: PathBuf| {
            let found = exists(&path);
            tracing::debug!(path = ?path.display(), found, "checking saved file");
            found.then_some(path)
        };

        info.requested_filepath()
            .and_then(existing)
            .or_else(|| info.reported_filename().and_then(existing))
            .or_else(|| {
                self.extractor
                    .prepare_filename(info, outtmpl)
                    .and_then(existing)
            })
    }
}

fn advance(state: &mut JobState, next: JobState) {
    tracing::debug!(from = ?state, to = ?next, "state transition");
    *state = next;
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl Extractor for Never {
        fn extract(
            &self,
            _url: &str,
            _options: &ExtractorOptions,
            _download: bool,
        ) -> Result<MediaInfo, ExtractorError> {
            Err(ExtractorError::new("Unreachable", "not used"))
        }
    }

    fn orchestrator(settings: Settings) -> Orchestrator {
        Orchestrator::new(Arc::new(Never), settings)
    }

    #[test]
    fn format_selectors() {
        assert_eq!(FormatPolicy::Merged.selector(), "bestvideo+bestaudio");
        assert_eq!(FormatPolicy::SingleFile.selector(), "best");
    }

    #[test]
    fn referer_lookup() {
        assert_eq!(
            referer_for("https://www.Instagram.com/reel/abc"),
            Some("https://www.instagram.com/")
        );
        assert_eq!(referer_for("https://youtu.be/abc"), None);
    }

    #[test]
    fn options_for_primary_attempt() {
        let orch = orchestrator(Settings::default());
        let req = JobRequest::new("https://youtu.be/abc", "/dl");

        let opts = orch.build_options(
            &req,
            "/dl/%(id)s.%(ext)s",
            FormatPolicy::Merged,
            None,
            ProgressLog::new(),
        );

        assert_eq!(opts.params.format.as_deref(), Some("bestvideo+bestaudio"));
        assert_eq!(opts.params.noplaylist, Some(true));
        assert_eq!(opts.output_template(), Some("/dl/%(id)s.%(ext)s"));
        assert!(opts.params.http_headers.is_none());
        assert!(opts.params.cookiefile.is_none());
        assert!(opts.params.ffmpeg_location.is_none());
        assert!(opts.progress.is_some());
    }

    #[test]
    fn options_inject_site_referer() {
        let orch = orchestrator(Settings::default());
        let req = JobRequest::new("https://www.instagram.com/reel/abc", "/dl");

        let opts = orch.build_options(&req, "x", FormatPolicy::SingleFile, None, ProgressLog::new());
        let headers = opts.params.http_headers.unwrap();

        assert_eq!(opts.params.format.as_deref(), Some("best"));
        assert_eq!(headers["Referer"], "https://www.instagram.com/");
    }

    #[test]
    fn referer_override_wins() {
        let orch = orchestrator(Settings::default());
        let req = JobRequest::new("https://www.instagram.com/reel/abc", "/dl")
            .with_referer("https://example.com/")
            .with_credential_file("/tmp/cookies.txt");

        let opts = orch.build_options(&req, "x", FormatPolicy::Merged, None, ProgressLog::new());

        assert_eq!(opts.params.http_headers.unwrap()["Referer"], "https://example.com/");
        assert_eq!(opts.params.cookiefile.as_deref(), Some("/tmp/cookies.txt"));
    }

    #[test]
    fn options_carry_ffmpeg_directory() {
        let tools = tempfile::tempdir().unwrap();
        let orch = orchestrator(Settings::default());
        let req = JobRequest::new("https://youtu.be/abc", "/dl");

        let opts = orch.build_options(
            &req,
            "x",
            FormatPolicy::Merged,
            Some(tools.path()),
            ProgressLog::new(),
        );

        assert_eq!(
            opts.params.ffmpeg_location.as_deref(),
            Some(tools.path().to_string_lossy().as_ref())
        );
    }

    fn info_with(value: serde_json::Value) -> MediaInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolution_prefers_requested_download() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        std::fs::write(&first, b"").unwrap();
        std::fs::write(&second, b"").unwrap();

        let info = info_with(serde_json::json!({
            "requested_downloads": [{ "filepath": first }],
            "_filename": second,
        }));

        let orch = orchestrator(Settings::default());
        assert_eq!(orch.resolve_output(&info, "unused"), Some(first));
    }

    #[test]
    fn resolution_skips_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let reconstructed = dir.path().join("abc.mp4");
        std::fs::write(&reconstructed, b"").unwrap();

        let info = info_with(serde_json::json!({
            "id": "abc",
            "ext": "mp4",
            "requested_downloads": [{ "filepath": dir.path().join("gone.mp4") }],
            "_filename": dir.path().join("also-gone.mp4"),
        }));
        let outtmpl = dir.path().join("%(id)s.%(ext)s");

        let orch = orchestrator(Settings::default());
        assert_eq!(
            orch.resolve_output(&info, &outtmpl.to_string_lossy()),
            Some(reconstructed)
        );
        assert_eq!(orch.resolve_output(&info_with(serde_json::json!({})), "/nowhere/%(id)s"), None);
    }
}
