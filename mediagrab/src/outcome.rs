//! Terminal result of a download job.

use crate::error::{AttemptFailure, ErrorCategory, JobError};
use std::path::{Path, PathBuf};

/// What a finished job hands back to its caller.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// File saved and located on disk
    Success {
        path: PathBuf,
        /// Primary attempt failure, when the fallback format succeeded
        recovered_from: Option<AttemptFailure>,
    },
    /// Download completed but the saved file could not be located
    PartialSuccess { message: String },
    /// Job failed
    Failure(JobError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failure(_))
    }

    /// Saved file, if located.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Success { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            DownloadOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.error().map(JobError::category)
    }
}

impl From<JobError> for DownloadOutcome {
    fn from(e: JobError) -> Self {
        DownloadOutcome::Failure(e)
    }
}
