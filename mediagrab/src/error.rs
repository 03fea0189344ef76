//! Error types for download jobs.

use crate::orchestrator::FormatPolicy;
use mediagrab_dl::ExtractorError;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Once;
use thiserror::Error;

/// Coarse classification of a failed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    ToolMissing,
    Extraction,
    Unexpected,
}

/// Terminal failure of a download job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Input rejected before any work started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Merge or probe tool not found
    #[error("{tool} not found. {hint}")]
    ToolMissing {
        tool: &'static str,
        hint: &'static str,
    },

    /// Primary and fallback attempts both failed
    #[error(
        "Primary error:\n{primary}\n\nRetry error:\n{retry}\n\nCollected hook messages:\n{}",
        EventList(.recent_events)
    )]
    Extraction {
        primary: AttemptFailure,
        retry: AttemptFailure,
        recent_events: Vec<String>,
    },

    /// Panic caught at the job boundary
    #[error("{kind}: {message}\n\nBacktrace:\n{backtrace}")]
    Unexpected {
        kind: String,
        message: String,
        backtrace: String,
    },
}

impl JobError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            JobError::Validation(_) => ErrorCategory::Validation,
            JobError::ToolMissing { .. } => ErrorCategory::ToolMissing,
            JobError::Extraction { .. } => ErrorCategory::Extraction,
            JobError::Unexpected { .. } => ErrorCategory::Unexpected,
        }
    }

    /// Convert a caught panic payload.
    ///
    /// Uses the backtrace recorded at the panic site when the panic went
    /// through [`catch_panic`], else captures one here.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());

        let backtrace = PANIC_BACKTRACE
            .try_with(|slot| slot.borrow_mut().take())
            .ok()
            .flatten()
            .unwrap_or_else(|| Backtrace::force_capture().to_string());

        JobError::Unexpected {
            kind: "panic".to_string(),
            message,
            backtrace,
        }
    }
}

thread_local! {
    /// Backtrace of the last panic on this thread, set by the panic hook.
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Run `f`, converting a panic into [`JobError::Unexpected`].
///
/// The first call chains a panic hook in front of the existing one. The hook
/// records a backtrace on the panicking thread before unwinding starts, so the
/// report shows the frames that panicked.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, JobError> {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            let _ = PANIC_BACKTRACE.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(backtrace);
                }
            });
            previous(info);
        }));
    });

    let _ = PANIC_BACKTRACE.try_with(|slot| slot.borrow_mut().take());

    panic::catch_unwind(AssertUnwindSafe(f)).map_err(JobError::from_panic)
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no URL provided")]
    MissingUrl,

    #[error("cookies file not found: {}", .0.display())]
    CredentialFileNotFound(PathBuf),

    #[error("filename is empty after sanitization: {0:?}")]
    EmptyFilename(String),

    #[error("cannot create destination directory {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Context captured from one failed download attempt.
#[derive(Clone, Debug)]
pub struct AttemptFailure {
    pub policy: FormatPolicy,
    pub error: ExtractorError,
    /// Progress events preceding the failure
    pub recent_events: Vec<String>,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error.report())?;
        if !self.recent_events.is_empty() {
            write!(
                f,
                "\n\nLast hook messages:\n{}",
                EventList(&self.recent_events)
            )?;
        }
        Ok(())
    }
}

struct EventList<'a>(&'a [String]);

impl fmt::Display for EventList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<no hook messages>")
        } else {
            write!(f, "{}", self.0.join("\n"))
        }
    }
}
