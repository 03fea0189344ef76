//! Error type for extractor invocations.

use pyo3::prelude::*;
use std::fmt;
use thiserror::Error;

/// Failure reported by the extractor for one `extract` call.
///
/// Carries the exception type name, its message, and the formatted traceback
/// when the failure originated on the Python side.
#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}")]
pub struct ExtractorError {
    /// Exception type name (e.g., `"DownloadError"`)
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Formatted traceback, if one was available
    pub traceback: Option<String>,
}

impl ExtractorError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// Capture type, message and traceback from a Python exception.
    pub fn from_py(py: Python<'_>, err: &PyErr) -> Self {
        let kind = err
            .get_type(py)
            .name()
            .map(|name| name.to_string())
            .unwrap_or_else(|_| "Exception".to_string());

        let message = err.value(py).to_string();

        let traceback = err.traceback(py).and_then(|tb| tb.format().ok());

        Self {
            kind,
            message,
            traceback,
        }
    }

    /// Multi-line report with the traceback appended.
    pub fn report(&self) -> Report<'_> {
        Report(self)
    }
}

impl From<PyErr> for ExtractorError {
    fn from(err: PyErr) -> Self {
        Python::attach(|py| Self::from_py(py, &err))
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(err: serde_json::Error) -> Self {
        Self::new("InvalidMetadata", err.to_string())
    }
}

/// Display adapter returned by [`ExtractorError::report`].
pub struct Report<'a>(&'a ExtractorError);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        if let Some(tb) = &self.0.traceback {
            write!(f, "\n\nTraceback:\n{}", tb.trim_end())?;
        }
        Ok(())
    }
}
