//! yt-dlp Python API wrappers.
//!
//! Type-safe bindings to [yt-dlp](https://github.com/yt-dlp/yt-dlp) `YoutubeDL` parameters.
//!
//! ```no_run
//! use mediagrab_dl::dl::{DownloadOptions, OutputTemplates, YtDlp};
//! use mediagrab_dl::extractor::{Extractor, ExtractorOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = DownloadOptions {
//!     format: Some("bestvideo+bestaudio".to_string()),
//!     outtmpl: Some(OutputTemplates::simple("%(title)s.%(ext)s".to_string())),
//!     noplaylist: Some(true),
//!     ..Default::default()
//! };
//! let info = YtDlp.extract("https://youtube.com/watch?v=example", &ExtractorOptions::new(params), true)?;
//! println!("Downloaded: {:?}", info.title());
//! # Ok(())
//! # }
//! ```

use crate::error::ExtractorError;
use crate::extractor::{Extractor, ExtractorOptions};
use crate::info::MediaInfo;
use crate::progress::ProgressLog;
use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyTuple};
use std::collections::HashMap;
use std::path::PathBuf;

/// Log target for lines emitted by yt-dlp's logger.
pub const LOG_TARGET: &str = "yt_dlp";

/// Filename templates using `%(field)s` syntax. Key `default` required.
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct OutputTemplates(pub Option<HashMap<String, String>>);

impl OutputTemplates {
    /// Create with a single default template.
    pub fn simple(default: String) -> Self {
        Self(Some(HashMap::from([("default".to_string(), default)])))
    }

    /// The `default` template.
    pub fn default_template(&self) -> Option<&str> {
        self.0.as_ref()?.get("default").map(String::as_str)
    }
}

/// yt-dlp configuration passed to `YoutubeDL(params)`.
///
/// `None` fields are dropped before the call so yt-dlp applies its own defaults.
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub outtmpl: Option<OutputTemplates>,
    /// Download only the targeted item of a playlist URL
    pub noplaylist: Option<bool>,
    pub http_headers: Option<HashMap<String, String>>,
    /// Netscape-format cookies file
    pub cookiefile: Option<String>,
    /// Directory containing ffmpeg and ffprobe
    pub ffmpeg_location: Option<String>,
    pub quiet: Option<bool>,
    pub no_warnings: Option<bool>,
}

impl DownloadOptions {
    /// Insert or replace an HTTP header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.http_headers
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }
}

/// Extractor backed by the yt-dlp Python package.
///
/// Requires `yt_dlp` to be importable by the embedded interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct YtDlp;

impl Extractor for YtDlp {
    /// Calls `extract_info(url, download=download)` and returns the sanitized info dict.
    fn extract(
        &self,
        url: &str,
        options: &ExtractorOptions,
        download: bool,
    ) -> Result<MediaInfo, ExtractorError> {
        let json = Python::attach(|py| {
            call_extract(py, url, options, download).map_err(|e| ExtractorError::from_py(py, &e))
        })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Uses `YoutubeDL.prepare_filename` so the prediction matches yt-dlp exactly.
    fn prepare_filename(&self, info: &MediaInfo, outtmpl: &str) -> Option<PathBuf> {
        let json = serde_json::to_string(info).ok()?;

        Python::attach(|py| -> PyResult<String> {
            load_module(py)?
                .getattr("prepare_filename")?
                .call1((json, outtmpl))?
                .extract()
        })
        .inspect_err(|e| tracing::debug!(error = %e, "prepare_filename failed"))
        .ok()
        .map(PathBuf::from)
    }
}

fn load_module(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    PyModule::from_code(py, c_str!(include_str!("./dl.py")), c"dl.py", c"dl")
}

fn call_extract(
    py: Python<'_>,
    url: &str,
    options: &ExtractorOptions,
    download: bool,
) -> PyResult<String> {
    let module = load_module(py)?;

    let py_params = options.params.clone().into_pyobject(py)?;

    let hook = options
        .progress
        .clone()
        .map(|log| progress_hook(py, log))
        .transpose()?;

    let sink = log_sink(py)?;

    module
        .getattr("extract")?
        .call1((url, py_params, download, hook, sink))?
        .extract()
}

/// Python callable pushing each (summarized) progress dict into `log`.
fn progress_hook(py: Python<'_>, log: ProgressLog) -> PyResult<Bound<'_, PyCFunction>> {
    PyCFunction::new_closure(
        py,
        Some(c"progress_hook"),
        None,
        move |args: &Bound<'_, PyTuple>, _kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<()> {
            let event: String = args.get_item(0)?.extract()?;
            log.push(event);
            Ok(())
        },
    )
}

/// Python callable re-emitting yt-dlp logger lines as tracing events.
fn log_sink(py: Python<'_>) -> PyResult<Bound<'_, PyCFunction>> {
    PyCFunction::new_closure(
        py,
        Some(c"log_sink"),
        None,
        |args: &Bound<'_, PyTuple>, _kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<()> {
            let (level, message): (String, String) = args.extract()?;
            match level.as_str() {
                "error" => tracing::error!(target: LOG_TARGET, "{message}"),
                "warning" => tracing::warn!(target: LOG_TARGET, "{message}"),
                "info" => tracing::info!(target: LOG_TARGET, "{message}"),
                _ => tracing::debug!(target: LOG_TARGET, "{message}"),
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    /// Compare Python object with dict/list literal using recursive equality.
    #[track_caller]
    fn assert_py_eq(py: Python, py_obj: &Bound<PyAny>, expected: &'static CStr) {
        let py_expected = py.eval(expected, None, None).unwrap();
        assert!(py_obj.eq(&py_expected).unwrap());
    }

    #[test]
    fn output_templates_default() {
        Python::attach(|py| {
            let templates = OutputTemplates::default();
            let py_obj = templates.into_pyobject(py).unwrap();
            assert!(py_obj.is_none());
        });
    }

    #[test]
    fn output_templates_simple() {
        Python::attach(|py| {
            let templates = OutputTemplates::simple("/tmp/%(title)s.%(ext)s".to_string());
            let py_obj = templates.into_pyobject(py).unwrap();
            assert_py_eq(py, py_obj.as_any(), c"{'default': '/tmp/%(title)s.%(ext)s'}");
        });
    }

    #[test]
    fn headers_are_merged() {
        let opts = DownloadOptions::default()
            .with_header("Referer", "https://a.example/")
            .with_header("Referer", "https://www.instagram.com/")
            .with_header("Accept-Language", "en");

        let headers = opts.http_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Referer"], "https://www.instagram.com/");
    }

    #[test]
    fn download_options_custom() {
        Python::attach(|py| {
            let opts = DownloadOptions {
                format: Some("bestvideo+bestaudio".to_string()),
                noplaylist: Some(true),
                cookiefile: Some("/tmp/cookies.txt".to_string()),
                ..Default::default()
            };
            let py_obj = opts.into_pyobject(py).unwrap();
            assert_py_eq(
                py,
                py_obj.as_any(),
                c"{'format': 'bestvideo+bestaudio', 'outtmpl': None, 'noplaylist': True, 'http_headers': None, 'cookiefile': '/tmp/cookies.txt', 'ffmpeg_location': None, 'quiet': None, 'no_warnings': None}"
            );
        });
    }

    #[test]
    fn progress_hook_pushes_events() {
        let log = ProgressLog::new();

        Python::attach(|py| {
            let hook = progress_hook(py, log.clone()).unwrap();
            hook.call1(("{'status': 'downloading'}",)).unwrap();
            hook.call1(("{'status': 'finished'}",)).unwrap();
        });

        assert_eq!(
            log.tail(5),
            vec!["{'status': 'downloading'}", "{'status': 'finished'}"]
        );
    }

    #[test]
    fn log_sink_accepts_all_levels() {
        Python::attach(|py| {
            let sink = log_sink(py).unwrap();
            for level in ["debug", "info", "warning", "error"] {
                sink.call1((level, "message")).unwrap();
            }
            assert!(sink.call1(("info",)).is_err());
        });
    }

    #[test]
    fn python_exception_is_captured() {
        let err = Python::attach(|py| {
            let e = py
                .eval(c"int('not a number')", None, None)
                .expect_err("eval should raise");
            ExtractorError::from_py(py, &e)
        });

        assert_eq!(err.kind, "ValueError");
        assert!(err.message.contains("not a number"));
    }
}
