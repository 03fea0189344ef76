//! Download orchestration on top of [`mediagrab_dl`].
//!
//! A [`JobRequest`] describes one download. An [`Orchestrator`] runs it:
//! validate, check that ffmpeg and ffprobe are reachable, try the merged
//! best-video+best-audio format, fall back once to the best single file, and
//! locate the saved file. Jobs run on worker threads via [`worker`].
//!
//! ```no_run
//! use mediagrab::{JobRequest, Orchestrator, Settings, worker};
//! use mediagrab_dl::YtDlp;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let request = JobRequest::from_settings("https://youtu.be/jNQXAC9IVRw", &settings);
//! let orchestrator = Arc::new(Orchestrator::new(Arc::new(YtDlp), settings));
//!
//! let outcome = worker::spawn_download(orchestrator, request)?.wait()?;
//! println!("{:?}", outcome.path());
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod cli;
pub mod dl;
pub mod error;
pub mod fetch;
pub mod info;
pub mod job;
pub mod orchestrator;
pub mod outcome;
pub mod settings;
pub mod site;
pub mod tools;
pub mod worker;

pub use error::{ErrorCategory, JobError, ValidationError};
pub use fetch::{FetchedInfo, fetch_info};
pub use job::{FilenamePolicy, JobRequest};
pub use orchestrator::{FormatPolicy, Orchestrator};
pub use outcome::DownloadOutcome;
pub use settings::Settings;
pub use tools::ToolLocator;
