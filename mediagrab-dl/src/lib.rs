//! Type-safe Rust bindings to [yt-dlp](https://github.com/yt-dlp/yt-dlp) Python library.
//!
//! ## Modules
//!
//! - [`dl`] - yt-dlp `YoutubeDL` parameters and the [`dl::YtDlp`] extractor
//! - [`extractor`] - [`Extractor`] trait the download pipeline is written against
//! - [`info`] - Info dict returned by `extract_info`
//! - [`progress`] - Bounded log of progress hook events
//! - [`template`] - `%(field)s` output template rendering
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediagrab_dl::{Extractor, ExtractorOptions, YtDlp};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let info = YtDlp.extract("https://youtube.com/watch?v=example", &ExtractorOptions::default(), false)?;
//! println!("{:?}", info.title());
//! # Ok(())
//! # }
//! ```

pub mod dl;
pub mod error;
pub mod extractor;
pub mod info;
pub mod progress;
pub mod template;

pub use dl::{DownloadOptions, OutputTemplates, YtDlp};
pub use error::ExtractorError;
pub use extractor::{Extractor, ExtractorOptions};
pub use info::MediaInfo;
pub use progress::ProgressLog;
