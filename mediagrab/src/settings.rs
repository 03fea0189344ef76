//! Application settings shared by every job.
//!
//! [`Settings`] is a plain value handed to each orchestrator when it is built;
//! nothing reads configuration from global state. It derives serde so an
//! embedding application can persist it however it likes. The CLI builds it
//! from [`SettingsArgs`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default merge binary, resolved through the system search path.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Default output template.
pub const DEFAULT_TEMPLATE: &str = "%(title)s [%(id)s].%(ext)s";

/// Default allow-list of site fragments.
pub const DEFAULT_SITES: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "music.youtube.com",
    "instagram.com",
];

/// Settings supplied by the configuration collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// ffmpeg binary, its directory, or the bare name `ffmpeg`
    pub ffmpeg_path: String,
    /// Default destination directory
    pub save_directory: PathBuf,
    /// Output template used when no explicit filename is given
    pub filename_template: String,
    /// Allow-list of site fragments for URL matching
    pub supported_sites: Vec<String>,
    /// Netscape-format cookies file passed to the extractor
    pub cookies_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_path: DEFAULT_FFMPEG.to_string(),
            save_directory: default_save_directory(),
            filename_template: DEFAULT_TEMPLATE.to_string(),
            supported_sites: DEFAULT_SITES.iter().map(|s| s.to_string()).collect(),
            cookies_file: None,
        }
    }
}

/// System download directory, falling back to `~/Downloads`.
pub fn default_save_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// CLI arguments overriding [`Settings`].
#[derive(clap::Args, Clone, Debug)]
pub struct SettingsArgs {
    /// Path to ffmpeg binary or its directory
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FFMPEG)]
    pub ffmpeg: String,

    /// Output filename template
    #[arg(long, value_name = "TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    /// Supported site fragment (repeatable, replaces the default list)
    #[arg(long = "site", value_name = "DOMAIN")]
    pub sites: Vec<String>,

    /// Cookies file in Netscape format
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,
}

impl From<SettingsArgs> for Settings {
    fn from(args: SettingsArgs) -> Self {
        let defaults = Settings::default();

        let supported_sites = if args.sites.is_empty() {
            defaults.supported_sites
        } else {
            args.sites
        };

        Self {
            ffmpeg_path: args.ffmpeg,
            filename_template: args.template,
            supported_sites,
            cookies_file: args.cookies,
            ..defaults
        }
    }
}
