//! Dl subcommand - download a URL with best video and audio merged.

use crate::error::{ErrorCategory, JobError};
use crate::job::JobRequest;
use crate::orchestrator::Orchestrator;
use crate::outcome::DownloadOutcome;
use crate::settings::{Settings, SettingsArgs};
use crate::site::{self, SiteMatch};
use crate::worker;
use color_eyre::Section;
use eyre::{Report, Result, eyre};
use mediagrab_dl::YtDlp;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI arguments for a download.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// URL to download
    pub url: String,

    /// Output directory (default: system download directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Filename to save as, instead of the template
    #[arg(short, long)]
    pub name: Option<String>,

    /// Referer header sent with every request
    #[arg(long)]
    pub referer: Option<String>,

    /// Download even if the URL is not recognized
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Resolved configuration for a download.
#[derive(Debug)]
pub struct Config {
    pub request: JobRequest,
    pub settings: Settings,
    pub force: bool,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let settings = Settings::from(args.settings);

        let mut request = JobRequest::from_settings(args.url, &settings);
        if let Some(output) = args.output {
            request.destination_directory = output;
        }
        if let Some(name) = args.name {
            request = request.with_filename(name);
        }
        if let Some(referer) = args.referer {
            request = request.with_referer(referer);
        }

        Ok(Self {
            request,
            settings,
            force: args.force,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    let url = &config.request.source_url;

    match site::classify(url, &config.settings.supported_sites) {
        SiteMatch::Listed(site) => tracing::debug!(url = %url, site = %site, "supported site"),
        SiteMatch::Permissive => {
            tracing::warn!(url = %url, "URL outside supported sites, trying anyway")
        }
        SiteMatch::Unsupported if !config.force => {
            return Err(eyre!("URL not supported: {url:?}")
                .suggestion("pass --force to hand it to the extractor anyway"));
        }
        SiteMatch::Unsupported => tracing::warn!(url = %url, "unsupported URL forced"),
    }

    tracing::info!(
        url = %url,
        directory = ?config.request.destination_directory.display(),
        "downloading"
    );

    let orchestrator = Arc::new(Orchestrator::new(Arc::new(YtDlp), config.settings));
    let outcome = worker::spawn_download(orchestrator, config.request)?.wait()?;

    match outcome {
        DownloadOutcome::Success {
            path,
            recovered_from,
        } => {
            if let Some(failure) = recovered_from {
                tracing::warn!(
                    error = %failure.error,
                    "merged format failed, saved the single-file fallback"
                );
            }
            println!("{}", path.display());
            Ok(())
        }
        DownloadOutcome::PartialSuccess { message } => {
            println!("{message}");
            Ok(())
        }
        DownloadOutcome::Failure(e) => Err(failure_report(e)),
    }
}

fn failure_report(error: JobError) -> Report {
    let category = error.category();
    let report = Report::new(error).note(format!("failure category: {category:?}"));

    match category {
        ErrorCategory::ToolMissing => {
            report.suggestion("install ffmpeg, or pass --ffmpeg with its path or directory")
        }
        ErrorCategory::Validation => report.suggestion("check the arguments and try again"),
        ErrorCategory::Extraction => {
            report.suggestion("run `mgrab info <URL>` to see whether metadata can be fetched")
        }
        ErrorCategory::Unexpected => report,
    }
}
