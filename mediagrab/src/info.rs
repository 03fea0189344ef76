//! Info subcommand - show metadata for a URL without downloading.

use crate::worker;
use color_eyre::Section;
use eyre::{Result, eyre};
use mediagrab_dl::{Extractor, MediaInfo, YtDlp};
use std::sync::Arc;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// URL to look up
    pub url: String,

    /// Print the full info dict as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: Args) -> Result<()> {
    let extractor: Arc<dyn Extractor> = Arc::new(YtDlp);
    let fetched = worker::spawn_info(extractor, args.url.clone())?.wait()?;

    if let Some(error) = fetched.error {
        return Err(eyre!("metadata lookup failed: {error}")
            .note("the lookup is best-effort, the download itself may still work")
            .suggestion(format!("mgrab dl {:?}", args.url)));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fetched.metadata)?);
    } else {
        print!("{}", summary(&fetched.metadata));
    }

    Ok(())
}

fn summary(info: &MediaInfo) -> String {
    let unknown = "unknown";
    let duration = info
        .duration()
        .map(format_duration)
        .unwrap_or_else(|| unknown.to_string());

    format!(
        "Title:    {}\nUploader: {}\nDuration: {}\nSite:     {}\n",
        info.title().unwrap_or(unknown),
        info.uploader().unwrap_or(unknown),
        duration,
        info.extractor_key().unwrap_or(unknown),
    )
}

/// Format seconds as `h:mm:ss`, or `m:ss` under an hour.
fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);

    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
