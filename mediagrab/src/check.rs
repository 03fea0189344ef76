//! Check subcommand - report where the merge and probe tools resolve.

use crate::settings::DEFAULT_FFMPEG;
use crate::tools::{MERGER, PROBE, SearchMode, ToolLocation, ToolLocator};
use color_eyre::Section;
use eyre::{Result, eyre};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to ffmpeg binary or its directory
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FFMPEG)]
    pub ffmpeg: String,
}

pub fn execute(args: Args) -> Result<()> {
    let locator = ToolLocator::new();

    let locations: Vec<ToolLocation> = [MERGER, PROBE]
        .into_iter()
        .map(|tool| locator.locate(Some(&args.ffmpeg), tool))
        .collect();

    for location in &locations {
        println!("{}", describe(location));
    }

    let missing: Vec<&str> = locations
        .iter()
        .filter(|l| !l.is_available())
        .map(|l| l.binary_name.as_str())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(eyre!("missing tools: {}", missing.join(", "))
        .suggestion("install ffmpeg, or pass --ffmpeg with its path or directory"))
}

fn describe(location: &ToolLocation) -> String {
    let Some(path) = &location.resolved_path else {
        return format!("{}: not found", location.binary_name);
    };

    let source = match location.search_mode {
        SearchMode::ExplicitFile => "configured path",
        SearchMode::ExplicitDirectory => "configured directory",
        SearchMode::SystemPath => "PATH",
    };

    format!("{}: {} ({source})", location.binary_name, path.display())
}
