use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use narsad_conditions::{
    extract::{ConditionExtractor, Extraction},
    family::ConditionFamily,
    trial::RawTable,
};

use self::{contrasts::ContrastsArg, events::EventsArg, extract::ExtractArg};
use crate::util;

mod contrasts;
mod events;
mod extract;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log more detail (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Label each trial with its derived condition
    Extract(#[clap(flatten)] ExtractArg),
    /// Generate contrasts between derived conditions
    Contrasts(#[clap(flatten)] ContrastsArg),
    /// Write events files whose trial types are the derived conditions
    Events(#[clap(flatten)] EventsArg),
}

/// Events files plus where to put per-file outputs
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InputArg {
    /// Events files (CSV or TSV with `trial_type` and `onset` columns)
    #[arg(required = true)]
    events: Vec<PathBuf>,
    /// Output file path for a single events file
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,
    /// Directory for per-file outputs; stdout is used when neither this nor
    /// `--output` is given
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl InputArg {
    /// Output path for `events_path`, or `None` for stdout
    ///
    /// Several inputs need `--output-dir`; a single `--output` or stdout
    /// would mix their outputs.
    fn output_path(&self, events_path: &Path, suffix: &str) -> anyhow::Result<Option<PathBuf>> {
        match (&self.output_dir, &self.output) {
            (Some(dir), _) => Ok(Some(util::derived_output_path(dir, events_path, suffix))),
            (None, output) if self.events.len() == 1 => Ok(output.clone()),
            (None, _) => anyhow::bail!(
                "--output-dir is required when processing {} events files",
                self.events.len()
            ),
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    util::init_logger(args.verbose, args.quiet);
    match &args.mode {
        Mode::Extract(arg) => extract::run(arg)?,
        Mode::Contrasts(arg) => contrasts::run(arg)?,
        Mode::Events(arg) => events::run(arg)?,
    }
    Ok(())
}

/// Loads one events file and runs condition extraction on it
fn load_and_extract(path: &Path) -> anyhow::Result<Extraction> {
    let raw = util::read_events_file(path)?;
    extract_events(path, &raw)
}

/// Runs condition extraction on an events file already loaded from `path`
fn extract_events(path: &Path, raw: &RawTable) -> anyhow::Result<Extraction> {
    log::info!("Processing {}", path.display());
    let extraction = ConditionExtractor::new()
        .extract_raw(raw)
        .with_context(|| format!("Invalid events file: {}", path.display()))?;
    util::log_diagnostics(&extraction.diagnostics);

    for family in ConditionFamily::ALL {
        let summary = extraction.summary(family);
        log::debug!(
            "{family}: first={:?}, others={:?}",
            summary.first,
            summary.others
        );
    }
    Ok(extraction)
}
