use narsad_conditions::family::ConditionFamily;

use super::InputArg;
use crate::{
    model::events_table::{self, ExtractionSummary},
    util::{self, Output},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum ExtractFormat {
    /// Events table with an appended `conditions` column
    #[default]
    Csv,
    /// Per-family summary
    Json,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExtractArg {
    #[clap(flatten)]
    input: InputArg,
    /// Output format: csv or json
    #[arg(long, default_value = "csv")]
    format: ExtractFormat,
}

pub(crate) fn run(arg: &ExtractArg) -> anyhow::Result<()> {
    let ExtractArg { input, format } = arg;
    for path in &input.events {
        let raw = util::read_events_file(path)?;
        let extraction = super::extract_events(path, &raw)?;
        for family in ConditionFamily::ALL {
            let summary = extraction.summary(family);
            if summary.first.is_some() {
                log::info!("{family}: {} trials", summary.trial_count());
            }
        }

        let suffix = match format {
            ExtractFormat::Csv => "conditions.csv",
            ExtractFormat::Json => "conditions.json",
        };
        let mut output = Output::from_output_path(input.output_path(path, suffix)?)?;
        match format {
            ExtractFormat::Csv => output.write_records(
                b',',
                &events_table::augmented_header(&raw),
                events_table::augmented_records(&raw, &extraction.table),
            )?,
            ExtractFormat::Json => output.write_json(ExtractionSummary::new(
                path.display().to_string(),
                &extraction,
            ))?,
        }
    }
    Ok(())
}
