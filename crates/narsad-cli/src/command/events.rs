use super::InputArg;
use crate::{model::events_table, util::Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EventsArg {
    #[clap(flatten)]
    input: InputArg,
}

/// Writes `onset, duration, trial_type` TSVs whose trial types are the derived
/// conditions, as read by first-level model setup
pub(crate) fn run(arg: &EventsArg) -> anyhow::Result<()> {
    let EventsArg { input } = arg;
    for path in &input.events {
        let extraction = super::load_and_extract(path)?;
        let mut output = Output::from_output_path(input.output_path(path, "events.tsv")?)?;
        output.write_records(
            b'\t',
            &events_table::PROCESSED_EVENTS_HEADER,
            events_table::processed_event_records(&extraction.table),
        )?;
    }
    Ok(())
}
