use narsad_conditions::contrast::{ContrastBuilder, ContrastPolicy, DEFAULT_BASELINE};

use super::InputArg;
use crate::{
    model::contrast_file::{self, ContrastFile},
    util::{self, Output},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum ContrastFormat {
    /// One row per contrast
    #[default]
    Csv,
    /// Numbered listing for reading
    Text,
    /// Contrasts plus dropped contrasts and provenance
    Json,
}

impl ContrastFormat {
    fn suffix(self) -> &'static str {
        match self {
            Self::Csv => "contrasts.csv",
            Self::Text => "contrasts.txt",
            Self::Json => "contrasts.json",
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ContrastsArg {
    #[clap(flatten)]
    input: InputArg,
    /// Contrast policy: minimal, standard, curated (alias interesting),
    /// fixation or custom
    #[arg(long, default_value = "curated")]
    policy: ContrastPolicy,
    /// Reference condition for the curated and fixation policies
    #[arg(long, default_value = DEFAULT_BASELINE)]
    baseline: String,
    /// Contrast expression such as "CSS_others > CSR_others" (custom policy)
    #[arg(long = "contrast", value_name = "EXPR")]
    contrasts: Vec<String>,
    /// Output format: csv, text or json
    #[arg(long, default_value = "csv")]
    format: ContrastFormat,
    /// Fail when an events file yields no usable contrasts
    #[arg(long)]
    require_contrasts: bool,
}

pub(crate) fn run(arg: &ContrastsArg) -> anyhow::Result<()> {
    let ContrastsArg {
        input,
        policy,
        baseline,
        contrasts,
        format,
        require_contrasts,
    } = arg;

    if *policy == ContrastPolicy::Custom && contrasts.is_empty() {
        anyhow::bail!("the custom policy needs at least one --contrast expression");
    }
    if *policy != ContrastPolicy::Custom && !contrasts.is_empty() {
        log::warn!("--contrast is ignored by the {policy} policy");
    }

    let mut empty_inputs = vec![];
    for path in &input.events {
        let extraction = super::load_and_extract(path)?;
        let report = ContrastBuilder::new(*policy)
            .baseline(baseline.as_str())
            .table(&extraction.table)
            .custom_contrasts(contrasts.iter().map(String::as_str))
            .build()?;
        util::log_diagnostics(&report.diagnostics);
        if report.is_empty() {
            empty_inputs.push(path.display().to_string());
        }

        let mut output = Output::from_output_path(input.output_path(path, format.suffix())?)?;
        match format {
            ContrastFormat::Csv => output.write_records(
                b',',
                &contrast_file::CSV_HEADER,
                contrast_file::csv_records(&report.contrasts),
            )?,
            ContrastFormat::Text => {
                contrast_file::write_text(&mut output, &report.contrasts, report.policy)?;
                output.finish()?;
            }
            ContrastFormat::Json => output.write_json(ContrastFile::new(
                path.display().to_string(),
                baseline,
                &report,
            ))?,
        }
    }

    if *require_contrasts && !empty_inputs.is_empty() {
        anyhow::bail!(
            "no usable {policy} contrasts for: {}",
            empty_inputs.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;
    use crate::command::{CommandArgs, Mode};

    fn parse(args: &[&str]) -> ContrastsArg {
        let args = CommandArgs::try_parse_from(["narsad", "contrasts"].iter().chain(args)).unwrap();
        match args.mode {
            Mode::Contrasts(arg) => arg,
            mode => panic!("unexpected mode: {mode:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let arg = parse(&["events.csv"]);
        assert_eq!(arg.policy, ContrastPolicy::Curated);
        assert_eq!(arg.baseline, "FIXATION");
        assert_eq!(arg.format, ContrastFormat::Csv);
        assert!(arg.contrasts.is_empty());
        assert!(!arg.require_contrasts);
    }

    #[test]
    fn test_custom_options() {
        let arg = parse(&[
            "events.csv",
            "--policy",
            "custom",
            "--contrast",
            "CSS_others > CSR_others",
            "--contrast",
            "CS-_first",
            "--baseline",
            "REST",
            "--format",
            "json",
            "--require-contrasts",
        ]);
        assert_eq!(arg.policy, ContrastPolicy::Custom);
        assert_eq!(arg.contrasts, ["CSS_others > CSR_others", "CS-_first"]);
        assert_eq!(arg.baseline, "REST");
        assert_eq!(arg.format, ContrastFormat::Json);
        assert!(arg.require_contrasts);
    }

    #[test]
    fn test_policy_alias() {
        assert_eq!(parse(&["e.csv", "--policy", "interesting"]).policy, ContrastPolicy::Curated);
        assert!(
            CommandArgs::try_parse_from(["narsad", "contrasts", "e.csv", "--policy", "pairwise"])
                .is_err()
        );
    }

    #[test]
    fn test_format_suffix() {
        assert_eq!(ContrastFormat::Text.suffix(), "contrasts.txt");
        assert_eq!(ContrastFormat::Json.suffix(), "contrasts.json");
    }
}
