use std::io::{self, Write};

use chrono::{DateTime, Utc};
use narsad_conditions::contrast::{
    Contrast, ContrastPolicy, ContrastReport, ContrastSet, DroppedContrast,
};
use serde::Serialize;

/// JSON export of one contrast build
#[derive(Debug, Clone, Serialize)]
pub struct ContrastFile<'a> {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub policy: ContrastPolicy,
    pub baseline: &'a str,
    pub contrasts: &'a ContrastSet,
    pub dropped: &'a [DroppedContrast],
}

impl<'a> ContrastFile<'a> {
    pub fn new(source: String, baseline: &'a str, report: &'a ContrastReport) -> Self {
        Self {
            source,
            generated_at: Utc::now(),
            policy: report.policy,
            baseline,
            contrasts: &report.contrasts,
            dropped: &report.dropped,
        }
    }
}

pub const CSV_HEADER: [&str; 7] = [
    "contrast_id",
    "contrast_name",
    "contrast_type",
    "condition1",
    "condition2",
    "weight1",
    "weight2",
];

/// One CSV row per contrast, ids starting at 1
///
/// A single-condition contrast leaves `condition2` empty and `weight2` at 0.
pub fn csv_records(contrasts: &ContrastSet) -> impl Iterator<Item = [String; 7]> + '_ {
    contrasts.iter().enumerate().map(|(i, contrast)| {
        let condition = |n: usize| contrast.conditions.get(n).cloned().unwrap_or_default();
        let weight = |n: usize| format_weight(contrast.weights.get(n).copied().unwrap_or(0.0));
        [
            (i + 1).to_string(),
            contrast.name.clone(),
            contrast.kind.to_string(),
            condition(0),
            condition(1),
            weight(0),
            weight(1),
        ]
    })
}

/// Numbered, human-readable listing of the contrasts
pub fn write_text<W>(mut writer: W, contrasts: &ContrastSet, policy: ContrastPolicy) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "# Contrast file generated for NARSAD data")?;
    writeln!(writer, "# Format: (contrast_name, contrast_type, conditions, weights)")?;
    writeln!(writer, "# Policy: {policy}")?;
    writeln!(writer, "# Total contrasts: {}", contrasts.len())?;
    writeln!(writer)?;
    for (i, contrast) in contrasts.iter().enumerate() {
        write_text_entry(&mut writer, i + 1, contrast)?;
    }
    Ok(())
}

fn write_text_entry<W>(writer: &mut W, id: usize, contrast: &Contrast) -> io::Result<()>
where
    W: Write,
{
    let weights = contrast
        .weights
        .iter()
        .map(|w| format_weight(*w))
        .collect::<Vec<_>>();
    writeln!(writer, "{id:2}. {}", contrast.name)?;
    writeln!(writer, "    Type: {}", contrast.kind)?;
    writeln!(writer, "    Conditions: {:?}", contrast.conditions)?;
    writeln!(writer, "    Weights: [{}]", weights.join(", "))?;
    writeln!(writer)
}

/// Integral weights print without a fractional part (`1`, `-1`)
fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 && weight.abs() < 1e15 {
        format!("{weight:.0}")
    } else {
        weight.to_string()
    }
}
