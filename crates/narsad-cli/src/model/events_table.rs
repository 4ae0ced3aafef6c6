use narsad_conditions::{
    extract::{AugmentedTrialTable, Extraction, FamilySummary},
    trial::{DURATION_COLUMN, LABEL_COLUMN, ONSET_COLUMN, RawTable, Trial},
};
use serde::Serialize;

const CONDITIONS_COLUMN: &str = "conditions";
const MISSING_VALUE: &str = "n/a";

pub const PROCESSED_EVENTS_HEADER: [&str; 3] = [ONSET_COLUMN, DURATION_COLUMN, LABEL_COLUMN];

/// Events file columns, as read, followed by `conditions`
pub fn augmented_header(raw: &RawTable) -> Vec<&str> {
    raw.columns
        .iter()
        .map(String::as_str)
        .chain([CONDITIONS_COLUMN])
        .collect()
}

/// Events file rows, cells unchanged, each followed by its derived condition
///
/// `table` must have been built from `raw`, so rows line up one to one.
pub fn augmented_records<'a>(
    raw: &'a RawTable,
    table: &'a AugmentedTrialTable,
) -> impl Iterator<Item = Vec<String>> + 'a {
    raw.rows
        .iter()
        .zip(table.conditions())
        .map(|(cells, condition)| {
            cells
                .iter()
                .chain([condition])
                .cloned()
                .collect::<Vec<_>>()
        })
}

/// `onset, duration, trial_type` rows with the derived condition as trial type
pub fn processed_event_records(
    table: &AugmentedTrialTable,
) -> impl Iterator<Item = [String; 3]> + '_ {
    table.rows().map(|(trial, condition)| {
        [
            format_seconds(trial.onset),
            format_duration(trial),
            condition.to_owned(),
        ]
    })
}

fn format_seconds(seconds: f64) -> String {
    seconds.to_string()
}

fn format_duration(trial: &Trial) -> String {
    trial
        .duration
        .map_or_else(|| MISSING_VALUE.to_owned(), format_seconds)
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionCount {
    pub condition: String,
    pub trials: usize,
}

/// JSON summary of one extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary<'a> {
    pub source: String,
    pub trials: usize,
    pub families: &'a [FamilySummary],
    pub other_conditions: &'a [String],
    pub conditions: Vec<ConditionCount>,
}

impl<'a> ExtractionSummary<'a> {
    pub fn new(source: String, extraction: &'a Extraction) -> Self {
        Self {
            source,
            trials: extraction.table.len(),
            families: &extraction.summaries,
            other_conditions: &extraction.other_conditions,
            conditions: extraction
                .table
                .condition_counts()
                .iter()
                .map(|(condition, trials)| ConditionCount {
                    condition: condition.to_owned(),
                    trials,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use narsad_conditions::extract::ConditionExtractor;

    use super::*;

    fn raw_table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            columns.iter().map(|c| (*c).to_owned()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
                .collect(),
        )
    }

    fn extraction() -> Extraction {
        let raw = RawTable::new(
            ["onset", "duration", "trial_type", "response"]
                .map(str::to_owned)
                .to_vec(),
            [
                ["0", "2", "FIXATION", "none"],
                ["5.5", "4", "CSS", "left"],
                ["12", "n/a", "CSS", "right"],
                ["3", "4", "CS-", "none"],
            ]
            .map(|row| row.map(str::to_owned).to_vec())
            .to_vec(),
        );
        ConditionExtractor::new().extract_raw(&raw).unwrap()
    }

    #[test]
    fn test_augmented_table_keeps_columns_and_cells_as_read() {
        let raw = raw_table(
            &["onset", "trial_type", "response"],
            &[&["5.50", "CS-", "left"], &["1.0", "FIXATION", "none"]],
        );
        let extraction = ConditionExtractor::new().extract_raw(&raw).unwrap();

        assert_eq!(
            augmented_header(&raw),
            ["onset", "trial_type", "response", "conditions"]
        );
        let records = augmented_records(&raw, &extraction.table).collect::<Vec<_>>();
        assert_eq!(
            records,
            [
                ["5.50", "CS-", "left", "CS-_first"],
                ["1.0", "FIXATION", "none", "FIXATION"],
            ]
        );
    }

    #[test]
    fn test_augmented_records_with_duration_column() {
        let raw = raw_table(
            &["onset", "duration", "trial_type"],
            &[&["12", "n/a", "CSS"], &["5.5", "4", "CSS"]],
        );
        let extraction = ConditionExtractor::new().extract_raw(&raw).unwrap();
        let records = augmented_records(&raw, &extraction.table).collect::<Vec<_>>();
        assert_eq!(records[0], ["12", "n/a", "CSS", "CSS_others"]);
        assert_eq!(records[1], ["5.5", "4", "CSS", "CSS_first"]);
    }

    #[test]
    fn test_processed_event_records() {
        let extraction = extraction();
        let records = processed_event_records(&extraction.table).collect::<Vec<_>>();
        assert_eq!(
            records,
            [
                ["0", "2", "FIXATION"],
                ["5.5", "4", "CSS_first"],
                ["12", "n/a", "CSS_others"],
                ["3", "4", "CS-_first"],
            ]
        );
    }

    #[test]
    fn test_extraction_summary_json() {
        let extraction = extraction();
        let summary = ExtractionSummary::new("events.tsv".to_owned(), &extraction);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["trials"], 4);
        assert_eq!(json["families"][1]["family"], "CSS");
        assert_eq!(json["families"][1]["first_index"], 1);
        assert_eq!(json["families"][1]["other_indices"], serde_json::json!([2]));
        assert_eq!(json["families"][2]["first"], serde_json::Value::Null);
        assert_eq!(json["other_conditions"], serde_json::json!(["FIXATION"]));
        assert_eq!(
            json["conditions"],
            serde_json::json!([
                {"condition": "FIXATION", "trials": 1},
                {"condition": "CSS_first", "trials": 1},
                {"condition": "CSS_others", "trials": 1},
                {"condition": "CS-_first", "trials": 1},
            ])
        );
    }
}
