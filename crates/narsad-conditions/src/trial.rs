//! Trial records and boundary validation
//!
//! Events files arrive as loosely-shaped tables: named columns and string
//! cells. [`TrialTable::from_raw`] is the single place that shape is checked
//! and converted into typed [`Trial`] records. Everything downstream works on
//! the typed table and never re-validates.
//!
//! # Required Columns
//!
//! | column       | type             | notes                                  |
//! |--------------|------------------|----------------------------------------|
//! | `trial_type` | string           | `label` accepted as an alias           |
//! | `onset`      | number (seconds) | finite, non-negative                   |
//! | `duration`   | number (seconds) | optional; `n/a` or empty means unknown |
//!
//! Any further columns are kept verbatim, in order, so outputs can echo them.

use serde::Serialize;

use crate::ValidationError;

pub const LABEL_COLUMN: &str = "trial_type";
pub const LABEL_COLUMN_ALIAS: &str = "label";
pub const ONSET_COLUMN: &str = "onset";
pub const DURATION_COLUMN: &str = "duration";

/// One timed behavioral event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    /// Raw condition identifier, e.g. `CS-`, `CSS1`, `FIXATION`
    pub label: String,
    /// Start time in seconds
    pub onset: f64,
    /// Event length in seconds, if the events file recorded one
    pub duration: Option<f64>,
    /// Values of the table's extra columns, aligned with
    /// [`TrialTable::extra_columns`]
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl Trial {
    #[must_use]
    pub fn new(label: impl Into<String>, onset: f64) -> Self {
        Self {
            label: label.into(),
            onset,
            duration: None,
            extra: vec![],
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Column names plus string cells, as read from a delimited events file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

/// Validated, ordered trials of one subject/run
///
/// Never empty, and every onset and duration is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialTable {
    extra_columns: Vec<String>,
    trials: Vec<Trial>,
}

impl TrialTable {
    /// Builds a table from typed trials without extra columns
    pub fn new(trials: Vec<Trial>) -> Result<Self, ValidationError> {
        Self::with_extra_columns(vec![], trials)
    }

    /// Builds a table from typed trials whose `extra` values line up with
    /// `extra_columns`
    pub fn with_extra_columns(
        extra_columns: Vec<String>,
        trials: Vec<Trial>,
    ) -> Result<Self, ValidationError> {
        if trials.is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        for (row, trial) in trials.iter().enumerate() {
            check_time(row, ONSET_COLUMN, trial.onset)?;
            if let Some(duration) = trial.duration {
                check_time(row, DURATION_COLUMN, duration)?;
            }
            if trial.extra.len() != extra_columns.len() {
                return Err(ValidationError::RaggedRow {
                    row,
                    expected: extra_columns.len(),
                    found: trial.extra.len(),
                });
            }
        }
        Ok(Self {
            extra_columns,
            trials,
        })
    }

    /// Validates a loaded events table and converts it into typed trials
    ///
    /// Checks run in this order: empty table, missing required columns, row
    /// width, cell types, value ranges. The first failure is returned.
    pub fn from_raw(raw: &RawTable) -> Result<Self, ValidationError> {
        if raw.rows.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let label_idx = raw
            .column_index(LABEL_COLUMN)
            .or_else(|| raw.column_index(LABEL_COLUMN_ALIAS));
        let onset_idx = raw.column_index(ONSET_COLUMN);
        let (Some(label_idx), Some(onset_idx)) = (label_idx, onset_idx) else {
            let mut columns = vec![];
            if label_idx.is_none() {
                columns.push(LABEL_COLUMN.to_owned());
            }
            if onset_idx.is_none() {
                columns.push(ONSET_COLUMN.to_owned());
            }
            return Err(ValidationError::MissingColumns { columns });
        };
        let duration_idx = raw.column_index(DURATION_COLUMN);

        let extra_indices = (0..raw.columns.len())
            .filter(|&i| i != label_idx && i != onset_idx && Some(i) != duration_idx)
            .collect::<Vec<_>>();
        let extra_columns = extra_indices
            .iter()
            .map(|&i| raw.columns[i].trim().to_owned())
            .collect();

        let trials = raw
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                if cells.len() != raw.columns.len() {
                    return Err(ValidationError::RaggedRow {
                        row,
                        expected: raw.columns.len(),
                        found: cells.len(),
                    });
                }
                let onset = parse_number(row, ONSET_COLUMN, &cells[onset_idx])?;
                let duration = duration_idx
                    .map(|i| parse_optional_number(row, DURATION_COLUMN, &cells[i]))
                    .transpose()?
                    .flatten();
                Ok(Trial {
                    label: cells[label_idx].trim().to_owned(),
                    onset,
                    duration,
                    extra: extra_indices
                        .iter()
                        .map(|&i| cells[i].trim().to_owned())
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_extra_columns(extra_columns, trials)
    }

    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    #[must_use]
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }
}

impl<'a> IntoIterator for &'a TrialTable {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn check_time(row: usize, column: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            row,
            column: column.to_owned(),
            value,
        })
    }
}

fn parse_number(row: usize, column: &str, cell: &str) -> Result<f64, ValidationError> {
    cell.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::WrongType {
            row,
            column: column.to_owned(),
            value: cell.to_owned(),
        })
}

fn parse_optional_number(
    row: usize,
    column: &str,
    cell: &str,
) -> Result<Option<f64>, ValidationError> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }
    parse_number(row, column, cell).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            columns.iter().map(|c| (*c).to_owned()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_from_raw_basic() {
        let table = TrialTable::from_raw(&raw(
            &["onset", "duration", "trial_type"],
            &[&["0", "2.5", "FIXATION"], &["5.0", "4", "CS-"]],
        ))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.trials()[0], Trial::new("FIXATION", 0.0).with_duration(2.5));
        assert_eq!(table.trials()[1].label, "CS-");
        assert_eq!(table.trials()[1].onset, 5.0);
        assert!(table.extra_columns().is_empty());
    }

    #[test]
    fn test_from_raw_accepts_label_alias_and_missing_duration() {
        let table =
            TrialTable::from_raw(&raw(&["label", "onset"], &[&["CSS", "10"]])).unwrap();
        assert_eq!(table.trials()[0], Trial::new("CSS", 10.0));
    }

    #[test]
    fn test_from_raw_keeps_extra_columns_in_order() {
        let table = TrialTable::from_raw(&raw(
            &["subject", "onset", "trial_type", "response"],
            &[&["N101", "1", "US", "left"]],
        ))
        .unwrap();
        assert_eq!(table.extra_columns(), ["subject", "response"]);
        assert_eq!(table.trials()[0].extra, ["N101", "left"]);
    }

    #[test]
    fn test_from_raw_na_duration() {
        let table = TrialTable::from_raw(&raw(
            &["trial_type", "onset", "duration"],
            &[&["CS-", "1", "n/a"], &["CS-", "2", ""]],
        ))
        .unwrap();
        assert!(table.iter().all(|t| t.duration.is_none()));
    }

    #[test]
    fn test_from_raw_empty() {
        let err = TrialTable::from_raw(&raw(&["trial_type", "onset"], &[])).unwrap_err();
        assert_eq!(err, ValidationError::EmptyInput);
        assert_eq!(err.kind(), "empty-input");
    }

    #[test]
    fn test_from_raw_missing_columns() {
        let err = TrialTable::from_raw(&raw(&["condition", "time"], &[&["CS-", "1"]]))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns {
                columns: vec!["trial_type".to_owned(), "onset".to_owned()]
            }
        );

        let err =
            TrialTable::from_raw(&raw(&["trial_type", "duration"], &[&["CS-", "1"]])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns {
                columns: vec!["onset".to_owned()]
            }
        );
    }

    #[test]
    fn test_from_raw_wrong_type() {
        let err = TrialTable::from_raw(&raw(
            &["trial_type", "onset"],
            &[&["CS-", "1"], &["CSS", "soon"]],
        ))
        .unwrap_err();
        assert_eq!(err.kind(), "wrong-type");
        assert!(matches!(err, ValidationError::WrongType { row: 1, .. }));
    }

    #[test]
    fn test_from_raw_ragged_row() {
        let err = TrialTable::from_raw(&raw(&["trial_type", "onset"], &[&["CS-"]])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RaggedRow {
                row: 0,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_negative_onset_is_invalid() {
        let err = TrialTable::new(vec![Trial::new("CS-", -1.0)]).unwrap_err();
        assert_eq!(err.kind(), "invalid-value");

        let err = TrialTable::new(vec![Trial::new("CS-", f64::NAN)]).unwrap_err();
        assert_eq!(err.kind(), "invalid-value");
    }

    #[test]
    fn test_new_empty() {
        assert_eq!(TrialTable::new(vec![]), Err(ValidationError::EmptyInput));
    }
}
