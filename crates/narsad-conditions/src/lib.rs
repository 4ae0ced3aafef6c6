//! Condition extraction and contrast generation for first-level fMRI models
//!
//! This crate turns a subject's behavioral trial-event table from the NARSAD
//! conditioning task into the inputs a first-level statistical model needs:
//! a derived condition label for every trial, and an ordered set of named
//! linear contrasts between those labels.
//!
//! # Overview
//!
//! Data flows one way:
//!
//! 1. **Validate** ([`trial::TrialTable`]): build a typed trial table from a
//!    loaded events table ([`trial::RawTable`]) or from typed trials.
//! 2. **Extract** ([`extract::ConditionExtractor`]): split the CS-, CSS and
//!    CSR families into `<family>_first` and `<family>_others` by onset,
//!    leaving every other trial type unchanged.
//! 3. **Build contrasts** ([`contrast::ContrastBuilder`]): generate contrasts
//!    under a [`contrast::ContrastPolicy`], dropping any contrast that names a
//!    condition without trials.
//!
//! Extraction and contrast generation are pure. Instead of logging, each
//! returns its [`diagnostics::Diagnostics`] alongside the primary output.
//!
//! # Examples
//!
//! ```
//! use narsad_conditions::{
//!     contrast::{ContrastBuilder, ContrastPolicy},
//!     extract::ConditionExtractor,
//!     trial::{Trial, TrialTable},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let table = TrialTable::new(vec![
//!     Trial::new("FIXATION", 0.0),
//!     Trial::new("CS-", 5.0),
//!     Trial::new("CSS", 10.0),
//!     Trial::new("CS-", 15.0),
//!     Trial::new("CSS", 20.0),
//! ])?;
//!
//! let extraction = ConditionExtractor::new().extract(&table);
//! assert_eq!(extraction.table.conditions()[1], "CS-_first");
//! assert_eq!(extraction.table.conditions()[3], "CS-_others");
//!
//! let report = ContrastBuilder::new(ContrastPolicy::Curated)
//!     .table(&extraction.table)
//!     .build()?;
//! let names: Vec<_> = report.contrasts.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(
//!     names,
//!     ["CS-_others > FIXATION", "CSS_others > FIXATION", "CSS_others > CS-_others", "CS-_others > CSS_others"]
//! );
//! # Ok(())
//! # }
//! ```

pub mod contrast;
pub mod diagnostics;
pub mod extract;
pub mod family;
pub mod trial;

/// Malformed or absent input detected at the boundary of the core
///
/// These errors are raised immediately and never retried. A contrast that is
/// dropped for lack of trials is *not* an error; see
/// [`contrast::DroppedContrast`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    #[display("row {row}, column '{column}': expected a number, found '{value}'")]
    WrongType {
        row: usize,
        column: String,
        value: String,
    },
    #[display("row {row} has {found} cells but the header has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("trial table cannot be empty")]
    EmptyInput,
    #[display("trial table missing required columns: {}", columns.join(", "))]
    MissingColumns {
        #[error(not(source))]
        columns: Vec<String>,
    },
    #[display("row {row}, column '{column}': {value} is not a finite non-negative number")]
    InvalidValue {
        row: usize,
        column: String,
        value: f64,
    },
    #[display("required input '{name}' was not supplied")]
    MissingInput {
        #[error(not(source))]
        name: &'static str,
    },
}

impl ValidationError {
    /// Short kebab-case identifier of the error kind
    ///
    /// A ragged row is reported as `wrong-type`: the row is not the tabular
    /// shape the header promises.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WrongType { .. } | Self::RaggedRow { .. } => "wrong-type",
            Self::EmptyInput => "empty-input",
            Self::MissingColumns { .. } => "missing-columns",
            Self::InvalidValue { .. } => "invalid-value",
            Self::MissingInput { .. } => "missing-input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(ValidationError::EmptyInput.kind(), "empty-input");
        assert_eq!(
            ValidationError::MissingColumns {
                columns: vec!["onset".to_owned()]
            }
            .kind(),
            "missing-columns"
        );
        assert_eq!(
            ValidationError::RaggedRow {
                row: 0,
                expected: 3,
                found: 2
            }
            .kind(),
            "wrong-type"
        );
        assert_eq!(
            ValidationError::MissingInput { name: "table" }.kind(),
            "missing-input"
        );
    }

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = ValidationError::MissingColumns {
            columns: vec!["trial_type".to_owned(), "onset".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "trial table missing required columns: trial_type, onset"
        );
    }
}
