//! First-versus-others condition extraction
//!
//! For each [`ConditionFamily`] with at least one trial, the trial with the
//! smallest onset becomes `<family>_first` and every other trial of the family
//! becomes `<family>_others`. Trials outside the three families keep their raw
//! label.
//!
//! # Tie-break
//!
//! When several trials of a family share the minimal onset, the one appearing
//! earliest in the input table is `_first`.
//!
//! # Raw labels only
//!
//! Extraction must run on raw trial types. Derived labels such as `CS-_first`
//! still match the `CS-` prefix, so feeding an augmented table back in would
//! regroup them. Raw labels that already look derived produce a warning.
//!
//! # Examples
//!
//! ```
//! use narsad_conditions::{
//!     extract::ConditionExtractor,
//!     family::ConditionFamily,
//!     trial::{Trial, TrialTable},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let table = TrialTable::new(vec![
//!     Trial::new("CSR", 18.0),
//!     Trial::new("CSR", 8.0),
//!     Trial::new("US", 30.0),
//! ])?;
//! let extraction = ConditionExtractor::new().extract(&table);
//!
//! assert_eq!(extraction.table.conditions(), ["CSR_others", "CSR_first", "US"]);
//! let csr = extraction.summary(ConditionFamily::Csr);
//! assert_eq!(csr.first.as_deref(), Some("CSR_first"));
//! assert_eq!(csr.first_index, Some(1));
//! assert_eq!(extraction.other_conditions, ["US"]);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;

use serde::Serialize;

use crate::{
    ValidationError,
    contrast::ConditionCounts,
    diagnostics::Diagnostics,
    family::ConditionFamily,
    trial::{RawTable, Trial, TrialTable},
};

const DERIVED_SUFFIXES: [&str; 2] = ["_first", "_others"];

/// A trial table with one derived condition label per trial
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedTrialTable {
    table: TrialTable,
    conditions: Vec<String>,
}

impl AugmentedTrialTable {
    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        self.table.trials()
    }

    /// Derived condition label of each trial, aligned with [`Self::trials`]
    #[must_use]
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    #[must_use]
    pub fn extra_columns(&self) -> &[String] {
        self.table.extra_columns()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Iterates over `(trial, derived condition)` pairs in table order
    pub fn rows(&self) -> impl Iterator<Item = (&Trial, &str)> {
        self.table
            .iter()
            .zip(self.conditions.iter().map(String::as_str))
    }

    /// Distinct derived conditions in order of first appearance
    #[must_use]
    pub fn unique_conditions(&self) -> Vec<&str> {
        unique(self.conditions.iter().map(String::as_str))
    }

    #[must_use]
    pub fn condition_counts(&self) -> ConditionCounts {
        ConditionCounts::from_labels(self.conditions.iter().map(String::as_str))
    }
}

/// Which rows of a family were labelled first and others
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub family: ConditionFamily,
    /// `<family>_first`, or `None` if the family has no trials
    pub first: Option<String>,
    /// `[<family>_others]` if the family has two or more trials, else empty
    pub others: Vec<String>,
    /// Table row of the `_first` trial
    pub first_index: Option<usize>,
    /// Table rows of the `_others` trials, in table order
    pub other_indices: Vec<usize>,
}

impl FamilySummary {
    fn empty(family: ConditionFamily) -> Self {
        Self {
            family,
            first: None,
            others: vec![],
            first_index: None,
            other_indices: vec![],
        }
    }

    #[must_use]
    pub fn trial_count(&self) -> usize {
        usize::from(self.first_index.is_some()) + self.other_indices.len()
    }
}

/// Output of [`ConditionExtractor::extract`]
#[derive(Debug, Clone)]
pub struct Extraction {
    pub table: AugmentedTrialTable,
    /// One summary per family, in [`ConditionFamily::ALL`] order
    pub summaries: [FamilySummary; 3],
    /// Raw labels outside every family, deduplicated, in order of appearance
    pub other_conditions: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl Extraction {
    #[must_use]
    pub fn summary(&self, family: ConditionFamily) -> &FamilySummary {
        let index = ConditionFamily::ALL
            .iter()
            .position(|f| *f == family)
            .unwrap_or_default();
        &self.summaries[index]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionExtractor;

impl ConditionExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validates a loaded events table, then extracts conditions from it
    pub fn extract_raw(&self, raw: &RawTable) -> Result<Extraction, ValidationError> {
        let table = TrialTable::from_raw(raw)?;
        Ok(self.extract(&table))
    }

    /// Derives a condition label for every trial of `table`
    ///
    /// The input is left untouched; the augmented table owns a copy.
    #[must_use]
    pub fn extract(&self, table: &TrialTable) -> Extraction {
        let trials = table.trials();
        let mut diagnostics = Diagnostics::new();
        diagnostics.info(format!("Using trial table with {} trials", trials.len()));

        let already_derived = unique(
            trials
                .iter()
                .map(|t| t.label.as_str())
                .filter(|label| DERIVED_SUFFIXES.iter().any(|s| label.ends_with(s))),
        );
        if !already_derived.is_empty() {
            diagnostics.warn(format!(
                "Raw labels look already derived: {}; extraction expects raw trial types",
                already_derived.join(", ")
            ));
        }

        let mut conditions = trials.iter().map(|t| t.label.clone()).collect::<Vec<_>>();
        let summaries = ConditionFamily::ALL.map(|family| {
            let summary = split_family(trials, family);
            match summary.first_index {
                Some(first_index) => {
                    conditions[first_index] = family.first_label();
                    for &i in &summary.other_indices {
                        conditions[i] = family.others_label();
                    }
                    diagnostics.info(format!(
                        "{family} conditions: first trial at row {first_index} (onset {}s), {} others",
                        trials[first_index].onset,
                        summary.other_indices.len()
                    ));
                }
                None => diagnostics.info(format!("{family} conditions: no matching trials")),
            }
            summary
        });

        let other_conditions = unique(
            trials
                .iter()
                .map(|t| t.label.as_str())
                .filter(|label| ConditionFamily::of(label).is_none()),
        )
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();

        let table = AugmentedTrialTable {
            table: table.clone(),
            conditions,
        };
        diagnostics.info(format!(
            "Unique conditions for contrast generation: {}",
            table.unique_conditions().join(", ")
        ));
        diagnostics.info(format!("Other conditions: {}", other_conditions.join(", ")));

        Extraction {
            table,
            summaries,
            other_conditions,
            diagnostics,
        }
    }
}

/// Convenience wrapper around [`ConditionExtractor::extract`]
#[must_use]
pub fn extract(table: &TrialTable) -> Extraction {
    ConditionExtractor::new().extract(table)
}

fn split_family(trials: &[Trial], family: ConditionFamily) -> FamilySummary {
    let members = trials
        .iter()
        .enumerate()
        .filter(|(_, t)| family.matches(&t.label))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    // `min_by` keeps the earliest of equal elements, which is the tie-break.
    let Some(first_index) = members.iter().copied().min_by(|&a, &b| {
        trials[a]
            .onset
            .partial_cmp(&trials[b].onset)
            .unwrap_or(Ordering::Equal)
    }) else {
        return FamilySummary::empty(family);
    };

    let other_indices = members
        .into_iter()
        .filter(|&i| i != first_index)
        .collect::<Vec<_>>();
    FamilySummary {
        family,
        first: Some(family.first_label()),
        others: if other_indices.is_empty() {
            vec![]
        } else {
            vec![family.others_label()]
        },
        first_index: Some(first_index),
        other_indices,
    }
}

fn unique<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = vec![];
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}
