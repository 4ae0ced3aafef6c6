//! Linear contrasts between derived conditions
//!
//! A [`ContrastBuilder`] turns the derived conditions of an
//! [`AugmentedTrialTable`] (or their trial counts, given directly as
//! [`ConditionCounts`]) into an ordered, name-unique [`ContrastSet`].
//!
//! # Policies
//!
//! | policy     | contrasts                                                        |
//! |------------|------------------------------------------------------------------|
//! | `minimal`  | `<c>>baseline`, weight `[1]`, for every condition `c`            |
//! | `standard` | `A>B` `[1, -1]` and `A<B` `[-1, 1]` for every pair, `n*(n-1)`     |
//! | `curated`  | the nine `_others` comparisons of [`curated_expressions`]        |
//! | `fixation` | `<c> > FIXATION` `[1, -1]` for every condition except the baseline |
//! | `custom`   | caller-supplied `"A > B"` expressions                            |
//!
//! # Validation
//!
//! Whatever the policy, a contrast is kept only if every condition it names
//! has at least one trial. Anything else is moved to
//! [`ContrastReport::dropped`] with the offending labels, and later contrasts
//! reusing an earlier name are dropped as duplicates. An empty result is not
//! an error; the report carries a warning instead.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{ValidationError, diagnostics::Diagnostics, extract::AugmentedTrialTable};

/// Reference condition of the curated and fixation policies
pub const DEFAULT_BASELINE: &str = "FIXATION";

const EXPRESSION_SEPARATOR: &str = " > ";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContrastKind {
    /// Simple linear (t) contrast
    #[default]
    T,
}

impl fmt::Display for ContrastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T => f.write_str("T"),
        }
    }
}

/// A named comparison with one signed weight per condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contrast {
    pub name: String,
    pub kind: ContrastKind,
    pub conditions: Vec<String>,
    pub weights: Vec<f64>,
}

impl Contrast {
    /// `<condition>>baseline` with weight `[1]`
    #[must_use]
    pub fn against_baseline(condition: &str) -> Self {
        Self {
            name: format!("{condition}>baseline"),
            kind: ContrastKind::T,
            conditions: vec![condition.to_owned()],
            weights: vec![1.0],
        }
    }

    /// `<a> > <b>` with weights `[1, -1]`
    #[must_use]
    pub fn greater_than(a: &str, b: &str) -> Self {
        Self {
            name: format!("{a}{EXPRESSION_SEPARATOR}{b}"),
            kind: ContrastKind::T,
            conditions: vec![a.to_owned(), b.to_owned()],
            weights: vec![1.0, -1.0],
        }
    }

    /// Parses `"A > B"`, or a lone condition meaning `A` against baseline
    ///
    /// Returns `None` for empty operands, more than one `>`, or a stray `<`.
    #[must_use]
    pub fn parse(expression: &str) -> Option<Self> {
        let expression = expression.trim();
        if expression.is_empty() || expression.contains('<') {
            return None;
        }
        match expression.split_once(EXPRESSION_SEPARATOR) {
            Some((a, b)) => {
                let (a, b) = (a.trim(), b.trim());
                if a.is_empty() || b.is_empty() || a.contains('>') || b.contains('>') {
                    return None;
                }
                Some(Self::greater_than(a, b))
            }
            None if !expression.contains('>') => Some(Self::against_baseline(expression)),
            None => None,
        }
    }
}

impl fmt::Display for Contrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?}, {:?}, {:?}, {:?})",
            self.name,
            self.kind.to_string(),
            self.conditions,
            self.weights
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastPolicy {
    Minimal,
    #[default]
    Standard,
    /// Fixed list of nine `_others` comparisons, also known as "interesting"
    Curated,
    Fixation,
    Custom,
}

impl ContrastPolicy {
    pub const ALL: [Self; 5] = [
        Self::Minimal,
        Self::Standard,
        Self::Curated,
        Self::Fixation,
        Self::Custom,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Curated => "curated",
            Self::Fixation => "fixation",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ContrastPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown contrast policy '{name}' (expected minimal, standard, curated, fixation or custom)")]
pub struct UnknownPolicyError {
    #[error(not(source))]
    pub name: String,
}

impl FromStr for ContrastPolicy {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("interesting") {
            return Ok(Self::Curated);
        }
        Self::ALL
            .into_iter()
            .find(|policy| s.eq_ignore_ascii_case(policy.name()))
            .ok_or_else(|| UnknownPolicyError { name: s.to_owned() })
    }
}

/// The curated contrast expressions, with `baseline` as the reference label
///
/// With the default baseline these are, in order:
///
/// ```text
/// CS-_others > FIXATION
/// CSS_others > FIXATION
/// CSR_others > FIXATION
/// CSS_others > CSR_others
/// CSR_others > CSS_others
/// CSS_others > CS-_others
/// CSR_others > CS-_others
/// CS-_others > CSS_others
/// CS-_others > CSR_others
/// ```
#[must_use]
pub fn curated_expressions(baseline: &str) -> [String; 9] {
    const CS: &str = "CS-_others";
    const CSS: &str = "CSS_others";
    const CSR: &str = "CSR_others";
    [
        (CS, baseline),
        (CSS, baseline),
        (CSR, baseline),
        (CSS, CSR),
        (CSR, CSS),
        (CSS, CS),
        (CSR, CS),
        (CS, CSS),
        (CS, CSR),
    ]
    .map(|(a, b)| format!("{a}{EXPRESSION_SEPARATOR}{b}"))
}

/// Trial count per derived condition, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionCounts {
    counts: Vec<(String, usize)>,
}

impl ConditionCounts {
    /// Counts occurrences of each label
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        labels.into_iter().map(|label| (label, 1)).collect()
    }

    /// Trial count of `label`, zero if it never occurs
    #[must_use]
    pub fn get(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, n)| *n)
    }

    #[must_use]
    pub fn is_populated(&self, label: &str) -> bool {
        self.get(label) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(l, n)| (l.as_str(), *n))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.counts.iter().map(|(l, _)| l.as_str())
    }

    /// Number of distinct labels, including labels with zero trials
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn add(&mut self, label: &str, n: usize) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += n,
            None => self.counts.push((label.to_owned(), n)),
        }
    }
}

impl<S> FromIterator<(S, usize)> for ConditionCounts
where
    S: AsRef<str>,
{
    /// Repeated labels are merged by adding their counts
    fn from_iter<T: IntoIterator<Item = (S, usize)>>(iter: T) -> Self {
        let mut counts = Self::default();
        for (label, n) in iter {
            counts.add(label.as_ref(), n);
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum DropReason {
    /// Referenced conditions that are absent or have no trials
    MissingConditions(Vec<String>),
    DuplicateName,
    InvalidExpression,
}

/// A contrast that was requested but left out of the set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedContrast {
    pub name: String,
    pub reason: DropReason,
}

impl fmt::Display for DroppedContrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DropReason::MissingConditions(labels) => write!(
                f,
                "Contrast {}: conditions [{}] missing or have no trials",
                self.name,
                labels.join(", ")
            ),
            DropReason::DuplicateName => {
                write!(f, "Contrast {}: duplicate contrast name", self.name)
            }
            DropReason::InvalidExpression => {
                write!(f, "Invalid contrast format: {:?}", self.name)
            }
        }
    }
}

/// Ordered contrasts, unique by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContrastSet {
    contrasts: Vec<Contrast>,
}

impl ContrastSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.contrasts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contrasts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contrast> {
        self.contrasts.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contrast> {
        self.contrasts.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contrasts.iter().map(|c| c.name.as_str())
    }
}

impl<'a> IntoIterator for &'a ContrastSet {
    type Item = &'a Contrast;
    type IntoIter = std::slice::Iter<'a, Contrast>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Output of [`ContrastBuilder::build`]
#[derive(Debug, Clone, Serialize)]
pub struct ContrastReport {
    pub policy: ContrastPolicy,
    pub contrasts: ContrastSet,
    pub dropped: Vec<DroppedContrast>,
    pub diagnostics: Diagnostics,
}

impl ContrastReport {
    /// `true` if no contrast survived validation; callers should surface this
    /// as a configuration problem
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contrasts.is_empty()
    }
}

/// Generates contrasts under a policy
///
/// One of [`ContrastBuilder::table`] or [`ContrastBuilder::counts`] must be
/// supplied; when both are, explicit counts win.
#[derive(Debug, Clone)]
pub struct ContrastBuilder<'a> {
    policy: ContrastPolicy,
    baseline: String,
    table: Option<&'a AugmentedTrialTable>,
    counts: Option<ConditionCounts>,
    custom: Vec<String>,
}

impl<'a> ContrastBuilder<'a> {
    #[must_use]
    pub fn new(policy: ContrastPolicy) -> Self {
        Self {
            policy,
            baseline: DEFAULT_BASELINE.to_owned(),
            table: None,
            counts: None,
            custom: vec![],
        }
    }

    /// Reference label; surrounding whitespace is ignored
    #[must_use]
    pub fn baseline(mut self, baseline: impl Into<String>) -> Self {
        self.baseline = baseline.into().trim().to_owned();
        self
    }

    #[must_use]
    pub fn table(mut self, table: &'a AugmentedTrialTable) -> Self {
        self.table = Some(table);
        self
    }

    #[must_use]
    pub fn counts(mut self, counts: ConditionCounts) -> Self {
        self.counts = Some(counts);
        self
    }

    /// Expressions used by [`ContrastPolicy::Custom`]; ignored otherwise
    #[must_use]
    pub fn custom_contrasts<I, S>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom = expressions.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(&self) -> Result<ContrastReport, ValidationError> {
        let counts = match (&self.counts, self.table) {
            (Some(counts), _) => counts.clone(),
            (None, Some(table)) => table.condition_counts(),
            (None, None) => {
                return Err(ValidationError::MissingInput {
                    name: "augmented trial table",
                });
            }
        };

        let mut diagnostics = Diagnostics::new();
        for (label, n) in counts.iter() {
            diagnostics.info(format!("Condition '{label}': {n} trials"));
        }

        let mut contrasts = ContrastSet::default();
        let mut dropped = vec![];
        for candidate in self.candidates(&counts) {
            let contrast = match candidate {
                Ok(contrast) => contrast,
                Err(expression) => {
                    dropped.push(DroppedContrast {
                        name: expression,
                        reason: DropReason::InvalidExpression,
                    });
                    continue;
                }
            };

            let mut missing: Vec<String> = vec![];
            for condition in &contrast.conditions {
                if !counts.is_populated(condition) && !missing.contains(condition) {
                    missing.push(condition.clone());
                }
            }
            let reason = match (missing.is_empty(), contrasts.contains(&contrast.name)) {
                (false, _) => DropReason::MissingConditions(missing),
                (true, true) => DropReason::DuplicateName,
                (true, false) => {
                    diagnostics.info(format!("Added contrast: {}", contrast.name));
                    contrasts.contrasts.push(contrast);
                    continue;
                }
            };
            dropped.push(DroppedContrast {
                name: contrast.name,
                reason,
            });
        }

        for drop in &dropped {
            diagnostics.warn(drop.to_string());
        }
        diagnostics.info(format!(
            "Created {} {} contrasts",
            contrasts.len(),
            self.policy
        ));
        if contrasts.is_empty() {
            diagnostics.warn(format!(
                "No usable contrasts generated; check condition labels against the {} contrast list",
                self.policy
            ));
        }

        Ok(ContrastReport {
            policy: self.policy,
            contrasts,
            dropped,
            diagnostics,
        })
    }

    /// Requested contrasts in policy order, before validation
    ///
    /// Unparseable custom expressions are returned as `Err(expression)`.
    fn candidates(&self, counts: &ConditionCounts) -> Vec<Result<Contrast, String>> {
        let labels = counts.labels().collect::<Vec<_>>();
        match self.policy {
            ContrastPolicy::Minimal => labels
                .iter()
                .map(|label| Ok(Contrast::against_baseline(label)))
                .collect(),
            ContrastPolicy::Standard => {
                let mut candidates = vec![];
                for (i, a) in labels.iter().enumerate() {
                    for b in &labels[i + 1..] {
                        candidates.push(Ok(Contrast {
                            name: format!("{a}>{b}"),
                            kind: ContrastKind::T,
                            conditions: vec![(*a).to_owned(), (*b).to_owned()],
                            weights: vec![1.0, -1.0],
                        }));
                        candidates.push(Ok(Contrast {
                            name: format!("{a}<{b}"),
                            kind: ContrastKind::T,
                            conditions: vec![(*a).to_owned(), (*b).to_owned()],
                            weights: vec![-1.0, 1.0],
                        }));
                    }
                }
                candidates
            }
            ContrastPolicy::Curated => curated_expressions(&self.baseline)
                .iter()
                .map(|expr| parse_candidate(expr))
                .collect(),
            ContrastPolicy::Fixation => labels
                .iter()
                .filter(|label| **label != self.baseline)
                .map(|label| Ok(Contrast::greater_than(label, &self.baseline)))
                .collect(),
            ContrastPolicy::Custom => self.custom.iter().map(|expr| parse_candidate(expr)).collect(),
        }
    }
}

fn parse_candidate(expression: &str) -> Result<Contrast, String> {
    Contrast::parse(expression).ok_or_else(|| expression.to_owned())
}
