//! Condition families subject to first/others splitting
//!
//! Three families are recognized by label prefix. The `CS-` family explicitly
//! excludes labels starting with `CSS` or `CSR`, so no label can belong to two
//! families. Each family has its own predicate.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConditionFamily {
    #[serde(rename = "CS-")]
    CsMinus,
    #[serde(rename = "CSS")]
    Css,
    #[serde(rename = "CSR")]
    Csr,
}

impl ConditionFamily {
    /// All families, in the order extraction processes and reports them
    pub const ALL: [Self; 3] = [Self::CsMinus, Self::Css, Self::Csr];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CsMinus => "CS-",
            Self::Css => "CSS",
            Self::Csr => "CSR",
        }
    }

    #[must_use]
    pub fn matches(self, label: &str) -> bool {
        match self {
            Self::CsMinus => is_cs_minus(label),
            Self::Css => is_css(label),
            Self::Csr => is_csr(label),
        }
    }

    /// Returns the family a raw label belongs to, if any
    #[must_use]
    pub fn of(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.matches(label))
    }

    /// Derived label of the chronologically first trial, e.g. `CSS_first`
    #[must_use]
    pub fn first_label(self) -> String {
        format!("{}_first", self.name())
    }

    /// Derived label of every later trial, e.g. `CSS_others`
    #[must_use]
    pub fn others_label(self) -> String {
        format!("{}_others", self.name())
    }
}

impl fmt::Display for ConditionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[must_use]
pub fn is_cs_minus(label: &str) -> bool {
    label.starts_with("CS-") && !label.starts_with("CSS") && !label.starts_with("CSR")
}

#[must_use]
pub fn is_css(label: &str) -> bool {
    label.starts_with("CSS")
}

#[must_use]
pub fn is_csr(label: &str) -> bool {
    label.starts_with("CSR")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cs_minus_predicate() {
        assert!(is_cs_minus("CS-"));
        assert!(is_cs_minus("CS-1"));
        assert!(is_cs_minus("CS-_reinstated"));
        assert!(!is_cs_minus("CSS"));
        assert!(!is_cs_minus("CSR"));
        assert!(!is_cs_minus("CS+"));
        assert!(!is_cs_minus("cs-"));
        assert!(!is_cs_minus("US"));
    }

    #[test]
    fn test_css_and_csr_predicates() {
        assert!(is_css("CSS"));
        assert!(is_css("CSS1"));
        assert!(!is_css("CSR"));
        assert!(is_csr("CSR"));
        assert!(is_csr("CSR2"));
        assert!(!is_csr("CSS"));
    }

    #[test]
    fn test_families_are_disjoint() {
        for label in ["CS-", "CS-1", "CSS", "CSS-", "CSS1", "CSR", "CSR-", "CSR1", "US", "FIXATION"] {
            let matching = ConditionFamily::ALL
                .into_iter()
                .filter(|f| f.matches(label))
                .count();
            assert!(matching <= 1, "{label} matched {matching} families");
        }
    }

    #[test]
    fn test_of() {
        assert_eq!(ConditionFamily::of("CS-"), Some(ConditionFamily::CsMinus));
        assert_eq!(ConditionFamily::of("CSS1"), Some(ConditionFamily::Css));
        assert_eq!(ConditionFamily::of("CSR"), Some(ConditionFamily::Csr));
        assert_eq!(ConditionFamily::of("FIXATION"), None);
        assert_eq!(ConditionFamily::of("CS+"), None);
    }

    #[test]
    fn test_derived_labels() {
        assert_eq!(ConditionFamily::CsMinus.first_label(), "CS-_first");
        assert_eq!(ConditionFamily::Csr.others_label(), "CSR_others");
    }
}
