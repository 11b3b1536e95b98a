use std::collections::BTreeSet;

use crate::overrides::OverrideTable;

/// Number of ranked candidates returned by the scorer.
pub const DEFAULT_TOP_N: usize = 5;

/// Well-known diagnoses that boosted scoring favours.
pub const COMMON_CONDITIONS: [&str; 10] = [
    "Common Cold",
    "Bronchial Asthma",
    "Pneumonia",
    "Migraine",
    "Hypertension",
    "Diabetes",
    "Gastroenteritis",
    "Acidity",
    "Urinary tract infection",
    "Allergy",
];

/// Tunable inputs to the scorer, fixed for the lifetime of an engine.
#[derive(Debug, Clone)]
pub struct ScoringRules {
    pub common_conditions: BTreeSet<String>,
    pub overrides: OverrideTable,
    pub top_n: usize,
}

impl ScoringRules {
    pub fn is_common(&self, disease: &str) -> bool {
        self.common_conditions.contains(disease)
    }

    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            common_conditions: COMMON_CONDITIONS.iter().map(|s| s.to_string()).collect(),
            overrides: OverrideTable::builtin(),
            top_n: DEFAULT_TOP_N,
        }
    }
}
