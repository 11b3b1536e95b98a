use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::symptoms::SymptomSet;

/// Forces `disease` to `score` when every symptom in `requires` was reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub requires: Vec<String>,
    pub disease: String,
    pub score: f64,
}

impl OverrideRule {
    pub fn matches(&self, query: &SymptomSet) -> bool {
        self.requires.iter().all(|s| query.contains(s))
    }
}

/// Ordered override rules consulted by strict scoring before the corpus scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    rules: Vec<OverrideRule>,
}

impl OverrideTable {
    pub fn builtin() -> Self {
        Self {
            rules: vec![OverrideRule {
                requires: vec!["itchy rash".to_string(), "blisters".to_string()],
                disease: "Chicken Pox".to_string(),
                score: 100.0,
            }],
        }
    }

    pub fn new(rules: Vec<OverrideRule>) -> Result<Self, EngineError> {
        for rule in &rules {
            if rule.requires.iter().all(|s| s.trim().is_empty()) {
                return Err(EngineError::Overrides(format!(
                    "rule for '{}' has no required symptoms",
                    rule.disease
                )));
            }
            if rule.disease.trim().is_empty() {
                return Err(EngineError::Overrides(
                    "rule has an empty disease name".to_string(),
                ));
            }
            if !rule.score.is_finite() {
                return Err(EngineError::Overrides(format!(
                    "rule for '{}' has a non-finite score",
                    rule.disease
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a JSON array of rules, e.g.
    /// `[{"requires": ["itchy rash", "blisters"], "disease": "Chicken Pox", "score": 100}]`.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let rules: Vec<OverrideRule> =
            serde_json::from_str(json).map_err(|e| EngineError::Overrides(e.to_string()))?;
        Self::new(rules)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// Rules triggered by `query`, in table order.
    pub fn matching<'a>(&'a self, query: &'a SymptomSet) -> impl Iterator<Item = &'a OverrideRule> {
        self.rules.iter().filter(move |r| r.matches(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_requires_both_symptoms() {
        let table = OverrideTable::builtin();
        let both = SymptomSet::parse("itchy rash, blisters, fever");
        let one = SymptomSet::parse("itchy rash");
        assert_eq!(table.matching(&both).count(), 1);
        assert_eq!(table.matching(&one).count(), 0);
    }

    #[test]
    fn from_json_round_trips_rules() {
        let table = OverrideTable::from_json(
            r#"[{"requires": ["stiff_neck", "high_fever"], "disease": "Meningitis", "score": 95.5}]"#,
        )
        .expect("valid rules");
        assert_eq!(table.rules().len(), 1);
        assert_eq!(table.rules()[0].disease, "Meningitis");
        assert_eq!(table.rules()[0].score, 95.5);
    }

    #[test]
    fn empty_requirements_rejected() {
        let err = OverrideTable::from_json(r#"[{"requires": [], "disease": "X", "score": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::Overrides(_)));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(OverrideTable::from_json("{not json").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"[{"requires": ["a"], "disease": "B", "score": 50}]"#)
            .expect("write");
        let table = OverrideTable::load(&path).expect("load");
        assert_eq!(table.rules()[0].requires, vec!["a"]);
        assert!(OverrideTable::load(&dir.path().join("missing.json")).is_err());
    }
}
