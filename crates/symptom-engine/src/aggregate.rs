//! Merge recommendation bundles of ranked diseases into one response.
//!
//! Both merge policies drop blank entries and missing precaution slots and
//! never repeat an item. They differ in output order and precaution rows:
//!
//! - [`MergePolicy::Ordered`] keeps first-seen order across the ranking
//!   (console rendering) and reads only the first precaution row per disease.
//! - [`MergePolicy::SetCollapse`] gathers everything and collapses each list
//!   through a set at the end (network service). Rank order is not preserved.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierPrediction;
use crate::reference::{RecommendationBundle, RecommendationLookup};
use crate::scorer::ScoredCandidate;

/// Anything carrying a disease name in rank order.
pub trait RankedDisease {
    fn disease_name(&self) -> &str;
}

impl RankedDisease for ScoredCandidate {
    fn disease_name(&self) -> &str {
        &self.disease
    }
}

impl RankedDisease for ClassifierPrediction {
    fn disease_name(&self) -> &str {
        &self.disease
    }
}

impl RankedDisease for String {
    fn disease_name(&self) -> &str {
        self
    }
}

impl RankedDisease for &str {
    fn disease_name(&self) -> &str {
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    Ordered,
    SetCollapse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub descriptions: Vec<String>,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

impl AggregatedResponse {
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
            && self.precautions.is_empty()
            && self.medications.is_empty()
            && self.diets.is_empty()
            && self.workouts.is_empty()
    }
}

pub fn aggregate<R, L>(ranked: &[R], lookup: &L, policy: MergePolicy) -> AggregatedResponse
where
    R: RankedDisease,
    L: RecommendationLookup + ?Sized,
{
    let empty = RecommendationBundle::default();
    let mut merged = Merger::default();

    for candidate in ranked {
        let bundle = lookup
            .recommendations(candidate.disease_name())
            .unwrap_or(&empty);

        merged.descriptions.push(bundle.description_or_sentinel());
        let precautions = match policy {
            MergePolicy::Ordered => bundle.first_precaution_row(),
            MergePolicy::SetCollapse => &bundle.precautions[..],
        };
        for precaution in precautions.iter().flatten() {
            merged.precautions.push(precaution);
        }
        for medication in &bundle.medications {
            merged.medications.push(medication);
        }
        for diet in &bundle.diets {
            merged.diets.push(diet);
        }
        for workout in &bundle.workouts {
            merged.workouts.push(workout);
        }
    }

    merged.finish(policy)
}

#[derive(Default)]
struct Merger<'a> {
    descriptions: UniqueList<'a>,
    precautions: UniqueList<'a>,
    medications: UniqueList<'a>,
    diets: UniqueList<'a>,
    workouts: UniqueList<'a>,
}

impl Merger<'_> {
    fn finish(self, policy: MergePolicy) -> AggregatedResponse {
        AggregatedResponse {
            descriptions: self.descriptions.finish(policy),
            precautions: self.precautions.finish(policy),
            medications: self.medications.finish(policy),
            diets: self.diets.finish(policy),
            workouts: self.workouts.finish(policy),
        }
    }
}

/// Non-blank strings without repeats, in first-seen order.
#[derive(Default)]
struct UniqueList<'a> {
    seen: HashSet<&'a str>,
    items: Vec<&'a str>,
}

impl<'a> UniqueList<'a> {
    fn push(&mut self, item: &'a str) {
        if item.trim().is_empty() {
            return;
        }
        if self.seen.insert(item) {
            self.items.push(item);
        }
    }

    fn finish(self, policy: MergePolicy) -> Vec<String> {
        match policy {
            MergePolicy::Ordered => self.items.into_iter().map(str::to_string).collect(),
            MergePolicy::SetCollapse => self
                .items
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::reference::DESCRIPTION_UNAVAILABLE;

    fn bundle(description: &str, precautions: &[&str], medications: &[&str]) -> RecommendationBundle {
        RecommendationBundle {
            description: Some(description.to_string()),
            precautions: precautions
                .iter()
                .map(|p| if p.is_empty() { None } else { Some(p.to_string()) })
                .collect(),
            medications: medications.iter().map(|m| m.to_string()).collect(),
            diets: vec![],
            workouts: vec![],
        }
    }

    fn lookup() -> HashMap<String, RecommendationBundle> {
        let mut tables = HashMap::new();
        tables.insert(
            "Migraine".to_string(),
            RecommendationBundle {
                diets: vec!["Low-sodium diet".into()],
                workouts: vec!["Stay hydrated".into(), "  ".into()],
                ..bundle(
                    "Recurring headaches.",
                    &["meditation", "reduce stress", "", "consult doctor"],
                    &["Analgesics", "Triptans"],
                )
            },
        );
        tables.insert(
            "Hypertension".to_string(),
            RecommendationBundle {
                diets: vec!["Low-sodium diet".into(), "DASH diet".into()],
                ..bundle(
                    "High blood pressure.",
                    &["salt baths", "reduce stress", "get proper sleep", "consult doctor"],
                    &["Diuretics", "Analgesics"],
                )
            },
        );
        tables
    }

    fn ranked(names: &[&str]) -> Vec<ScoredCandidate> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ScoredCandidate {
                disease: n.to_string(),
                score: 100.0 - i as f64,
            })
            .collect()
    }

    #[test]
    fn ordered_keeps_first_seen_order() {
        let out = aggregate(&ranked(&["Migraine", "Hypertension"]), &lookup(), MergePolicy::Ordered);
        assert_eq!(out.descriptions, vec!["Recurring headaches.", "High blood pressure."]);
        assert_eq!(
            out.precautions,
            vec!["meditation", "reduce stress", "consult doctor", "salt baths", "get proper sleep"]
        );
        assert_eq!(out.medications, vec!["Analgesics", "Triptans", "Diuretics"]);
        assert_eq!(out.diets, vec!["Low-sodium diet", "DASH diet"]);
        assert_eq!(out.workouts, vec!["Stay hydrated"]);
    }

    #[test]
    fn set_collapse_dedups_without_rank_order() {
        let out = aggregate(
            &ranked(&["Migraine", "Hypertension"]),
            &lookup(),
            MergePolicy::SetCollapse,
        );
        assert_eq!(out.medications, vec!["Analgesics", "Diuretics", "Triptans"]);
        assert_eq!(out.diets, vec!["DASH diet", "Low-sodium diet"]);
        assert_eq!(out.precautions.len(), 5);
    }

    #[test]
    fn shared_medication_appears_once_under_both_policies() {
        for policy in [MergePolicy::Ordered, MergePolicy::SetCollapse] {
            let out = aggregate(&ranked(&["Migraine", "Hypertension"]), &lookup(), policy);
            let count = out.medications.iter().filter(|m| *m == "Analgesics").count();
            assert_eq!(count, 1, "policy {policy:?}");
        }
    }

    #[test]
    fn ordered_reads_first_precaution_row_only() {
        let mut lookup = HashMap::new();
        lookup.insert(
            "GERD".to_string(),
            bundle(
                "Acid reflux.",
                &["avoid fatty food", "", "eat smaller meals", "", "sleep upright", "", "", ""],
                &[],
            ),
        );
        let ranked = ranked(&["GERD"]);

        let ordered = aggregate(&ranked, &lookup, MergePolicy::Ordered);
        assert_eq!(ordered.precautions, vec!["avoid fatty food", "eat smaller meals"]);

        let collapsed = aggregate(&ranked, &lookup, MergePolicy::SetCollapse);
        assert_eq!(
            collapsed.precautions,
            vec!["avoid fatty food", "eat smaller meals", "sleep upright"]
        );
    }

    #[test]
    fn empty_ranking_gives_empty_response() {
        for policy in [MergePolicy::Ordered, MergePolicy::SetCollapse] {
            let out = aggregate::<ScoredCandidate, _>(&[], &lookup(), policy);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn lookup_miss_yields_sentinel_only() {
        let out = aggregate(&["Unknown Disease"], &lookup(), MergePolicy::Ordered);
        assert_eq!(out.descriptions, vec![DESCRIPTION_UNAVAILABLE]);
        assert!(out.precautions.is_empty());
        assert!(out.medications.is_empty());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let tables = lookup();
        let input = ranked(&["Hypertension", "Migraine", "Unknown"]);
        for policy in [MergePolicy::Ordered, MergePolicy::SetCollapse] {
            let first = aggregate(&input, &tables, policy);
            let second = aggregate(&input, &tables, policy);
            assert_eq!(first, second);
        }
        assert_eq!(tables, lookup());
    }

    #[test]
    fn classifier_predictions_aggregate_too() {
        let predictions = vec![ClassifierPrediction {
            disease: "Hypertension".into(),
            confidence: 87.5,
        }];
        let out = aggregate(&predictions, &lookup(), MergePolicy::SetCollapse);
        assert_eq!(out.descriptions, vec!["High blood pressure."]);
    }
}
