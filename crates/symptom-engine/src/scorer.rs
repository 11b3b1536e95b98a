//! Symptom-overlap scoring.
//!
//! Two strategies share the same skeleton: score every reference case, keep
//! the best score per disease in first-seen order, stable-sort descending and
//! keep the top N. Scores are match percentages, not probabilities; boosted
//! scores can exceed 100.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::DiseaseCorpus;
use crate::rules::ScoringRules;
use crate::symptoms::SymptomSet;

const COMMON_BOOST: f64 = 1.5;
const FULL_EXPLANATION_BOOST: f64 = 1.2;
const UNCOMMON_PENALTY: f64 = 0.7;
const UNCOMMON_PENALTY_BELOW: f64 = 80.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Overlap ratio with common-condition and full-explanation boosts.
    #[default]
    Boosted,
    /// Plain overlap ratio plus override rules.
    Strict,
}

impl ScoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Boosted => "boosted",
            ScoringStrategy::Strict => "strict",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boosted" => Ok(ScoringStrategy::Boosted),
            "strict" | "accurate" => Ok(ScoringStrategy::Strict),
            other => Err(format!(
                "unknown scoring strategy '{other}' (expected 'boosted' or 'strict')"
            )),
        }
    }
}

/// A disease and its heuristic match score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub disease: String,
    pub score: f64,
}

/// Rank diseases for `query` under `strategy`. Never fails; unknown symptoms
/// simply never match.
pub fn rank(
    corpus: &DiseaseCorpus,
    rules: &ScoringRules,
    query: &SymptomSet,
    strategy: ScoringStrategy,
) -> Vec<ScoredCandidate> {
    let candidates = match strategy {
        ScoringStrategy::Boosted => rank_boosted(corpus, rules, query),
        ScoringStrategy::Strict => rank_strict(corpus, rules, query),
    };
    debug!(
        strategy = %strategy,
        symptoms = query.len(),
        candidates = candidates.len(),
        top = candidates.first().map(|c| c.disease.as_str()).unwrap_or(""),
        "ranked diseases"
    );
    candidates
}

pub fn rank_boosted(
    corpus: &DiseaseCorpus,
    rules: &ScoringRules,
    query: &SymptomSet,
) -> Vec<ScoredCandidate> {
    let mut best = BestScores::default();

    for profile in corpus.profiles() {
        let total = profile.symptoms.len();
        if total == 0 {
            continue;
        }
        let overlap = query.overlap(&profile.symptoms);
        let common = rules.is_common(&profile.name);

        let mut score = overlap as f64 / total as f64 * 100.0;
        if common {
            score *= COMMON_BOOST;
        }
        if overlap == query.len() {
            score *= FULL_EXPLANATION_BOOST;
        }
        if !common && score < UNCOMMON_PENALTY_BELOW {
            score *= UNCOMMON_PENALTY;
        }
        best.offer(&profile.name, score);
    }

    best.into_top(rules.top_n)
}

pub fn rank_strict(
    corpus: &DiseaseCorpus,
    rules: &ScoringRules,
    query: &SymptomSet,
) -> Vec<ScoredCandidate> {
    let mut best = BestScores::default();

    for rule in rules.overrides.matching(query) {
        best.force(&rule.disease, rule.score);
    }

    for profile in corpus.profiles() {
        let total = profile.symptoms.len();
        if total == 0 {
            continue;
        }
        let overlap = query.overlap(&profile.symptoms);
        best.offer(&profile.name, overlap as f64 / total as f64 * 100.0);
    }

    best.into_top(rules.top_n)
}

/// Round to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        if floor % 2.0 == 0.0 { floor } else { floor + 1.0 }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

/// Best score per disease, remembering first-seen order for tie-breaking.
#[derive(Default)]
struct BestScores {
    order: Vec<(String, f64)>,
    index: HashMap<String, usize>,
    forced: Vec<bool>,
}

impl BestScores {
    fn offer(&mut self, disease: &str, score: f64) {
        match self.index.get(disease) {
            Some(&i) => {
                if !self.forced[i] && score > self.order[i].1 {
                    self.order[i].1 = score;
                }
            }
            None => {
                self.index.insert(disease.to_string(), self.order.len());
                self.order.push((disease.to_string(), score));
                self.forced.push(false);
            }
        }
    }

    /// Pin a score that later corpus offers cannot change. The first forced
    /// score for a disease wins.
    fn force(&mut self, disease: &str, score: f64) {
        if self.index.contains_key(disease) {
            return;
        }
        self.index.insert(disease.to_string(), self.order.len());
        self.order.push((disease.to_string(), score));
        self.forced.push(true);
    }

    fn into_top(mut self, n: usize) -> Vec<ScoredCandidate> {
        // Stable: equal scores keep first-seen order.
        self.order.sort_by(|a, b| b.1.total_cmp(&a.1));
        self.order
            .into_iter()
            .take(n)
            .map(|(disease, score)| ScoredCandidate {
                disease,
                score: round2(score),
            })
            .collect()
    }
}
