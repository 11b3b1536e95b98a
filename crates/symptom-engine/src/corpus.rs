use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;

pub const PROGNOSIS_COLUMN: &str = "prognosis";

/// Symptoms recorded as present for one reference case of a disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseProfile {
    pub name: String,
    pub symptoms: BTreeSet<String>,
}

impl DiseaseProfile {
    pub fn new<I, S>(name: impl Into<String>, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            symptoms: symptoms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reference cases in file order. A disease usually appears in many rows;
/// the scorer keeps the best-matching row per disease.
#[derive(Debug, Clone, Default)]
pub struct DiseaseCorpus {
    symptom_columns: Vec<String>,
    profiles: Vec<DiseaseProfile>,
}

impl DiseaseCorpus {
    pub fn from_profiles(profiles: Vec<DiseaseProfile>) -> Self {
        let mut seen = HashSet::new();
        let mut symptom_columns = Vec::new();
        for symptom in profiles.iter().flat_map(|p| &p.symptoms) {
            if seen.insert(symptom.as_str()) {
                symptom_columns.push(symptom.clone());
            }
        }
        Self {
            symptom_columns,
            profiles,
        }
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let source_name = path.display().to_string();
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| EngineError::Csv {
                path: source_name.clone(),
                source,
            })?;
        let corpus = Self::from_reader(reader, &source_name)?;
        info!(
            path = %source_name,
            rows = corpus.profiles.len(),
            diseases = corpus.disease_names().len(),
            symptom_columns = corpus.symptom_columns.len(),
            "disease corpus loaded"
        );
        Ok(corpus)
    }

    /// Parse a training table: one column per symptom holding `1` when
    /// present, plus a `prognosis` column naming the disease.
    pub fn from_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
        source_name: &str,
    ) -> Result<Self, EngineError> {
        let csv_err = |source: csv::Error| EngineError::Csv {
            path: source_name.to_string(),
            source,
        };

        let headers = reader.headers().map_err(csv_err)?.clone();
        let prognosis_idx = headers
            .iter()
            .position(|h| h.trim() == PROGNOSIS_COLUMN)
            .ok_or_else(|| EngineError::MissingColumn {
                path: source_name.to_string(),
                column: PROGNOSIS_COLUMN.to_string(),
            })?;

        let symptom_idx: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != prognosis_idx && !h.trim().is_empty())
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        let mut profiles = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let Some(name) = record.get(prognosis_idx).map(str::trim) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let symptoms = symptom_idx
                .iter()
                .filter(|(i, _)| record.get(*i).map(str::trim) == Some("1"))
                .map(|(_, symptom)| symptom.clone())
                .collect();
            profiles.push(DiseaseProfile {
                name: name.to_string(),
                symptoms,
            });
        }

        let mut seen = HashSet::new();
        let symptom_columns = symptom_idx
            .into_iter()
            .map(|(_, s)| s)
            .filter(|s| seen.insert(s.clone()))
            .collect();

        Ok(Self {
            symptom_columns,
            profiles,
        })
    }

    pub fn profiles(&self) -> &[DiseaseProfile] {
        &self.profiles
    }

    pub fn symptom_columns(&self) -> &[String] {
        &self.symptom_columns
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Distinct disease names in first-seen order.
    pub fn disease_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.profiles
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}
