//! Per-disease recommendation tables.
//!
//! Five CSV tables keyed by disease name are merged into one
//! [`RecommendationBundle`] per disease at load time. The workout table spells
//! its key column `disease` while the others use `Disease`; both spellings are
//! accepted everywhere and normalized to a single `disease_name` key.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::DataPaths;
use crate::error::EngineError;

/// Rendered in place of a missing description.
pub const DESCRIPTION_UNAVAILABLE: &str = "Not available";

/// Precaution columns per table row.
pub const PRECAUTION_SLOTS: usize = 4;

/// Auxiliary advice for one disease. An unknown disease resolves to the
/// empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub description: Option<String>,
    /// Four slots per precaution row; blank slots are `None`.
    pub precautions: Vec<Option<String>>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

impl RecommendationBundle {
    pub fn description_or_sentinel(&self) -> &str {
        self.description.as_deref().unwrap_or(DESCRIPTION_UNAVAILABLE)
    }

    /// Slots of the first precaution row only.
    pub fn first_precaution_row(&self) -> &[Option<String>] {
        &self.precautions[..self.precautions.len().min(PRECAUTION_SLOTS)]
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.precautions.is_empty()
            && self.medications.is_empty()
            && self.diets.is_empty()
            && self.workouts.is_empty()
    }
}

/// Read-only access to recommendation bundles by disease name.
pub trait RecommendationLookup {
    fn recommendations(&self, disease: &str) -> Option<&RecommendationBundle>;
}

impl RecommendationLookup for HashMap<String, RecommendationBundle> {
    fn recommendations(&self, disease: &str) -> Option<&RecommendationBundle> {
        self.get(disease)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRow {
    #[serde(rename = "Disease", alias = "disease")]
    pub disease_name: String,
    #[serde(rename = "Description", alias = "description")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrecautionRow {
    #[serde(rename = "Disease", alias = "disease")]
    pub disease_name: String,
    #[serde(rename = "Precaution_1")]
    pub precaution_1: Option<String>,
    #[serde(rename = "Precaution_2")]
    pub precaution_2: Option<String>,
    #[serde(rename = "Precaution_3")]
    pub precaution_3: Option<String>,
    #[serde(rename = "Precaution_4")]
    pub precaution_4: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicationRow {
    #[serde(rename = "Disease", alias = "disease")]
    pub disease_name: String,
    #[serde(rename = "Medication", alias = "medication")]
    pub medication: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DietRow {
    #[serde(rename = "Disease", alias = "disease")]
    pub disease_name: String,
    #[serde(rename = "Diet", alias = "diet")]
    pub diet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutRow {
    #[serde(rename = "disease", alias = "Disease")]
    pub disease_name: String,
    #[serde(rename = "workout", alias = "Workout")]
    pub workout: Option<String>,
}

/// Raw rows of all five tables, before merging.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRows {
    pub descriptions: Vec<DescriptionRow>,
    pub precautions: Vec<PrecautionRow>,
    pub medications: Vec<MedicationRow>,
    pub diets: Vec<DietRow>,
    pub workouts: Vec<WorkoutRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    bundles: HashMap<String, RecommendationBundle>,
}

impl ReferenceTables {
    pub fn load(paths: &DataPaths) -> Result<Self, EngineError> {
        let rows = ReferenceRows {
            descriptions: read_table(&paths.descriptions)?,
            precautions: read_table(&paths.precautions)?,
            medications: read_table(&paths.medications)?,
            diets: read_table(&paths.diets)?,
            workouts: read_table(&paths.workouts)?,
        };
        let tables = Self::from_rows(rows);
        info!(diseases = tables.len(), "reference tables loaded");
        Ok(tables)
    }

    pub fn from_rows(rows: ReferenceRows) -> Self {
        let mut bundles: HashMap<String, RecommendationBundle> = HashMap::new();

        for row in rows.descriptions {
            let bundle = bundles.entry(key(&row.disease_name)).or_default();
            if bundle.description.is_none() {
                bundle.description = row.description.filter(|d| !d.trim().is_empty());
            }
        }
        for row in rows.precautions {
            bundles
                .entry(key(&row.disease_name))
                .or_default()
                .precautions
                .extend([
                    row.precaution_1,
                    row.precaution_2,
                    row.precaution_3,
                    row.precaution_4,
                ]);
        }
        for row in rows.medications {
            if let Some(medication) = row.medication {
                bundles
                    .entry(key(&row.disease_name))
                    .or_default()
                    .medications
                    .push(medication);
            }
        }
        for row in rows.diets {
            if let Some(diet) = row.diet {
                bundles.entry(key(&row.disease_name)).or_default().diets.push(diet);
            }
        }
        for row in rows.workouts {
            if let Some(workout) = row.workout {
                bundles
                    .entry(key(&row.disease_name))
                    .or_default()
                    .workouts
                    .push(workout);
            }
        }

        Self { bundles }
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn diseases(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }
}

impl RecommendationLookup for ReferenceTables {
    fn recommendations(&self, disease: &str) -> Option<&RecommendationBundle> {
        self.bundles.get(disease.trim())
    }
}

fn key(disease: &str) -> String {
    disease.trim().to_string()
}

/// Deserialize every row of a headed CSV table. Extra columns are ignored.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EngineError> {
    let source_name = path.display().to_string();
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| EngineError::Csv {
            path: source_name.clone(),
            source,
        })?;
    read_rows(reader, &source_name)
}

pub fn read_rows<T: DeserializeOwned, R: std::io::Read>(
    mut reader: csv::Reader<R>,
    source_name: &str,
) -> Result<Vec<T>, EngineError> {
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| EngineError::Csv {
            path: source_name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows<T: DeserializeOwned>(content: &str) -> Vec<T> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        read_rows(reader, "test.csv").expect("rows should parse")
    }

    #[test]
    fn workout_key_is_normalized() {
        let workouts: Vec<WorkoutRow> =
            rows(",Unnamed: 0,disease,workout\n0,0,Migraine,Stay hydrated\n1,1,Migraine,Rest\n");
        let descriptions: Vec<DescriptionRow> =
            rows("Disease,Description\nMigraine,A headache disorder.\n");
        let tables = ReferenceTables::from_rows(ReferenceRows {
            descriptions,
            workouts,
            ..Default::default()
        });

        let bundle = tables.recommendations("Migraine").expect("migraine present");
        assert_eq!(bundle.workouts, vec!["Stay hydrated", "Rest"]);
        assert_eq!(bundle.description_or_sentinel(), "A headache disorder.");
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn precaution_blanks_become_none() {
        let precautions: Vec<PrecautionRow> = rows(
            ",Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4\n\
             0,Allergy,apply calamine,,avoid dust,\n",
        );
        let tables = ReferenceTables::from_rows(ReferenceRows {
            precautions,
            ..Default::default()
        });
        let bundle = tables.recommendations("Allergy").expect("allergy present");
        assert_eq!(
            bundle.precautions,
            vec![
                Some("apply calamine".to_string()),
                None,
                Some("avoid dust".to_string()),
                None
            ]
        );
        assert_eq!(bundle.description_or_sentinel(), DESCRIPTION_UNAVAILABLE);
    }

    #[test]
    fn first_description_wins_and_keys_are_trimmed() {
        let descriptions: Vec<DescriptionRow> =
            rows("Disease,Description\nAcne ,first\nAcne,second\n");
        let tables = ReferenceTables::from_rows(ReferenceRows {
            descriptions,
            ..Default::default()
        });
        let bundle = tables.recommendations(" Acne").expect("acne present");
        assert_eq!(bundle.description.as_deref(), Some("first"));
    }

    #[test]
    fn miss_is_none_not_error() {
        let tables = ReferenceTables::default();
        assert!(tables.recommendations("Nothing").is_none());
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let write = |name: &str, body: &str| {
            std::fs::write(dir.path().join(name), body).expect("write fixture");
        };
        write("description.csv", "Disease,Description\nGERD,Reflux.\n");
        write(
            "precautions_df.csv",
            "Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4\nGERD,avoid fatty food,,,\n",
        );
        write("medications.csv", "Disease,Medication\nGERD,Antacids\n");
        write("diets.csv", "Disease,Diet\nGERD,Low-fat diet\n");
        write("workout_df.csv", "disease,workout\nGERD,Eat smaller meals\n");

        let tables = ReferenceTables::load(&DataPaths::in_dir(dir.path())).expect("load");
        let bundle = tables.recommendations("GERD").expect("gerd present");
        assert_eq!(bundle.medications, vec!["Antacids"]);
        assert_eq!(bundle.diets, vec!["Low-fat diet"]);
        assert_eq!(bundle.workouts, vec!["Eat smaller meals"]);
        assert_eq!(bundle.precautions.len(), 4);
    }
}
