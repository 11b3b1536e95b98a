//! The fixed, versioned symptom schema.
//!
//! The vector builder and every classifier must agree on this ordering; a
//! classifier declares the schema version it was trained against and
//! [`crate::classifier::classify`] refuses to call it on a mismatch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::symptoms::SymptomSet;

pub const VOCABULARY_VERSION: &str = "symptoms-v1";

/// Symptom names in feature order. Irregular spellings are part of the
/// reference corpus header and must not be corrected.
const SYMPTOMS_V1: [&str; 132] = [
    "itching",
    "skin_rash",
    "nodal_skin_eruptions",
    "continuous_sneezing",
    "shivering",
    "chills",
    "joint_pain",
    "stomach_pain",
    "acidity",
    "ulcers_on_tongue",
    "muscle_wasting",
    "vomiting",
    "burning_micturition",
    "spotting_ urination",
    "fatigue",
    "weight_gain",
    "anxiety",
    "cold_hands_and_feets",
    "mood_swings",
    "weight_loss",
    "restlessness",
    "lethargy",
    "patches_in_throat",
    "irregular_sugar_level",
    "cough",
    "high_fever",
    "sunken_eyes",
    "breathlessness",
    "sweating",
    "dehydration",
    "indigestion",
    "headache",
    "yellowish_skin",
    "dark_urine",
    "nausea",
    "loss_of_appetite",
    "pain_behind_the_eyes",
    "back_pain",
    "constipation",
    "abdominal_pain",
    "diarrhoea",
    "mild_fever",
    "yellow_urine",
    "yellowing_of_eyes",
    "acute_liver_failure",
    "fluid_overload",
    "swelling_of_stomach",
    "swelled_lymph_nodes",
    "malaise",
    "blurred_and_distorted_vision",
    "phlegm",
    "throat_irritation",
    "redness_of_eyes",
    "sinus_pressure",
    "runny_nose",
    "congestion",
    "chest_pain",
    "weakness_in_limbs",
    "fast_heart_rate",
    "pain_during_bowel_movements",
    "pain_in_anal_region",
    "bloody_stool",
    "irritation_in_anus",
    "neck_pain",
    "dizziness",
    "cramps",
    "bruising",
    "obesity",
    "swollen_legs",
    "swollen_blood_vessels",
    "puffy_face_and_eyes",
    "enlarged_thyroid",
    "brittle_nails",
    "swollen_extremeties",
    "excessive_hunger",
    "extra_marital_contacts",
    "drying_and_tingling_lips",
    "slurred_speech",
    "knee_pain",
    "hip_joint_pain",
    "muscle_weakness",
    "stiff_neck",
    "swelling_joints",
    "movement_stiffness",
    "spinning_movements",
    "loss_of_balance",
    "unsteadiness",
    "weakness_of_one_body_side",
    "loss_of_smell",
    "bladder_discomfort",
    "foul_smell_of urine",
    "continuous_feel_of_urine",
    "passage_of_gases",
    "internal_itching",
    "toxic_look_(typhos)",
    "depression",
    "irritability",
    "muscle_pain",
    "altered_sensorium",
    "red_spots_over_body",
    "belly_pain",
    "abnormal_menstruation",
    "dischromic _patches",
    "watering_from_eyes",
    "increased_appetite",
    "polyuria",
    "family_history",
    "mucoid_sputum",
    "rusty_sputum",
    "lack_of_concentration",
    "visual_disturbances",
    "receiving_blood_transfusion",
    "receiving_unsterile_injections",
    "coma",
    "stomach_bleeding",
    "distention_of_abdomen",
    "history_of_alcohol_consumption",
    "fluid_overload.1",
    "blood_in_sputum",
    "prominent_veins_on_calf",
    "palpitations",
    "painful_walking",
    "pus_filled_pimples",
    "blackheads",
    "scurring",
    "skin_peeling",
    "silver_like_dusting",
    "small_dents_in_nails",
    "inflammatory_nails",
    "blister",
    "red_sore_around_nose",
    "yellow_crust_ooze",
];

#[derive(Debug, Clone)]
pub struct SymptomVocabulary {
    version: String,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymptomVocabulary {
    pub fn builtin() -> Self {
        Self::new(VOCABULARY_VERSION, SYMPTOMS_V1)
    }

    /// Build a vocabulary from an explicit ordering. Later duplicates keep
    /// the first index.
    pub fn new<I, S>(version: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            version: version.to_string(),
            names,
            index,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    /// Binary presence vector in vocabulary order. Unknown symptoms are ignored.
    pub fn presence_vector(&self, query: &SymptomSet) -> PresenceVector {
        let mut values = vec![0.0_f32; self.names.len()];
        for symptom in query.iter() {
            if let Some(i) = self.index_of(symptom) {
                values[i] = 1.0;
            }
        }
        PresenceVector {
            schema_version: self.version.clone(),
            values,
        }
    }

    /// Header columns that this vocabulary does not know about.
    pub fn unknown_columns<'a>(&self, columns: &'a [String]) -> Vec<&'a str> {
        columns
            .iter()
            .map(String::as_str)
            .filter(|c| !self.index.contains_key(*c))
            .collect()
    }
}

/// Classifier input: one `0.0`/`1.0` feature per vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceVector {
    pub schema_version: String,
    pub values: Vec<f32>,
}

impl PresenceVector {
    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|v| **v > 0.0).count()
    }
}
