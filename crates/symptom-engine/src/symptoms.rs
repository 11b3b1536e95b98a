use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Characters stripped from both ends of a reported symptom.
const STRAY_CHARS: &[char] = &['[', ']', '\'', '"', ' '];

/// A normalized, duplicate-free set of reported symptom names.
///
/// Matching is case-sensitive and exact after normalization. Iteration is in
/// sorted order so the set has a stable textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomSet {
    symptoms: BTreeSet<String>,
}

impl SymptomSet {
    /// Parse a comma-separated line such as `"itching, skin_rash"` or a
    /// stringified list like `"['itching', 'skin_rash']"`.
    pub fn parse(line: &str) -> Self {
        line.split(',').collect()
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.symptoms.contains(symptom)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symptoms.iter().map(String::as_str)
    }

    /// Number of symptoms shared with `other`.
    pub fn overlap(&self, other: &BTreeSet<String>) -> usize {
        // Iterate the smaller side.
        if self.symptoms.len() <= other.len() {
            self.symptoms.iter().filter(|s| other.contains(*s)).count()
        } else {
            other.iter().filter(|s| self.symptoms.contains(*s)).count()
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let symptoms = iter
            .into_iter()
            .filter_map(|s| normalize_symptom(s.as_ref()))
            .collect();
        Self { symptoms }
    }
}

/// Trim whitespace and stray list punctuation. Returns `None` when nothing
/// is left.
pub fn normalize_symptom(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches(STRAY_CHARS).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_list_punctuation() {
        let set = SymptomSet::parse("['itching', 'skin_rash' ,  nodal_skin_eruptions]");
        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["itching", "nodal_skin_eruptions", "skin_rash"]);
    }

    #[test]
    fn duplicates_and_blanks_collapse() {
        let set: SymptomSet = ["cough", " cough ", "", "  ", "'cough'"].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains("cough"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let set = SymptomSet::parse("Cough");
        assert!(!set.contains("cough"));
    }

    #[test]
    fn inner_spaces_survive() {
        let set = SymptomSet::parse("itchy rash,spotting_ urination");
        assert!(set.contains("itchy rash"));
        assert!(set.contains("spotting_ urination"));
    }

    #[test]
    fn overlap_counts_shared_names() {
        let set = SymptomSet::parse("a,b,c");
        let profile: BTreeSet<String> = ["b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set.overlap(&profile), 2);
        assert_eq!(SymptomSet::default().overlap(&profile), 0);
    }
}
