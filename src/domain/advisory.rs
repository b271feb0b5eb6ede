//! Advisory records: static guidance attached to a diagnosis label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default guidance for labels the table does not know.
pub const DEFAULT_TESTS: &str = "Consult a healthcare provider for appropriate diagnostic tests";
pub const DEFAULT_CARE: &str = "Consult a doctor for proper treatment plan";
pub const DEFAULT_EMERGENCY: &str =
    "Severe worsening of symptoms, difficulty breathing, loss of consciousness";

/// Tests, care suggestions and emergency signs for one diagnosis.
///
/// Serialized with the `tests`/`meds`/`emergency` keys used by stored reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub tests: String,

    #[serde(rename = "meds")]
    pub care: String,

    pub emergency: String,
}

impl AdvisoryRecord {
    pub fn new(
        tests: impl Into<String>,
        care: impl Into<String>,
        emergency: impl Into<String>,
    ) -> Self {
        Self {
            tests: tests.into(),
            care: care.into(),
            emergency: emergency.into(),
        }
    }

    /// Whether every field carries text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.tests, &self.care, &self.emergency]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

impl Default for AdvisoryRecord {
    fn default() -> Self {
        Self::new(DEFAULT_TESTS, DEFAULT_CARE, DEFAULT_EMERGENCY)
    }
}

/// Versionable label → advisory mapping, loadable independently of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryTable {
    #[serde(default)]
    pub version: u32,

    pub entries: BTreeMap<String, AdvisoryRecord>,
}

impl AdvisoryTable {
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&AdvisoryRecord> {
        self.entries.get(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels whose record has an empty field.
    pub fn incomplete_labels(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, r)| !r.is_complete())
            .map(|(l, _)| l.as_str())
    }

    /// Table shipped with the binary.
    #[must_use]
    pub fn builtin() -> Self {
        let rows = [
            (
                "Dengue",
                "NS1 Antigen Test, Complete Blood Count (CBC) with Platelet Count",
                "Paracetamol for fever, Adequate hydration, Rest",
                "Severe abdominal pain, persistent vomiting, bleeding gums, blood in stool/vomit",
            ),
            (
                "Malaria",
                "Blood Smear Test, Rapid Diagnostic Test (RDT), Microscopy",
                "Antimalarial medication (prescribed by doctor), Fever management",
                "Confusion, seizures, difficulty breathing, severe anemia, jaundice",
            ),
            (
                "Typhoid",
                "Widal Test, Blood Culture, Stool Culture",
                "Antibiotics (prescribed), Hydration, Nutritious diet",
                "Severe abdominal pain, intestinal bleeding, confusion, high-grade persistent fever",
            ),
            (
                "COVID-19",
                "RT-PCR Test, Rapid Antigen Test, Chest X-Ray if severe",
                "Isolation, Supportive care, Plenty of fluids, Paracetamol if needed",
                "Difficulty breathing, persistent chest pain, confusion, bluish lips",
            ),
            (
                "Pneumonia",
                "Chest X-Ray, Blood Tests, Sputum Culture",
                "Antibiotics (prescribed), Rest, Hydration",
                "Severe difficulty breathing, blue lips/fingernails, confusion, chest pain",
            ),
            (
                "Influenza",
                "Clinical diagnosis, Rapid Influenza Test if needed",
                "Rest, Fluids, Paracetamol for fever, Antivirals if prescribed",
                "Difficulty breathing, chest pain, severe weakness, confusion",
            ),
            (
                "Tuberculosis",
                "Chest X-Ray, Sputum Test, Tuberculin Skin Test",
                "Anti-TB medication (6-9 months course as prescribed)",
                "Coughing blood, severe chest pain, extreme weight loss",
            ),
            (
                "Hepatitis A",
                "ALT/AST, HAV IgM",
                "Supportive care, hydration",
                "Deepening jaundice, confusion, bleeding, persistent vomiting",
            ),
            (
                "Urinary_Tract_Infection",
                "Urine analysis, Urine culture",
                "Antibiotics (prescribed), hydration",
                "High fever with flank pain, vomiting, blood in urine",
            ),
            (
                "Gastroenteritis",
                "Stool routine, Electrolytes",
                "ORS, antidiarrheal (as advised)",
                "Signs of severe dehydration, blood in stool, persistent high fever",
            ),
        ];

        let entries = rows
            .into_iter()
            .map(|(label, tests, care, emergency)| {
                (label.to_string(), AdvisoryRecord::new(tests, care, emergency))
            })
            .collect();

        Self {
            version: 1,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_complete() {
        let table = AdvisoryTable::builtin();
        assert!(table.len() >= 7);
        assert_eq!(table.incomplete_labels().count(), 0);
        assert!(table.get("Dengue").is_some());
        assert!(table.get("UnknownX").is_none());
    }

    #[test]
    fn test_json_keys_match_report_layout() {
        let json = serde_json::to_value(AdvisoryRecord::default()).expect("Should serialize");
        assert_eq!(json["tests"], DEFAULT_TESTS);
        assert_eq!(json["meds"], DEFAULT_CARE);
        assert_eq!(json["emergency"], DEFAULT_EMERGENCY);
    }

    #[test]
    fn test_incomplete_detection() {
        let mut table = AdvisoryTable::builtin();
        table
            .entries
            .insert("Blank".into(), AdvisoryRecord::new("x", " ", "y"));
        assert_eq!(table.incomplete_labels().collect::<Vec<_>>(), vec!["Blank"]);
    }
}
