//! Feature vector builder: assembles a raw record in schema order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Demographics, FeatureSchema, RawRecord, RawValue, SymptomSet};
use crate::MediaidError;

/// Builds one [`RawRecord`] per request from demographics and symptoms.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    schema: Arc<FeatureSchema>,
}

impl FeatureVectorBuilder {
    #[must_use]
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Assemble the raw record.
    ///
    /// Demographics are copied verbatim. Every schema symptom gets 1 when
    /// present in `symptoms` and 0 otherwise. Selected symptoms the schema
    /// does not know are left out (see [`Self::unknown_symptoms`]).
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the assembled record does not cover the
    /// schema exactly.
    pub fn build(
        &self,
        demographics: &Demographics,
        symptoms: &SymptomSet,
    ) -> Result<RawRecord, MediaidError> {
        let mut values: BTreeMap<&str, RawValue> = BTreeMap::new();
        values.insert("age", RawValue::Integer(i64::from(demographics.age)));
        values.insert("gender", RawValue::Category(demographics.gender.clone()));
        values.insert("region", RawValue::Category(demographics.region.clone()));
        values.insert(
            "duration_days",
            RawValue::Integer(i64::from(demographics.duration_days)),
        );
        values.insert(
            "comorbidity",
            RawValue::Category(demographics.comorbidity.clone()),
        );
        for name in self.schema.symptoms() {
            values.insert(name, RawValue::Indicator(u8::from(symptoms.contains(name))));
        }

        let mut entries = Vec::with_capacity(self.schema.len());
        let mut missing = Vec::new();
        for name in self.schema.names() {
            match values.remove(name.as_str()) {
                Some(value) => entries.push((name.clone(), value)),
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(MediaidError::SchemaMismatch(format!(
                "no value for features {missing:?}"
            )));
        }
        if !values.is_empty() {
            let unplaced: Vec<&str> = values.keys().copied().collect();
            return Err(MediaidError::SchemaMismatch(format!(
                "schema has no slot for {unplaced:?}"
            )));
        }

        let record = RawRecord::from_entries(entries);
        debug_assert_eq!(record.len(), self.schema.len());
        Ok(record)
    }

    /// Selected symptoms outside the schema's symptom partition.
    #[must_use]
    pub fn unknown_symptoms(&self, symptoms: &SymptomSet) -> Vec<String> {
        symptoms
            .iter()
            .filter(|s| !self.schema.is_symptom(s))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::REFERENCE_SYMPTOMS;

    fn builder() -> FeatureVectorBuilder {
        FeatureVectorBuilder::new(Arc::new(FeatureSchema::reference()))
    }

    fn demographics() -> Demographics {
        Demographics {
            age: 30,
            gender: "Male".into(),
            region: "Punjab".into(),
            duration_days: 4,
            comorbidity: "None".into(),
        }
    }

    #[test]
    fn test_reference_scenario() {
        let symptoms: SymptomSet = ["fever", "cough", "fatigue"].into_iter().collect();
        let record = builder()
            .build(&demographics(), &symptoms)
            .expect("Should build");

        assert_eq!(record.get("age"), Some(&RawValue::Integer(30)));
        assert_eq!(record.get("gender"), Some(&RawValue::Category("Male".into())));
        assert_eq!(record.get("region"), Some(&RawValue::Category("Punjab".into())));
        assert_eq!(record.get("duration_days"), Some(&RawValue::Integer(4)));
        assert_eq!(record.get("comorbidity"), Some(&RawValue::Category("None".into())));

        for symptom in REFERENCE_SYMPTOMS {
            let expected = u8::from(matches!(symptom, "fever" | "cough" | "fatigue"));
            assert_eq!(
                record.get(symptom),
                Some(&RawValue::Indicator(expected)),
                "{symptom}"
            );
        }
    }

    #[test]
    fn test_record_covers_schema_exactly() {
        let b = builder();
        let subsets: [&[&str]; 4] = [
            &[],
            &["rash"],
            &["weight_loss", "abdominal_pain", "night_sweats"],
            &REFERENCE_SYMPTOMS,
        ];
        for subset in subsets {
            let symptoms: SymptomSet = subset.iter().copied().collect();
            let record = b.build(&demographics(), &symptoms).expect("Should build");
            assert_eq!(record.len(), b.schema().len());
            assert!(record.names().eq(b.schema().names().iter().map(String::as_str)));
        }
    }

    #[test]
    fn test_demographics_not_normalized() {
        let d = Demographics {
            gender: "male ".into(),
            ..demographics()
        };
        let record = builder().build(&d, &SymptomSet::new()).expect("Should build");
        assert_eq!(record.get("gender"), Some(&RawValue::Category("male ".into())));
    }

    #[test]
    fn test_unknown_symptoms_are_excluded() {
        let b = builder();
        let symptoms: SymptomSet = ["fever", "sneezing", "age"].into_iter().collect();
        let record = b.build(&demographics(), &symptoms).expect("Should build");

        assert!(record.get("sneezing").is_none());
        assert_eq!(record.get("age"), Some(&RawValue::Integer(30)));
        assert_eq!(b.unknown_symptoms(&symptoms), vec!["age", "sneezing"]);
    }

    #[test]
    fn test_stale_schema_is_a_mismatch() {
        let names = FeatureSchema::reference()
            .names()
            .iter()
            .filter(|n| n.as_str() != "comorbidity")
            .cloned()
            .collect::<Vec<_>>();
        let stale = FeatureVectorBuilder::new(Arc::new(FeatureSchema::unchecked(names)));

        let err = stale
            .build(&demographics(), &SymptomSet::new())
            .expect_err("Should reject stale schema");
        match err {
            MediaidError::SchemaMismatch(detail) => assert!(detail.contains("comorbidity")),
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_schema_order_is_followed() {
        let schema = FeatureSchema::new([
            "fever",
            "comorbidity",
            "age",
            "cough",
            "region",
            "duration_days",
            "gender",
        ])
        .expect("Should build schema");
        let b = FeatureVectorBuilder::new(Arc::new(schema));
        let record = b
            .build(&demographics(), &["cough"].into_iter().collect())
            .expect("Should build");

        let names: Vec<&str> = record.names().collect();
        assert_eq!(
            names,
            ["fever", "comorbidity", "age", "cough", "region", "duration_days", "gender"]
        );
        assert_eq!(record.get("cough"), Some(&RawValue::Indicator(1)));
        assert_eq!(record.get("fever"), Some(&RawValue::Indicator(0)));
    }
}
