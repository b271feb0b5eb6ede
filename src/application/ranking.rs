//! Top-K ranking of classifier output.

use crate::domain::RankedDiagnosis;

use super::ClassifierOutput;

/// Number of candidates reported when nothing else is configured.
pub const DEFAULT_TOP_K: usize = 3;

/// Orders classes by probability and keeps the first K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKRanker {
    k: usize,
}

impl Default for TopKRanker {
    fn default() -> Self {
        Self { k: DEFAULT_TOP_K }
    }
}

impl TopKRanker {
    /// A ranker keeping `k` candidates; `k` is at least 1.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Rank classifier output.
    ///
    /// Probabilities are sorted descending with ties kept in class order and
    /// reported as percentages. A hard label becomes a single candidate at
    /// 100%.
    #[must_use]
    pub fn rank(&self, output: &ClassifierOutput) -> Vec<RankedDiagnosis> {
        match output {
            ClassifierOutput::Labeled(label) => vec![RankedDiagnosis::new(label.clone(), 100.0)],
            ClassifierOutput::Distributed {
                labels,
                probabilities,
            } => {
                let mut order: Vec<usize> = (0..labels.len().min(probabilities.len())).collect();
                // sort_by is stable, so equal probabilities keep class order.
                order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

                order
                    .into_iter()
                    .take(self.k)
                    .map(|i| RankedDiagnosis::new(labels[i].clone(), probabilities[i] * 100.0))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distributed(labels: &[&str], probabilities: &[f64]) -> ClassifierOutput {
        ClassifierOutput::Distributed {
            labels: labels.iter().map(|s| (*s).to_string()).collect(),
            probabilities: probabilities.to_vec(),
        }
    }

    fn assert_ranking(ranking: &[RankedDiagnosis], expected: &[(&str, f64)]) {
        assert_eq!(ranking.len(), expected.len());
        for (got, (label, confidence)) in ranking.iter().zip(expected) {
            assert_eq!(got.label, *label);
            assert!(
                (got.confidence - confidence).abs() < 1e-9,
                "{} != {confidence}",
                got.confidence
            );
        }
    }

    #[test]
    fn test_three_class_example() {
        let ranking = TopKRanker::default().rank(&distributed(
            &["Dengue", "Malaria", "COVID-19"],
            &[0.62, 0.25, 0.13],
        ));
        assert_ranking(
            &ranking,
            &[("Dengue", 62.0), ("Malaria", 25.0), ("COVID-19", 13.0)],
        );
    }

    #[test]
    fn test_keeps_only_top_k() {
        let ranking = TopKRanker::default().rank(&distributed(
            &["A", "B", "C", "D", "E"],
            &[0.05, 0.40, 0.10, 0.30, 0.15],
        ));
        assert_ranking(&ranking, &[("B", 40.0), ("D", 30.0), ("E", 15.0)]);
    }

    #[test]
    fn test_fewer_classes_than_k() {
        let ranking = TopKRanker::default().rank(&distributed(&["A", "B"], &[0.2, 0.8]));
        assert_ranking(&ranking, &[("B", 80.0), ("A", 20.0)]);
    }

    #[test]
    fn test_ties_keep_class_order() {
        let ranking = TopKRanker::new(2).rank(&distributed(&["X", "Y", "Z"], &[0.25, 0.5, 0.25]));
        assert_ranking(&ranking, &[("Y", 50.0), ("X", 25.0)]);
    }

    #[test]
    fn test_hard_label_is_certain() {
        let ranking = TopKRanker::default().rank(&ClassifierOutput::Labeled("Malaria".into()));
        assert_ranking(&ranking, &[("Malaria", 100.0)]);
    }

    #[test]
    fn test_ranking_is_non_increasing() {
        let p = [0.11, 0.07, 0.19, 0.02, 0.31, 0.3];
        let ranking =
            TopKRanker::new(6).rank(&distributed(&["a", "b", "c", "d", "e", "f"], &p));
        assert!(ranking
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert!(ranking.iter().all(|r| (0.0..=100.0).contains(&r.confidence)));
    }

    #[test]
    fn test_k_is_at_least_one() {
        assert_eq!(TopKRanker::new(0).k(), 1);
    }
}
