//! Built-in toy problem with a known right-reason structure
//!
//! Each class `c` is determined by signal feature `c` of the synthetic
//! dataset; all other features are noise. The explanation is a single-feature
//! occlusion attribution, and the correction oracle rejects any positively
//! attributed feature that is not the true class's signal feature, emitting a
//! counter-example with that feature zeroed and the true label attached.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::{macro_scores, PerfRecord, Problem, Scores};
use crate::data::{
    fingerprint_slice, CorrectionSet, Dataset, Fingerprint, Label, SyntheticConfig,
    SyntheticDataset,
};
use crate::explanation::Explanation;
use crate::learner::Learner;

/// Configuration for the toy problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToyConfig {
    /// Synthetic dataset parameters
    pub dataset: SyntheticConfig,
    /// Number of features kept in each explanation
    pub expl_features: usize,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            dataset: SyntheticConfig::default(),
            expl_features: 3,
        }
    }
}

/// Synthetic problem with ground-truth relevant features
pub struct ToyProblem {
    dataset: Dataset,
    explainable: BTreeSet<usize>,
    expl_features: usize,
}

impl ToyProblem {
    /// Generate the problem; every example starts out explainable
    pub fn new(config: ToyConfig) -> Self {
        let dataset = SyntheticDataset::generate(&config.dataset);
        let explainable = (0..dataset.n_examples()).collect();
        Self {
            dataset,
            explainable,
            expl_features: config.expl_features.max(1),
        }
    }

    /// Restrict the explainable subset (e.g. to model partially
    /// explainable corpora)
    pub fn with_explainable(mut self, explainable: BTreeSet<usize>) -> Self {
        self.explainable = explainable;
        self
    }

    fn scores<L: Learner>(&self, learner: &L, examples: &[usize]) -> Scores {
        let truth = self.dataset.select_labels(examples);
        let predicted: Vec<Label> = examples
            .iter()
            .map(|&i| learner.predict(self.dataset.row(i)))
            .collect();
        macro_scores(&truth, &predicted, self.dataset.n_classes())
    }
}

impl Problem for ToyProblem {
    fn n_classes(&self) -> usize {
        self.dataset.n_classes()
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn explainable(&self) -> &BTreeSet<usize> {
        &self.explainable
    }

    fn query_label(&self, i: usize) -> Label {
        self.dataset.label(i)
    }

    fn explain<L: Learner>(
        &self,
        learner: &L,
        _known_examples: &[usize],
        i: usize,
        predicted: Label,
    ) -> Explanation {
        let x = self.dataset.row(i).to_owned();
        let base = learner.predict_proba(x.view())[predicted];

        // Single-feature occlusion: how much the predicted-class probability
        // drops when one feature is zeroed out.
        let mut attributions: Vec<(usize, f64)> = (0..self.dataset.n_features())
            .map(|j| {
                let mut occluded = x.clone();
                occluded[j] = 0.0;
                let p = learner.predict_proba(occluded.view())[predicted];
                (j, base - p)
            })
            .collect();

        attributions.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let kept: Vec<(usize, f64)> = attributions
            .iter()
            .take(self.expl_features)
            .cloned()
            .collect();
        let discrepancy: f64 = attributions
            .iter()
            .skip(self.expl_features)
            .map(|&(_, w)| w.abs())
            .sum();

        Explanation::new(kept, discrepancy)
    }

    fn query_corrections(
        &self,
        mut corrections: CorrectionSet,
        i: usize,
        predicted: Label,
        explanation: &Explanation,
        excluded: &HashSet<Fingerprint>,
    ) -> CorrectionSet {
        let true_label = self.query_label(i);

        for &(j, weight) in explanation.features() {
            // Only positively attributed features are claims worth judging.
            if weight <= 0.0 {
                continue;
            }
            // The true class's signal feature is the right reason.
            if j == true_label {
                continue;
            }
            // A correct prediction credited to its own signal feature needs
            // no counter-example.
            if predicted == true_label && j == predicted {
                continue;
            }

            let mut row = self.dataset.row(i).to_vec();
            row[j] = 0.0;

            let fp = fingerprint_slice(&row);
            if excluded.contains(&fp) || corrections.contains_fingerprint(&fp) {
                continue;
            }
            corrections.push(row, true_label);
        }

        corrections
    }

    fn eval<L: Learner>(
        &self,
        learner: &L,
        _known_examples: &[usize],
        test_examples: &[usize],
        eval_examples: Option<&[usize]>,
        _t: usize,
    ) -> PerfRecord {
        PerfRecord {
            test: self.scores(learner, test_examples),
            eval: eval_examples.map(|examples| self.scores(learner, examples)),
        }
    }
}
