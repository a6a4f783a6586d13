//! Problem contract consumed by the interactive loop
//!
//! A problem owns the dataset, the set of examples eligible for
//! explanation, the label oracle, the explanation function, the correction
//! oracle, and the evaluation function. The loop drives these through fixed
//! contracts and never looks inside the artifacts they return.

pub mod toy;

pub use toy::{ToyConfig, ToyProblem};

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::data::{CorrectionSet, Dataset, Fingerprint, Label};
use crate::explanation::Explanation;
use crate::learner::Learner;

/// Macro-averaged precision / recall / F1 over one example subset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Performance record for one evaluation: the always-evaluated test subset,
/// plus the heavier eval subset on cadence rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfRecord {
    pub test: Scores,
    pub eval: Option<Scores>,
}

/// Compute macro-averaged scores from aligned truth/prediction vectors.
/// Classes absent from both truth and predictions contribute zero.
pub fn macro_scores(truth: &[Label], predicted: &[Label], n_classes: usize) -> Scores {
    assert_eq!(truth.len(), predicted.len(), "truth and predictions align");

    let mut tp = vec![0usize; n_classes];
    let mut fp = vec![0usize; n_classes];
    let mut fn_ = vec![0usize; n_classes];

    for (&t, &p) in truth.iter().zip(predicted.iter()) {
        if t == p {
            tp[t] += 1;
        } else {
            fp[p] += 1;
            fn_[t] += 1;
        }
    }

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    for c in 0..n_classes {
        let p = if tp[c] + fp[c] > 0 {
            tp[c] as f64 / (tp[c] + fp[c]) as f64
        } else {
            0.0
        };
        let r = if tp[c] + fn_[c] > 0 {
            tp[c] as f64 / (tp[c] + fn_[c]) as f64
        } else {
            0.0
        };
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        precision += p;
        recall += r;
        f1 += f;
    }

    let k = n_classes.max(1) as f64;
    Scores {
        precision: precision / k,
        recall: recall / k,
        f1: f1 / k,
    }
}

/// The problem contract
pub trait Problem {
    /// Number of declared classes
    fn n_classes(&self) -> usize;

    /// The dataset the example indices point into
    fn dataset(&self) -> &Dataset;

    /// Indices eligible for explanation and correction
    fn explainable(&self) -> &BTreeSet<usize>;

    /// Ground-truth oracle; deterministic for a fixed index
    fn query_label(&self, i: usize) -> Label;

    /// Local explanation of the learner's prediction on example `i`
    fn explain<L: Learner>(
        &self,
        learner: &L,
        known_examples: &[usize],
        i: usize,
        predicted: Label,
    ) -> Explanation;

    /// Oracle correction step: convert rejected explanation content into
    /// synthetic counter-examples. Returns the updated accumulator, which
    /// may be unchanged and must never shrink once non-empty. Rows whose
    /// fingerprint appears in `excluded` must not be emitted.
    fn query_corrections(
        &self,
        corrections: CorrectionSet,
        i: usize,
        predicted: Label,
        explanation: &Explanation,
        excluded: &HashSet<Fingerprint>,
    ) -> CorrectionSet;

    /// Evaluate the learner on the test subset, plus the eval subset when
    /// given (cadence rounds only)
    fn eval<L: Learner>(
        &self,
        learner: &L,
        known_examples: &[usize],
        test_examples: &[usize],
        eval_examples: Option<&[usize]>,
        t: usize,
    ) -> PerfRecord;
}
