//! Datasets, example partitions, and correction accumulation.

pub mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticDataset};

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{CaipiError, CaipiResult};

/// Class label: an index into `0..n_classes`
pub type Label = usize;

/// Dense feature fingerprint used as a leakage guard: the bit patterns of a
/// row's components. Correction rows whose fingerprint matches a held-out
/// test row are never emitted.
pub type Fingerprint = Vec<u64>;

/// Compute the fingerprint of a dense feature row
pub fn fingerprint(row: ArrayView1<f64>) -> Fingerprint {
    row.iter().map(|v| v.to_bits()).collect()
}

/// Compute the fingerprint of a dense feature slice
pub fn fingerprint_slice(row: &[f64]) -> Fingerprint {
    row.iter().map(|v| v.to_bits()).collect()
}

/// An immutable labeled dataset. The interactive loop never mutates it,
/// only indexes into it by example index.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Vec<Label>,
    n_classes: usize,
}

impl Dataset {
    /// Create a dataset from a feature matrix, label vector, and declared
    /// class count. Label count must match the row count and every label
    /// must be below `n_classes`.
    pub fn new(x: Array2<f64>, y: Vec<Label>, n_classes: usize) -> Self {
        assert_eq!(
            x.nrows(),
            y.len(),
            "feature rows and labels must align ({} rows, {} labels)",
            x.nrows(),
            y.len()
        );
        assert!(
            y.iter().all(|&label| label < n_classes),
            "every label must be below n_classes = {}",
            n_classes
        );

        Self { x, y, n_classes }
    }

    /// Number of examples
    pub fn n_examples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of features per example
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of declared classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// The full feature matrix
    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    /// All labels, in example order
    pub fn labels(&self) -> &[Label] {
        &self.y
    }

    /// One feature row
    pub fn row(&self, i: usize) -> ArrayView1<f64> {
        self.x.row(i)
    }

    /// Ground-truth label of one example
    pub fn label(&self, i: usize) -> Label {
        self.y[i]
    }

    /// Feature rows for a set of example indices, in the given order
    pub fn select_rows(&self, examples: &[usize]) -> Array2<f64> {
        self.x.select(Axis(0), examples)
    }

    /// Labels for a set of example indices, in the given order
    pub fn select_labels(&self, examples: &[usize]) -> Vec<Label> {
        examples.iter().map(|&i| self.y[i]).collect()
    }

    /// Fingerprints of the feature rows of a set of examples
    pub fn fingerprints(&self, examples: &[usize]) -> HashSet<Fingerprint> {
        examples.iter().map(|&i| fingerprint(self.x.row(i))).collect()
    }
}

/// Synthetic counter-examples accumulated from oracle corrections.
///
/// The accumulator grows monotonically: rows are appended, never removed or
/// reordered, and the row count always equals the label count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionSet {
    rows: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl CorrectionSet {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated corrections
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the accumulator is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Accumulated feature rows
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Accumulated labels, aligned with `rows`
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Append one synthetic counter-example
    pub fn push(&mut self, row: Vec<f64>, label: Label) {
        if let Some(first) = self.rows.first() {
            assert_eq!(
                row.len(),
                first.len(),
                "correction rows must share one width"
            );
        }
        self.rows.push(row);
        self.labels.push(label);
    }

    /// Check whether a row with this fingerprint is already accumulated
    pub fn contains_fingerprint(&self, fp: &Fingerprint) -> bool {
        self.rows.iter().any(|row| &fingerprint_slice(row) == fp)
    }

    /// Fail when every accumulated label is identical. A model cannot be
    /// fit on such a set alone; the caller skips that path and reports the
    /// returned error.
    pub fn check_label_variance(&self) -> CaipiResult<()> {
        match self.labels.first() {
            Some(&first) if self.labels.iter().all(|&label| label == first) => {
                Err(CaipiError::degenerate_corrections(first))
            }
            _ => Ok(()),
        }
    }

    /// True when every accumulated label is identical
    pub fn is_degenerate(&self) -> bool {
        self.check_label_variance().is_err()
    }

    /// The correction rows as a matrix, or `None` when empty
    pub fn to_matrix(&self) -> Option<Array2<f64>> {
        let first = self.rows.first()?;
        let width = first.len();
        let mut x = Array2::zeros((self.rows.len(), width));
        for (r, row) in self.rows.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                x[[r, c]] = value;
            }
        }
        Some(x)
    }
}

/// Assemble the retraining set for one round: correction rows first, then
/// the feature rows of all known examples, labels aligned throughout.
pub fn assemble_training_set(
    dataset: &Dataset,
    known_examples: &[usize],
    corrections: &CorrectionSet,
) -> (Array2<f64>, Vec<Label>) {
    let n = corrections.len() + known_examples.len();
    let width = dataset.n_features();
    let mut x = Array2::zeros((n, width));
    let mut y = Vec::with_capacity(n);

    for (r, row) in corrections.rows().iter().enumerate() {
        assert_eq!(row.len(), width, "correction width must match the dataset");
        for (c, &value) in row.iter().enumerate() {
            x[[r, c]] = value;
        }
    }
    y.extend_from_slice(corrections.labels());

    let offset = corrections.len();
    for (r, &i) in known_examples.iter().enumerate() {
        x.row_mut(offset + r).assign(&dataset.row(i));
        y.push(dataset.label(i));
    }

    (x, y)
}

/// Per-class balance ratio of a label set: max class proportion divided by
/// min class proportion, with zero counts clamped to one virtual example.
/// Diagnostic only; returns NaN for an empty label set.
pub fn class_balance(labels: &[Label], n_classes: usize) -> f64 {
    if labels.is_empty() || n_classes == 0 {
        return f64::NAN;
    }

    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }

    let total = labels.len() as f64;
    let clamp = 1.0 / total;
    let mut max_prop = f64::MIN;
    let mut min_prop = f64::MAX;
    for &count in &counts {
        let prop = (count as f64 / total).max(clamp);
        max_prop = max_prop.max(prop);
        min_prop = min_prop.min(prop);
    }

    max_prop / min_prop
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_dataset() -> Dataset {
        let x = array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5], [1.0, 1.0]];
        Dataset::new(x, vec![0, 1, 0, 1], 2)
    }

    #[test]
    fn test_dataset_accessors() {
        let dataset = small_dataset();
        assert_eq!(dataset.n_examples(), 4);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.n_classes(), 2);
        assert_eq!(dataset.label(2), 0);
        assert_eq!(dataset.row(1).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_select_rows_preserves_order() {
        let dataset = small_dataset();
        let rows = dataset.select_rows(&[3, 0]);
        assert_eq!(rows.nrows(), 2);
        assert_eq!(rows.row(0).to_vec(), vec![1.0, 1.0]);
        assert_eq!(rows.row(1).to_vec(), vec![0.0, 1.0]);
        assert_eq!(dataset.select_labels(&[3, 0]), vec![1, 0]);
    }

    #[test]
    fn test_fingerprints_match_identical_rows() {
        let dataset = small_dataset();
        let fps = dataset.fingerprints(&[0, 1]);
        assert!(fps.contains(&fingerprint_slice(&[0.0, 1.0])));
        assert!(!fps.contains(&fingerprint_slice(&[0.5, 0.5])));
    }

    #[test]
    fn test_correction_set_alignment() {
        let mut corrections = CorrectionSet::new();
        assert!(corrections.is_empty());
        assert!(!corrections.is_degenerate());

        corrections.push(vec![0.0, 1.0], 1);
        corrections.push(vec![1.0, 0.0], 0);

        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections.rows().len(), corrections.labels().len());
        assert!(!corrections.is_degenerate());
    }

    #[test]
    fn test_correction_set_degenerate() {
        let mut corrections = CorrectionSet::new();
        corrections.push(vec![0.0, 1.0], 1);
        corrections.push(vec![0.5, 1.0], 1);
        assert!(corrections.is_degenerate());
    }

    #[test]
    fn test_label_variance_check_names_the_label() {
        let mut corrections = CorrectionSet::new();
        assert!(corrections.check_label_variance().is_ok());

        corrections.push(vec![0.0, 1.0], 1);
        corrections.push(vec![0.5, 1.0], 1);
        assert!(matches!(
            corrections.check_label_variance(),
            Err(CaipiError::DegenerateCorrections { label: 1 })
        ));

        corrections.push(vec![1.0, 0.0], 0);
        assert!(corrections.check_label_variance().is_ok());
    }

    #[test]
    fn test_correction_set_fingerprint_lookup() {
        let mut corrections = CorrectionSet::new();
        corrections.push(vec![0.25, 0.75], 0);
        assert!(corrections.contains_fingerprint(&fingerprint_slice(&[0.25, 0.75])));
        assert!(!corrections.contains_fingerprint(&fingerprint_slice(&[0.75, 0.25])));
    }

    #[test]
    fn test_assemble_corrections_first() {
        let dataset = small_dataset();
        let mut corrections = CorrectionSet::new();
        corrections.push(vec![9.0, 9.0], 1);

        let (x, y) = assemble_training_set(&dataset, &[0, 2], &corrections);
        assert_eq!(x.nrows(), 3);
        assert_eq!(y.len(), 3);
        assert_eq!(x.row(0).to_vec(), vec![9.0, 9.0]);
        assert_eq!(y, vec![1, 0, 0]);
    }

    #[test]
    fn test_assemble_without_corrections() {
        let dataset = small_dataset();
        let corrections = CorrectionSet::new();
        let (x, y) = assemble_training_set(&dataset, &[1, 3], &corrections);
        assert_eq!(x.nrows(), 2);
        assert_eq!(y, vec![1, 1]);
    }

    #[test]
    fn test_class_balance_uniform() {
        let balance = class_balance(&[0, 1, 0, 1], 2);
        assert!((balance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_balance_skewed() {
        let balance = class_balance(&[0, 0, 0, 1], 2);
        assert!((balance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_balance_missing_class_is_clamped() {
        // Class 2 has zero count; clamped to one virtual example out of 4.
        let balance = class_balance(&[0, 0, 1, 1], 3);
        assert!(balance.is_finite());
        assert!((balance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_balance_empty_is_nan() {
        assert!(class_balance(&[], 2).is_nan());
    }

    #[test]
    fn test_class_balance_at_least_one() {
        let balance = class_balance(&[0, 1, 1, 2, 2, 2], 3);
        assert!(balance >= 1.0);
    }
}
