//! Local explanation artifact
//!
//! An explanation attributes a prediction to a small set of features. The
//! interactive loop treats it as opaque: it is produced by the problem's
//! explainer and consumed by the problem's correction oracle.

use serde::{Deserialize, Serialize};

/// A local, per-example explanation: feature/weight pairs sorted by
/// descending absolute weight, plus a discrepancy score quantifying how
/// much attributed mass the kept features miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    features: Vec<(usize, f64)>,
    discrepancy: f64,
}

impl Explanation {
    /// Create an explanation from feature/weight pairs and a discrepancy
    pub fn new(mut features: Vec<(usize, f64)>, discrepancy: f64) -> Self {
        features.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        Self {
            features,
            discrepancy,
        }
    }

    /// The attributed feature/weight pairs, strongest first
    pub fn features(&self) -> &[(usize, f64)] {
        &self.features
    }

    /// Discrepancy score of the explanation
    pub fn discrepancy(&self) -> f64 {
        self.discrepancy
    }

    /// Number of attributed features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check whether the explanation attributes nothing
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Weight attributed to one feature, if present
    pub fn weight_of(&self, feature: usize) -> Option<f64> {
        self.features
            .iter()
            .find(|(j, _)| *j == feature)
            .map(|&(_, w)| w)
    }

    /// The strongest `k` attributed features
    pub fn top_features(&self, k: usize) -> &[(usize, f64)] {
        &self.features[..k.min(self.features.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_sorted_by_magnitude() {
        let expl = Explanation::new(vec![(0, 0.1), (3, -0.9), (1, 0.5)], 0.0);
        let order: Vec<usize> = expl.features().iter().map(|&(j, _)| j).collect();
        assert_eq!(order, vec![3, 1, 0]);
    }

    #[test]
    fn test_weight_lookup() {
        let expl = Explanation::new(vec![(2, 0.4), (5, -0.2)], 0.1);
        assert_eq!(expl.weight_of(2), Some(0.4));
        assert_eq!(expl.weight_of(7), None);
    }

    #[test]
    fn test_top_features_clamped() {
        let expl = Explanation::new(vec![(0, 1.0), (1, 0.5)], 0.0);
        assert_eq!(expl.top_features(5).len(), 2);
        assert_eq!(expl.top_features(1)[0].0, 0);
    }

    #[test]
    fn test_tie_broken_by_index() {
        let expl = Explanation::new(vec![(4, 0.5), (1, -0.5)], 0.0);
        assert_eq!(expl.features()[0].0, 1);
    }
}
