//! Multinomial logistic regression learner
//!
//! A linear softmax classifier trained by seeded full-batch gradient
//! descent. `fit` reinitializes the weights from the configured seed before
//! training, so retraining on the same rows reproduces the same model — the
//! interactive loop relies on that for deterministic traces.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::strategy::QueryStrategy;
use super::Learner;
use crate::data::Label;
use crate::error::{CaipiError, CaipiResult};

/// Configuration for the linear learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearConfig {
    /// Number of input features
    pub n_features: usize,
    /// Number of classes
    pub n_classes: usize,
    /// Full-batch gradient descent epochs per fit
    pub epochs: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// L2 regularization strength
    pub l2: f64,
    /// Seed for weight initialization and the random strategy
    pub seed: u64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            n_features: 2,
            n_classes: 2,
            epochs: 200,
            learning_rate: 0.5,
            l2: 1e-4,
            seed: 42,
        }
    }
}

/// Softmax linear classifier with a pluggable query strategy
pub struct LinearLearner {
    config: LinearConfig,
    strategy: QueryStrategy,
    w: Array2<f64>, // [n_classes, n_features]
    b: Array1<f64>, // [n_classes]
    rng: StdRng,
}

impl LinearLearner {
    /// Create a new learner with seeded weight initialization
    pub fn new(config: LinearConfig, strategy: QueryStrategy) -> Self {
        let (w, b) = Self::init_weights(&config);
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            strategy,
            w,
            b,
            rng,
        }
    }

    /// The configured query strategy
    pub fn strategy(&self) -> QueryStrategy {
        self.strategy
    }

    fn init_weights(config: &LinearConfig) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let scale = (2.0 / config.n_features.max(1) as f64).sqrt();
        let w = Array2::from_shape_fn((config.n_classes, config.n_features), |_| {
            (rng.gen::<f64>() - 0.5) * 2.0 * scale
        });
        let b = Array1::zeros(config.n_classes);
        (w, b)
    }

    fn softmax_rows(logits: &mut Array2<f64>) {
        for mut row in logits.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
    }

    fn softmax(mut logits: Array1<f64>) -> Array1<f64> {
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        logits.mapv_inplace(|v| (v - max).exp());
        let sum = logits.sum();
        logits / sum
    }
}

impl Learner for LinearLearner {
    fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn fit(&mut self, x: ArrayView2<f64>, y: &[Label]) {
        assert_eq!(x.nrows(), y.len(), "rows and labels must align");
        assert_eq!(
            x.ncols(),
            self.config.n_features,
            "feature width must match the configuration"
        );

        // Reinitialize so each fit replaces prior state deterministically.
        let (w, b) = Self::init_weights(&self.config);
        self.w = w;
        self.b = b;

        if x.nrows() == 0 {
            return;
        }
        let n = x.nrows() as f64;

        for _ in 0..self.config.epochs {
            let mut p = x.dot(&self.w.t()); // [n, n_classes]
            p += &self.b;
            Self::softmax_rows(&mut p);

            // Softmax + cross-entropy gradient: p - one_hot(y)
            for (r, &label) in y.iter().enumerate() {
                p[[r, label]] -= 1.0;
            }

            let mut grad_w = p.t().dot(&x);
            grad_w /= n;
            grad_w.scaled_add(self.config.l2, &self.w);

            let mut grad_b = p.sum_axis(Axis(0));
            grad_b /= n;

            self.w.scaled_add(-self.config.learning_rate, &grad_w);
            self.b.scaled_add(-self.config.learning_rate, &grad_b);
        }
    }

    fn predict(&self, x: ArrayView1<f64>) -> Label {
        let probs = self.predict_proba(x);
        let mut best = 0;
        let mut best_p = f64::NEG_INFINITY;
        for (c, &p) in probs.iter().enumerate() {
            if p > best_p {
                best = c;
                best_p = p;
            }
        }
        best
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let logits = self.w.dot(&x) + &self.b;
        Self::softmax(logits)
    }

    fn select_query(&mut self, x: &Array2<f64>, candidates: &[usize]) -> CaipiResult<usize> {
        if candidates.is_empty() {
            return Err(CaipiError::empty_collection("query candidates"));
        }

        let w = &self.w;
        let b = &self.b;
        let selected = self.strategy.select(
            candidates,
            |i| Self::softmax(w.dot(&x.row(i)) + b),
            &mut self.rng,
        );
        Ok(selected)
    }

    fn params(&self) -> Vec<f64> {
        self.w.iter().chain(self.b.iter()).cloned().collect()
    }
}
