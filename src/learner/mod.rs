//! Learner contract and built-in implementations
//!
//! The interactive loop consumes learners through the [`Learner`] trait:
//! fit on rows, predict labels and class probabilities, pick one query from
//! a candidate pool, and expose an opaque parameter snapshot for the trace.

pub mod linear;
pub mod strategy;

pub use linear::{LinearConfig, LinearLearner};
pub use strategy::QueryStrategy;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::data::Label;
use crate::error::CaipiResult;

/// Trainable classifier consumed by the interactive loop
pub trait Learner {
    /// Optional hyperparameter search before the initial fit. May be a no-op.
    fn select_model(&mut self, _x: ArrayView2<f64>, _y: &[Label]) {}

    /// Reseed every random stream the learner owns. The drivers call this
    /// with the run seed before the warm start; learners without random
    /// state may ignore it.
    fn reseed(&mut self, _seed: u64) {}

    /// Supervised training on the given rows; replaces prior model state
    fn fit(&mut self, x: ArrayView2<f64>, y: &[Label]);

    /// Predict the label of a single example
    fn predict(&self, x: ArrayView1<f64>) -> Label;

    /// Predict per-class probabilities for a single example
    fn predict_proba(&self, x: ArrayView1<f64>) -> Array1<f64>;

    /// Pick exactly one index from a non-empty candidate pool using the
    /// configured query strategy. Fails on an empty pool.
    fn select_query(&mut self, x: &ndarray::Array2<f64>, candidates: &[usize])
        -> CaipiResult<usize>;

    /// Opaque parameter snapshot, retained for diagnostics only
    fn params(&self) -> Vec<f64>;
}
