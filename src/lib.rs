//! # caipi
//!
//! An interactive explanatory active-learning loop: a learner queries one
//! unknown example per round, an oracle labels it and judges the learner's
//! stated reasons, and rejected reasons come back as synthetic
//! counter-examples folded into the next retraining set.
//!
//! The crate separates three roles:
//!
//! - [`Learner`] — a trainable classifier with a query strategy
//! - [`Problem`] — the dataset, label oracle, explainer, and correction
//!   oracle for one task
//! - the drivers — [`run_interactive`] for one session,
//!   [`run_folds`] for stratified cross-validation, and
//!   [`run_passive`] for the non-interactive variant
//!
//! ## Quick Start
//!
//! ```
//! use caipi::{
//!     LinearConfig, LinearLearner, LoopConfig, Problem, QueryStrategy, ToyConfig, ToyProblem,
//!     run_interactive,
//! };
//!
//! let problem = ToyProblem::new(ToyConfig::default());
//! let n = problem.dataset().n_examples();
//!
//! let mut learner = LinearLearner::new(
//!     LinearConfig {
//!         n_features: problem.dataset().n_features(),
//!         n_classes: problem.dataset().n_classes(),
//!         ..Default::default()
//!     },
//!     QueryStrategy::LeastConfident,
//! );
//!
//! let train: Vec<usize> = (0..n / 2).collect();
//! let test: Vec<usize> = (n / 2..n).collect();
//! let known = &train[..6];
//!
//! let config = LoopConfig { max_iters: 5, ..Default::default() };
//! let trace = run_interactive(
//!     &problem, &mut learner, &train, known, &test, &test, &config, None,
//! )
//! .unwrap();
//!
//! assert_eq!(trace.rounds.len(), 5);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod explanation;
pub mod folds;
pub mod interactive;
pub mod learner;
pub mod logging;
pub mod passive;
pub mod problem;

pub use config::{ExperimentConfig, FoldConfig, LoopConfig};
pub use data::{
    assemble_training_set, class_balance, CorrectionSet, Dataset, Fingerprint, Label,
    SyntheticConfig, SyntheticDataset,
};
pub use error::{CaipiError, CaipiResult};
pub use explanation::Explanation;
pub use folds::{run_folds, stratified_kfold, subsample_per_class, FoldOutcome};
pub use interactive::{run_interactive, RoundRecord, RunTrace};
pub use learner::{Learner, LinearConfig, LinearLearner, QueryStrategy};
pub use logging::{RoundLogEntry, RunLogger};
pub use passive::{run_passive, PassiveReport};
pub use problem::{macro_scores, PerfRecord, Problem, Scores, ToyConfig, ToyProblem};
