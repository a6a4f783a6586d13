//! Experiment configuration via TOML files
//!
//! Loading follows a defaults-plus-clamping policy: missing sections and
//! keys fall back to defaults, numeric values are clamped into their legal
//! ranges where a silent fix is harmless, and values that would change the
//! protocol's meaning are rejected instead.

use std::fs;
use std::path::Path;

use serde::Serialize;
use toml::Value;

use crate::error::{CaipiError, CaipiResult};

/// Configuration for one interactive run
#[derive(Debug, Clone, Serialize)]
pub struct LoopConfig {
    /// Maximum number of rounds
    pub max_iters: usize,
    /// First round at which explanation/correction activates; −1 disables
    pub start_expl_at: i64,
    /// Cadence (in rounds) of evaluation on the eval subset
    pub eval_iters: usize,
    /// Seed for the run's random streams
    pub seed: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            start_expl_at: -1,
            eval_iters: 10,
            seed: 0,
        }
    }
}

impl LoopConfig {
    /// Reject configurations that would change the protocol's meaning
    pub fn validate(&self) -> CaipiResult<()> {
        if self.eval_iters == 0 {
            return Err(CaipiError::invalid_config("eval_iters", "must be ≥ 1"));
        }
        Ok(())
    }
}

/// Configuration for the cross-validation fold driver
#[derive(Debug, Clone, Serialize)]
pub struct FoldConfig {
    /// Number of stratified folds
    pub n_folds: usize,
    /// Proportion (0..=1) or absolute per-class count (>1) of initially
    /// known training examples
    pub prop_known: f64,
    /// Proportion or absolute per-class count of the test subset used for
    /// the heavier eval cadence
    pub prop_eval: f64,
    /// Seed for fold splitting and subsampling
    pub seed: u64,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            n_folds: 10,
            prop_known: 0.1,
            prop_eval: 0.1,
            seed: 0,
        }
    }
}

impl FoldConfig {
    pub fn validate(&self) -> CaipiResult<()> {
        if self.n_folds < 2 {
            return Err(CaipiError::invalid_config("n_folds", "must be ≥ 2"));
        }
        if self.prop_known < 0.0 {
            return Err(CaipiError::invalid_config("prop_known", "must be ≥ 0"));
        }
        if self.prop_eval < 0.0 {
            return Err(CaipiError::invalid_config("prop_eval", "must be ≥ 0"));
        }
        Ok(())
    }
}

/// Full experiment configuration: `[interaction]` and `[evaluation]` tables
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperimentConfig {
    pub interaction: LoopConfig,
    pub evaluation: FoldConfig,
}

impl ExperimentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CaipiResult<Self> {
        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml_str: &str) -> CaipiResult<Self> {
        let value: Value = toml::from_str(toml_str)
            .map_err(|err| CaipiError::invalid_config("toml", err.to_string()))?;

        let interaction = value
            .get("interaction")
            .and_then(|v| v.as_table())
            .cloned()
            .unwrap_or_default();
        let evaluation = value
            .get("evaluation")
            .and_then(|v| v.as_table())
            .cloned()
            .unwrap_or_default();

        let defaults = LoopConfig::default();
        let loop_config = LoopConfig {
            max_iters: interaction
                .get("max_iters")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as usize)
                .unwrap_or(defaults.max_iters),
            start_expl_at: interaction
                .get("start_expl_at")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(-1))
                .unwrap_or(defaults.start_expl_at),
            eval_iters: interaction
                .get("eval_iters")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(1) as usize)
                .unwrap_or(defaults.eval_iters),
            seed: interaction
                .get("seed")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(defaults.seed),
        };

        let defaults = FoldConfig::default();
        let fold_config = FoldConfig {
            n_folds: evaluation
                .get("n_folds")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(2) as usize)
                .unwrap_or(defaults.n_folds),
            prop_known: evaluation
                .get("prop_known")
                .and_then(read_number)
                .map(|v| v.max(0.0))
                .unwrap_or(defaults.prop_known),
            prop_eval: evaluation
                .get("prop_eval")
                .and_then(read_number)
                .map(|v| v.max(0.0))
                .unwrap_or(defaults.prop_eval),
            seed: evaluation
                .get("seed")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(defaults.seed),
        };

        loop_config.validate()?;
        fold_config.validate()?;

        Ok(Self {
            interaction: loop_config,
            evaluation: fold_config,
        })
    }
}

fn read_number(value: &Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
}
