//! Stratified cross-validation driver for interactive sessions
//!
//! Splits a dataset into stratified folds and runs one full interactive
//! session per fold, in parallel, with a fresh learner each time. Per fold
//! the initially-known subset is drawn from the training side and the eval
//! subset from the test side, both stratified per class.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{FoldConfig, LoopConfig};
use crate::error::{CaipiError, CaipiResult};
use crate::interactive::{run_interactive, RunTrace};
use crate::learner::Learner;
use crate::problem::Problem;

/// Split labels into `k` stratified folds. Returns `(train, test)` index
/// pairs with both sides sorted; every class is spread round-robin across
/// folds after a seeded per-class shuffle.
pub fn stratified_kfold(
    y: &[usize],
    n_classes: usize,
    k: usize,
    seed: u64,
) -> CaipiResult<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(CaipiError::invalid_config("n_folds", "must be ≥ 2"));
    }
    if y.is_empty() {
        return Err(CaipiError::empty_collection("labels"));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; y.len()];

    for class in 0..n_classes {
        let mut members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
        members.shuffle(&mut rng);
        for (position, &i) in members.iter().enumerate() {
            assignment[i] = position % k;
        }
    }

    let folds = (0..k)
        .map(|fold| {
            let mut train = Vec::new();
            let mut test = Vec::new();
            for (i, &f) in assignment.iter().enumerate() {
                if f == fold {
                    test.push(i);
                } else {
                    train.push(i);
                }
            }
            (train, test)
        })
        .collect();

    Ok(folds)
}

/// Draw a stratified subsample of `examples`. A `prop` in `0..=1` is read
/// as a proportion of the subset size split evenly across classes; a larger
/// value is an absolute per-class count. At least three examples per class
/// are taken when the class has that many.
pub fn subsample_per_class(
    y: &[usize],
    examples: &[usize],
    n_classes: usize,
    prop: f64,
    rng: &mut StdRng,
) -> Vec<usize> {
    let per_class = if prop <= 1.0 {
        let total = (examples.len() as f64 * prop).round() as usize;
        total / n_classes.max(1)
    } else {
        prop.round() as usize
    };
    let per_class = per_class.max(3);

    let mut selected = Vec::new();
    for class in 0..n_classes {
        let mut members: Vec<usize> = examples.iter().copied().filter(|&i| y[i] == class).collect();
        members.shuffle(rng);
        members.truncate(per_class.min(members.len()));
        selected.extend(members);
    }
    selected.sort_unstable();
    selected
}

/// One fold's result
#[derive(Debug, Clone, Serialize)]
pub struct FoldOutcome {
    /// Fold number in `0..n_folds`
    pub fold: usize,
    /// Trace of the fold's interactive session
    pub trace: RunTrace,
}

/// Run one interactive session per stratified fold, in parallel. Each fold
/// gets a fresh learner from `make_learner` and its own seeded subsampling
/// stream, so the outcome is independent of scheduling order.
pub fn run_folds<P, L, F>(
    problem: &P,
    make_learner: F,
    loop_config: &LoopConfig,
    fold_config: &FoldConfig,
) -> CaipiResult<Vec<FoldOutcome>>
where
    P: Problem + Sync,
    L: Learner,
    F: Fn(usize) -> L + Sync,
{
    fold_config.validate()?;

    let y = problem.dataset().labels();
    let n_classes = problem.n_classes();
    let folds = stratified_kfold(y, n_classes, fold_config.n_folds, fold_config.seed)?;

    folds
        .into_par_iter()
        .enumerate()
        .map(|(fold, (train, test))| {
            let mut rng = StdRng::seed_from_u64(fold_config.seed.wrapping_add(fold as u64));
            let known = subsample_per_class(y, &train, n_classes, fold_config.prop_known, &mut rng);
            let eval = subsample_per_class(y, &test, n_classes, fold_config.prop_eval, &mut rng);

            // Each fold gets its own run seed so folds stay independent yet
            // reproducible from the one configured seed.
            let run_config = LoopConfig {
                seed: loop_config.seed.wrapping_add(fold as u64),
                ..loop_config.clone()
            };

            let mut learner = make_learner(fold);
            let trace = run_interactive(
                problem,
                &mut learner,
                &train,
                &known,
                &test,
                &eval,
                &run_config,
                None,
            )?;
            Ok(FoldOutcome { fold, trace })
        })
        .collect()
}
