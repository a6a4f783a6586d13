//! The interactive round protocol
//!
//! One call to [`run_interactive`] drives a full session: per round the
//! learner picks an unknown example, the oracle labels it (and, once
//! explanation is active, judges the learner's stated reasons), the
//! correction accumulator grows, and the learner is retrained on known
//! rows plus all corrections. The trace records one entry per completed
//! round together with a parameter snapshot of the retrained model.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::LoopConfig;
use crate::data::{assemble_training_set, class_balance, CorrectionSet};
use crate::error::{CaipiError, CaipiResult};
use crate::learner::Learner;
use crate::logging::{RoundLogEntry, RunLogger};
use crate::problem::{PerfRecord, Problem};

/// Outcome of one completed round
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    /// Round counter, starting at zero
    pub t: usize,
    /// Index of the example queried this round
    pub selected: usize,
    /// Whether explanation/correction was active this round
    pub explained: bool,
    /// Performance after retraining
    pub perf: PerfRecord,
    /// Size of the correction accumulator after this round
    pub n_corrections: usize,
    /// Class balance ratio of this round's training set
    pub balance: f64,
}

/// Full trace of one interactive session
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunTrace {
    /// One record per completed round
    pub rounds: Vec<RoundRecord>,
    /// Parameter snapshot of the model after each round's retraining
    pub params: Vec<Vec<f64>>,
}

fn validate_partition(train_examples: &[usize], known_seed: &[usize]) -> CaipiResult<()> {
    if known_seed.is_empty() {
        return Err(CaipiError::invalid_partition(
            "known seed",
            "at least one example must be known before the loop starts",
        ));
    }

    let train: HashSet<usize> = train_examples.iter().copied().collect();
    if train.len() != train_examples.len() {
        return Err(CaipiError::invalid_partition(
            "training set",
            "training indices must be distinct",
        ));
    }
    let seed: HashSet<usize> = known_seed.iter().copied().collect();
    if seed.len() != known_seed.len() {
        return Err(CaipiError::invalid_partition(
            "known seed",
            "known indices must be distinct",
        ));
    }
    if let Some(&stray) = known_seed.iter().find(|i| !train.contains(i)) {
        return Err(CaipiError::invalid_partition(
            "known seed",
            format!("index {} is not a training example", stray),
        ));
    }

    Ok(())
}

/// Run the interactive protocol for up to `config.max_iters` rounds.
///
/// The loop owns the known/unknown split: `known_seed` is copied and grows
/// by exactly one index per round until every training example is known or
/// the round budget is exhausted. Explanation and correction activate from
/// round `config.start_expl_at` onward (never, when negative); the eval
/// subset is scored every `config.eval_iters`-th round.
pub fn run_interactive<P: Problem, L: Learner>(
    problem: &P,
    learner: &mut L,
    train_examples: &[usize],
    known_seed: &[usize],
    test_examples: &[usize],
    eval_examples: &[usize],
    config: &LoopConfig,
    mut logger: Option<&mut RunLogger>,
) -> CaipiResult<RunTrace> {
    config.validate()?;
    validate_partition(train_examples, known_seed)?;

    // The run seed governs the learner's random streams; two runs with the
    // same configuration replay identically regardless of how the learner
    // was seeded at construction.
    learner.reseed(config.seed);

    let dataset = problem.dataset();
    // Rows identical to a held-out test row must never enter training via
    // a correction.
    let excluded = dataset.fingerprints(test_examples);

    let mut known: Vec<usize> = known_seed.to_vec();
    let mut corrections = CorrectionSet::new();
    let mut trace = RunTrace::default();

    // Warm start on the seed before the first query.
    let seed_x = dataset.select_rows(&known);
    let seed_y = dataset.select_labels(&known);
    learner.select_model(seed_x.view(), &seed_y);
    learner.fit(seed_x.view(), &seed_y);

    for t in 0..config.max_iters {
        if known.len() >= train_examples.len() {
            break;
        }

        let known_set: HashSet<usize> = known.iter().copied().collect();
        let unknown: Vec<usize> = train_examples
            .iter()
            .copied()
            .filter(|i| !known_set.contains(i))
            .collect();

        // Prefer unknown examples whose explanations the oracle can judge;
        // fall back to the full unknown pool when none remain.
        let explainable = problem.explainable();
        let preferred: Vec<usize> = unknown
            .iter()
            .copied()
            .filter(|i| explainable.contains(i))
            .collect();
        let pool = if preferred.is_empty() {
            &unknown
        } else {
            &preferred
        };

        let i = learner.select_query(dataset.features(), pool)?;
        if known_set.contains(&i) || !unknown.contains(&i) {
            return Err(CaipiError::contract_violation(
                i,
                "query must be an unknown training example",
            ));
        }

        let explained = config.start_expl_at >= 0 && t as i64 >= config.start_expl_at;
        let predicted = learner.predict(dataset.row(i));
        let explanation = explained.then(|| problem.explain(learner, &known, i, predicted));
        let actual = problem.query_label(i);

        known.push(i);

        if let Some(explanation) = &explanation {
            let before = corrections.len();
            corrections = problem.query_corrections(corrections, i, predicted, explanation, &excluded);
            if corrections.len() < before {
                return Err(CaipiError::contract_violation(
                    i,
                    "correction accumulator shrank",
                ));
            }
        }

        let (x, y) = assemble_training_set(dataset, &known, &corrections);
        let balance = class_balance(&y, problem.n_classes());
        learner.fit(x.view(), &y);
        trace.params.push(learner.params());

        let do_eval = t % config.eval_iters == 0;
        let perf = problem.eval(
            learner,
            &known,
            test_examples,
            do_eval.then_some(eval_examples),
            t,
        );

        if let Some(logger) = logger.as_deref_mut() {
            logger.record(RoundLogEntry {
                sequence: 0,
                t,
                selected: i,
                predicted,
                actual,
                explained,
                n_corrections: corrections.len(),
                balance,
                test_f1: perf.test.f1,
                eval_f1: perf.eval.as_ref().map(|scores| scores.f1),
                timestamp_ms: 0,
            })?;
        }

        trace.rounds.push(RoundRecord {
            t,
            selected: i,
            explained,
            perf,
            n_corrections: corrections.len(),
            balance,
        });
    }

    Ok(trace)
}
