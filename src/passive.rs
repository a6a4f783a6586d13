//! Passive-evaluation variant
//!
//! Instead of interleaving queries and retraining, this variant trains on
//! the full training set once, collects every correction the oracle would
//! issue, and measures how much of the signal survives in three derived
//! training sets: the corrections alone, the training set plus corrections,
//! and a diagnostic set where each row keeps only its explained features.

use ndarray::Array2;
use serde::Serialize;

use crate::data::{assemble_training_set, CorrectionSet};
use crate::error::{CaipiError, CaipiResult};
use crate::learner::Learner;
use crate::logging::log_diagnostic;
use crate::problem::{PerfRecord, Problem};

/// Report of one passive evaluation
#[derive(Debug, Clone, Serialize)]
pub struct PassiveReport {
    /// Performance after fitting on the full training set
    pub train: PerfRecord,
    /// Performance after fitting on corrections alone; `None` when the
    /// accumulated set is empty or single-class
    pub corrections_only: Option<PerfRecord>,
    /// Performance after fitting on training rows plus corrections
    pub train_with_corrections: Option<PerfRecord>,
    /// Performance of the explanation-masked diagnostic; `None` when that
    /// best-effort path failed
    pub masked: Option<PerfRecord>,
    /// Failure description of the masked path, when it failed
    pub masked_error: Option<String>,
    /// Total corrections accumulated
    pub n_corrections: usize,
    /// Whether the accumulated corrections were single-class
    pub degenerate_corrections: bool,
}

fn fit_and_eval<P: Problem, L: Learner>(
    problem: &P,
    learner: &mut L,
    x: ndarray::ArrayView2<f64>,
    y: &[usize],
    train_examples: &[usize],
    test_examples: &[usize],
) -> PerfRecord {
    learner.fit(x, y);
    problem.eval(learner, train_examples, test_examples, None, 0)
}

fn masked_diagnostic<P: Problem, L: Learner>(
    problem: &P,
    learner: &mut L,
    train_examples: &[usize],
    test_examples: &[usize],
) -> CaipiResult<PerfRecord> {
    let dataset = problem.dataset();
    let explainable: Vec<usize> = train_examples
        .iter()
        .copied()
        .filter(|i| problem.explainable().contains(i))
        .collect();
    if explainable.is_empty() {
        return Err(CaipiError::empty_collection("explainable training examples"));
    }

    // Keep only the features each row's explanation named; everything else
    // is zeroed so the fit sees the stated reasons and nothing more.
    let mut x = Array2::zeros((explainable.len(), dataset.n_features()));
    for (r, &i) in explainable.iter().enumerate() {
        let predicted = learner.predict(dataset.row(i));
        let explanation = problem.explain(learner, train_examples, i, predicted);
        for &(j, _) in explanation.features() {
            x[[r, j]] = dataset.row(i)[j];
        }
    }
    let y = dataset.select_labels(&explainable);

    Ok(fit_and_eval(
        problem,
        learner,
        x.view(),
        &y,
        train_examples,
        test_examples,
    ))
}

/// Run the passive evaluation. The learner is refit several times: the
/// explanation-masked diagnostic explains the baseline fit, and the
/// train-plus-corrections fit runs last when corrections exist.
pub fn run_passive<P: Problem, L: Learner>(
    problem: &P,
    learner: &mut L,
    train_examples: &[usize],
    test_examples: &[usize],
) -> CaipiResult<PassiveReport> {
    if train_examples.is_empty() {
        return Err(CaipiError::empty_collection("training examples"));
    }

    let dataset = problem.dataset();
    let excluded = dataset.fingerprints(test_examples);

    // Baseline: the full training set.
    let train_x = dataset.select_rows(train_examples);
    let train_y = dataset.select_labels(train_examples);
    learner.select_model(train_x.view(), &train_y);
    let train = fit_and_eval(
        problem,
        learner,
        train_x.view(),
        &train_y,
        train_examples,
        test_examples,
    );

    // Every correction the oracle would issue across the explainable
    // training examples, judged against the baseline model.
    let mut corrections = CorrectionSet::new();
    for &i in train_examples {
        if !problem.explainable().contains(&i) {
            continue;
        }
        let predicted = learner.predict(dataset.row(i));
        let explanation = problem.explain(learner, train_examples, i, predicted);
        corrections = problem.query_corrections(corrections, i, predicted, &explanation, &excluded);
    }
    let n_corrections = corrections.len();
    let degenerate = corrections.is_degenerate();

    // Best-effort diagnostic, judged against the baseline model before any
    // correction fit replaces it. Failure is reported, not propagated.
    let (masked, masked_error) =
        match masked_diagnostic(problem, learner, train_examples, test_examples) {
            Ok(perf) => (Some(perf), None),
            Err(err) => {
                let details = err.to_string();
                log_diagnostic("passive masked evaluation", &details)?;
                (None, Some(details))
            }
        };

    let corrections_only = match corrections.to_matrix() {
        Some(x) => match corrections.check_label_variance() {
            Ok(()) => Some(fit_and_eval(
                problem,
                learner,
                x.view(),
                corrections.labels(),
                train_examples,
                test_examples,
            )),
            Err(err) => {
                log_diagnostic("passive corrections-only evaluation", &err.to_string())?;
                None
            }
        },
        None => None,
    };

    let train_with_corrections = if corrections.is_empty() {
        None
    } else {
        let (x, y) = assemble_training_set(dataset, train_examples, &corrections);
        Some(fit_and_eval(
            problem,
            learner,
            x.view(),
            &y,
            train_examples,
            test_examples,
        ))
    };

    Ok(PassiveReport {
        train,
        corrections_only,
        train_with_corrections,
        masked,
        masked_error,
        n_corrections,
        degenerate_corrections: degenerate,
    })
}
