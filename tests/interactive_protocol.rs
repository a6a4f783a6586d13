//! End-to-end checks of the interactive round protocol and its drivers.

use std::collections::{BTreeSet, HashSet};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use caipi::{
    run_folds, run_interactive, CaipiResult, FoldConfig, Learner, LinearConfig, LinearLearner,
    Problem,
    LoopConfig, QueryStrategy, RunLogger, ToyConfig, ToyProblem,
};

/// Wrapper that journals every query the inner learner makes.
struct RecordingLearner {
    inner: LinearLearner,
    selections: Vec<usize>,
}

impl RecordingLearner {
    fn new(inner: LinearLearner) -> Self {
        Self {
            inner,
            selections: Vec::new(),
        }
    }
}

impl Learner for RecordingLearner {
    fn select_model(&mut self, x: ArrayView2<f64>, y: &[usize]) {
        self.inner.select_model(x, y);
    }

    fn reseed(&mut self, seed: u64) {
        self.inner.reseed(seed);
    }

    fn fit(&mut self, x: ArrayView2<f64>, y: &[usize]) {
        self.inner.fit(x, y);
    }

    fn predict(&self, x: ArrayView1<f64>) -> usize {
        self.inner.predict(x)
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.inner.predict_proba(x)
    }

    fn select_query(&mut self, x: &Array2<f64>, candidates: &[usize]) -> CaipiResult<usize> {
        let selected = self.inner.select_query(x, candidates)?;
        self.selections.push(selected);
        Ok(selected)
    }

    fn params(&self) -> Vec<f64> {
        self.inner.params()
    }
}

fn problem() -> ToyProblem {
    ToyProblem::new(ToyConfig::default())
}

fn linear_learner(problem: &ToyProblem, strategy: QueryStrategy) -> LinearLearner {
    LinearLearner::new(
        LinearConfig {
            n_features: problem.dataset().n_features(),
            n_classes: problem.dataset().n_classes(),
            ..Default::default()
        },
        strategy,
    )
}

/// Training/test split with one known seed example per class.
fn split(problem: &ToyProblem) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let n = problem.dataset().n_examples();
    let train: Vec<usize> = (0..n / 2).collect();
    let test: Vec<usize> = (n / 2..n).collect();

    let mut seen = vec![false; problem.dataset().n_classes()];
    let known: Vec<usize> = train
        .iter()
        .copied()
        .filter(|&i| {
            let label = problem.dataset().label(i);
            !std::mem::replace(&mut seen[label], true)
        })
        .collect();

    (train, known, test)
}

#[test]
fn known_set_grows_by_one_legal_query_per_round() {
    for strategy in [
        QueryStrategy::Random,
        QueryStrategy::LeastConfident,
        QueryStrategy::Margin,
    ] {
        let problem = problem();
        let (train, known, test) = split(&problem);
        let mut learner = RecordingLearner::new(linear_learner(&problem, strategy));

        let config = LoopConfig {
            max_iters: 12,
            ..Default::default()
        };
        let trace = run_interactive(
            &problem, &mut learner, &train, &known, &test, &test, &config, None,
        )
        .unwrap();
        assert_eq!(trace.rounds.len(), 12);

        // Each query is a distinct training example that was unknown at the
        // time it was picked.
        let train_set: HashSet<usize> = train.iter().copied().collect();
        let mut known_so_far: HashSet<usize> = known.iter().copied().collect();
        for &i in &learner.selections {
            assert!(train_set.contains(&i), "{:?}: query outside train", strategy);
            assert!(
                known_so_far.insert(i),
                "{:?}: example {} queried while already known",
                strategy,
                i
            );
        }
        assert_eq!(known_so_far.len(), known.len() + 12);
    }
}

#[test]
fn run_stops_when_every_training_example_is_known() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::LeastConfident);

    let config = LoopConfig {
        max_iters: 10_000,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    assert_eq!(trace.rounds.len(), train.len() - known.len());
}

#[test]
fn disabled_explanations_never_accumulate_corrections() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::Margin);

    let config = LoopConfig {
        max_iters: 15,
        start_expl_at: -1,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    assert!(trace.rounds.iter().all(|r| r.n_corrections == 0 && !r.explained));
}

#[test]
fn delayed_explanations_activate_at_the_configured_round() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::LeastConfident);

    let config = LoopConfig {
        max_iters: 12,
        start_expl_at: 5,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    for round in &trace.rounds {
        assert_eq!(round.explained, round.t >= 5);
        if round.t < 5 {
            assert_eq!(round.n_corrections, 0);
        }
    }
    let counts: Vec<usize> = trace.rounds.iter().map(|r| r.n_corrections).collect();
    assert!(counts.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn empty_explainable_pool_falls_back_to_all_unknown_examples() {
    let problem = ToyProblem::new(ToyConfig::default()).with_explainable(BTreeSet::new());
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::LeastConfident);

    let config = LoopConfig {
        max_iters: 8,
        start_expl_at: 0,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    assert_eq!(trace.rounds.len(), 8);
    // Explanation is active but the toy oracle has nothing to judge.
    assert!(trace.rounds.iter().all(|r| r.explained));
}

#[test]
fn balance_stays_finite_and_at_least_one() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::Random);

    let config = LoopConfig {
        max_iters: 20,
        start_expl_at: 0,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    for round in &trace.rounds {
        assert!(round.balance.is_finite());
        assert!(round.balance >= 1.0);
    }
}

#[test]
fn eval_subset_is_scored_only_on_cadence_rounds() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::LeastConfident);

    let config = LoopConfig {
        max_iters: 10,
        eval_iters: 4,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem, &mut learner, &train, &known, &test, &test, &config, None,
    )
    .unwrap();
    for round in &trace.rounds {
        assert_eq!(round.perf.eval.is_some(), round.t % 4 == 0);
    }
}

#[test]
fn fixed_seed_runs_are_identical() {
    let run = || {
        let problem = problem();
        let (train, known, test) = split(&problem);
        let mut learner = linear_learner(&problem, QueryStrategy::Random);
        let config = LoopConfig {
            max_iters: 10,
            start_expl_at: 3,
            eval_iters: 2,
            ..Default::default()
        };
        let trace = run_interactive(
            &problem, &mut learner, &train, &known, &test, &test, &config, None,
        )
        .unwrap();
        serde_json::to_string(&trace).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn logger_receives_one_entry_per_round() {
    let problem = problem();
    let (train, known, test) = split(&problem);
    let mut learner = linear_learner(&problem, QueryStrategy::LeastConfident);
    let mut logger = RunLogger::new(usize::MAX);

    let config = LoopConfig {
        max_iters: 6,
        eval_iters: 2,
        ..Default::default()
    };
    let trace = run_interactive(
        &problem,
        &mut learner,
        &train,
        &known,
        &test,
        &test,
        &config,
        Some(&mut logger),
    )
    .unwrap();

    assert_eq!(logger.entries().len(), trace.rounds.len());
    for (entry, round) in logger.entries().iter().zip(trace.rounds.iter()) {
        assert_eq!(entry.t, round.t);
        assert_eq!(entry.selected, round.selected);
        assert_eq!(entry.n_corrections, round.n_corrections);
        assert_eq!(entry.eval_f1.is_some(), round.perf.eval.is_some());
    }
}

#[test]
fn fold_driver_runs_every_fold() {
    let problem = problem();
    let n_features = problem.dataset().n_features();
    let n_classes = problem.dataset().n_classes();

    let loop_config = LoopConfig {
        max_iters: 4,
        start_expl_at: 0,
        ..Default::default()
    };
    let fold_config = FoldConfig {
        n_folds: 4,
        ..Default::default()
    };

    let outcomes = run_folds(
        &problem,
        |fold| {
            LinearLearner::new(
                LinearConfig {
                    n_features,
                    n_classes,
                    seed: 100 + fold as u64,
                    ..Default::default()
                },
                QueryStrategy::LeastConfident,
            )
        },
        &loop_config,
        &fold_config,
    )
    .unwrap();

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert_eq!(outcome.trace.rounds.len(), 4);
        assert_eq!(outcome.trace.params.len(), 4);
    }
}
