//! Query selection strategies
//!
//! A closed set of strategies, each one selection function over the model's
//! per-candidate class probabilities. Ties are broken by candidate order, so
//! selection is deterministic for everything but [`QueryStrategy::Random`].

use std::str::FromStr;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Query selection strategy for the active learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStrategy {
    /// Uniformly random candidate
    Random,
    /// Candidate whose top class probability is lowest
    LeastConfident,
    /// Candidate with the smallest top-two probability margin
    Margin,
}

impl QueryStrategy {
    /// Select one candidate index. `proba` maps a candidate example index
    /// to its class probability vector; `Random` never calls it.
    pub fn select<F>(&self, candidates: &[usize], mut proba: F, rng: &mut StdRng) -> usize
    where
        F: FnMut(usize) -> Array1<f64>,
    {
        assert!(!candidates.is_empty(), "candidate pool must be non-empty");

        match self {
            QueryStrategy::Random => *candidates
                .choose(rng)
                .expect("non-empty pool always yields a choice"),
            QueryStrategy::LeastConfident => {
                Self::argmin_score(candidates, |i| top_probability(&proba(i)))
            }
            QueryStrategy::Margin => Self::argmin_score(candidates, |i| top_margin(&proba(i))),
        }
    }

    fn argmin_score<F>(candidates: &[usize], mut score: F) -> usize
    where
        F: FnMut(usize) -> f64,
    {
        let mut best = candidates[0];
        let mut best_score = score(best);
        for &i in &candidates[1..] {
            let s = score(i);
            if s < best_score {
                best = i;
                best_score = s;
            }
        }
        best
    }
}

impl FromStr for QueryStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "random" => Ok(QueryStrategy::Random),
            "least-confident" | "uncertainty" => Ok(QueryStrategy::LeastConfident),
            "margin" => Ok(QueryStrategy::Margin),
            other => Err(format!("unknown query strategy: {}", other)),
        }
    }
}

fn top_probability(probs: &Array1<f64>) -> f64 {
    probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn top_margin(probs: &Array1<f64>) -> f64 {
    let mut first = f64::NEG_INFINITY;
    let mut second = f64::NEG_INFINITY;
    for &p in probs.iter() {
        if p > first {
            second = first;
            first = p;
        } else if p > second {
            second = p;
        }
    }
    if second.is_finite() {
        first - second
    } else {
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn probs_for(i: usize) -> Array1<f64> {
        match i {
            0 => array![0.9, 0.05, 0.05], // confident
            1 => array![0.4, 0.35, 0.25], // uncertain, small margin
            _ => array![0.6, 0.3, 0.1],
        }
    }

    #[test]
    fn test_least_confident_picks_lowest_top_probability() {
        let mut rng = StdRng::seed_from_u64(0);
        let selected = QueryStrategy::LeastConfident.select(&[0, 1, 2], probs_for, &mut rng);
        assert_eq!(selected, 1);
    }

    #[test]
    fn test_margin_picks_smallest_gap() {
        let mut rng = StdRng::seed_from_u64(0);
        let selected = QueryStrategy::Margin.select(&[0, 1, 2], probs_for, &mut rng);
        assert_eq!(selected, 1);
    }

    #[test]
    fn test_random_stays_within_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let selected = QueryStrategy::Random.select(&[3, 8, 11], probs_for, &mut rng);
            assert!([3, 8, 11].contains(&selected));
        }
    }

    #[test]
    fn test_ties_broken_by_candidate_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let uniform = |_: usize| array![0.5, 0.5];
        let selected = QueryStrategy::LeastConfident.select(&[9, 4, 2], uniform, &mut rng);
        assert_eq!(selected, 9);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("random".parse(), Ok(QueryStrategy::Random));
        assert_eq!("uncertainty".parse(), Ok(QueryStrategy::LeastConfident));
        assert_eq!("margin".parse(), Ok(QueryStrategy::Margin));
        assert!("gradient".parse::<QueryStrategy>().is_err());
    }
}
