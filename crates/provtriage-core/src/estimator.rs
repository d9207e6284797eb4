//! Monte Carlo exploitability estimation
//!
//! Runs the attacker automaton many times from random leaves with a random
//! starting number of string families and reports the fraction of runs that
//! reach the accept state.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::debug;

use crate::automaton::{AttackerAutomaton, DEFAULT_MAX_HOPS};
use crate::error::{Result, TriageError};
use crate::graph::ProvenanceGraph;
use crate::metrics::GraphMetrics;

/// Average count of attacker-controllable leaves across observed graphs.
pub const DEFAULT_MU: u32 = 3;
/// Average provenance graph depth across observed graphs.
pub const DEFAULT_AVERAGE_DEPTH: f64 = 36.88;
pub const DEFAULT_TRIALS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Low,
    Medium,
    High,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Low => "LOW",
            Rating::Medium => "MEDIUM",
            Rating::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bands are closed at the top: exactly 1/3 is LOW, exactly 2/3 is MEDIUM.
pub fn score_to_rating(score: f64) -> Rating {
    if score <= 1.0 / 3.0 {
        Rating::Low
    } else if score <= 2.0 / 3.0 {
        Rating::Medium
    } else {
        Rating::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Expected number of attacker-controllable leaves.
    pub mu: u32,
    /// Per-hop baseline leakage probability.
    pub epsilon: f64,
    pub trials: usize,
    /// Hop limit of a single attacker run.
    pub max_hops: usize,
}

impl EstimatorConfig {
    /// Leakage derived from the population statistics: `1 / (mu * depth)`.
    pub fn from_population(mu: u32, average_depth: f64, trials: usize) -> Self {
        Self {
            mu,
            epsilon: 1.0 / (f64::from(mu) * average_depth),
            trials,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::from_population(DEFAULT_MU, DEFAULT_AVERAGE_DEPTH, DEFAULT_TRIALS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub successes: usize,
    pub trials: usize,
    pub score: f64,
    pub rating: Rating,
}

/// Owns its random generator so that a seeded estimator is reproducible and
/// independent of any other estimator in the process.
pub struct MonteCarloEstimator<R> {
    config: EstimatorConfig,
    rng: R,
}

impl<R: Rng> MonteCarloEstimator<R> {
    pub fn new(config: EstimatorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(&mut self, graph: &ProvenanceGraph, metrics: &GraphMetrics) -> Result<Estimate> {
        if metrics.leaf_ids.is_empty() {
            return Err(TriageError::NoLeaves);
        }

        let automaton = AttackerAutomaton::new(graph, metrics.sink_tier, self.config.epsilon)
            .with_max_hops(self.config.max_hops);
        let spread = (metrics.controllable_leaf_ids.len() + 1) as f64;
        let families = Normal::new(f64::from(self.config.mu), spread).map_err(|_| {
            TriageError::InvalidDistribution {
                mean: f64::from(self.config.mu),
                std_dev: spread,
            }
        })?;
        let ceiling = f64::from(self.config.mu) + 1.0;

        let mut successes = 0;
        for _ in 0..self.config.trials {
            let sample: f64 = families.sample(&mut self.rng);
            let start_families = sample.abs().clamp(1.0, ceiling) as u32;
            let start = metrics.leaf_ids[self.rng.random_range(0..metrics.leaf_ids.len())];
            if automaton.run(start_families, start, &mut self.rng).is_accepted() {
                successes += 1;
            }
        }

        let score = if self.config.trials == 0 {
            0.0
        } else {
            successes as f64 / self.config.trials as f64
        };
        let rating = score_to_rating(score);
        debug!(successes, trials = self.config.trials, score, %rating, "estimated exploitability");

        Ok(Estimate {
            successes,
            trials: self.config.trials,
            score,
            rating,
        })
    }
}
