//! Probabilistic attacker automaton
//!
//! The attacker starts at a leaf holding some number of independent
//! attacker-controlled string fragments ("string families") and walks the
//! `flows_to` edges towards the sink. Every hop may block the attacker, with a
//! probability that depends on what kind of operation the data passes
//! through. Reaching a node without consumers is a successful exploit when
//! enough families survive for the sink tier.

use rand::Rng;
use tracing::trace;

use crate::classify::{SanitizerCategory, SanitizersRegistry, SinkTier};
use crate::graph::{NodeId, ProvenanceGraph};

/// Name of the synthetic accept state.
pub const ACCEPT_STATE: &str = "S";

pub const DEFAULT_MAX_HOPS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Reached the sink with enough families: the accept state `S`.
    Accepted,
    /// Stopped at `at` without exploiting the sink.
    Halted { at: NodeId },
}

impl RunOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RunOutcome::Accepted)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Accepted => f.write_str(ACCEPT_STATE),
            RunOutcome::Halted { at } => write!(f, "{at}"),
        }
    }
}

/// Survival odds of one hop and what surviving does to the family count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub survival: f64,
    pub effect: HopEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopEffect {
    None,
    /// One fragment is lost.
    DropFamily,
    /// At most two fragments remain distinguishable.
    CapAtTwo,
}

impl HopEffect {
    pub fn apply(&self, families: u32) -> u32 {
        match self {
            HopEffect::None => families,
            HopEffect::DropFamily => families.saturating_sub(1),
            HopEffect::CapAtTwo => families.min(2),
        }
    }
}

pub struct AttackerAutomaton<'a> {
    graph: &'a ProvenanceGraph,
    tier: SinkTier,
    epsilon: f64,
    sanitizers: SanitizersRegistry,
    max_hops: usize,
}

impl<'a> AttackerAutomaton<'a> {
    pub fn new(graph: &'a ProvenanceGraph, tier: SinkTier, epsilon: f64) -> Self {
        Self {
            graph,
            tier,
            epsilon,
            sanitizers: SanitizersRegistry::with_defaults(),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn tier(&self) -> SinkTier {
        self.tier
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Odds of passing through an operation labelled `operation`.
    pub fn hop(&self, families: u32, operation: &str) -> Hop {
        let f = f64::from(families);
        match self.sanitizers.category_of(operation) {
            Some(SanitizerCategory::Implicit) => Hop {
                survival: (f - 1.0) / f,
                effect: HopEffect::DropFamily,
            },
            Some(SanitizerCategory::Explicit) => Hop {
                survival: 1.0 / f,
                effect: HopEffect::CapAtTwo,
            },
            Some(SanitizerCategory::ObjectAccess) => Hop {
                survival: 1.0 - f * self.epsilon,
                effect: HopEffect::None,
            },
            None => Hop {
                survival: 1.0 - self.epsilon,
                effect: HopEffect::None,
            },
        }
    }

    /// Walks from `start` until the attacker is blocked or reaches a sink.
    ///
    /// A walk longer than the hop limit (only possible on cyclic graphs whose
    /// hops all survive with certainty) halts where it stands.
    pub fn run<R: Rng + ?Sized>(&self, families: u32, start: NodeId, rng: &mut R) -> RunOutcome {
        let mut current = start;
        let mut families = families;

        for _ in 0..self.max_hops {
            if families < 1 {
                return RunOutcome::Halted { at: current };
            }

            let next_states = self.graph.flows_to(current);
            if next_states.is_empty() {
                return if self.tier.accepts(families) {
                    RunOutcome::Accepted
                } else {
                    RunOutcome::Halted { at: current }
                };
            }

            let next = next_states[rng.random_range(0..next_states.len())];
            let operation = self
                .graph
                .get(next)
                .map(|node| node.operation.as_str())
                .unwrap_or_default();
            let hop = self.hop(families, operation);

            if rng.random::<f64>() < hop.survival {
                families = hop.effect.apply(families);
                trace!(from = current, to = next, families, "attacker advanced");
                current = next;
            } else {
                trace!(from = current, to = next, "attacker blocked");
                return RunOutcome::Halted { at: current };
            }
        }

        RunOutcome::Halted { at: current }
    }
}
