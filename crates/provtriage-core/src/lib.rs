//! Exploitability triage for taint provenance graphs
//!
//! Two analyses share the [`graph::ProvenanceGraph`] model: the operation
//! tree and solver query pipeline ([`optree`], [`smt`]) and the Monte Carlo
//! exploitability estimate ([`metrics`], [`automaton`], [`estimator`],
//! [`triage`]).

pub mod automaton;
pub mod classify;
pub mod config;
pub mod error;
pub mod estimator;
pub mod graph;
pub mod metrics;
pub mod optree;
pub mod smt;
pub mod solver_output;
pub mod triage;

pub use error::{ErrorKind, GraphError, Result, TriageError};
pub use estimator::{EstimatorConfig, MonteCarloEstimator, Rating, score_to_rating};
pub use graph::{NodeId, ProvenanceGraph, ProvenanceNode};
pub use optree::{OperationTreeBuilder, OperationTreeNode};
pub use smt::{ConstraintSynthesizer, SolverQuery};
pub use triage::{TriageReport, triage};
