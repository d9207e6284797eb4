//! Error types shared by the provenance analyses

use crate::graph::NodeId;

/// Errors raised while loading a provenance graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid provenance JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Node id '{0}' is not numeric")]
    InvalidNodeId(String),
    #[error("Node id {0} appears more than once")]
    DuplicateNodeId(NodeId),
    #[error("Node {node} flows from unknown node {parent}")]
    DanglingEdge { node: NodeId, parent: NodeId },
}

/// Coarse classification of analysis failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedGraph,
    UnsupportedQuery,
    InvalidConfiguration,
}

/// Arity a reduction step expects of a node's parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    AtLeastOne,
    ExactlyOne,
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::AtLeastOne => f.write_str("at least one"),
            Arity::ExactlyOne => f.write_str("exactly one"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriageError {
    #[error("Node {0} is not in the provenance graph")]
    UnknownNode(NodeId),
    #[error("Provenance graph is empty")]
    EmptyGraph,
    #[error("Provenance graph has no leaves to start from")]
    NoLeaves,
    #[error("Node {node} ('{operation}') expects {expected} parent, found {found}")]
    ParentArity {
        node: NodeId,
        operation: String,
        expected: Arity,
        found: usize,
    },
    #[error("Neither field-access parent of node {node} is tainted")]
    UntaintedFieldAccess { node: NodeId },
    #[error("Node {node} feeds back into its own operation tree")]
    CyclicReduction { node: NodeId },
    #[error("Literal node {node} has no value")]
    MissingLiteralValue { node: NodeId },
    #[error("Unhandled sink type: {operation}")]
    UnknownSink { operation: String },
    #[error("'{kind}' operation has no operand")]
    MissingOperand { kind: &'static str },
    #[error("Cannot build a solver query for a '{kind}' root")]
    UnsupportedQuery { kind: &'static str },
    #[error("Cannot sample string families from N({mean}, {std_dev})")]
    InvalidDistribution { mean: f64, std_dev: f64 },
}

impl TriageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TriageError::UnsupportedQuery { .. } => ErrorKind::UnsupportedQuery,
            TriageError::InvalidDistribution { .. } => ErrorKind::InvalidConfiguration,
            _ => ErrorKind::MalformedGraph,
        }
    }
}

pub type Result<T, E = TriageError> = std::result::Result<T, E>;
