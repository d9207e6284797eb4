//! Sink markers and sink tiers
//!
//! The instrumenter records the dangerous call a flow ends in as a `call:`
//! operation. Exact markers select the operation-tree wrapper; the looser tier
//! sets decide how many independent attacker-controlled fragments the sink
//! needs before it is exploitable.

use serde::Serialize;

use super::sanitizers::operation_matches_any;
use crate::error::{Result, TriageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Code evaluation: `eval`, `Function`.
    Eval,
    /// Shell command execution: `exec`, `execSync`.
    Exec,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Eval => "eval",
            SinkKind::Exec => "exec",
        }
    }

    /// Payload the synthesized string must contain to prove exploitability.
    pub fn exploit_payload(&self) -> &'static str {
        match self {
            SinkKind::Exec => "$(touch success);#",
            SinkKind::Eval => "__proto__+global.CTF();//",
        }
    }

    /// Coarse sink type of a root operation label, used to pick the exploit harness.
    ///
    /// Matching is case sensitive and checks `exec` before `eval`/`Function`.
    pub fn from_root_operation(operation: &str) -> Result<Self> {
        if operation.contains("exec") {
            Ok(SinkKind::Exec)
        } else if operation.contains("eval") || operation.contains("Function") {
            Ok(SinkKind::Eval)
        } else {
            Err(TriageError::UnknownSink {
                operation: operation.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkMarker {
    pub operation: String,
    pub kind: SinkKind,
    pub description: String,
}

impl SinkMarker {
    pub fn new(operation: &str, kind: SinkKind, description: &str) -> Self {
        Self {
            operation: operation.to_string(),
            kind,
            description: description.to_string(),
        }
    }
}

pub fn default_sink_markers() -> Vec<SinkMarker> {
    vec![
        SinkMarker::new("call:eval", SinkKind::Eval, "Dynamic code evaluation"),
        SinkMarker::new("call:exec", SinkKind::Exec, "Shell command execution"),
        SinkMarker::new(
            "call:execSync",
            SinkKind::Exec,
            "Synchronous shell command execution",
        ),
        SinkMarker::new(
            "call:Function",
            SinkKind::Eval,
            "Dynamic function construction",
        ),
    ]
}

/// Exact marker for a sink call label, if it is one of the known sink calls.
pub fn find_sink_marker(operation: &str) -> Option<SinkMarker> {
    default_sink_markers()
        .into_iter()
        .find(|marker| marker.operation == operation)
}

/// How many surviving string families a sink needs to be exploitable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkTier {
    /// Execute-only sinks: one attacker-controlled fragment suffices.
    T1,
    /// Richer sinks needing control over at least two fragments (a key and a value).
    T2,
}

impl SinkTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkTier::T1 => "t1",
            SinkTier::T2 => "t2",
        }
    }

    pub fn accepts(&self, string_families: u32) -> bool {
        match self {
            SinkTier::T1 => true,
            SinkTier::T2 => string_families > 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkTierRegistry {
    t1: Vec<String>,
    t2: Vec<String>,
}

impl Default for SinkTierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SinkTierRegistry {
    pub fn with_defaults() -> Self {
        Self {
            t1: vec!["exec".to_string()],
            t2: ["eval", "Function", "execSync"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Tier of a sink label; the t2 set is checked first since `execSync` also matches `exec`.
    pub fn classify(&self, operation: &str) -> Result<SinkTier> {
        if operation_matches_any(operation, self.t2.iter().map(String::as_str)) {
            Ok(SinkTier::T2)
        } else if operation_matches_any(operation, self.t1.iter().map(String::as_str)) {
            Ok(SinkTier::T1)
        } else {
            Err(TriageError::UnknownSink {
                operation: operation.to_string(),
            })
        }
    }
}
