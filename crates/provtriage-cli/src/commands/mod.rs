//! CLI command implementations

pub mod exploit;
pub mod optree;
pub mod sink;
pub mod smt;
pub mod triage;

pub use exploit::ExploitArgs;
pub use optree::OptreeArgs;
pub use sink::SinkArgs;
pub use smt::SmtArgs;
pub use triage::TriageArgs;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use provtriage_core::ProvenanceGraph;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the operation tree of a provenance graph as JSON
    Optree(OptreeArgs),

    /// Emit the SMT-LIB query proving the exploit payload reaches the sink
    Smt(SmtArgs),

    /// Show the sink type and tier of a provenance graph
    Sink(SinkArgs),

    /// Estimate the exploitability of one or more provenance graphs
    Triage(TriageArgs),

    /// Read a solver model and print the exploit string it proves
    Exploit(ExploitArgs),
}

pub(crate) fn load_graph(path: &Path) -> Result<ProvenanceGraph> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read provenance graph '{}'", path.display()))?;
    ProvenanceGraph::from_json(&source)
        .with_context(|| format!("Failed to load provenance graph '{}'", path.display()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::PathBuf;

    pub const EXEC_GRAPH: &str = r#"{
        "1": { "operation": "call:exec", "flows_from": ["2"], "tainted": true },
        "2": { "operation": "+", "flows_from": ["3", "4"], "tainted": true },
        "3": { "operation": "Untainted", "flows_from": [], "value": "ls ", "tainted": false },
        "4": { "operation": "model:set_taint", "flows_from": ["5"], "tainted": true },
        "5": { "operation": "Tainted", "flows_from": [], "value": "dir", "tainted": true }
    }"#;

    pub fn write_graph(dir: &tempfile::TempDir, name: &str, source: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, source).unwrap();
        path
    }
}
