//! Optree command - prints the operation tree of a provenance graph

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use provtriage_core::{OperationTreeBuilder, OperationTreeNode, ProvenanceGraph};

use super::load_graph;

#[derive(Args, Debug)]
pub struct OptreeArgs {
    /// Provenance graph JSON export
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,
}

impl OptreeArgs {
    pub fn run(&self) -> Result<()> {
        let graph = load_graph(&self.graph)?;
        let tree = build_tree(&graph)?;
        println!("{}", serde_json::to_string_pretty(&tree)?);
        Ok(())
    }
}

pub(crate) fn build_tree(graph: &ProvenanceGraph) -> Result<OperationTreeNode> {
    match OperationTreeBuilder::new(graph).build_from_root()? {
        Some(tree) => Ok(tree),
        None => anyhow::bail!("Root operation has no string semantics; nothing to reduce"),
    }
}
