//! Smt command - emits the solver query for a provenance graph

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use provtriage_core::{ConstraintSynthesizer, ProvenanceGraph, SolverQuery};
use tracing::info;

use super::load_graph;
use super::optree::build_tree;

#[derive(Args, Debug)]
pub struct SmtArgs {
    /// Provenance graph JSON export
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Write the query to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SmtArgs {
    pub fn run(&self) -> Result<()> {
        let graph = load_graph(&self.graph)?;
        let query = synthesize_query(&graph)?;

        match &self.output {
            Some(path) => {
                fs::write(path, format!("{query}\n"))
                    .with_context(|| format!("Failed to write query to '{}'", path.display()))?;
                info!(path = %path.display(), inputs = query.input_count, "wrote solver query");
            }
            None => println!("{query}"),
        }
        Ok(())
    }
}

fn synthesize_query(graph: &ProvenanceGraph) -> Result<SolverQuery> {
    let tree = build_tree(graph)?;
    Ok(ConstraintSynthesizer::synthesize(&tree)?)
}
