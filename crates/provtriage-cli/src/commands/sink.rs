//! Sink command - reports the sink type and tier of a provenance graph

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use provtriage_core::ProvenanceGraph;
use provtriage_core::TriageError;
use provtriage_core::classify::{
    SanitizersRegistry, SinkKind, SinkTier, SinkTierRegistry, find_sink_marker,
};
use provtriage_core::graph::FIRST_OPERATION_ID;

use super::load_graph;

#[derive(Args, Debug)]
pub struct SinkArgs {
    /// Provenance graph JSON export
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,
}

impl SinkArgs {
    pub fn run(&self) -> Result<()> {
        let graph = load_graph(&self.graph)?;
        print!("{}", render_sink(&graph)?);
        Ok(())
    }
}

/// Sink line plus one line per sanitizer operation found in the graph.
fn render_sink(graph: &ProvenanceGraph) -> Result<String> {
    let (kind, tier) = classify_sink(graph)?;
    let mut out = format!(
        "{} {} ({})",
        "sink:".cyan().bold(),
        kind.as_str(),
        tier.as_str().dimmed()
    );
    if let Some(marker) = graph
        .get(FIRST_OPERATION_ID)
        .and_then(|root| find_sink_marker(&root.operation))
    {
        out.push_str(&format!(" - {}", marker.description));
    }
    out.push('\n');

    let sanitizers = SanitizersRegistry::with_defaults();
    for node in graph.nodes() {
        if let Some(pattern) = sanitizers.pattern_for(&node.operation) {
            out.push_str(&format!(
                "  {} node {} '{}': {} ({})\n",
                "sanitizer".yellow(),
                node.id,
                node.operation,
                pattern.description,
                pattern.category.as_str()
            ));
        }
    }
    Ok(out)
}

fn classify_sink(graph: &ProvenanceGraph) -> Result<(SinkKind, SinkTier)> {
    let root = graph
        .get(FIRST_OPERATION_ID)
        .ok_or(TriageError::UnknownNode(FIRST_OPERATION_ID))?;
    let kind = SinkKind::from_root_operation(&root.operation)?;
    let tier = SinkTierRegistry::with_defaults().classify(&root.operation)?;
    Ok((kind, tier))
}
