//! Structural statistics of a provenance graph

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{SanitizerCategory, SanitizersRegistry, SinkTier, SinkTierRegistry};
use crate::error::{Result, TriageError};
use crate::graph::{FIRST_OPERATION_ID, NodeId, ProvenanceGraph};

/// Label fragment marking a value the attacker writes directly.
pub const SET_TAINT_MARKER: &str = "set_taint";

/// An edge to a node that is not newer than its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleEdge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongestPath {
    pub length: usize,
    pub cycles: Vec<CycleEdge>,
}

/// Labels of every operation that matched a sanitizer category, duplicates kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizerCensus {
    pub implicit: Vec<String>,
    pub explicit: Vec<String>,
    pub object_access: Vec<String>,
    pub total_operations: usize,
}

impl SanitizerCensus {
    pub fn collect(graph: &ProvenanceGraph, registry: &SanitizersRegistry) -> Self {
        let mut census = Self::default();
        for node in graph.nodes() {
            let operation = &node.operation;
            if registry.matches_category(operation, SanitizerCategory::Implicit) {
                census.implicit.push(operation.clone());
            }
            if registry.matches_category(operation, SanitizerCategory::Explicit) {
                census.explicit.push(operation.clone());
            }
            if registry.matches_category(operation, SanitizerCategory::ObjectAccess) {
                census.object_access.push(operation.clone());
            }
            census.total_operations += 1;
        }
        census
    }

    pub fn unique(labels: &[String]) -> Vec<String> {
        labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub leaf_ids: Vec<NodeId>,
    pub controllable_leaf_ids: Vec<NodeId>,
    pub sink_tier: SinkTier,
    pub longest_path: LongestPath,
    pub census: SanitizerCensus,
}

impl GraphMetrics {
    pub fn compute(graph: &ProvenanceGraph) -> Result<Self> {
        Self::compute_with(
            graph,
            &SanitizersRegistry::with_defaults(),
            &SinkTierRegistry::with_defaults(),
        )
    }

    pub fn compute_with(
        graph: &ProvenanceGraph,
        sanitizers: &SanitizersRegistry,
        tiers: &SinkTierRegistry,
    ) -> Result<Self> {
        let leaf_ids = graph.leaf_ids();
        let controllable_leaf_ids = controllable_leaves(graph, &leaf_ids);
        let sink_tier = sink_tier(graph, tiers)?;
        let longest_path = longest_path(graph, FIRST_OPERATION_ID)?;
        let census = SanitizerCensus::collect(graph, sanitizers);

        debug!(
            nodes = graph.node_count(),
            leaves = leaf_ids.len(),
            controllable = controllable_leaf_ids.len(),
            tier = sink_tier.as_str(),
            longest_path = longest_path.length,
            "computed graph metrics"
        );

        Ok(Self {
            node_count: graph.node_count(),
            leaf_ids,
            controllable_leaf_ids,
            sink_tier,
            longest_path,
            census,
        })
    }
}

/// Leaves whose only consumer is a `set_taint` operation.
pub fn controllable_leaves(graph: &ProvenanceGraph, leaf_ids: &[NodeId]) -> Vec<NodeId> {
    leaf_ids
        .iter()
        .copied()
        .filter(|&leaf| match graph.flows_to(leaf) {
            [consumer] => graph
                .get(*consumer)
                .is_some_and(|node| node.operation.contains(SET_TAINT_MARKER)),
            _ => false,
        })
        .collect()
}

/// Tier of the sink recorded as the first operation.
pub fn sink_tier(graph: &ProvenanceGraph, tiers: &SinkTierRegistry) -> Result<SinkTier> {
    let root = graph
        .get(FIRST_OPERATION_ID)
        .ok_or(TriageError::UnknownNode(FIRST_OPERATION_ID))?;
    tiers.classify(&root.operation)
}

/// Longest chain of `flows_from` edges starting at `root`.
///
/// Only edges to strictly greater ids are followed; any other edge is recorded
/// as a cycle and skipped. Each node's length is computed once.
pub fn longest_path(graph: &ProvenanceGraph, root: NodeId) -> Result<LongestPath> {
    let mut lengths: HashMap<NodeId, usize> = HashMap::new();
    let mut cycles = Vec::new();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if lengths.contains_key(&id) {
            continue;
        }
        let node = graph.get(id).ok_or(TriageError::UnknownNode(id))?;

        if !expanded {
            stack.push((id, true));
            for &parent in &node.flows_from {
                if parent > id {
                    if !lengths.contains_key(&parent) {
                        stack.push((parent, false));
                    }
                } else {
                    warn!(from = id, to = parent, "detected a cycle");
                    cycles.push(CycleEdge {
                        from: id,
                        to: parent,
                    });
                }
            }
            continue;
        }

        let longest_parent = node
            .flows_from
            .iter()
            .filter(|&&parent| parent > id)
            .filter_map(|parent| lengths.get(parent).copied())
            .max()
            .unwrap_or(0);
        lengths.insert(id, longest_parent + 1);
    }

    Ok(LongestPath {
        length: lengths.get(&root).copied().unwrap_or(1),
        cycles,
    })
}
