//! Provenance graph model
//!
//! A provenance graph records, for every runtime operation observed by the
//! taint instrumenter, which earlier values it was computed from. Edges are
//! stored as `flows_from` (node -> its data sources) and the reverse
//! `flows_to` relation is derived once at construction time.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Deserialize;

use crate::error::GraphError;

pub type NodeId = u64;

/// Id the instrumenter gives to the first recorded operation (the sink call).
pub const FIRST_OPERATION_ID: NodeId = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceNode {
    pub id: NodeId,
    pub operation: String,
    pub flows_from: Vec<NodeId>,
    pub value: Option<String>,
    pub tainted: bool,
}

impl ProvenanceNode {
    pub fn new(id: NodeId, operation: &str, flows_from: Vec<NodeId>) -> Self {
        Self {
            id,
            operation: operation.to_string(),
            flows_from,
            value: None,
            tainted: false,
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn tainted(mut self) -> Self {
        self.tainted = true;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.flows_from.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    operation: String,
    #[serde(default)]
    flows_from: Vec<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    tainted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceGraph {
    nodes: BTreeMap<NodeId, ProvenanceNode>,
    flows_to: BTreeMap<NodeId, Vec<NodeId>>,
}

impl ProvenanceGraph {
    /// Builds a graph from its nodes and derives `flows_to`.
    ///
    /// Ids must be unique and every `flows_from` entry must name a node in the graph.
    pub fn new(nodes: impl IntoIterator<Item = ProvenanceNode>) -> Result<Self, GraphError> {
        let mut by_id: BTreeMap<NodeId, ProvenanceNode> = BTreeMap::new();
        for node in nodes {
            match by_id.entry(node.id) {
                Entry::Occupied(_) => return Err(GraphError::DuplicateNodeId(node.id)),
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
        }
        let nodes = by_id;

        let mut flows_to: BTreeMap<NodeId, Vec<NodeId>> =
            nodes.keys().map(|&id| (id, Vec::new())).collect();

        for node in nodes.values() {
            for &parent in &node.flows_from {
                let children = flows_to.get_mut(&parent).ok_or(GraphError::DanglingEdge {
                    node: node.id,
                    parent,
                })?;
                // Nodes are visited in ascending order, so a repeat can only be the last entry.
                if children.last() != Some(&node.id) {
                    children.push(node.id);
                }
            }
        }

        Ok(Self { nodes, flows_to })
    }

    /// Parses the instrumenter's JSON export: an object keyed by numeric id strings.
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        let raw: BTreeMap<String, RawNode> = serde_json::from_str(source)?;
        let mut nodes = Vec::with_capacity(raw.len());

        for (key, raw_node) in raw {
            let id = parse_node_id(&key)?;
            let flows_from = raw_node
                .flows_from
                .iter()
                .map(|parent| parse_node_id(parent))
                .collect::<Result<Vec<_>, _>>()?;
            nodes.push(ProvenanceNode {
                id,
                operation: raw_node.operation,
                flows_from,
                value: raw_node.value,
                tainted: raw_node.tainted,
            });
        }

        Self::new(nodes)
    }

    pub fn get(&self, id: NodeId) -> Option<&ProvenanceNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProvenanceNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes consuming the output of `id`, in ascending id order.
    pub fn flows_to(&self, id: NodeId) -> &[NodeId] {
        self.flows_to.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Smallest node id, the root of the operation tree.
    pub fn min_id(&self) -> Option<NodeId> {
        self.nodes.keys().next().copied()
    }

    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.is_leaf())
            .map(|node| node.id)
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.flows_to.values().map(Vec::len).sum()
    }
}

fn parse_node_id(raw: &str) -> Result<NodeId, GraphError> {
    raw.trim()
        .parse()
        .map_err(|_| GraphError::InvalidNodeId(raw.to_string()))
}
