//! Operation tree reduction
//!
//! Collapses a provenance graph into the handful of operations that matter
//! for string construction: concatenations, base-string derivations, literals
//! and the sink wrapper. Calls, imprecise operations, field accesses and
//! unary operations are transparent; everything else is pruned.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, trace};

use crate::classify::{
    LiteralKind, OperationCategory, OperationClassifier, SinkKind, StringOpKind,
};
use crate::error::{Arity, Result, TriageError};
use crate::graph::{NodeId, ProvenanceGraph, ProvenanceNode};

const STRING_ANNOTATION: &str = "[String";
const STRING_ANNOTATION_CHARS: &str = "[String: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Concat,
    Base,
    Exec,
    Eval,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Concat => "concat",
            OperationKind::Base => "base",
            OperationKind::Exec => "exec",
            OperationKind::Eval => "eval",
        }
    }

    pub fn sink(&self) -> Option<SinkKind> {
        match self {
            OperationKind::Exec => Some(SinkKind::Exec),
            OperationKind::Eval => Some(SinkKind::Eval),
            OperationKind::Concat | OperationKind::Base => None,
        }
    }
}

impl From<StringOpKind> for OperationKind {
    fn from(kind: StringOpKind) -> Self {
        match kind {
            StringOpKind::Concat => OperationKind::Concat,
            StringOpKind::Base => OperationKind::Base,
        }
    }
}

impl From<SinkKind> for OperationKind {
    fn from(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Exec => OperationKind::Exec,
            SinkKind::Eval => OperationKind::Eval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationTreeNode {
    Operation {
        kind: OperationKind,
        operands: Vec<OperationTreeNode>,
    },
    Literal {
        kind: LiteralKind,
        value: String,
    },
}

impl OperationTreeNode {
    pub fn operation(kind: OperationKind, operands: Vec<OperationTreeNode>) -> Self {
        OperationTreeNode::Operation { kind, operands }
    }

    pub fn input(value: &str) -> Self {
        OperationTreeNode::Literal {
            kind: LiteralKind::Input,
            value: value.to_string(),
        }
    }

    pub fn constant(value: &str) -> Self {
        OperationTreeNode::Literal {
            kind: LiteralKind::Constant,
            value: value.to_string(),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            OperationTreeNode::Operation { kind, .. } => kind.as_str(),
            OperationTreeNode::Literal { kind, .. } => kind.as_str(),
        }
    }
}

/// `Operation` serializes as `{kind: {op0: .., op1: ..}}`, `Literal` as `{kind: value}`.
impl Serialize for OperationTreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            OperationTreeNode::Operation { kind, operands } => {
                map.serialize_entry(kind.as_str(), &Operands(operands))?;
            }
            OperationTreeNode::Literal { kind, value } => {
                map.serialize_entry(kind.as_str(), value)?;
            }
        }
        map.end()
    }
}

struct Operands<'a>(&'a [OperationTreeNode]);

impl Serialize for Operands<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, operand) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("op{index}"), operand)?;
        }
        map.end()
    }
}

pub struct OperationTreeBuilder<'a> {
    graph: &'a ProvenanceGraph,
    classifier: OperationClassifier,
}

impl<'a> OperationTreeBuilder<'a> {
    pub fn new(graph: &'a ProvenanceGraph) -> Self {
        Self::with_classifier(graph, OperationClassifier::with_defaults())
    }

    pub fn with_classifier(graph: &'a ProvenanceGraph, classifier: OperationClassifier) -> Self {
        Self { graph, classifier }
    }

    /// Reduces the graph from its numerically smallest node id.
    pub fn build_from_root(&self) -> Result<Option<OperationTreeNode>> {
        let root = self.graph.min_id().ok_or(TriageError::EmptyGraph)?;
        debug!(root, "building operation tree");
        self.build(root)
    }

    /// Reduces the subgraph feeding `id`. `None` means the branch was pruned.
    ///
    /// Fails with `CyclicReduction` when a node feeds back into its own subtree.
    pub fn build(&self, id: NodeId) -> Result<Option<OperationTreeNode>> {
        let mut path = Vec::new();
        self.reduce(id, &mut path)
    }

    fn reduce(&self, id: NodeId, path: &mut Vec<NodeId>) -> Result<Option<OperationTreeNode>> {
        if path.contains(&id) {
            return Err(TriageError::CyclicReduction { node: id });
        }
        path.push(id);
        let reduced = self.reduce_node(id, path);
        path.pop();
        reduced
    }

    fn reduce_node(
        &self,
        id: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Result<Option<OperationTreeNode>> {
        let node = self.node(id)?;
        let category = self.classifier.classify(&node.operation);
        trace!(id, operation = %node.operation, ?category, "reducing node");

        match category {
            OperationCategory::StringOp(kind) => {
                let mut operands = Vec::with_capacity(node.flows_from.len());
                for &parent in &node.flows_from {
                    if let Some(operand) = self.reduce(parent, path)? {
                        operands.push(operand);
                    }
                }
                Ok(Some(OperationTreeNode::operation(kind.into(), operands)))
            }
            OperationCategory::Literal(kind) => {
                let raw = node
                    .value
                    .as_deref()
                    .ok_or(TriageError::MissingLiteralValue { node: id })?;
                Ok(Some(OperationTreeNode::Literal {
                    kind,
                    value: strip_string_annotation(raw),
                }))
            }
            OperationCategory::Call => {
                require_parents(node, Arity::AtLeastOne)?;
                self.reduce(node.flows_from[0], path)
            }
            OperationCategory::Imprecise => {
                require_parents(node, Arity::AtLeastOne)?;
                let parent = if node.operation == "imprecise:assign" {
                    node.flows_from[node.flows_from.len() - 1]
                } else {
                    node.flows_from[0]
                };
                self.reduce(parent, path)
            }
            OperationCategory::Sink(kind) => {
                require_parents(node, Arity::ExactlyOne)?;
                // A pruned argument leaves the slot empty; consumers report it.
                let operands = self.reduce(node.flows_from[0], path)?.into_iter().collect();
                Ok(Some(OperationTreeNode::operation(kind.into(), operands)))
            }
            OperationCategory::FieldAccess => self.reduce_field_access(node, path),
            OperationCategory::Unary => {
                require_parents(node, Arity::ExactlyOne)?;
                self.reduce(node.flows_from[0], path)
            }
            OperationCategory::Other => Ok(None),
        }
    }

    fn reduce_field_access(
        &self,
        node: &ProvenanceNode,
        path: &mut Vec<NodeId>,
    ) -> Result<Option<OperationTreeNode>> {
        require_parents(node, Arity::AtLeastOne)?;
        if node.flows_from.len() == 1 {
            return self.reduce(node.flows_from[0], path);
        }

        let left = node.flows_from[0];
        let right = node.flows_from[1];
        if self.node(left)?.tainted {
            self.reduce(left, path)
        } else if self.node(right)?.tainted {
            self.reduce(right, path)
        } else {
            Err(TriageError::UntaintedFieldAccess { node: node.id })
        }
    }

    fn node(&self, id: NodeId) -> Result<&'a ProvenanceNode> {
        self.graph.get(id).ok_or(TriageError::UnknownNode(id))
    }
}

fn require_parents(node: &ProvenanceNode, expected: Arity) -> Result<()> {
    let found = node.flows_from.len();
    let ok = match expected {
        Arity::AtLeastOne => found >= 1,
        Arity::ExactlyOne => found == 1,
    };
    if ok {
        Ok(())
    } else {
        Err(TriageError::ParentArity {
            node: node.id,
            operation: node.operation.clone(),
            expected,
            found,
        })
    }
}

/// Removes the `[String: '...']` wrapper the instrumenter puts around boxed strings.
///
/// Without a quote the annotation characters are stripped from both ends as a
/// character set, which can also eat matching characters of the literal itself.
pub fn strip_string_annotation(raw: &str) -> String {
    if !raw.contains(STRING_ANNOTATION) {
        return raw.to_string();
    }
    if raw.contains('\'') {
        return raw.split('\'').nth(1).unwrap_or_default().to_string();
    }
    raw.trim_matches(|c| STRING_ANNOTATION_CHARS.contains(c))
        .to_string()
}
