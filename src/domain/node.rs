//! Node model: the sole entity of the tree store.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::traversal::{Branching, PreOrder};

/// Type tag given to nodes whose literal carries none.
pub const DEFAULT_TYPE: &str = "div";

/// Identifier of a node, unique within one engine lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

/// Tree node. Children are embedded directly, not referenced by id.
///
/// On the wire a node is a flat JSON object: `id`, `parent`, `type`, `props`,
/// `children`, plus any extension fields added through `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Id of the owning node, `None` for the root
    pub parent: Option<NodeId>,
    /// Opaque type tag, consumed by renderers
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Open extension fields outside the canonical shape
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Default node: `div`, no props, no children.
    pub fn new(id: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            id,
            parent,
            kind: DEFAULT_TYPE.to_string(),
            props: Map::new(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Pre-order walk over this node and its descendants.
    pub fn iter(&self) -> PreOrder<'_, Node> {
        PreOrder::new(self)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree, 1 for a leaf.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Node::depth)
            .max()
            .unwrap_or(0)
    }

    /// Point direct children at this node's id.
    pub(crate) fn adopt_children(&mut self) {
        let id = self.id;
        for child in &mut self.children {
            child.parent = Some(id);
        }
    }
}

impl Branching for Node {
    fn branches(&self) -> &[Self] {
        &self.children
    }

    fn branches_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}
