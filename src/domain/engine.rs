//! The tree engine: one rooted tree plus its id counter.

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::{IdAllocator, IdPolicy};
use crate::domain::literal::{json_kind, parse_children, parse_id, NodeLiteral};
use crate::domain::node::DEFAULT_TYPE;
use crate::domain::traversal::{breadth_first, breadth_first_mut, depth_first, level_of};
use crate::domain::{Node, NodeId};

/// Deepest tree an engine accepts unless configured otherwise.
///
/// Serializing and dropping a node recurse once per level.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Construction options for a [`TreeEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Type tag for literals that carry none
    pub default_type: String,
    pub id_policy: IdPolicy,
    /// Maximum number of levels, the root counting as one
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_type: DEFAULT_TYPE.to_string(),
            id_policy: IdPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Mutable, id-addressed tree store.
///
/// Each instance owns its tree and its id counter; nothing is shared between
/// instances. Lookups walk the tree breadth-first, construction assigns ids
/// depth-first in pre-order: a node's children all get their ids before any
/// grandchild does.
///
/// ```
/// use serde_json::json;
/// use structree::domain::{NodeId, TreeEngine};
///
/// let mut engine = TreeEngine::new();
/// engine.build(json!({"children": [{"children": [{}, {}]}, {}]})).unwrap();
///
/// let first = engine.get(NodeId(1)).unwrap();
/// let ids: Vec<_> = first.children.iter().map(|c| c.id).collect();
/// assert_eq!(ids, vec![NodeId(3), NodeId(4)]);
/// ```
#[derive(Debug)]
pub struct TreeEngine {
    root: Option<Node>,
    ids: IdAllocator,
    default_type: String,
    max_depth: usize,
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeEngine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            root: None,
            ids: IdAllocator::new(options.id_policy),
            default_type: options.default_type,
            max_depth: options.max_depth,
        }
    }

    /// Replace the tree with one materialized from a nested literal.
    ///
    /// `null` counts as a missing structure; `{}` builds a single default node.
    #[instrument(level = "debug", skip_all)]
    pub fn build(&mut self, literal: Value) -> DomainResult<&Node> {
        if literal.is_null() {
            return Err(DomainError::missing("build", "a structure"));
        }
        let literal = NodeLiteral::parse(literal)?;
        let root = self.atomically(|engine| {
            let root = engine.materialize(literal, None)?;
            engine.check_depth(root.depth())?;
            Ok(root)
        })?;
        debug!(root = %root.id, nodes = root.len(), next = %self.ids.peek(), "built structure");

        Ok(&*self.root.insert(root))
    }

    /// Insert a node, as new root when `parent` is `None`.
    ///
    /// A new root discards the previous tree. If `parent` does not resolve,
    /// the node is still created (its ids are consumed) but never attached.
    /// Returns a snapshot of the created node.
    #[instrument(level = "debug", skip(self, data))]
    pub fn add(&mut self, data: Value, parent: Option<NodeId>) -> DomainResult<Node> {
        if data.is_null() {
            return Err(DomainError::missing("add", "node data"));
        }
        let literal = NodeLiteral::parse(data)?;
        // levels above the new node, when it will be attached at all
        let above = match parent {
            None => Some(0),
            Some(parent_id) => self.level(parent_id),
        };
        let mut node = self.atomically(|engine| {
            let node = engine.materialize(literal, None)?;
            engine.check_depth(above.unwrap_or(0) + node.depth())?;
            Ok(node)
        })?;

        let Some(parent_id) = parent else {
            if let Some(previous) = &self.root {
                debug!(previous = %previous.id, root = %node.id, "replacing root");
            }
            return Ok(self.root.insert(node).clone());
        };

        match self.get_mut(parent_id) {
            Some(holder) => {
                node.parent = Some(holder.id);
                holder.children.push(node.clone());
            }
            None => warn!(id = %node.id, parent = %parent_id, "parent not found, node dropped"),
        }
        Ok(node)
    }

    /// First node with `id` in level order, `None` if absent or the tree is empty.
    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let root = self.root.as_ref()?;
        breadth_first(root, |node| node, |node| node.id == id)
    }

    /// Live mutable access. Changes made through it bypass the engine's checks.
    #[instrument(level = "trace", skip(self))]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let root = self.root.as_mut()?;
        breadth_first_mut(root, |node| node.id == id)
    }

    /// Shallow merge of `data` into the node `id`.
    ///
    /// `type`, `props`, `children` and `id` are replaced wholesale; any other
    /// key is written to the node's extension fields. Replacement children are
    /// materialized like `build` does. `parent` follows the tree and is ignored.
    /// Nothing is written unless the whole patch is valid.
    #[instrument(level = "debug", skip(self, data))]
    pub fn update(&mut self, id: NodeId, data: Value) -> DomainResult<&Node> {
        let fields = match data {
            Value::Null => return Err(DomainError::missing("update", "node data")),
            Value::Object(fields) => fields,
            other => {
                return Err(DomainError::InvalidLiteral(format!(
                    "update data must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };
        let level = self.level(id).ok_or(DomainError::NodeNotFound(id))?;

        let patch = Patch::parse(fields)?;
        let children = self.atomically(|engine| {
            let children = engine.prepare_children(id, &patch)?;
            if let Some(children) = &children {
                let below = children.iter().map(Node::depth).max().unwrap_or(0);
                engine.check_depth(level + below)?;
            }
            Ok(children)
        })?;

        let default_type = self.default_type.clone();
        let node = self.get_mut(id).ok_or(DomainError::NodeNotFound(id))?;
        patch.apply(node, children, &default_type);
        debug!(id = %node.id, "updated node");
        Ok(&*node)
    }

    /// Detach the node `id` together with its subtree and return it.
    ///
    /// Removing the root empties the tree; the id counter keeps running.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> DomainResult<Node> {
        let node = self.get(id).ok_or(DomainError::NodeNotFound(id))?;

        let Some(parent_id) = node.parent else {
            debug!("removing root, tree detached");
            return self.root.take().ok_or(DomainError::NodeNotFound(id));
        };

        let holder = self
            .get_mut(parent_id)
            .ok_or(DomainError::NodeNotFound(parent_id))?;
        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut holder.children)
            .into_iter()
            .partition(|child| child.id == id);
        holder.children = kept;

        let removed = removed
            .into_iter()
            .next()
            .ok_or(DomainError::NodeNotFound(id))?;
        debug!(id = %removed.id, nodes = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// The live root, `None` when the tree is empty.
    pub fn structure(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Drop the tree and restart ids at zero.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self) {
        self.root = None;
        self.ids.reset();
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, Node::len)
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.ids.policy()
    }

    /// Run `op`, undoing its id allocations if it fails.
    fn atomically<R, F>(&mut self, op: F) -> DomainResult<R>
    where
        F: FnOnce(&mut Self) -> DomainResult<R>,
    {
        let checkpoint = self.ids.checkpoint();
        let result = op(self);
        match &result {
            Ok(_) => self.ids.commit(checkpoint),
            Err(e) => {
                debug!(error = %e, "rolling back id allocation");
                self.ids.rollback(checkpoint);
            }
        }
        result
    }

    /// Level of node `id`, the root being level 1.
    fn level(&self, id: NodeId) -> Option<usize> {
        let root = self.root.as_ref()?;
        level_of(root, |node| node.id == id)
    }

    fn check_depth(&self, depth: usize) -> DomainResult<()> {
        if depth > self.max_depth {
            return Err(DomainError::DepthExceeded {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }

    /// Allocate every id in `literal` and turn it into a node tree.
    fn materialize(&mut self, mut literal: NodeLiteral, parent: Option<NodeId>) -> DomainResult<Node> {
        literal.id = Some(self.ids.handle_id(literal.id)?);
        allocate_children(&mut self.ids, &mut literal)?;
        literal.into_node(parent, &self.default_type)
    }

    /// Materialize replacement children for the node that will carry `id`.
    fn prepare_children(&mut self, id: NodeId, patch: &Patch) -> DomainResult<Option<Vec<Node>>> {
        let holder_id = match patch.id {
            Some(new_id) if new_id != id => self.ids.claim(new_id)?,
            _ => id,
        };
        let Some(children) = &patch.children else {
            return Ok(None);
        };

        let mut holder = NodeLiteral {
            id: Some(holder_id),
            children: children.clone(),
            ..NodeLiteral::default()
        };
        allocate_children(&mut self.ids, &mut holder)?;
        let holder = holder.into_node(None, &self.default_type)?;
        Ok(Some(holder.children))
    }
}

/// Depth-first id assignment below `literal`, whose own id is already set.
///
/// Each visit hands out ids to all of a node's children before the walk
/// descends, which gives `{children: [{children: [{}, {}]}, {}]}` the ids
/// 0, 1, 3, 4, 2 in document order.
fn allocate_children(ids: &mut IdAllocator, literal: &mut NodeLiteral) -> DomainResult<()> {
    depth_first::<_, DomainError, _>(
        literal,
        |node: &mut NodeLiteral| {
            for child in node.children.iter_mut() {
                child.id = Some(ids.handle_id(child.id)?);
            }
            Ok(())
        },
        None,
    )
}

/// Validated `update` payload.
#[derive(Debug, Default)]
struct Patch {
    id: Option<NodeId>,
    kind: Option<Option<String>>,
    props: Option<Map<String, Value>>,
    children: Option<Vec<NodeLiteral>>,
    extra: Map<String, Value>,
}

impl Patch {
    fn parse(fields: Map<String, Value>) -> DomainResult<Self> {
        let mut patch = Patch::default();
        for (key, value) in fields {
            match key.as_str() {
                "id" => patch.id = Some(parse_id(&value)?),
                "parent" => debug!("ignoring parent in update data"),
                "type" => {
                    patch.kind = match value {
                        Value::Null => Some(None),
                        Value::String(kind) => Some(Some(kind)),
                        other => {
                            return Err(DomainError::InvalidLiteral(format!(
                                "type must be a string, got {}",
                                json_kind(&other)
                            )))
                        }
                    }
                }
                "props" => {
                    patch.props = match value {
                        Value::Null => Some(Map::new()),
                        Value::Object(props) => Some(props),
                        other => {
                            return Err(DomainError::InvalidLiteral(format!(
                                "props must be an object, got {}",
                                json_kind(&other)
                            )))
                        }
                    }
                }
                "children" => {
                    patch.children = match value {
                        Value::Null => Some(Vec::new()),
                        other => Some(parse_children(other)?),
                    }
                }
                _ => {
                    patch.extra.insert(key, value);
                }
            }
        }
        Ok(patch)
    }

    fn apply(self, node: &mut Node, children: Option<Vec<Node>>, default_type: &str) {
        if let Some(id) = self.id {
            node.id = id;
            node.adopt_children();
        }
        if let Some(kind) = self.kind {
            node.kind = kind.unwrap_or_else(|| default_type.to_string());
        }
        if let Some(props) = self.props {
            node.props = props;
        }
        if let Some(children) = children {
            node.children = children;
            node.adopt_children();
        }
        node.extra.extend(self.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_build_restores_counter() {
        let mut engine = TreeEngine::with_options(EngineOptions {
            id_policy: IdPolicy::Reject,
            ..EngineOptions::default()
        });
        engine.build(json!({"children": [{}]})).unwrap();

        // id 0 is taken, so the second child fails after the first got id 2
        let result = engine.build(json!({"id": 9, "children": [{}, {"id": 0}]}));
        assert_eq!(result, Err(DomainError::DuplicateId(NodeId(0))));
        assert_eq!(engine.ids.peek(), NodeId(2));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_depth_limit_rolls_back_ids() {
        let mut engine = TreeEngine::with_options(EngineOptions {
            max_depth: 3,
            ..EngineOptions::default()
        });
        engine.build(json!({"children": [{"children": [{}]}]})).unwrap();

        let result = engine.add(json!({}), Some(NodeId(2)));
        assert_eq!(result, Err(DomainError::DepthExceeded { depth: 4, max: 3 }));
        assert_eq!(engine.ids.peek(), NodeId(3));
        assert_eq!(engine.len(), 3);
    }

    #[test]
    fn test_default_type_from_options() {
        let mut engine = TreeEngine::with_options(EngineOptions {
            default_type: "section".into(),
            ..EngineOptions::default()
        });
        let root = engine.build(json!({"children": [{"type": "p"}]})).unwrap();
        assert_eq!(root.kind, "section");
        assert_eq!(root.children[0].kind, "p");
    }

    #[test]
    fn test_patch_parse_routes_unknown_keys_to_extra() {
        let patch = Patch::parse(
            json!({"type": "span", "newProperty": "works", "parent": 4})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(patch.kind, Some(Some("span".into())));
        assert_eq!(patch.extra.len(), 1);
        assert_eq!(patch.extra["newProperty"], json!("works"));
    }

    #[test]
    fn test_patch_parse_rejects_bad_types() {
        let fields = json!({"props": "x"}).as_object().cloned().unwrap();
        assert!(Patch::parse(fields).is_err());
    }
}
