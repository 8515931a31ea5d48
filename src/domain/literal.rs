//! Nested literal description of a (sub)tree, as accepted by `build` and `add`.

use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::traversal::Branching;
use crate::domain::{Node, NodeId};

/// Parsed, not yet materialized node description.
///
/// Only `id`, `type`, `props` and `children` are read from the source object;
/// `parent` is always derived from the position in the tree and any other key
/// is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLiteral {
    pub id: Option<NodeId>,
    pub kind: Option<String>,
    pub props: Option<Map<String, Value>>,
    pub children: Vec<NodeLiteral>,
}

impl NodeLiteral {
    /// Parse a JSON object into a literal, recursively.
    ///
    /// `null` values for `id`, `type`, `props` and `children` count as absent.
    pub fn parse(value: Value) -> DomainResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(DomainError::InvalidLiteral(format!(
                "expected an object, got {}",
                json_kind(&value)
            )));
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_id(&value)?),
        };
        let kind = match object.remove("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(kind)) => Some(kind),
            Some(other) => {
                return Err(DomainError::InvalidLiteral(format!(
                    "type must be a string, got {}",
                    json_kind(&other)
                )))
            }
        };
        let props = match object.remove("props") {
            None | Some(Value::Null) => None,
            Some(Value::Object(props)) => Some(props),
            Some(other) => {
                return Err(DomainError::InvalidLiteral(format!(
                    "props must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };
        let children = match object.remove("children") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => parse_children(value)?,
        };

        Ok(Self {
            id,
            kind,
            props,
            children,
        })
    }

    /// Turn a literal whose ids have all been allocated into a node tree.
    pub(crate) fn into_node(self, parent: Option<NodeId>, default_type: &str) -> DomainResult<Node> {
        let id = self
            .id
            .ok_or_else(|| DomainError::InvalidLiteral("node id was never allocated".into()))?;
        let children = self
            .children
            .into_iter()
            .map(|child| child.into_node(Some(id), default_type))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Node {
            kind: self.kind.unwrap_or_else(|| default_type.to_string()),
            props: self.props.unwrap_or_default(),
            children,
            ..Node::new(id, parent)
        })
    }
}

impl TryFrom<Value> for NodeLiteral {
    type Error = DomainError;

    fn try_from(value: Value) -> DomainResult<Self> {
        NodeLiteral::parse(value)
    }
}

impl Branching for NodeLiteral {
    fn branches(&self) -> &[Self] {
        &self.children
    }

    fn branches_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}

pub(crate) fn parse_id(value: &Value) -> DomainResult<NodeId> {
    value.as_u64().map(NodeId).ok_or_else(|| {
        DomainError::InvalidLiteral(format!(
            "id must be a non-negative integer, got {}",
            value
        ))
    })
}

pub(crate) fn parse_children(value: Value) -> DomainResult<Vec<NodeLiteral>> {
    match value {
        Value::Array(items) => items.into_iter().map(NodeLiteral::parse).collect(),
        other => Err(DomainError::InvalidLiteral(format!(
            "children must be an array, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_empty_object() {
        let literal = NodeLiteral::parse(json!({})).unwrap();
        assert_eq!(literal, NodeLiteral::default());
    }

    #[test]
    fn test_parse_nested() {
        let literal = NodeLiteral::parse(json!({
            "id": 7,
            "type": "ul",
            "props": {"class": "list"},
            "children": [{"type": "li"}, {}]
        }))
        .unwrap();

        assert_eq!(literal.id, Some(NodeId(7)));
        assert_eq!(literal.kind.as_deref(), Some("ul"));
        assert_eq!(literal.props.unwrap()["class"], json!("list"));
        assert_eq!(literal.children.len(), 2);
        assert_eq!(literal.children[0].kind.as_deref(), Some("li"));
    }

    #[test]
    fn test_parse_ignores_parent_and_unknown_keys() {
        let literal = NodeLiteral::parse(json!({"parent": 3, "label": "x"})).unwrap();
        assert_eq!(literal, NodeLiteral::default());
    }

    #[test]
    fn test_parse_treats_null_fields_as_absent() {
        let literal = NodeLiteral::parse(json!({
            "id": null,
            "type": null,
            "props": null,
            "children": null
        }))
        .unwrap();
        assert_eq!(literal, NodeLiteral::default());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = NodeLiteral::parse(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidLiteral(_)));
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(NodeLiteral::parse(json!({"id": -1})).is_err());
        assert!(NodeLiteral::parse(json!({"id": "a"})).is_err());
        assert!(NodeLiteral::parse(json!({"type": 5})).is_err());
        assert!(NodeLiteral::parse(json!({"props": []})).is_err());
        assert!(NodeLiteral::parse(json!({"children": "text"})).is_err());
        assert!(NodeLiteral::parse(json!({"children": [null]})).is_err());
    }

    #[test]
    fn test_into_node_requires_ids() {
        let literal = NodeLiteral::default();
        assert!(literal.into_node(None, "div").is_err());
    }
}
