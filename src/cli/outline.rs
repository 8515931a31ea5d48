//! Indented outline of a node tree (termtree).

use termtree::Tree;

use crate::domain::Node;

pub trait ToOutline {
    fn to_outline(&self) -> Tree<String>;
}

impl ToOutline for Node {
    fn to_outline(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_outline()).collect();
        Tree::new(label(self)).with_leaves(leaves)
    }
}

impl ToOutline for Option<&Node> {
    fn to_outline(&self) -> Tree<String> {
        match self {
            Some(node) => node.to_outline(),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

// `div#0 {"class":"x"}`, props omitted when empty
fn label(node: &Node) -> String {
    if node.props.is_empty() {
        node.to_string()
    } else {
        format!("{} {}", node, serde_json::Value::Object(node.props.clone()))
    }
}
