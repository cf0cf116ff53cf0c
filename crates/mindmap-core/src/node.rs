//! Node identity and node data.
//!
//! A [`Node`] is one labeled item in the map: its display attributes plus the
//! structural links (`parent`, `children`) that the [`crate::Forest`] owns.
//! Structural links are read-only outside this crate; all mutation goes
//! through the forest's primitives so the containment invariants cannot be
//! bypassed.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default text color for newly created nodes.
pub const DEFAULT_COLOR: &str = "black";

/// Opaque node identifier.
///
/// Globally unique and never reused, even after the node is deleted. Fresh
/// identifiers are UUIDv4 strings; identifiers read back from a persisted
/// document keep whatever canonical string form they were stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh, globally unique identifier.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The canonical string form of this identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single node in the map.
///
/// Fields are public for reading; `parent` and `children` may only be
/// modified through [`crate::Forest`] so that every node stays in exactly
/// one containing sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Display name. May be empty.
    pub name: String,
    /// Parent identifier; `None` means this node is root-level.
    pub parent: Option<NodeId>,
    /// Text color, named (`"black"`) or hex (`"#rrggbb"`).
    pub color: String,
    /// Ordered child identifiers. Order is display order.
    pub children: Vec<NodeId>,
    /// Whether children are rendered and laid out.
    pub expanded: bool,
    /// Bold display flag.
    pub bold: bool,
}

impl Node {
    /// Create a detached node with default attributes.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            color: DEFAULT_COLOR.to_string(),
            children: Vec::new(),
            expanded: true,
            bold: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_display_matches_as_str() {
        let id = NodeId::from("n-42");
        assert_eq!(id.to_string(), "n-42");
        assert_eq!(id.as_str(), "n-42");
    }

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new(NodeId::fresh(), "Root");
        assert_eq!(node.name, "Root");
        assert_eq!(node.color, DEFAULT_COLOR);
        assert!(node.expanded);
        assert!(!node.bold);
        assert!(node.parent.is_none());
        assert!(node.children.is_empty());
    }
}
