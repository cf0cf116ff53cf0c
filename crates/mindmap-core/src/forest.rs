//! Tree Store
//!
//! The [`Forest`] owns the node table and the forest-of-roots structure.
//! After every mutation the following invariants hold:
//!
//! 1. Every identifier appearing as a child or in the root sequence exists
//!    as a key in the node table.
//! 2. Every node appears in exactly one containing sequence: the root list
//!    or exactly one parent's child list. Never both, never duplicated,
//!    never orphaned.
//! 3. The parent-child relation is acyclic.
//! 4. A node's `parent` field and its containing sequence are mutually
//!    consistent.
//!
//! No other component mutates `parent`/`children` directly; the mutation
//! engine goes through the crate-private [`Forest::detach`] /
//! [`Forest::attach`] primitives, which preserve invariant 4 by
//! construction.

use crate::node::{Node, NodeId};
use std::collections::HashMap;

/// Name given to the initial root node of a new forest.
pub const DEFAULT_ROOT_NAME: &str = "Root";

/// The full collection of trees the editor manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Create a forest with a single default root node.
    pub fn new() -> Self {
        let mut forest = Self::empty();
        let root_id = NodeId::fresh();
        forest
            .nodes
            .insert(root_id.clone(), Node::new(root_id.clone(), DEFAULT_ROOT_NAME));
        forest.roots.push(root_id);
        forest
    }

    /// Create a forest with no nodes at all.
    ///
    /// Only the persistence codec builds forests from scratch; interactive
    /// editing always starts from [`Forest::new`].
    pub fn empty() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Look up a node by identifier.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether the identifier resolves to a node.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total node count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every node identifier, in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.keys()
    }

    /// The ordered root-level identifiers.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The ordered children of a node, or `None` if the id does not resolve.
    pub fn children(&self, id: &NodeId) -> Option<&[NodeId]> {
        self.nodes.get(id).map(|node| node.children.as_slice())
    }

    /// Whether the node is root-level.
    pub fn is_root(&self, id: &NodeId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|node| node.parent.is_none())
    }

    /// The parent of a node, or `None` for roots and unknown ids.
    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    /// Ancestors of a node, ordered from its parent to the outermost root.
    pub fn ancestors_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            ancestors.push(parent.clone());
            current = self.parent_of(parent);
        }
        ancestors
    }

    /// Whether `id` lies in the subtree rooted at `ancestor` (strictly below it).
    ///
    /// Walks upward from `id`, so the cost is O(depth of `id`).
    pub fn is_descendant_of(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// A node together with all its descendants, in depth-first preorder.
    ///
    /// Uses an explicit stack so pathologically deep trees cannot overflow
    /// the call stack. Returns an empty vector for unknown ids.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Whether every ancestor of the node is expanded.
    ///
    /// Root-level nodes are always visible; a node's own `expanded` flag
    /// affects only its children.
    pub fn is_visible(&self, id: &NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if !self.nodes[parent].expanded {
                return false;
            }
            current = self.parent_of(parent);
        }
        true
    }

    /// The containing sequence of a node: its parent (or `None` for the
    /// root list) and its index within that sequence.
    pub fn position_of(&self, id: &NodeId) -> Option<(Option<NodeId>, usize)> {
        let node = self.nodes.get(id)?;
        match &node.parent {
            Some(parent_id) => {
                let siblings = &self.nodes.get(parent_id)?.children;
                let index = siblings.iter().position(|child| child == id)?;
                Some((Some(parent_id.clone()), index))
            }
            None => {
                let index = self.roots.iter().position(|root| root == id)?;
                Some((None, index))
            }
        }
    }

    /// Add a detached node to the table. The caller must [`Forest::attach`]
    /// it before handing control back.
    pub(crate) fn insert_detached(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node from the table. The node must already be detached and
    /// childless (or its children removed in the same operation).
    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Remove a node from its containing sequence, returning the previous
    /// parent and index. The node stays in the table with `parent` cleared.
    pub(crate) fn detach(&mut self, id: &NodeId) -> Option<(Option<NodeId>, usize)> {
        let (parent, index) = self.position_of(id)?;
        match &parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    parent_node.children.remove(index);
                }
            }
            None => {
                self.roots.remove(index);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
        Some((parent, index))
    }

    /// Insert a detached node into a containing sequence.
    ///
    /// `index: None` appends. The node's `parent` field is updated in the
    /// same step, so invariant 4 cannot be observed violated.
    pub(crate) fn attach(&mut self, id: &NodeId, parent: Option<&NodeId>, index: Option<usize>) {
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    let at = index
                        .unwrap_or(parent_node.children.len())
                        .min(parent_node.children.len());
                    parent_node.children.insert(at, id.clone());
                }
            }
            None => {
                let at = index.unwrap_or(self.roots.len()).min(self.roots.len());
                self.roots.insert(at, id.clone());
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent.cloned();
        }
    }

    /// Verify the structural invariants, returning a description of the
    /// first violation found.
    ///
    /// Debugging and test aid; the mutation primitives maintain the
    /// invariants without calling this.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen: HashMap<&NodeId, usize> = HashMap::new();

        for root in &self.roots {
            let node = self
                .nodes
                .get(root)
                .ok_or_else(|| format!("root {root} missing from node table"))?;
            if node.parent.is_some() {
                return Err(format!("root {root} has a parent"));
            }
            *seen.entry(root).or_insert(0) += 1;
        }

        for (id, node) in &self.nodes {
            if node.id != *id {
                return Err(format!("node {id} keyed under a different id"));
            }
            for child in &node.children {
                let child_node = self
                    .nodes
                    .get(child)
                    .ok_or_else(|| format!("child {child} of {id} missing from node table"))?;
                if child_node.parent.as_ref() != Some(id) {
                    return Err(format!("child {child} does not point back to parent {id}"));
                }
                *seen.entry(child).or_insert(0) += 1;
            }
        }

        for (id, count) in &seen {
            if *count != 1 {
                return Err(format!("node {id} appears in {count} containing sequences"));
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(format!(
                "{} nodes in table but {} reachable from a containing sequence",
                self.nodes.len(),
                seen.len()
            ));
        }

        // Acyclicity: every upward walk must terminate at a root.
        for id in self.nodes.keys() {
            let mut steps = 0usize;
            let mut current = self.parent_of(id);
            while let Some(parent) = current {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(format!("cycle detected walking ancestors of {id}"));
                }
                current = self.parent_of(parent);
            }
        }

        Ok(())
    }
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_of(forest: &mut Forest, parent: &NodeId, name: &str) -> NodeId {
        let id = NodeId::fresh();
        forest.insert_detached(Node::new(id.clone(), name));
        forest.attach(&id, Some(parent), None);
        id
    }

    #[test]
    fn test_new_forest_has_default_root() {
        let forest = Forest::new();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(forest.get(root).unwrap().name, DEFAULT_ROOT_NAME);
        assert!(forest.is_root(root));
        forest.check_invariants().unwrap();
    }

    #[test]
    fn test_attach_detach_keeps_parent_consistent() {
        let mut forest = Forest::new();
        let root = forest.roots()[0].clone();
        let a = child_of(&mut forest, &root, "A");

        assert_eq!(forest.parent_of(&a), Some(&root));
        assert_eq!(forest.children(&root).unwrap(), &[a.clone()]);
        forest.check_invariants().unwrap();

        let (parent, index) = forest.detach(&a).unwrap();
        assert_eq!(parent, Some(root.clone()));
        assert_eq!(index, 0);
        assert!(forest.children(&root).unwrap().is_empty());
        assert!(forest.get(&a).unwrap().parent.is_none());

        forest.attach(&a, None, Some(0));
        assert_eq!(forest.roots(), &[a.clone(), root.clone()]);
        forest.check_invariants().unwrap();
    }

    #[test]
    fn test_ancestors_ordered_parent_first() {
        let mut forest = Forest::new();
        let root = forest.roots()[0].clone();
        let a = child_of(&mut forest, &root, "A");
        let b = child_of(&mut forest, &a, "B");

        assert_eq!(forest.ancestors_of(&b), vec![a.clone(), root.clone()]);
        assert!(forest.is_descendant_of(&b, &root));
        assert!(forest.is_descendant_of(&b, &a));
        assert!(!forest.is_descendant_of(&root, &b));
        assert!(!forest.is_descendant_of(&b, &b));
    }

    #[test]
    fn test_descendants_preorder() {
        let mut forest = Forest::new();
        let root = forest.roots()[0].clone();
        let a = child_of(&mut forest, &root, "A");
        let b = child_of(&mut forest, &root, "B");
        let a1 = child_of(&mut forest, &a, "A1");

        assert_eq!(forest.descendants(&root), vec![root.clone(), a, a1, b]);
    }

    #[test]
    fn test_visibility_follows_ancestor_expansion() {
        let mut forest = Forest::new();
        let root = forest.roots()[0].clone();
        let a = child_of(&mut forest, &root, "A");
        let b = child_of(&mut forest, &a, "B");

        assert!(forest.is_visible(&b));
        forest.get_mut(&root).unwrap().expanded = false;
        assert!(forest.is_visible(&root));
        assert!(!forest.is_visible(&a));
        assert!(!forest.is_visible(&b));
        // The collapsed node's own flag does not hide the node itself.
        forest.get_mut(&root).unwrap().expanded = true;
        forest.get_mut(&b).unwrap().expanded = false;
        assert!(forest.is_visible(&b));
    }

    #[test]
    fn test_position_of_root_and_child() {
        let mut forest = Forest::new();
        let root = forest.roots()[0].clone();
        let a = child_of(&mut forest, &root, "A");
        let b = child_of(&mut forest, &root, "B");

        assert_eq!(forest.position_of(&root), Some((None, 0)));
        assert_eq!(forest.position_of(&a), Some((Some(root.clone()), 0)));
        assert_eq!(forest.position_of(&b), Some((Some(root.clone()), 1)));
        assert_eq!(forest.position_of(&NodeId::fresh()), None);
    }

    #[test]
    fn test_check_invariants_reports_orphan() {
        let mut forest = Forest::new();
        let orphan = NodeId::fresh();
        forest.insert_detached(Node::new(orphan, "orphan"));
        assert!(forest.check_invariants().is_err());
    }
}
