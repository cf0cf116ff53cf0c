//! Undo/Redo Log
//!
//! Two ordered stacks of [`ActionRecord`]s, unbounded except by memory.
//! Records are produced by the mutation engine; the inversion logic lives
//! there too ([`crate::MapEditor::undo`] / [`crate::MapEditor::redo`]),
//! because inverting a record needs the forest primitives. This module is
//! only the history bookkeeping.
//!
//! History is strictly linear: recording a new forward action discards the
//! entire redo stack. Two asymmetries are deliberate:
//!
//! - sibling reordering pushes no record at all (not undoable);
//! - redo of `Add` and `Paste` is a reported no-op
//!   ([`RedoOutcome::Unsupported`]) — insertions only undo in one
//!   direction.

use crate::forest::Forest;
use crate::node::{Node, NodeId};

/// Deep, value-only copy of a node and all its descendants.
///
/// Captured before a delete (so undo can restore every attribute and the
/// exact child order) and by the clipboard. Identifiers are preserved in
/// the snapshot; pasting generates fresh ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeSnapshot {
    /// The copied node, attributes and child-id order included.
    pub node: Node,
    /// Snapshots of the children, in display order.
    pub children: Vec<SubtreeSnapshot>,
}

impl SubtreeSnapshot {
    /// Capture the subtree rooted at `id`, or `None` if the id does not
    /// resolve.
    pub fn capture(forest: &Forest, id: &NodeId) -> Option<Self> {
        let node = forest.get(id)?.clone();
        let children = node
            .children
            .iter()
            .map(|child| Self::capture(forest, child))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { node, children })
    }

    /// Total number of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SubtreeSnapshot::node_count)
            .sum::<usize>()
    }
}

/// The data needed to exactly invert one mutation.
///
/// A closed sum with one case per mutation kind. Under-specified inverse
/// data (a missing sibling index, say) makes undo silently misplace nodes,
/// so every variant carries the full previous position where one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecord {
    /// A node was created by `add_child`/`add_sibling`. Undo deletes the
    /// whole subtree rooted there; redo is unsupported.
    Add {
        /// Identifier of the created node.
        id: NodeId,
    },
    /// A subtree was deleted. Undo restores the snapshot at the exact
    /// original index; redo deletes it again.
    Delete {
        /// Deep copy of the removed subtree.
        snapshot: SubtreeSnapshot,
        /// Previous parent (`None` = root level).
        parent: Option<NodeId>,
        /// Previous index in the containing sequence.
        index: usize,
    },
    /// A node was renamed. No record is pushed when the new text equals
    /// the old.
    Rename {
        /// Renamed node.
        id: NodeId,
        /// Text before the edit.
        old_name: String,
        /// Text after the edit.
        new_name: String,
    },
    /// A node's text color changed.
    SetColor {
        /// Recolored node.
        id: NodeId,
        /// Color before the change.
        old_color: String,
        /// Color after the change.
        new_color: String,
    },
    /// A node's bold flag was toggled. Self-inverse.
    ToggleBold {
        /// Toggled node.
        id: NodeId,
    },
    /// A node moved between containing sequences (or within one).
    Move {
        /// Moved node.
        id: NodeId,
        /// Parent before the move (`None` = root level).
        old_parent: Option<NodeId>,
        /// Index before the move.
        old_index: usize,
        /// Parent after the move.
        new_parent: Option<NodeId>,
        /// Index after the move.
        new_index: usize,
    },
    /// A clipboard subtree was pasted. Undo deletes the pasted subtree;
    /// redo is unsupported.
    Paste {
        /// Root of the freshly created subtree.
        root: NodeId,
    },
}

/// Result of an undo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The top record was inverted.
    Applied,
    /// The undo stack was empty; nothing changed.
    Empty,
}

/// Result of a redo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedoOutcome {
    /// The record's forward effect was re-applied.
    Applied,
    /// The redo stack was empty; nothing changed.
    Empty,
    /// The record was an insertion (`Add`/`Paste`), whose redo is
    /// intentionally unsupported. The record still returns to the undo
    /// stack; the forest is unchanged.
    Unsupported,
}

/// Two-stack action history.
#[derive(Debug, Default)]
pub struct HistoryLog {
    undo: Vec<ActionRecord>,
    redo: Vec<ActionRecord>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new forward action. Clears the redo stack: any forward
    /// edit invalidates previously undone history.
    pub fn record(&mut self, record: ActionRecord) {
        self.undo.push(record);
        self.redo.clear();
    }

    /// Whether an undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo stack depth.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Redo stack depth.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Drop all history. Used when a document is replaced wholesale.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub(crate) fn pop_undo(&mut self) -> Option<ActionRecord> {
        self.undo.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<ActionRecord> {
        self.redo.pop()
    }

    /// Push a record onto the redo stack unchanged (after undoing it).
    pub(crate) fn push_redo(&mut self, record: ActionRecord) {
        self.redo.push(record);
    }

    /// Push a record back onto the undo stack without clearing redo
    /// (the redo path; recording would discard the rest of the stack).
    pub(crate) fn push_undo(&mut self, record: ActionRecord) {
        self.undo.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_clears_redo() {
        let mut log = HistoryLog::new();
        log.record(ActionRecord::ToggleBold {
            id: NodeId::fresh(),
        });
        let record = log.pop_undo().unwrap();
        log.push_redo(record);
        assert!(log.can_redo());

        log.record(ActionRecord::ToggleBold {
            id: NodeId::fresh(),
        });
        assert!(!log.can_redo());
        assert_eq!(log.undo_depth(), 1);
    }

    #[test]
    fn test_snapshot_counts_descendants() {
        let forest = Forest::new();
        let root = forest.roots()[0].clone();
        let snapshot = SubtreeSnapshot::capture(&forest, &root).unwrap();
        assert_eq!(snapshot.node_count(), 1);
        assert!(SubtreeSnapshot::capture(&forest, &NodeId::fresh()).is_none());
    }
}
