//! Mutation Engine and Command Interface
//!
//! [`MapEditor`] is the single writer of a [`Forest`]. Every structural or
//! attribute mutation goes through it, so each operation can:
//!
//! - enforce acyclicity *before* touching the forest (no rollback paths),
//! - push exactly one inverse [`ActionRecord`] onto the history log,
//! - set the editor-wide modified flag and clear the redo stack.
//!
//! The unified [`Command`] enum is the entry point for frontends: commands
//! act on the current selection (the way toolbar/menu/keyboard surfaces
//! do), while the named methods take explicit identifiers and form the
//! programmatic API.
//!
//! # Example
//!
//! ```rust
//! use mindmap_core::MapEditor;
//!
//! let mut editor = MapEditor::new();
//! let root = editor.forest().roots()[0].clone();
//! let child = editor.add_child(&root).unwrap();
//! assert_eq!(editor.forest().children(&root).unwrap(), &[child]);
//! editor.undo();
//! assert_eq!(editor.forest().len(), 1);
//! ```

use crate::export;
use crate::forest::Forest;
use crate::history::{ActionRecord, HistoryLog, RedoOutcome, SubtreeSnapshot, UndoOutcome};
use crate::node::{Node, NodeId};
use thiserror::Error;
use tracing::debug;

/// Display name given to nodes created by `add_child`/`add_sibling`.
pub const DEFAULT_NODE_NAME: &str = "New Node";

/// Direction for sibling reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingOrder {
    /// Swap with the immediate predecessor.
    Up,
    /// Swap with the immediate successor.
    Down,
}

/// Structural commands, applied to the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureCommand {
    /// Append a new child under the selected node.
    AddChild,
    /// Insert a new sibling immediately after the selected node.
    AddSibling,
    /// Delete the selected subtree. Silent no-op when nothing is selected.
    DeleteSelected,
    /// Reparent the selection under `target` (`None` = root level).
    MoveAsChild {
        /// New parent, or `None` for the root list.
        target: Option<NodeId>,
    },
    /// Move the selection immediately before `anchor` in its sequence.
    MoveBefore {
        /// Sibling the selection is inserted before.
        anchor: NodeId,
    },
    /// Move the selection immediately after `anchor` in its sequence.
    MoveAfter {
        /// Sibling the selection is inserted after.
        anchor: NodeId,
    },
    /// Swap the selection with its previous sibling. Not undoable.
    MoveUp,
    /// Swap the selection with its next sibling. Not undoable.
    MoveDown,
    /// Reparent the selection as a sibling of its parent ("move left").
    MoveToParentSibling,
    /// Reparent the selection under its preceding sibling ("move right").
    MoveUnderPreviousSibling,
}

/// Attribute commands, applied to the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeCommand {
    /// Replace the display name. No history record when unchanged.
    Rename {
        /// New display name.
        text: String,
    },
    /// Set the text color (named or hex). Always recorded.
    SetColor {
        /// New color value.
        color: String,
    },
    /// Toggle the bold flag.
    ToggleBold,
}

/// Clipboard commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardCommand {
    /// Copy the selected subtree to the internal clipboard.
    Copy,
    /// Flatten the selected subtree to tab-indented plain text.
    CopyPlainText,
    /// Paste the clipboard subtree under the selected node.
    Paste,
}

/// History commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
    /// Invert the most recent recorded mutation.
    Undo,
    /// Re-apply the most recently undone mutation.
    Redo,
}

/// Selection and visibility commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Change the selection (`None` clears it).
    Select {
        /// Node to select, or `None`.
        id: Option<NodeId>,
    },
    /// Flip a node's expanded flag.
    ToggleExpanded {
        /// Node whose flag is flipped.
        id: NodeId,
    },
    /// Expand every node in the forest.
    ExpandAll,
}

/// Unified command enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Structural edits.
    Structure(StructureCommand),
    /// Attribute edits.
    Attribute(AttributeCommand),
    /// Clipboard operations.
    Clipboard(ClipboardCommand),
    /// Undo/redo.
    History(HistoryCommand),
    /// Selection and visibility.
    View(ViewCommand),
}

/// Command execution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Success, no return value.
    Success,
    /// A node was created.
    Created(NodeId),
    /// Success, returns text.
    Text(String),
    /// Outcome of an undo request.
    UndoResult(UndoOutcome),
    /// Outcome of a redo request.
    RedoResult(RedoOutcome),
}

/// Command error type.
///
/// All errors are recoverable and local: the forest is never left partially
/// mutated, and nothing here is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// An identifier did not resolve to a node.
    #[error("node not found: {0}")]
    NotFound(NodeId),
    /// The move would make a node its own ancestor.
    #[error("invalid move: {id} cannot be placed under {target}")]
    InvalidMove {
        /// Node being moved.
        id: NodeId,
        /// Offending destination.
        target: NodeId,
    },
    /// Paste was requested with an empty clipboard.
    #[error("clipboard is empty")]
    EmptyClipboard,
    /// A selection-relative command ran with nothing selected.
    #[error("no node is selected")]
    NoSelection,
}

/// The mutation engine: a forest plus its history log, clipboard and
/// selection.
///
/// Single-threaded and strictly sequential; every operation runs to
/// completion and either succeeds fully or fails without mutating. Each
/// editor window owns its own independent `MapEditor`.
#[derive(Debug)]
pub struct MapEditor {
    forest: Forest,
    history: HistoryLog,
    clipboard: Option<SubtreeSnapshot>,
    selection: Option<NodeId>,
    modified: bool,
}

impl MapEditor {
    /// Create an editor over a fresh forest with one default root, which
    /// starts selected.
    pub fn new() -> Self {
        let forest = Forest::new();
        let selection = forest.roots().first().cloned();
        Self {
            forest,
            history: HistoryLog::new(),
            clipboard: None,
            selection,
            modified: false,
        }
    }

    /// Create an editor over an existing forest (a loaded document).
    /// History starts empty; the first root starts selected.
    pub fn from_forest(forest: Forest) -> Self {
        let selection = forest.roots().first().cloned();
        Self {
            forest,
            history: HistoryLog::new(),
            clipboard: None,
            selection,
            modified: false,
        }
    }

    /// The forest being edited.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// The current selection.
    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    /// Change the selection. `None` clears it.
    pub fn select(&mut self, id: Option<NodeId>) -> Result<(), CommandError> {
        if let Some(id) = &id {
            self.require(id)?;
        }
        self.selection = id;
        Ok(())
    }

    /// Whether the clipboard holds a copied subtree.
    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Whether there are unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag (after a successful save).
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Whether an undo is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo stack depth.
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// Redo stack depth.
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Append a new child named [`DEFAULT_NODE_NAME`] under `parent`.
    pub fn add_child(&mut self, parent: &NodeId) -> Result<NodeId, CommandError> {
        self.add_child_named(parent, DEFAULT_NODE_NAME)
    }

    /// Append a new child with the given initial text under `parent`.
    pub fn add_child_named(
        &mut self,
        parent: &NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, CommandError> {
        self.require(parent)?;
        let id = NodeId::fresh();
        self.forest
            .insert_detached(Node::new(id.clone(), name.into()));
        self.forest.attach(&id, Some(parent), None);
        self.record(ActionRecord::Add { id: id.clone() });
        self.selection = Some(id.clone());
        debug!(node = %id, parent = %parent, "added child node");
        Ok(id)
    }

    /// Insert a new sibling named [`DEFAULT_NODE_NAME`] immediately after
    /// `reference`. When `reference` is a root, the new node is a root too.
    pub fn add_sibling(&mut self, reference: &NodeId) -> Result<NodeId, CommandError> {
        self.add_sibling_named(reference, DEFAULT_NODE_NAME)
    }

    /// Insert a new sibling with the given initial text immediately after
    /// `reference`.
    pub fn add_sibling_named(
        &mut self,
        reference: &NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, CommandError> {
        let (parent, index) = self
            .forest
            .position_of(reference)
            .ok_or_else(|| CommandError::NotFound(reference.clone()))?;
        let id = NodeId::fresh();
        self.forest
            .insert_detached(Node::new(id.clone(), name.into()));
        self.forest.attach(&id, parent.as_ref(), Some(index + 1));
        self.record(ActionRecord::Add { id: id.clone() });
        self.selection = Some(id.clone());
        debug!(node = %id, reference = %reference, "added sibling node");
        Ok(id)
    }

    /// Remove `id` and all its descendants. Deleting an id that is
    /// already gone is a no-op.
    ///
    /// The recorded action carries a deep copy of the removed subtree so
    /// undo can restore every descendant attribute at the exact original
    /// index. The selection falls back to the previous parent, then the
    /// first root, then `None`.
    pub fn delete_subtree(&mut self, id: &NodeId) -> Result<(), CommandError> {
        let Some(snapshot) = SubtreeSnapshot::capture(&self.forest, id) else {
            return Ok(());
        };
        let Some((parent, index)) = self.forest.position_of(id) else {
            return Ok(());
        };
        self.remove_subtree_quiet(id);
        debug!(node = %id, nodes = snapshot.node_count(), "deleted subtree");
        self.record(ActionRecord::Delete {
            snapshot,
            parent: parent.clone(),
            index,
        });
        self.selection = None;
        self.fix_selection(parent);
        Ok(())
    }

    /// Replace the display name. A rename to the current text is a no-op
    /// and pushes no history record.
    pub fn rename_node(&mut self, id: &NodeId, new_text: &str) -> Result<(), CommandError> {
        let node = self
            .forest
            .get(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        if node.name == new_text {
            return Ok(());
        }
        let old_name = node.name.clone();
        if let Some(node) = self.forest.get_mut(id) {
            node.name = new_text.to_string();
        }
        self.record(ActionRecord::Rename {
            id: id.clone(),
            old_name,
            new_name: new_text.to_string(),
        });
        Ok(())
    }

    /// Set the text color. Always recorded, even when unchanged (the color
    /// picker surface always commits).
    pub fn set_color(&mut self, id: &NodeId, color: &str) -> Result<(), CommandError> {
        let node = self
            .forest
            .get(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        let old_color = node.color.clone();
        if let Some(node) = self.forest.get_mut(id) {
            node.color = color.to_string();
        }
        self.record(ActionRecord::SetColor {
            id: id.clone(),
            old_color,
            new_color: color.to_string(),
        });
        Ok(())
    }

    /// Toggle the bold flag. Self-inverse under undo/redo.
    pub fn toggle_bold(&mut self, id: &NodeId) -> Result<(), CommandError> {
        self.require(id)?;
        if let Some(node) = self.forest.get_mut(id) {
            node.bold = !node.bold;
        }
        self.record(ActionRecord::ToggleBold { id: id.clone() });
        Ok(())
    }

    /// Swap `id` with its immediate predecessor or successor among its
    /// siblings. No-op at either end of the sequence.
    ///
    /// Known limitation: sibling reordering pushes no action record (it
    /// is not undoable) and does not clear the redo stack. It still
    /// marks the document modified.
    pub fn reorder_sibling(
        &mut self,
        id: &NodeId,
        direction: SiblingOrder,
    ) -> Result<(), CommandError> {
        let (parent, index) = self
            .forest
            .position_of(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        let sibling_count = match &parent {
            Some(parent_id) => self.forest.children(parent_id).map_or(0, <[_]>::len),
            None => self.forest.roots().len(),
        };
        let target = match direction {
            SiblingOrder::Up if index > 0 => index - 1,
            SiblingOrder::Down if index + 1 < sibling_count => index + 1,
            _ => return Ok(()),
        };
        self.forest.detach(id);
        self.forest.attach(id, parent.as_ref(), Some(target));
        self.modified = true;
        self.selection = Some(id.clone());
        debug!(node = %id, ?direction, "reordered sibling");
        Ok(())
    }

    /// Reparent `id` under `new_parent` (`None` = root level), appended at
    /// the end of the destination sequence.
    ///
    /// Fails with [`CommandError::InvalidMove`] when the destination is the
    /// node itself or one of its descendants. The guard walks the
    /// *target's* ancestors before any mutation, so a failed move leaves
    /// the forest untouched.
    pub fn move_as_child(
        &mut self,
        id: &NodeId,
        new_parent: Option<&NodeId>,
    ) -> Result<(), CommandError> {
        self.require(id)?;
        self.guard_cycle(id, new_parent)?;
        let (old_parent, old_index) = self
            .forest
            .detach(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        self.forest.attach(id, new_parent, None);
        let (new_parent, new_index) = self
            .forest
            .position_of(id)
            .unwrap_or((None, 0));
        debug!(node = %id, "moved as child");
        self.record(ActionRecord::Move {
            id: id.clone(),
            old_parent,
            old_index,
            new_parent,
            new_index,
        });
        self.selection = Some(id.clone());
        Ok(())
    }

    /// Move `id` immediately before `anchor` in the anchor's containing
    /// sequence.
    pub fn move_as_sibling_before(
        &mut self,
        id: &NodeId,
        anchor: &NodeId,
    ) -> Result<(), CommandError> {
        self.move_relative_to(id, anchor, 0)
    }

    /// Move `id` immediately after `anchor` in the anchor's containing
    /// sequence.
    pub fn move_as_sibling_after(
        &mut self,
        id: &NodeId,
        anchor: &NodeId,
    ) -> Result<(), CommandError> {
        self.move_relative_to(id, anchor, 1)
    }

    /// Reparent `id` as a sibling of its parent ("move left"). No-op for
    /// root-level nodes.
    pub fn move_to_parent_sibling(&mut self, id: &NodeId) -> Result<(), CommandError> {
        self.require(id)?;
        let Some(parent) = self.forest.parent_of(id).cloned() else {
            return Ok(());
        };
        let grandparent = self.forest.parent_of(&parent).cloned();
        self.move_as_child(id, grandparent.as_ref())
    }

    /// Reparent `id` under its immediately preceding sibling
    /// ("move right"). No-op for root-level or first-position nodes.
    pub fn move_under_previous_sibling(&mut self, id: &NodeId) -> Result<(), CommandError> {
        let (parent, index) = self
            .forest
            .position_of(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        let Some(parent) = parent else {
            return Ok(());
        };
        if index == 0 {
            return Ok(());
        }
        let new_parent = self.forest.children(&parent).map(|c| c[index - 1].clone());
        match new_parent {
            Some(new_parent) => self.move_as_child(id, Some(&new_parent)),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Deep, value-only copy of the subtree rooted at `id`. Identifiers
    /// are preserved in the copy but never reused on paste.
    pub fn copy_subtree(&self, id: &NodeId) -> Result<SubtreeSnapshot, CommandError> {
        SubtreeSnapshot::capture(&self.forest, id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))
    }

    /// Copy the subtree rooted at `id` to the internal clipboard.
    pub fn copy(&mut self, id: &NodeId) -> Result<(), CommandError> {
        self.clipboard = Some(self.copy_subtree(id)?);
        Ok(())
    }

    /// Deep-insert a subtree copy under `destination` (`None` = root
    /// level), appended at the end of the destination sequence. Every node
    /// in the copy receives a freshly generated identifier.
    pub fn paste_subtree(
        &mut self,
        snapshot: &SubtreeSnapshot,
        destination: Option<&NodeId>,
    ) -> Result<NodeId, CommandError> {
        if let Some(dest) = destination {
            self.require(dest)?;
        }
        let root = self.insert_snapshot_fresh(snapshot, destination);
        debug!(root = %root, nodes = snapshot.node_count(), "pasted subtree");
        self.record(ActionRecord::Paste { root: root.clone() });
        Ok(root)
    }

    /// Paste the clipboard subtree under `destination`.
    pub fn paste(&mut self, destination: Option<&NodeId>) -> Result<NodeId, CommandError> {
        let snapshot = self
            .clipboard
            .clone()
            .ok_or(CommandError::EmptyClipboard)?;
        self.paste_subtree(&snapshot, destination)
    }

    /// Flatten the subtree rooted at `id` to tab-indented plain text.
    pub fn plain_text(&self, id: &NodeId) -> Result<String, CommandError> {
        export::plain_text(&self.forest, id).ok_or_else(|| CommandError::NotFound(id.clone()))
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Flip a node's expanded flag. View state: not recorded in history.
    pub fn toggle_expanded(&mut self, id: &NodeId) -> Result<(), CommandError> {
        self.require(id)?;
        if let Some(node) = self.forest.get_mut(id) {
            node.expanded = !node.expanded;
        }
        Ok(())
    }

    /// Expand every node in the forest.
    pub fn expand_all(&mut self) {
        let ids: Vec<NodeId> = self.forest.node_ids().cloned().collect();
        for id in ids {
            if let Some(node) = self.forest.get_mut(&id) {
                node.expanded = true;
            }
        }
    }

    // ------------------------------------------------------------------
    // Undo / Redo
    // ------------------------------------------------------------------

    /// Invert the most recent recorded mutation.
    ///
    /// The inverted record is pushed unchanged onto the redo stack.
    /// Structural restorations are index-preserving: undoing a move puts
    /// the node back at its previous sibling index, and undoing a delete
    /// reinserts the full captured subtree at the original position.
    pub fn undo(&mut self) -> UndoOutcome {
        let Some(record) = self.history.pop_undo() else {
            return UndoOutcome::Empty;
        };
        match &record {
            ActionRecord::Add { id } => {
                self.remove_subtree_quiet(id);
            }
            ActionRecord::Delete {
                snapshot,
                parent,
                index,
            } => {
                self.restore_snapshot(snapshot, parent.as_ref(), *index);
            }
            ActionRecord::Rename { id, old_name, .. } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.name = old_name.clone();
                }
            }
            ActionRecord::SetColor { id, old_color, .. } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.color = old_color.clone();
                }
            }
            ActionRecord::ToggleBold { id } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.bold = !node.bold;
                }
            }
            ActionRecord::Move {
                id,
                old_parent,
                old_index,
                ..
            } => {
                self.apply_move_quiet(id, old_parent.clone(), Some(*old_index));
            }
            ActionRecord::Paste { root } => {
                self.remove_subtree_quiet(root);
            }
        }
        debug!(?record, "undid action");
        self.history.push_redo(record);
        self.modified = true;
        self.fix_selection(None);
        UndoOutcome::Applied
    }

    /// Re-apply the most recently undone mutation.
    ///
    /// Redo of `Add` and `Paste` is a reported no-op
    /// ([`RedoOutcome::Unsupported`]): insertions only undo in one
    /// direction. The record still moves back to the undo stack; undoing
    /// it again is harmless because the node no longer exists.
    pub fn redo(&mut self) -> RedoOutcome {
        let Some(record) = self.history.pop_redo() else {
            return RedoOutcome::Empty;
        };
        let outcome = match &record {
            ActionRecord::Add { .. } | ActionRecord::Paste { .. } => RedoOutcome::Unsupported,
            ActionRecord::Delete { snapshot, .. } => {
                self.remove_subtree_quiet(&snapshot.node.id);
                RedoOutcome::Applied
            }
            ActionRecord::Rename { id, new_name, .. } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.name = new_name.clone();
                }
                RedoOutcome::Applied
            }
            ActionRecord::SetColor { id, new_color, .. } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.color = new_color.clone();
                }
                RedoOutcome::Applied
            }
            ActionRecord::ToggleBold { id } => {
                if let Some(node) = self.forest.get_mut(id) {
                    node.bold = !node.bold;
                }
                RedoOutcome::Applied
            }
            ActionRecord::Move {
                id,
                new_parent,
                new_index,
                ..
            } => {
                self.apply_move_quiet(id, new_parent.clone(), Some(*new_index));
                RedoOutcome::Applied
            }
        };
        debug!(?record, ?outcome, "redid action");
        self.history.push_undo(record);
        if outcome == RedoOutcome::Applied {
            self.modified = true;
            self.fix_selection(None);
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Unified command dispatch
    // ------------------------------------------------------------------

    /// Execute a unified command against the current selection.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Structure(command) => self.execute_structure(command),
            Command::Attribute(command) => self.execute_attribute(command),
            Command::Clipboard(command) => self.execute_clipboard(command),
            Command::History(command) => Ok(self.execute_history(command)),
            Command::View(command) => self.execute_view(command),
        }
    }

    fn execute_structure(
        &mut self,
        command: StructureCommand,
    ) -> Result<CommandResult, CommandError> {
        match command {
            StructureCommand::AddChild => {
                let parent = self.selected()?;
                Ok(CommandResult::Created(self.add_child(&parent)?))
            }
            StructureCommand::AddSibling => {
                let reference = self.selected()?;
                Ok(CommandResult::Created(self.add_sibling(&reference)?))
            }
            StructureCommand::DeleteSelected => match self.selection.clone() {
                // Deleting with no selection is a silent no-op.
                None => Ok(CommandResult::Success),
                Some(id) => {
                    self.delete_subtree(&id)?;
                    Ok(CommandResult::Success)
                }
            },
            StructureCommand::MoveAsChild { target } => {
                let id = self.selected()?;
                self.move_as_child(&id, target.as_ref())?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveBefore { anchor } => {
                let id = self.selected()?;
                self.move_as_sibling_before(&id, &anchor)?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveAfter { anchor } => {
                let id = self.selected()?;
                self.move_as_sibling_after(&id, &anchor)?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveUp => {
                let id = self.selected()?;
                self.reorder_sibling(&id, SiblingOrder::Up)?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveDown => {
                let id = self.selected()?;
                self.reorder_sibling(&id, SiblingOrder::Down)?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveToParentSibling => {
                let id = self.selected()?;
                self.move_to_parent_sibling(&id)?;
                Ok(CommandResult::Success)
            }
            StructureCommand::MoveUnderPreviousSibling => {
                let id = self.selected()?;
                self.move_under_previous_sibling(&id)?;
                Ok(CommandResult::Success)
            }
        }
    }

    fn execute_attribute(
        &mut self,
        command: AttributeCommand,
    ) -> Result<CommandResult, CommandError> {
        let id = self.selected()?;
        match command {
            AttributeCommand::Rename { text } => self.rename_node(&id, &text)?,
            AttributeCommand::SetColor { color } => self.set_color(&id, &color)?,
            AttributeCommand::ToggleBold => self.toggle_bold(&id)?,
        }
        Ok(CommandResult::Success)
    }

    fn execute_clipboard(
        &mut self,
        command: ClipboardCommand,
    ) -> Result<CommandResult, CommandError> {
        match command {
            ClipboardCommand::Copy => {
                let id = self.selected()?;
                self.copy(&id)?;
                Ok(CommandResult::Success)
            }
            ClipboardCommand::CopyPlainText => {
                let id = self.selected()?;
                Ok(CommandResult::Text(self.plain_text(&id)?))
            }
            ClipboardCommand::Paste => {
                let destination = self.selected()?;
                let root = self.paste(Some(&destination))?;
                Ok(CommandResult::Created(root))
            }
        }
    }

    fn execute_history(&mut self, command: HistoryCommand) -> CommandResult {
        match command {
            HistoryCommand::Undo => CommandResult::UndoResult(self.undo()),
            HistoryCommand::Redo => CommandResult::RedoResult(self.redo()),
        }
    }

    fn execute_view(&mut self, command: ViewCommand) -> Result<CommandResult, CommandError> {
        match command {
            ViewCommand::Select { id } => {
                self.select(id)?;
                Ok(CommandResult::Success)
            }
            ViewCommand::ToggleExpanded { id } => {
                self.toggle_expanded(&id)?;
                Ok(CommandResult::Success)
            }
            ViewCommand::ExpandAll => {
                self.expand_all();
                Ok(CommandResult::Success)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require(&self, id: &NodeId) -> Result<(), CommandError> {
        if self.forest.contains(id) {
            Ok(())
        } else {
            Err(CommandError::NotFound(id.clone()))
        }
    }

    fn selected(&self) -> Result<NodeId, CommandError> {
        self.selection.clone().ok_or(CommandError::NoSelection)
    }

    fn record(&mut self, record: ActionRecord) {
        self.history.record(record);
        self.modified = true;
    }

    /// Cycle guard: the destination may not be the node itself or any of
    /// its descendants. Checked by walking the target's ancestors, before
    /// any mutation.
    fn guard_cycle(&self, id: &NodeId, target: Option<&NodeId>) -> Result<(), CommandError> {
        let Some(target) = target else {
            return Ok(());
        };
        self.require(target)?;
        if target == id || self.forest.is_descendant_of(target, id) {
            return Err(CommandError::InvalidMove {
                id: id.clone(),
                target: target.clone(),
            });
        }
        Ok(())
    }

    fn move_relative_to(
        &mut self,
        id: &NodeId,
        anchor: &NodeId,
        offset: usize,
    ) -> Result<(), CommandError> {
        self.require(id)?;
        self.require(anchor)?;
        if id == anchor {
            return Ok(());
        }
        let anchor_parent = self.forest.parent_of(anchor).cloned();
        self.guard_cycle(id, anchor_parent.as_ref())?;
        let (old_parent, old_index) = self
            .forest
            .detach(id)
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        // Anchor index is computed after the detach: removing `id` from a
        // shared sequence shifts positions.
        let anchor_index = self
            .forest
            .position_of(anchor)
            .map(|(_, index)| index)
            .unwrap_or(0);
        let new_index = anchor_index + offset;
        self.forest
            .attach(id, anchor_parent.as_ref(), Some(new_index));
        debug!(node = %id, anchor = %anchor, offset, "moved as sibling");
        self.record(ActionRecord::Move {
            id: id.clone(),
            old_parent,
            old_index,
            new_parent: anchor_parent,
            new_index,
        });
        self.selection = Some(id.clone());
        Ok(())
    }

    /// Detach `id` and drop its whole subtree from the node table, without
    /// touching history. Missing ids are ignored (the undo path can meet
    /// records whose node is already gone).
    fn remove_subtree_quiet(&mut self, id: &NodeId) {
        if !self.forest.contains(id) {
            return;
        }
        self.forest.detach(id);
        for descendant in self.forest.descendants(id) {
            self.forest.remove_node(&descendant);
        }
    }

    /// Move without recording; used by undo/redo to re-apply effects.
    fn apply_move_quiet(&mut self, id: &NodeId, parent: Option<NodeId>, index: Option<usize>) {
        if !self.forest.contains(id) {
            return;
        }
        if let Some(parent_id) = &parent
            && !self.forest.contains(parent_id)
        {
            return;
        }
        self.forest.detach(id);
        self.forest.attach(id, parent.as_ref(), index);
    }

    /// Reinsert a captured subtree verbatim (same identifiers, same
    /// attributes, same order) at the given position.
    fn restore_snapshot(
        &mut self,
        snapshot: &SubtreeSnapshot,
        parent: Option<&NodeId>,
        index: usize,
    ) {
        let mut stack = vec![snapshot];
        while let Some(current) = stack.pop() {
            self.forest.insert_detached(current.node.clone());
            stack.extend(current.children.iter());
        }
        let parent = parent.filter(|id| self.forest.contains(id));
        self.forest.attach(&snapshot.node.id, parent, Some(index));
    }

    /// Deep-insert a snapshot with fresh identifiers, appended under
    /// `parent`. Returns the new root id.
    fn insert_snapshot_fresh(
        &mut self,
        snapshot: &SubtreeSnapshot,
        parent: Option<&NodeId>,
    ) -> NodeId {
        let root_id = NodeId::fresh();
        let mut stack: Vec<(&SubtreeSnapshot, NodeId, Option<NodeId>)> =
            vec![(snapshot, root_id.clone(), parent.cloned())];
        while let Some((current, id, attach_to)) = stack.pop() {
            let mut node = Node::new(id.clone(), current.node.name.clone());
            node.color = current.node.color.clone();
            node.bold = current.node.bold;
            node.expanded = current.node.expanded;
            self.forest.insert_detached(node);
            self.forest.attach(&id, attach_to.as_ref(), None);
            // Reverse so siblings are appended in display order.
            for child in current.children.iter().rev() {
                stack.push((child, NodeId::fresh(), Some(id.clone())));
            }
        }
        root_id
    }

    /// After a structural change, make sure the selection still resolves;
    /// fall back to `preferred`, then the first root, then `None`.
    fn fix_selection(&mut self, preferred: Option<NodeId>) {
        if let Some(selection) = &self.selection
            && self.forest.contains(selection)
        {
            return;
        }
        self.selection = preferred
            .filter(|id| self.forest.contains(id))
            .or_else(|| self.forest.roots().first().cloned());
    }
}

impl Default for MapEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(editor: &MapEditor) -> NodeId {
        editor.forest().roots()[0].clone()
    }

    #[test]
    fn test_add_child_appends_and_selects() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        let b = editor.add_child(&root).unwrap();

        assert_eq!(editor.forest().children(&root).unwrap(), &[a, b.clone()]);
        assert_eq!(editor.selection(), Some(&b));
        assert_eq!(editor.forest().get(&b).unwrap().name, DEFAULT_NODE_NAME);
        assert!(editor.is_modified());
        editor.forest().check_invariants().unwrap();
    }

    #[test]
    fn test_add_sibling_inserts_after_reference() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        let b = editor.add_child(&root).unwrap();
        let sibling = editor.add_sibling(&a).unwrap();

        assert_eq!(
            editor.forest().children(&root).unwrap(),
            &[a, sibling, b]
        );
    }

    #[test]
    fn test_add_sibling_of_root_creates_root() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let sibling = editor.add_sibling(&root).unwrap();

        assert_eq!(editor.forest().roots(), &[root, sibling.clone()]);
        assert!(editor.forest().is_root(&sibling));
    }

    #[test]
    fn test_delete_falls_back_selection_to_parent() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        editor.delete_subtree(&a).unwrap();

        assert_eq!(editor.selection(), Some(&root));
        assert_eq!(editor.forest().len(), 1);
    }

    #[test]
    fn test_delete_last_root_clears_selection() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        editor.delete_subtree(&root).unwrap();

        assert!(editor.forest().is_empty());
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_rename_unchanged_records_nothing() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        editor.rename_node(&root, "Root").unwrap();
        assert!(!editor.can_undo());
        assert!(!editor.is_modified());

        editor.rename_node(&root, "Renamed").unwrap();
        assert_eq!(editor.undo_depth(), 1);
        assert!(editor.is_modified());
    }

    #[test]
    fn test_move_cycle_guard_rejects_descendant() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        let b = editor.add_child(&a).unwrap();

        let before = editor.forest().clone();
        let err = editor.move_as_child(&a, Some(&b)).unwrap_err();
        assert!(matches!(err, CommandError::InvalidMove { .. }));
        let err = editor.move_as_child(&a, Some(&a)).unwrap_err();
        assert!(matches!(err, CommandError::InvalidMove { .. }));
        // Failed moves leave the forest untouched and record nothing.
        assert_eq!(editor.forest(), &before);
        assert_eq!(editor.undo_depth(), 2); // just the two adds
    }

    #[test]
    fn test_move_to_root_level() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        editor.move_as_child(&a, None).unwrap();

        assert_eq!(editor.forest().roots(), &[root, a.clone()]);
        assert!(editor.forest().is_root(&a));
        editor.forest().check_invariants().unwrap();
    }

    #[test]
    fn test_reorder_sibling_is_silent_in_history() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        let b = editor.add_child(&root).unwrap();
        let depth = editor.undo_depth();

        editor.reorder_sibling(&b, SiblingOrder::Up).unwrap();
        assert_eq!(editor.forest().children(&root).unwrap(), &[b.clone(), a.clone()]);
        assert_eq!(editor.undo_depth(), depth);

        // No-op at the boundary.
        editor.reorder_sibling(&b, SiblingOrder::Up).unwrap();
        assert_eq!(editor.forest().children(&root).unwrap(), &[b, a]);
    }

    #[test]
    fn test_paste_generates_fresh_ids() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child_named(&root, "A").unwrap();
        let _a1 = editor.add_child_named(&a, "A1").unwrap();

        editor.copy(&a).unwrap();
        let pasted = editor.paste(Some(&root)).unwrap();

        assert_ne!(pasted, a);
        let pasted_node = editor.forest().get(&pasted).unwrap();
        assert_eq!(pasted_node.name, "A");
        assert_eq!(pasted_node.children.len(), 1);
        let pasted_child = &pasted_node.children[0];
        assert_eq!(editor.forest().get(pasted_child).unwrap().name, "A1");
        assert_eq!(editor.forest().len(), 5);
        editor.forest().check_invariants().unwrap();
    }

    #[test]
    fn test_paste_empty_clipboard_fails() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        assert_eq!(editor.paste(Some(&root)), Err(CommandError::EmptyClipboard));
    }

    #[test]
    fn test_move_under_previous_sibling() {
        let mut editor = MapEditor::new();
        let root = root_of(&editor);
        let a = editor.add_child(&root).unwrap();
        let b = editor.add_child(&root).unwrap();

        editor.move_under_previous_sibling(&b).unwrap();
        assert_eq!(editor.forest().children(&a).unwrap(), &[b.clone()]);

        // First child has no previous sibling: no-op.
        editor.move_under_previous_sibling(&a).unwrap();
        assert_eq!(editor.forest().parent_of(&a), Some(&root));

        // Move left restores the old shape.
        editor.move_to_parent_sibling(&b).unwrap();
        assert_eq!(editor.forest().children(&root).unwrap(), &[a, b]);
    }

    #[test]
    fn test_execute_requires_selection() {
        let mut editor = MapEditor::new();
        editor.select(None).unwrap();

        let err = editor
            .execute(Command::Structure(StructureCommand::AddChild))
            .unwrap_err();
        assert_eq!(err, CommandError::NoSelection);

        // Delete with no selection is the documented silent no-op.
        let result = editor
            .execute(Command::Structure(StructureCommand::DeleteSelected))
            .unwrap();
        assert_eq!(result, CommandResult::Success);
    }
}
