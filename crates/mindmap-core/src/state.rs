//! Map State Interface
//!
//! Exposes the editor's state to frontends in a structured, immutable
//! manner: state snapshots, a version counter that increments on every
//! observable change, and change-notification callbacks.
//!
//! The manager adopts a unidirectional data flow: frontends execute
//! commands via [`MapStateManager::execute`], the manager classifies the
//! change, bumps the version and fires callbacks, and frontends pull fresh
//! snapshots via the `*_state` methods. Commands that turn out to be
//! no-ops (a rename to the same text, an undo on an empty stack) do not
//! increment the version.
//!
//! # Example
//!
//! ```rust
//! use mindmap_core::{Command, MapStateManager, StructureCommand};
//!
//! let mut manager = MapStateManager::new();
//! manager.subscribe(|change| {
//!     println!("state changed: {:?}", change.change_type);
//! });
//!
//! manager.execute(Command::Structure(StructureCommand::AddChild)).unwrap();
//! assert_eq!(manager.version(), 1);
//! assert!(manager.document_state().is_modified);
//! ```

use crate::commands::{ClipboardCommand, Command, CommandError, CommandResult, MapEditor, ViewCommand};
use crate::forest::Forest;
use crate::history::{RedoOutcome, UndoOutcome};
use crate::node::NodeId;
use tracing::trace;

/// Document state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Total node count.
    pub node_count: usize,
    /// Number of root-level nodes.
    pub root_count: usize,
    /// Whether the document has unsaved changes.
    pub is_modified: bool,
    /// State version number (incremented on every observable change).
    pub version: u64,
}

/// Undo/redo stack state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    /// Can undo.
    pub can_undo: bool,
    /// Can redo.
    pub can_redo: bool,
    /// Undo stack depth.
    pub undo_depth: usize,
    /// Redo stack depth.
    pub redo_depth: usize,
}

/// Complete state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapState {
    /// Document state.
    pub document: DocumentState,
    /// Undo/redo state.
    pub history: HistoryState,
    /// Current selection.
    pub selection: Option<NodeId>,
}

/// State change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeType {
    /// Nodes were created, deleted or moved.
    StructureChanged,
    /// A node attribute (name, color, bold) changed.
    AttributeChanged,
    /// Expansion flags changed.
    VisibilityChanged,
    /// The selection changed.
    SelectionChanged,
    /// An undo or redo was applied.
    HistoryApplied,
    /// The whole document was replaced (load / new).
    DocumentReplaced,
}

/// State change record handed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// Change type.
    pub change_type: StateChangeType,
    /// Version before the change.
    pub old_version: u64,
    /// Version after the change.
    pub new_version: u64,
}

/// State change callback function type.
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

/// State manager wrapping a [`MapEditor`].
///
/// Owns the editor, tracks a monotonically increasing version number and
/// notifies subscribers after every observable change.
pub struct MapStateManager {
    editor: MapEditor,
    version: u64,
    callbacks: Vec<StateChangeCallback>,
}

impl MapStateManager {
    /// Create a manager over a fresh single-root document.
    pub fn new() -> Self {
        Self::from_editor(MapEditor::new())
    }

    /// Create a manager over an existing editor.
    pub fn from_editor(editor: MapEditor) -> Self {
        Self {
            editor,
            version: 0,
            callbacks: Vec::new(),
        }
    }

    /// The wrapped editor.
    pub fn editor(&self) -> &MapEditor {
        &self.editor
    }

    /// Mutable access to the wrapped editor.
    ///
    /// Advanced usage: mutations made this way bypass change
    /// classification, so the caller must follow up with
    /// [`MapStateManager::mark_changed`].
    pub fn editor_mut(&mut self) -> &mut MapEditor {
        &mut self.editor
    }

    /// Current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the state has changed since `version`.
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Execute a command, classify the resulting change, and notify
    /// subscribers. No-op commands leave the version untouched.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        let change_type = Self::change_type_for_command(&command);
        let forest_before = self.editor.forest().clone();
        let selection_before = self.editor.selection().cloned();

        let result = self.editor.execute(command)?;

        if let Some(change_type) = change_type {
            let changed = match change_type {
                StateChangeType::SelectionChanged => {
                    self.editor.selection().cloned() != selection_before
                }
                StateChangeType::HistoryApplied => matches!(
                    result,
                    CommandResult::UndoResult(UndoOutcome::Applied)
                        | CommandResult::RedoResult(RedoOutcome::Applied)
                ),
                // Structure, attribute and visibility changes are all
                // visible in the forest itself.
                _ => self.editor.forest() != &forest_before,
            };
            if changed {
                self.mark_changed(change_type);
            } else {
                trace!(?change_type, "command was a no-op; version unchanged");
            }
        }

        Ok(result)
    }

    fn change_type_for_command(command: &Command) -> Option<StateChangeType> {
        match command {
            Command::Structure(_) => Some(StateChangeType::StructureChanged),
            Command::Attribute(_) => Some(StateChangeType::AttributeChanged),
            Command::Clipboard(ClipboardCommand::Paste) => Some(StateChangeType::StructureChanged),
            // Copying reads state without mutating it.
            Command::Clipboard(_) => None,
            Command::History(_) => Some(StateChangeType::HistoryApplied),
            Command::View(ViewCommand::Select { .. }) => Some(StateChangeType::SelectionChanged),
            Command::View(_) => Some(StateChangeType::VisibilityChanged),
        }
    }

    /// Replace the document wholesale (after a load or "new"). History and
    /// clipboard start fresh; subscribers see a single
    /// [`StateChangeType::DocumentReplaced`].
    pub fn replace_document(&mut self, forest: Forest) {
        self.editor = MapEditor::from_forest(forest);
        self.mark_changed(StateChangeType::DocumentReplaced);
    }

    /// Clear the modified flag (after a successful save).
    pub fn mark_saved(&mut self) {
        self.editor.mark_saved();
    }

    /// Bump the version and notify subscribers. Used by
    /// [`MapStateManager::execute`] and by callers of
    /// [`MapStateManager::editor_mut`].
    pub fn mark_changed(&mut self, change_type: StateChangeType) {
        let old_version = self.version;
        self.version += 1;
        let change = StateChange {
            change_type,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }

    /// Subscribe to state change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Document state snapshot.
    pub fn document_state(&self) -> DocumentState {
        let forest = self.editor.forest();
        DocumentState {
            node_count: forest.len(),
            root_count: forest.roots().len(),
            is_modified: self.editor.is_modified(),
            version: self.version,
        }
    }

    /// Undo/redo state snapshot.
    pub fn history_state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.editor.can_undo(),
            can_redo: self.editor.can_redo(),
            undo_depth: self.editor.undo_depth(),
            redo_depth: self.editor.redo_depth(),
        }
    }

    /// Complete state snapshot.
    pub fn full_state(&self) -> MapState {
        MapState {
            document: self.document_state(),
            history: self.history_state(),
            selection: self.editor.selection().cloned(),
        }
    }
}

impl Default for MapStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MapStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapStateManager")
            .field("editor", &self.editor)
            .field("version", &self.version)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
