//! Workspace and multi-document model.
//!
//! The core is UI-agnostic, but the application opens one window per
//! document. This module provides a small [`Workspace`] that owns the open
//! documents: each gets an opaque [`MapId`], its own independent
//! [`MapStateManager`] (forest, history, clipboard and selection are never
//! shared between documents), and optional path metadata for save prompts
//! and window titles.

use crate::codec::{self, CodecError};
use crate::commands::MapEditor;
use crate::forest::Forest;
use crate::state::MapStateManager;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Opaque identifier for an open document in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapId(u64);

impl MapId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Workspace-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// A map id was not found.
    #[error("map not found: {0:?}")]
    MapNotFound(MapId),
    /// Decoding a document failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

struct MapEntry {
    manager: MapStateManager,
    path: Option<String>,
}

/// The set of open documents.
#[derive(Default)]
pub struct Workspace {
    maps: BTreeMap<MapId, MapEntry>,
    next_id: u64,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh single-root document.
    pub fn open_map(&mut self) -> MapId {
        self.insert(MapStateManager::new(), None)
    }

    /// Open an existing forest as a document.
    pub fn open_document(&mut self, forest: Forest, path: Option<String>) -> MapId {
        self.insert(MapStateManager::from_editor(MapEditor::from_forest(forest)), path)
    }

    /// Decode a JSON document and open it.
    pub fn open_from_json(
        &mut self,
        json: &str,
        path: Option<String>,
    ) -> Result<MapId, WorkspaceError> {
        let forest = codec::from_json(json)?;
        Ok(self.open_document(forest, path))
    }

    /// Close a document, dropping its state.
    pub fn close_map(&mut self, id: MapId) -> Result<(), WorkspaceError> {
        self.maps
            .remove(&id)
            .map(|_| info!(map = id.get(), "closed map"))
            .ok_or(WorkspaceError::MapNotFound(id))
    }

    /// The state manager of an open document.
    pub fn map(&self, id: MapId) -> Result<&MapStateManager, WorkspaceError> {
        self.maps
            .get(&id)
            .map(|entry| &entry.manager)
            .ok_or(WorkspaceError::MapNotFound(id))
    }

    /// Mutable access to the state manager of an open document.
    pub fn map_mut(&mut self, id: MapId) -> Result<&mut MapStateManager, WorkspaceError> {
        self.maps
            .get_mut(&id)
            .map(|entry| &mut entry.manager)
            .ok_or(WorkspaceError::MapNotFound(id))
    }

    /// The path a document was opened from (or last saved to).
    pub fn path(&self, id: MapId) -> Result<Option<&str>, WorkspaceError> {
        self.maps
            .get(&id)
            .map(|entry| entry.path.as_deref())
            .ok_or(WorkspaceError::MapNotFound(id))
    }

    /// Record the path of a document (after save-as).
    pub fn set_path(&mut self, id: MapId, path: Option<String>) -> Result<(), WorkspaceError> {
        let entry = self
            .maps
            .get_mut(&id)
            .ok_or(WorkspaceError::MapNotFound(id))?;
        entry.path = path;
        Ok(())
    }

    /// Serialize a document to its JSON form and clear its modified flag.
    pub fn save_to_json(&mut self, id: MapId) -> Result<String, WorkspaceError> {
        let entry = self
            .maps
            .get_mut(&id)
            .ok_or(WorkspaceError::MapNotFound(id))?;
        let json = codec::to_json(entry.manager.editor().forest());
        entry.manager.mark_saved();
        Ok(json)
    }

    /// Ids of all open documents, in opening order.
    pub fn map_ids(&self) -> Vec<MapId> {
        self.maps.keys().copied().collect()
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether no document is open.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    fn insert(&mut self, manager: MapStateManager, path: Option<String>) -> MapId {
        let id = MapId(self.next_id);
        self.next_id += 1;
        info!(map = id.get(), path = path.as_deref(), "opened map");
        self.maps.insert(id, MapEntry { manager, path });
        id
    }
}
