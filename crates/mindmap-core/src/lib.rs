#![warn(missing_docs)]
//! Mindmap Core - Headless Mind-Map / Outline Editor Kernel
//!
//! # Overview
//!
//! `mindmap-core` is the headless kernel of a mind-map editor: it owns the
//! document model (a forest of named, colored, collapsible nodes), every
//! mutation of it, undo/redo, spatial layout and JSON persistence. It does
//! not render anything; a frontend draws the boxes from the computed
//! layout and feeds user actions back in as commands.
//!
//! # Core Features
//!
//! - **Tree Store**: id-addressed forest with ordered children and
//!   strictly maintained structural invariants
//! - **Mutation Engine**: add/delete/rename/recolor/move/copy-paste, all
//!   validated up front (acyclicity guard) and recorded for undo
//! - **Undo/Redo Log**: linear two-stack history of invertible action
//!   records, deletions restored attribute- and index-exact
//! - **Layout Engine**: deterministic left-to-right tree layout with
//!   word-wrap-aware node heights and spatial arrow-key navigation
//! - **Persistence Codec**: flat JSON document format, lenient about
//!   legacy numeric ids, strict about structure
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Workspace (multi-document)                 │  ← One entry per window
//! ├─────────────────────────────────────────────┤
//! │  State Manager (versions + notifications)   │  ← Frontend sync
//! ├─────────────────────────────────────────────┤
//! │  Command Interface & Mutation Engine        │  ← All writes
//! ├─────────────────────────────────────────────┤
//! │  History Log │ Layout │ Codec │ Export      │  ← Services
//! ├─────────────────────────────────────────────┤
//! │  Forest (node table + root order)           │  ← Document model
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mindmap_core::{Command, MapEditor, StructureCommand};
//!
//! let mut editor = MapEditor::new();
//! let root = editor.forest().roots()[0].clone();
//!
//! // Direct, id-addressed API:
//! let child = editor.add_child_named(&root, "First idea").unwrap();
//!
//! // Or the selection-relative command interface frontends use:
//! editor.select(Some(child.clone())).unwrap();
//! editor.execute(Command::Structure(StructureCommand::AddChild)).unwrap();
//!
//! editor.undo();
//! assert_eq!(editor.forest().children(&child).unwrap().len(), 0);
//! ```
//!
//! # Module Description
//!
//! - [`node`] - node identifiers and the node record
//! - [`forest`] - the tree store and its invariants
//! - [`commands`] - mutation engine and unified command interface
//! - [`history`] - undo/redo action records and the two-stack log
//! - [`layout`] - spatial layout and nearest-node navigation
//! - [`codec`] - JSON document persistence
//! - [`export`] - tab-indented plain-text export
//! - [`state`] - versioned state snapshots and change notifications
//! - [`workspace`] - multi-document management

pub mod codec;
pub mod commands;
pub mod export;
pub mod forest;
pub mod history;
pub mod layout;
pub mod node;
pub mod state;
pub mod workspace;

pub use codec::CodecError;
pub use commands::{
    AttributeCommand, ClipboardCommand, Command, CommandError, CommandResult, DEFAULT_NODE_NAME,
    HistoryCommand, MapEditor, SiblingOrder, StructureCommand, ViewCommand,
};
pub use forest::{DEFAULT_ROOT_NAME, Forest};
pub use history::{ActionRecord, HistoryLog, RedoOutcome, SubtreeSnapshot, UndoOutcome};
pub use layout::{
    DropZone, Layout, LayoutEngine, MonospaceMeasure, NodePosition, TextMeasure, drop_zone,
    nearest_above, nearest_below,
};
pub use node::{DEFAULT_COLOR, Node, NodeId};
pub use state::{
    DocumentState, HistoryState, MapState, MapStateManager, StateChange, StateChangeCallback,
    StateChangeType,
};
pub use workspace::{MapId, Workspace, WorkspaceError};
