//! # JSON Tree Editor
//!
//! Editing engine for JSON documents held as node trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ convert: JSON value ⇄ node tree             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutations: pure edits, old tree → new tree  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: snapshot undo/redo                 │
//! │  - bounded stack                            │
//! │  - coalescing window for bursts             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: import/export, edits, undo/redo    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Trees are values**: edits never touch their input
//! 2. **Ids are stable**: assigned once, never derived from content
//! 3. **No-ops are not errors**: an edit that does not apply leaves the tree
//!    as it was
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jsontree_editor::{EditSession, FieldUpdate, HistoryConfig};
//!
//! let mut session = EditSession::new("cli", HistoryConfig::default());
//! session.import_text(r#"{ "title": "draft" }"#)?;
//!
//! let title = session.tree().resolve_path("/title").unwrap().id.clone();
//! session.update_fields(title, FieldUpdate::default().value("final"))?;
//!
//! session.undo();
//! println!("{}", session.export_text()?);
//! ```

pub mod convert;
mod errors;
pub mod history;
pub mod mutations;
mod session;
pub mod undo_stack;

pub use convert::{from_json, to_json, ConvertError, JsonInput, JsonShape, SharedValue};
pub use errors::EditorError;
pub use history::{HistoryConfig, HistorySession};
pub use mutations::{FieldUpdate, Mutation, MutationError, MutationResult, Placement};
pub use session::EditSession;
pub use undo_stack::UndoStack;

// Re-export model types for convenience
pub use jsontree_model::{DataValue, Node, NodeId, NodeKind, NodeType, TreeStats};
