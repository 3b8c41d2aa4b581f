//! # Edit Session Management
//!
//! An EditSession owns one document tree and its undo history. It is the
//! surface a host (UI, CLI, script runner) talks to:
//!
//! - import/export JSON text
//! - apply edits, each reporting whether the tree changed
//! - undo/redo
//! - stats
//!
//! ## Coalescing
//!
//! Every successful edit stages the tree as it was before the edit. While
//! a burst is still open (a snapshot is pending and the window has not
//! passed) the already-pending baseline is kept, so undo after a burst of
//! typing returns to the state before the first keystroke.
//!
//! ## Nesting
//!
//! JSON text is parsed without serde_json's recursion limit. The parser
//! grows its stack on demand, so any depth that fits in memory imports.

use crate::convert::{from_json, to_json};
use crate::history::{HistoryConfig, HistorySession};
use crate::mutations::{FieldUpdate, Mutation, Placement};
use crate::undo_stack::UndoStack;
use crate::EditorError;
use jsontree_model::{calculate_stats, Node, NodeId, TreeStats};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::time::Instant;
use tracing::{debug, warn};

/// Single editing session over one tree
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    tree: Node,

    history: HistorySession,

    /// Bumped on every change to the tree, undo and redo included
    version: u64,
}

impl EditSession {
    /// Session over an empty document (`{}`)
    pub fn new(id: impl Into<String>, config: HistoryConfig) -> Self {
        Self::with_tree(id, Node::root(vec![]), config)
    }

    pub fn with_tree(id: impl Into<String>, tree: Node, config: HistoryConfig) -> Self {
        Self {
            id: id.into(),
            tree,
            history: HistorySession::new(config),
            version: 0,
        }
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the tree with parsed JSON text
    ///
    /// On failure the current tree is kept. A successful import is one undo
    /// step of its own.
    pub fn import_text(&mut self, text: &str) -> Result<(), EditorError> {
        let value = parse_value(text).map_err(|e| {
            warn!(session = %self.id, error = %e, "rejected import: invalid JSON");
            EditorError::from(e)
        })?;
        self.import_value(&value)
    }

    pub fn import_value(&mut self, value: &Value) -> Result<(), EditorError> {
        let tree = from_json(value).map_err(|e| {
            warn!(session = %self.id, error = %e, "rejected import");
            e
        })?;

        let previous = std::mem::replace(&mut self.tree, tree);
        self.history.record(previous);
        self.version += 1;

        debug!(session = %self.id, nodes = self.tree.size(), "imported document");
        Ok(())
    }

    pub fn export_value(&self) -> Result<Value, EditorError> {
        Ok(to_json(&self.tree)?)
    }

    /// Pretty JSON (2-space indent), checked by parsing it back
    pub fn export_text(&self) -> Result<String, EditorError> {
        let value = self.export_value()?;
        let text =
            serde_json::to_string_pretty(&value).map_err(|e| EditorError::Export(e.to_string()))?;

        parse_value(&text).map_err(|e| EditorError::Export(e.to_string()))?;

        Ok(text)
    }

    /// Apply an edit. Returns whether the tree changed.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<bool, EditorError> {
        self.apply_at(mutation, Instant::now())
    }

    pub fn apply_at(&mut self, mutation: &Mutation, now: Instant) -> Result<bool, EditorError> {
        let next = match mutation.apply(&self.tree)? {
            Cow::Borrowed(_) => None,
            Cow::Owned(next) => Some(next),
        };

        match next {
            Some(next) => {
                debug!(session = %self.id, op = mutation.name(), "applied mutation");
                self.commit(next, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn update_fields(
        &mut self,
        node_id: impl Into<NodeId>,
        fields: FieldUpdate,
    ) -> Result<bool, EditorError> {
        self.apply(&Mutation::UpdateFields {
            node_id: node_id.into(),
            fields,
        })
    }

    pub fn replace_subtree(&mut self, node: Node) -> Result<bool, EditorError> {
        self.apply(&Mutation::ReplaceSubtree { node })
    }

    pub fn add_child(
        &mut self,
        parent_id: impl Into<NodeId>,
        node: Node,
    ) -> Result<bool, EditorError> {
        self.apply(&Mutation::AddChild {
            parent_id: parent_id.into(),
            node,
        })
    }

    /// Append the placeholder child (`Data` named `new` holding `""`)
    pub fn add_default_child(&mut self, parent_id: impl Into<NodeId>) -> Result<bool, EditorError> {
        self.add_child(parent_id, Node::placeholder())
    }

    pub fn remove_child(
        &mut self,
        parent_id: impl Into<NodeId>,
        child_id: impl Into<NodeId>,
    ) -> Result<bool, EditorError> {
        self.apply(&Mutation::RemoveChild {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        })
    }

    pub fn relocate(
        &mut self,
        node_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        placement: Placement,
    ) -> Result<bool, EditorError> {
        self.apply(&Mutation::Relocate {
            node_id: node_id.into(),
            target_id: target_id.into(),
            placement,
        })
    }

    fn commit(&mut self, next: Node, now: Instant) {
        let previous = std::mem::replace(&mut self.tree, next);

        // Close the burst if its window has passed, otherwise keep its baseline
        self.history.poll_at(now);
        let baseline = self.history.cancel().unwrap_or(previous);
        self.history.stage_at(baseline, now);

        self.version += 1;
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.tree) {
            Some(previous) => {
                self.tree = previous;
                self.version += 1;
                true
            }
            None => {
                debug!(session = %self.id, "nothing to undo");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.tree) {
            Some(next) => {
                self.tree = next;
                self.version += 1;
                true
            }
            None => {
                debug!(session = %self.id, "nothing to redo");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn poll(&mut self) -> bool {
        self.history.poll()
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        self.history.poll_at(now)
    }

    /// Close the current burst so the next edit starts a new undo step
    pub fn flush(&mut self) -> bool {
        self.history.flush()
    }

    pub fn history(&self) -> &HistorySession {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistorySession {
        &mut self.history
    }

    pub fn stats(&self) -> TreeStats {
        calculate_stats(&self.tree)
    }

    /// End the session, flushing pending history
    pub fn close(self) -> (Node, UndoStack) {
        (self.tree, self.history.teardown())
    }
}

/// Parse a JSON document of any nesting depth
fn parse_value(text: &str) -> Result<Value, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}
