//! # Undo/Redo Stack
//!
//! Snapshot history for a single document tree.
//!
//! ## Design
//!
//! - Each entry is a full tree snapshot taken before an edit
//! - Undo hands back the newest snapshot and parks the current tree on the
//!   redo stack
//! - Redo reverses that, without evicting anything
//! - Recording clears the redo stack
//! - The undo stack is bounded by a depth limit; lowering the limit trims
//!   lazily, one entry per subsequent record
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//!
//! stack.record(tree.clone());
//! tree = edited;
//!
//! if let Some(previous) = stack.undo(&tree) {
//!     tree = previous;
//! }
//! ```

use jsontree_model::Node;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use tracing::trace;

/// Undo levels kept when no limit is configured
pub const DEFAULT_DEPTH_LIMIT: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// Undo/redo stack of tree snapshots
#[derive(Debug, Clone)]
pub struct UndoStack {
    /// Snapshots to go back to (most recent last)
    undo_stack: VecDeque<Node>,

    /// Snapshots to go forward to (most recent first)
    redo_stack: VecDeque<Node>,

    depth_limit: NonZeroUsize,
}

impl UndoStack {
    /// Create a new undo stack with the default depth limit (20)
    pub fn new() -> Self {
        Self::with_depth_limit(DEFAULT_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(depth_limit: NonZeroUsize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            depth_limit,
        }
    }

    /// Record the tree as it was before an edit
    pub fn record(&mut self, snapshot: Node) {
        self.undo_stack.push_back(snapshot);

        if self.undo_stack.len() > self.depth_limit.get() {
            self.undo_stack.pop_front();
        }

        // New edit invalidates the redo branch
        self.redo_stack.clear();

        trace!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "recorded snapshot"
        );
    }

    /// Step back: returns the snapshot to install, `None` if there is nothing
    /// to undo
    pub fn undo(&mut self, current: &Node) -> Option<Node> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push_front(current.clone());

        trace!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "undo"
        );
        Some(previous)
    }

    /// Step forward: returns the snapshot to install, `None` if there is
    /// nothing to redo
    pub fn redo(&mut self, current: &Node) -> Option<Node> {
        let next = self.redo_stack.pop_front()?;
        self.undo_stack.push_back(current.clone());

        trace!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "redo"
        );
        Some(next)
    }

    /// Change the limit for future records. Existing entries above the new
    /// limit are dropped one per record.
    pub fn set_depth_limit(&mut self, depth_limit: NonZeroUsize) {
        self.depth_limit = depth_limit;
    }

    pub fn depth_limit(&self) -> NonZeroUsize {
        self.depth_limit
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo snapshots, oldest first
    pub fn undo_entries(&self) -> impl Iterator<Item = &Node> {
        self.undo_stack.iter()
    }

    /// Redo snapshots, next-to-redo first
    pub fn redo_entries(&self) -> impl Iterator<Item = &Node> {
        self.redo_stack.iter()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
