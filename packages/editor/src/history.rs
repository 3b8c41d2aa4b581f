//! # Coalescing History
//!
//! Wraps an [`UndoStack`] so rapid bursts of edits become one undo step.
//!
//! Snapshots go through two phases:
//!
//! 1. `stage`: the snapshot becomes pending and the coalescing window
//!    restarts. A newer stage replaces it.
//! 2. `flush`: the pending snapshot is recorded.
//!
//! `poll` flushes once the window has passed without a new stage, so a
//! host event loop drives the timer. Nothing runs in the background: all
//! timing goes through `Instant` values, which tests inject via `stage_at`
//! and `poll_at`.

use crate::undo_stack::{UndoStack, DEFAULT_DEPTH_LIMIT};
use jsontree_model::Node;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::trace;

pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum undo levels
    pub depth_limit: NonZeroUsize,

    /// Quiet period after the last stage before a pending snapshot is
    /// recorded
    pub coalesce_window: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            coalesce_window: DEFAULT_COALESCE_WINDOW,
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    snapshot: Node,
    staged_at: Instant,
}

/// Undo history with a coalescing window in front of the stack
#[derive(Debug, Clone)]
pub struct HistorySession {
    stack: UndoStack,
    pending: Option<Pending>,
    coalesce_window: Duration,
}

impl HistorySession {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            stack: UndoStack::with_depth_limit(config.depth_limit),
            pending: None,
            coalesce_window: config.coalesce_window,
        }
    }

    /// Stage a snapshot now
    pub fn stage(&mut self, snapshot: Node) {
        self.stage_at(snapshot, Instant::now());
    }

    /// Stage a snapshot, replacing any pending one and restarting the window
    pub fn stage_at(&mut self, snapshot: Node, now: Instant) {
        if self.pending.is_some() {
            trace!("replacing pending snapshot");
        }
        self.pending = Some(Pending {
            snapshot,
            staged_at: now,
        });
    }

    pub fn pending(&self) -> Option<&Node> {
        self.pending.as_ref().map(|p| &p.snapshot)
    }

    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Record the pending snapshot if its window has elapsed. Returns whether
    /// anything was recorded.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        let due = self
            .pending
            .as_ref()
            .map(|p| now.saturating_duration_since(p.staged_at) >= self.coalesce_window)
            .unwrap_or(false);

        if due {
            self.flush()
        } else {
            false
        }
    }

    /// Record the pending snapshot immediately
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                trace!("flushing pending snapshot");
                self.stack.record(pending.snapshot);
                true
            }
            None => false,
        }
    }

    /// Drop the pending snapshot, handing it back
    pub fn cancel(&mut self) -> Option<Node> {
        self.pending.take().map(|p| p.snapshot)
    }

    /// Record a snapshot directly, bypassing the window
    pub fn record(&mut self, snapshot: Node) {
        self.flush();
        self.stack.record(snapshot);
    }

    pub fn undo(&mut self, current: &Node) -> Option<Node> {
        self.flush();
        self.stack.undo(current)
    }

    pub fn redo(&mut self, current: &Node) -> Option<Node> {
        self.flush();
        self.stack.redo(current)
    }

    /// A pending snapshot counts as an undo step
    pub fn can_undo(&self) -> bool {
        self.pending.is_some() || self.stack.can_undo()
    }

    /// Flushing a pending snapshot clears the redo stack, so nothing is
    /// redoable while one is pending
    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.stack.can_redo()
    }

    pub fn set_depth_limit(&mut self, depth_limit: NonZeroUsize) {
        self.stack.set_depth_limit(depth_limit);
    }

    pub fn set_coalesce_window(&mut self, window: Duration) {
        self.coalesce_window = window;
    }

    pub fn coalesce_window(&self) -> Duration {
        self.coalesce_window
    }

    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    /// Drop all history, pending snapshot included
    pub fn clear(&mut self) {
        self.pending = None;
        self.stack.clear();
    }

    /// Flush and hand back the final stack
    pub fn teardown(mut self) -> UndoStack {
        self.flush();
        self.stack
    }
}

impl Default for HistorySession {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: i64) -> Node {
        Node::root(vec![Node::data(n).named("v").with_id("v")]).with_id("root")
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_config() {
        let config = HistoryConfig::default();
        assert_eq!(config.depth_limit.get(), 20);
        assert_eq!(config.coalesce_window, ms(300));
    }

    #[test]
    fn test_poll_respects_window() {
        let mut history = HistorySession::default();
        let t0 = Instant::now();

        history.stage_at(snapshot(0), t0);
        assert!(!history.poll_at(t0 + ms(299)));
        assert_eq!(history.stack().undo_levels(), 0);

        assert!(history.poll_at(t0 + ms(300)));
        assert_eq!(history.stack().undo_levels(), 1);
        assert!(history.pending().is_none());
    }

    #[test]
    fn test_restage_restarts_window() {
        let mut history = HistorySession::default();
        let t0 = Instant::now();

        history.stage_at(snapshot(0), t0);
        history.stage_at(snapshot(1), t0 + ms(200));

        assert!(!history.poll_at(t0 + ms(400)));
        assert!(history.poll_at(t0 + ms(500)));

        // one entry, holding the latest stage
        assert_eq!(history.stack().undo_levels(), 1);
        assert_eq!(history.stack().undo_entries().next(), Some(&snapshot(1)));
    }

    #[test]
    fn test_flush_and_cancel() {
        let mut history = HistorySession::default();
        assert!(!history.flush());

        history.stage(snapshot(0));
        assert_eq!(history.cancel(), Some(snapshot(0)));
        assert!(!history.flush());

        history.stage(snapshot(1));
        assert!(history.flush());
        assert_eq!(history.stack().undo_levels(), 1);
    }

    #[test]
    fn test_undo_flushes_pending() {
        let mut history = HistorySession::default();
        history.stage(snapshot(0));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.undo(&snapshot(1)).unwrap();
        assert_eq!(restored, snapshot(0));
        assert!(history.can_redo());
    }

    #[test]
    fn test_pending_blocks_redo() {
        let mut history = HistorySession::default();
        history.record(snapshot(0));
        history.undo(&snapshot(1));
        assert!(history.can_redo());

        history.stage(snapshot(0));
        assert!(!history.can_redo());
        assert!(history.redo(&snapshot(2)).is_none());
    }

    #[test]
    fn test_teardown_flushes() {
        let mut history = HistorySession::default();
        history.stage_at(snapshot(0), Instant::now());

        let stack = history.teardown();
        assert_eq!(stack.undo_levels(), 1);
    }
}
