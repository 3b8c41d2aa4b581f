//! # JSON Tree Model
//!
//! Node definitions shared by the editor and the command line front end.
//!
//! A document is a tree with exactly one [`NodeKind::Root`] at the top.
//! Containers (`Root`, `Object`, `List`) hold ordered children, `Data`
//! leaves hold a JSON primitive. Every node carries an opaque [`NodeId`]
//! assigned at construction which never changes afterwards.

pub mod node;
pub mod stats;

pub use node::{DataValue, Iter, Node, NodeId, NodeKind, NodeType, RootLayout};
pub use stats::{calculate_stats, NodeCounts, TreeStats};
