//! # Tree Mutations
//!
//! Pure structural edits. Every operation takes the current tree by
//! reference and returns a [`Cow`]:
//!
//! - `Cow::Borrowed(tree)`: nothing changed, the request did not apply
//! - `Cow::Owned(next)`: a new tree, the input is untouched
//!
//! ## No-op policy
//!
//! A missing id, a variant without the needed slot, or an illegal
//! relocation target is not an error. Edits coming from the UI are applied
//! optimistically and the node they name may already be gone.
//!
//! The only failure is [`MutationError::DuplicateId`]: a caller-supplied node
//! would put an id into the tree twice.
//!
//! ## Relocation
//!
//! - Detach the moved subtree, then reattach it next to or under the target
//! - Rejected when the target is the moved node or inside the moved subtree
//! - The root never moves and has no siblings

use jsontree_model::{DataValue, Node, NodeId, NodeKind};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),
}

pub type MutationResult<'a> = Result<Cow<'a, Node>, MutationError>;

/// Where a relocated node lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    /// Sibling immediately before the target
    InsertBefore,

    /// Sibling immediately after the target
    InsertAfter,

    /// Last child of the target
    Adopt,
}

/// Partial node fields for [`update_fields`]
///
/// Unset fields keep their current value. `name: Some(None)` clears the
/// name and `value: Some(DataValue::Null)` stores `null`. `value` only
/// applies to `Data` nodes and `children` only to containers; an update
/// carrying a field the node cannot hold is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub name: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub value: Option<DataValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

/// Distinguish an explicit `null` from a missing key (keep)
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl FieldUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Some(name.into()));
        self
    }

    pub fn clear_name(mut self) -> Self {
        self.name = Some(None);
        self
    }

    pub fn value(mut self, value: impl Into<DataValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Merged copy of `node`, or `None` when a field does not apply
    fn merge_into(&self, node: &Node) -> Option<Node> {
        let mut merged = node.clone();

        if let Some(name) = &self.name {
            merged.name = name.clone();
        }

        match &mut merged.kind {
            NodeKind::Data { value } => {
                if self.children.is_some() {
                    return None;
                }
                if let Some(new_value) = &self.value {
                    *value = new_value.clone();
                }
            }
            NodeKind::Root { children, .. }
            | NodeKind::Object { children }
            | NodeKind::List { children } => {
                if self.value.is_some() {
                    return None;
                }
                if let Some(new_children) = &self.children {
                    if new_children.iter().any(contains_root) {
                        return None;
                    }
                    *children = new_children.clone();
                }
            }
        }

        Some(merged)
    }
}

/// Semantic edits as data
///
/// ```text
/// { "op": "relocate", "node_id": "…", "target_id": "…", "placement": "adopt" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Shallow-merge fields into a node
    UpdateFields {
        node_id: NodeId,
        #[serde(default)]
        fields: FieldUpdate,
    },

    /// Replace the node with the same id as `node`
    ReplaceSubtree { node: Node },

    /// Append a node to a container's children
    AddChild { parent_id: NodeId, node: Node },

    /// Remove a direct child from a container
    RemoveChild { parent_id: NodeId, child_id: NodeId },

    /// Move a subtree next to or under another node
    Relocate {
        node_id: NodeId,
        target_id: NodeId,
        placement: Placement,
    },
}

impl Mutation {
    pub fn apply<'a>(&self, tree: &'a Node) -> MutationResult<'a> {
        match self {
            Mutation::UpdateFields { node_id, fields } => {
                update_fields(tree, node_id.as_str(), fields)
            }
            Mutation::ReplaceSubtree { node } => replace_subtree(tree, node),
            Mutation::AddChild { parent_id, node } => {
                add_child(tree, parent_id.as_str(), node.clone())
            }
            Mutation::RemoveChild {
                parent_id,
                child_id,
            } => Ok(remove_child(tree, parent_id.as_str(), child_id.as_str())),
            Mutation::Relocate {
                node_id,
                target_id,
                placement,
            } => Ok(relocate(
                tree,
                node_id.as_str(),
                target_id.as_str(),
                *placement,
            )),
        }
    }

    /// Short label for logs and history listings
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::UpdateFields { .. } => "update-fields",
            Mutation::ReplaceSubtree { .. } => "replace-subtree",
            Mutation::AddChild { .. } => "add-child",
            Mutation::RemoveChild { .. } => "remove-child",
            Mutation::Relocate { .. } => "relocate",
        }
    }
}

/// Shallow-merge `fields` into the node with `node_id`
pub fn update_fields<'a>(
    tree: &'a Node,
    node_id: &str,
    fields: &FieldUpdate,
) -> MutationResult<'a> {
    let Some(target) = tree.find(node_id) else {
        debug!(node_id, "update_fields: node not found");
        return Ok(Cow::Borrowed(tree));
    };

    let Some(merged) = fields.merge_into(target) else {
        debug!(node_id, node_type = %target.node_type(), "update_fields: field not applicable");
        return Ok(Cow::Borrowed(tree));
    };

    if merged == *target {
        return Ok(Cow::Borrowed(tree));
    }

    if let Some(children) = &fields.children {
        let vacated: Vec<&Node> = target.children().unwrap_or_default().iter().collect();
        let incoming: Vec<&Node> = children.iter().collect();
        ensure_unique_ids(tree, &vacated, &incoming)?;
    }

    Ok(Cow::Owned(put(tree, merged)))
}

/// Replace the node whose id matches `replacement.id`
///
/// The replacement keeps the target's place in its container. Turning a
/// root into a non-root (or the reverse) does not apply.
pub fn replace_subtree<'a>(tree: &'a Node, replacement: &Node) -> MutationResult<'a> {
    let Some(target) = tree.find(replacement.id.as_str()) else {
        debug!(node_id = %replacement.id, "replace_subtree: node not found");
        return Ok(Cow::Borrowed(tree));
    };

    let nested_root = replacement
        .children()
        .map(|children| children.iter().any(contains_root))
        .unwrap_or(false);
    if target.is_root() != replacement.is_root() || nested_root {
        debug!(node_id = %replacement.id, "replace_subtree: root cannot change position");
        return Ok(Cow::Borrowed(tree));
    }

    if replacement == target {
        return Ok(Cow::Borrowed(tree));
    }

    ensure_unique_ids(tree, &[target], &[replacement])?;

    Ok(Cow::Owned(put(tree, replacement.clone())))
}

/// Append `new_node` as the last child of `parent_id`
pub fn add_child<'a>(tree: &'a Node, parent_id: &str, new_node: Node) -> MutationResult<'a> {
    let Some(parent) = tree.find(parent_id) else {
        debug!(parent_id, "add_child: parent not found");
        return Ok(Cow::Borrowed(tree));
    };

    if !parent.has_children() || contains_root(&new_node) {
        debug!(parent_id, node_type = %parent.node_type(), "add_child: not applicable");
        return Ok(Cow::Borrowed(tree));
    }

    ensure_unique_ids(tree, &[], &[&new_node])?;

    let mut next = tree.clone();
    if let Some(children) = next.find_mut(parent_id).and_then(Node::children_mut) {
        children.push(new_node);
    }
    Ok(Cow::Owned(next))
}

/// Remove the direct child `child_id` of `parent_id`
pub fn remove_child<'a>(tree: &'a Node, parent_id: &str, child_id: &str) -> Cow<'a, Node> {
    let position = tree
        .find(parent_id)
        .and_then(Node::children)
        .and_then(|children| children.iter().position(|c| c.id.as_str() == child_id));

    let Some(position) = position else {
        debug!(parent_id, child_id, "remove_child: not applicable");
        return Cow::Borrowed(tree);
    };

    let mut next = tree.clone();
    if let Some(children) = next.find_mut(parent_id).and_then(Node::children_mut) {
        children.remove(position);
    }
    Cow::Owned(next)
}

/// Move the subtree at `moved_id` relative to `target_id`
pub fn relocate<'a>(
    tree: &'a Node,
    moved_id: &str,
    target_id: &str,
    placement: Placement,
) -> Cow<'a, Node> {
    if moved_id == target_id {
        debug!(moved_id, "relocate: target is the moved node");
        return Cow::Borrowed(tree);
    }

    let mut next = tree.clone();
    let Some(detached) = detach(&mut next, moved_id) else {
        debug!(moved_id, "relocate: node not found or is the root");
        return Cow::Borrowed(tree);
    };

    if detached.contains(target_id) {
        debug!(moved_id, target_id, "relocate: target inside moved subtree");
        return Cow::Borrowed(tree);
    }

    if attach(&mut next, detached, target_id, placement).is_err() {
        debug!(target_id, ?placement, "relocate: target cannot take the node");
        return Cow::Borrowed(tree);
    }

    if next == *tree {
        return Cow::Borrowed(tree);
    }
    Cow::Owned(next)
}

/// Copy of `tree` with the node sharing `node.id` swapped for `node`
fn put(tree: &Node, node: Node) -> Node {
    if tree.id == node.id {
        return node;
    }
    let mut next = tree.clone();
    if let Some(slot) = next.find_mut(node.id.as_str()) {
        *slot = node;
    }
    next
}

/// Remove the node with `id` from whichever container holds it
fn detach(tree: &mut Node, id: &str) -> Option<Node> {
    let (children, pos) = sibling_slot(tree, id)?;
    Some(children.remove(pos))
}

/// Insert `node` relative to `target_id`, handing it back on failure
fn attach(tree: &mut Node, node: Node, target_id: &str, placement: Placement) -> Result<(), Node> {
    match placement {
        Placement::Adopt => match tree.find_mut(target_id).and_then(Node::children_mut) {
            Some(children) => {
                children.push(node);
                Ok(())
            }
            None => Err(node),
        },
        Placement::InsertBefore | Placement::InsertAfter => match sibling_slot(tree, target_id) {
            Some((children, pos)) => {
                let index = if placement == Placement::InsertAfter { pos + 1 } else { pos };
                children.insert(index, node);
                Ok(())
            }
            None => Err(node),
        },
    }
}

/// Children vector holding `id` and its position there. `None` for the root.
fn sibling_slot<'a>(tree: &'a mut Node, id: &str) -> Option<(&'a mut Vec<Node>, usize)> {
    let path = tree.path_to(id)?;
    let (&pos, parent) = path.split_last()?;
    let children = tree.at_path_mut(parent)?.children_mut()?;
    Some((children, pos))
}

fn contains_root(node: &Node) -> bool {
    node.iter().any(Node::is_root)
}

/// Fail if `incoming` repeats an id, or reuses one still in the tree once
/// the `vacated` subtrees are gone
fn ensure_unique_ids(
    tree: &Node,
    vacated: &[&Node],
    incoming: &[&Node],
) -> Result<(), MutationError> {
    let freed: HashSet<&str> = vacated
        .iter()
        .flat_map(|n| n.ids())
        .map(NodeId::as_str)
        .collect();

    let mut taken: HashSet<&str> = tree
        .ids()
        .map(NodeId::as_str)
        .filter(|id| !freed.contains(id))
        .collect();

    for id in incoming.iter().flat_map(|n| n.ids()) {
        if !taken.insert(id.as_str()) {
            return Err(MutationError::DuplicateId(id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Node {
        Node::root(vec![
            Node::object(vec![
                Node::data(1).named("x").with_id("x"),
                Node::data(2).named("y").with_id("y"),
            ])
            .named("a")
            .with_id("a"),
            Node::list(vec![Node::data(true).with_id("l0")])
                .named("b")
                .with_id("b"),
            Node::data("leaf").named("c").with_id("c"),
        ])
        .with_id("root")
    }

    fn child_ids<'a>(tree: &'a Node, id: &str) -> Vec<&'a str> {
        tree.find(id)
            .and_then(Node::children)
            .unwrap()
            .iter()
            .map(|c| c.id.as_str())
            .collect()
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::Relocate {
            node_id: NodeId::from("x"),
            target_id: NodeId::from("b"),
            placement: Placement::Adopt,
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_mutation_wire_format() {
        let mutation: Mutation = serde_json::from_value(serde_json::json!({
            "op": "update_fields",
            "node_id": "x",
            "fields": { "name": "renamed" }
        }))
        .unwrap();

        assert_eq!(
            mutation,
            Mutation::UpdateFields {
                node_id: NodeId::from("x"),
                fields: FieldUpdate::default().name("renamed"),
            }
        );

        let tree = fixture();
        let next = mutation.apply(&tree).unwrap();
        assert_eq!(next.find("x").unwrap().name.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_field_update_null_clears_name() {
        let update: FieldUpdate = serde_json::from_str(r#"{ "name": null }"#).unwrap();
        assert_eq!(update.name, Some(None));

        let update: FieldUpdate = serde_json::from_str(r#"{ "value": 3 }"#).unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.value, Some(DataValue::from(3)));
    }

    #[test]
    fn test_field_update_null_sets_null_value() {
        let update: FieldUpdate = serde_json::from_str(r#"{ "value": null }"#).unwrap();
        assert_eq!(update, FieldUpdate::default().value(DataValue::Null));

        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"value":null}"#);
        let parsed: FieldUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, update);

        let missing: FieldUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.value, None);
    }

    #[test]
    fn test_update_fields_null_value_over_wire() {
        let mutation: Mutation = serde_json::from_value(serde_json::json!({
            "op": "update_fields",
            "node_id": "x",
            "fields": { "value": null }
        }))
        .unwrap();

        let tree = fixture();
        let next = mutation.apply(&tree).unwrap();
        assert!(matches!(next, Cow::Owned(_)));
        assert_eq!(next.find("x").unwrap().value(), Some(&DataValue::Null));
    }

    #[test]
    fn test_update_fields_preserves_identity() {
        let tree = fixture();
        let fields = FieldUpdate::default().name("renamed").value("v");
        let next = update_fields(&tree, "x", &fields).unwrap();

        let node = next.find("x").unwrap();
        assert_eq!(node.name.as_deref(), Some("renamed"));
        assert_eq!(node.value(), Some(&DataValue::from("v")));
        assert_eq!(node.id.as_str(), "x");
        assert!(matches!(next, Cow::Owned(_)));

        // input untouched
        assert_eq!(tree.find("x").unwrap().name.as_deref(), Some("x"));
    }

    #[test]
    fn test_update_fields_missing_node_is_noop() {
        let tree = fixture();
        let next = update_fields(&tree, "gone", &FieldUpdate::default().name("z")).unwrap();
        assert!(matches!(next, Cow::Borrowed(_)));
    }

    #[test]
    fn test_update_fields_value_on_container_is_noop() {
        let tree = fixture();
        let next = update_fields(&tree, "a", &FieldUpdate::default().value(1)).unwrap();
        assert!(matches!(next, Cow::Borrowed(_)));

        let next = update_fields(&tree, "c", &FieldUpdate::default().children(vec![])).unwrap();
        assert!(matches!(next, Cow::Borrowed(_)));
    }

    #[test]
    fn test_update_fields_children_may_reuse_old_child_ids() {
        let tree = fixture();
        let mut children = tree.find("a").unwrap().children().unwrap().to_vec();
        children.push(Node::placeholder().with_id("new"));

        let next = update_fields(&tree, "a", &FieldUpdate::default().children(children)).unwrap();
        assert_eq!(child_ids(&next, "a"), vec!["x", "y", "new"]);
    }

    #[test]
    fn test_update_fields_children_rejects_foreign_ids() {
        let tree = fixture();
        let children = vec![Node::data(0).named("dup").with_id("c")];
        let err = update_fields(&tree, "a", &FieldUpdate::default().children(children))
            .unwrap_err();
        assert_eq!(err, MutationError::DuplicateId(NodeId::from("c")));
    }

    #[test]
    fn test_add_child_appends() {
        let tree = fixture();
        let next = add_child(&tree, "b", Node::data(false).with_id("l1")).unwrap();
        assert_eq!(child_ids(&next, "b"), vec!["l0", "l1"]);
    }

    #[test]
    fn test_add_child_to_data_is_noop() {
        let tree = fixture();
        let next = add_child(&tree, "c", Node::data(0).with_id("n")).unwrap();
        assert!(matches!(next, Cow::Borrowed(_)));
    }

    #[test]
    fn test_add_child_rejects_duplicate_id() {
        let tree = fixture();
        let err = add_child(&tree, "b", Node::data(0).with_id("x")).unwrap_err();
        assert_eq!(err, MutationError::DuplicateId(NodeId::from("x")));
    }

    #[test]
    fn test_add_child_rejects_root() {
        let tree = fixture();
        let next = add_child(&tree, "a", Node::root(vec![]).named("r")).unwrap();
        assert!(matches!(next, Cow::Borrowed(_)));
    }

    #[test]
    fn test_remove_child() {
        let tree = fixture();
        let next = remove_child(&tree, "a", "x");
        assert_eq!(child_ids(&next, "a"), vec!["y"]);

        assert!(matches!(remove_child(&tree, "a", "c"), Cow::Borrowed(_)));
        assert!(matches!(remove_child(&tree, "c", "x"), Cow::Borrowed(_)));
        assert!(matches!(remove_child(&tree, "gone", "x"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_relocate_before_and_after() {
        let tree = fixture();

        let next = relocate(&tree, "c", "a", Placement::InsertBefore);
        assert_eq!(child_ids(&next, "root"), vec!["c", "a", "b"]);

        let next = relocate(&tree, "x", "y", Placement::InsertAfter);
        assert_eq!(child_ids(&next, "a"), vec!["y", "x"]);

        let next = relocate(&tree, "l0", "x", Placement::InsertAfter);
        assert_eq!(child_ids(&next, "a"), vec!["x", "l0", "y"]);
        assert!(child_ids(&next, "b").is_empty());
    }

    #[test]
    fn test_relocate_adopt() {
        let tree = fixture();
        let next = relocate(&tree, "a", "b", Placement::Adopt);
        assert_eq!(child_ids(&next, "b"), vec!["l0", "a"]);
        // subtree travels intact
        assert_eq!(next.find("a").unwrap(), tree.find("a").unwrap());
    }

    #[test]
    fn test_relocate_onto_itself_is_noop() {
        let tree = fixture();
        for placement in [Placement::InsertBefore, Placement::InsertAfter, Placement::Adopt] {
            assert!(matches!(relocate(&tree, "a", "a", placement), Cow::Borrowed(_)));
        }
    }

    #[test]
    fn test_relocate_into_descendant_is_noop() {
        let tree = fixture();
        let next = relocate(&tree, "a", "x", Placement::Adopt);
        assert!(matches!(next, Cow::Borrowed(_)));
        assert_eq!(*next, tree);
    }

    #[test]
    fn test_relocate_root_or_around_root_is_noop() {
        let tree = fixture();
        assert!(matches!(relocate(&tree, "root", "a", Placement::Adopt), Cow::Borrowed(_)));
        assert!(matches!(relocate(&tree, "a", "root", Placement::InsertBefore), Cow::Borrowed(_)));
        assert!(matches!(relocate(&tree, "c", "x", Placement::Adopt), Cow::Borrowed(_)));
    }

    #[test]
    fn test_relocate_to_current_position_is_noop() {
        let tree = fixture();
        let next = relocate(&tree, "b", "a", Placement::InsertAfter);
        assert!(matches!(next, Cow::Borrowed(_)));
    }

    #[test]
    fn test_relocate_in_deep_chain() {
        let mut bottom = Node::data(0).named("v").with_id("bottom");
        for depth in 0..1000 {
            bottom = Node::object(vec![bottom]).named(format!("d{depth}"));
        }
        let tree = Node::root(vec![bottom, Node::list(vec![]).with_id("sink")]).with_id("root");

        let next = relocate(&tree, "bottom", "sink", Placement::Adopt);
        assert_eq!(child_ids(&next, "sink"), vec!["bottom"]);
        assert_eq!(next.parent_of("bottom").unwrap().id.as_str(), "sink");

        let back = relocate(&next, "bottom", "sink", Placement::InsertBefore);
        assert_eq!(child_ids(&back, "root")[1], "bottom");
    }

    #[test]
    fn test_replace_subtree() {
        let tree = fixture();
        let replacement = Node::list(vec![Node::data(9).with_id("nine")])
            .named("a")
            .with_id("a");
        let next = replace_subtree(&tree, &replacement).unwrap();
        assert_eq!(next.find("a").unwrap(), &replacement);
        assert!(next.find("x").is_none());
        assert_eq!(child_ids(&next, "root"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_subtree_rejects_demoting_root() {
        let tree = fixture();
        let replacement = Node::object(vec![]).with_id("root");
        assert!(matches!(replace_subtree(&tree, &replacement).unwrap(), Cow::Borrowed(_)));
    }
}
