//! Integration tests for editor crate

use jsontree_editor::{
    from_json, to_json, ConvertError, EditSession, EditorError, FieldUpdate, HistoryConfig,
    Mutation, Node, NodeKind, NodeType, Placement, SharedValue,
};
use serde_json::{json, Value};

fn session_with(value: Value) -> anyhow::Result<EditSession> {
    let mut session = EditSession::new("integration", HistoryConfig::default());
    session.import_value(&value)?;
    Ok(session)
}

#[test]
fn test_empty_object_round_trip() -> anyhow::Result<()> {
    let tree = from_json(&json!({}))?;
    assert_eq!(tree.node_type(), NodeType::Root);
    assert_eq!(tree.children().map(<[Node]>::len), Some(0));
    assert_eq!(to_json(&tree)?, json!({}));
    Ok(())
}

#[test]
fn test_nested_document_shape() -> anyhow::Result<()> {
    let input = json!({ "a": 1, "b": [true, null] });
    let tree = from_json(&input)?;

    let children = tree.children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name.as_deref(), Some("a"));
    assert_eq!(children[0].node_type(), NodeType::Data);
    assert_eq!(children[1].name.as_deref(), Some("b"));
    match &children[1].kind {
        NodeKind::List { children } => {
            assert_eq!(children.len(), 2);
            assert!(children.iter().all(|c| c.node_type() == NodeType::Data));
        }
        other => panic!("expected list, got {:?}", other),
    }

    assert_eq!(to_json(&tree)?, input);
    Ok(())
}

#[test]
fn test_empty_name_fails_export() -> anyhow::Result<()> {
    let tree = Node::root(vec![Node::data(1).named("").with_id("blank")]);
    let err = to_json(&tree).unwrap_err();
    assert_eq!(err, ConvertError::InvalidName("blank".into()));
    Ok(())
}

#[test]
fn test_self_referencing_input() {
    let obj = SharedValue::object();
    obj.insert("self", obj.clone());

    assert_eq!(from_json(&obj), Err(ConvertError::CircularReference));
}

#[test]
fn test_document_workflow() -> anyhow::Result<()> {
    let mut session = session_with(json!({
        "name": "widget",
        "tags": ["a", "b"],
        "size": { "w": 10, "h": 20 }
    }))?;

    let root = session.tree().id.clone();
    let tags = session.tree().resolve_path("/tags").unwrap().id.clone();
    let size = session.tree().resolve_path("/size").unwrap().id.clone();
    let h = session.tree().resolve_path("/size/h").unwrap().id.clone();

    assert!(session.add_child(tags, Node::data("c"))?);
    session.flush();
    assert!(session.relocate(h, root.clone(), Placement::Adopt)?);
    session.flush();
    assert!(session.update_fields(size, FieldUpdate::default().name("dims"))?);
    session.flush();

    assert_eq!(
        session.export_value()?,
        json!({
            "name": "widget",
            "tags": ["a", "b", "c"],
            "dims": { "w": 10 },
            "h": 20
        })
    );

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(
        session.export_value()?,
        json!({
            "name": "widget",
            "tags": ["a", "b", "c"],
            "size": { "w": 10, "h": 20 }
        })
    );

    assert!(session.redo());
    assert_eq!(session.export_value()?["h"], json!(20));
    Ok(())
}

#[test]
fn test_import_error_messages() -> anyhow::Result<()> {
    let mut session = session_with(json!({ "keep": true }))?;

    let err = session.import_text("[1, 2,").unwrap_err();
    match &err {
        EditorError::Parse { line, column, .. } => {
            assert_eq!(*line, 1);
            assert!(*column > 0);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Parse error:"));

    let err = session.import_text("\"text\"").unwrap_err();
    assert_eq!(err.to_string(), "Input is not a valid JSON object");

    assert_eq!(session.export_value()?, json!({ "keep": true }));
    Ok(())
}

#[test]
fn test_top_level_array_document() -> anyhow::Result<()> {
    let mut session = session_with(json!([1, { "x": 2 }]))?;
    let root = session.tree().id.clone();

    session.add_child(root, Node::data(3))?;
    assert_eq!(session.export_value()?, json!([1, { "x": 2 }, 3]));
    Ok(())
}

#[test]
fn test_mutations_from_script_text() -> anyhow::Result<()> {
    let mut session = session_with(json!({ "a": 1 }))?;
    let a = session.tree().resolve_path("/a").unwrap().id.clone();

    let script = format!(
        r#"[
            {{ "op": "update_fields", "node_id": "{a}", "fields": {{ "value": "one" }} }},
            {{
                "op": "add_child",
                "parent_id": "{root}",
                "node": {{ "type": "list", "name": "l", "children": [] }}
            }}
        ]"#,
        root = session.tree().id
    );
    let steps: Vec<Mutation> = serde_json::from_str(&script)?;

    for step in &steps {
        assert!(session.apply(step)?);
    }

    assert_eq!(session.export_value()?, json!({ "a": "one", "l": [] }));
    Ok(())
}

#[test]
fn test_deeply_nested_document_round_trip() -> anyhow::Result<()> {
    let depth = 1000;
    let text = format!("{}1{}", r#"{"k":"#.repeat(depth), "}".repeat(depth));

    let mut session = EditSession::new("deep", HistoryConfig::default());
    session.import_text(&text)?;
    assert_eq!(session.stats().max_depth, depth + 1);

    let exported = session.export_text()?;
    let compact: String = exported.split_whitespace().collect();
    assert_eq!(compact, text);
    Ok(())
}

#[test]
fn test_null_value_through_wire_format() -> anyhow::Result<()> {
    let mut session = session_with(json!({ "a": 1 }))?;
    let a = session.tree().resolve_path("/a").unwrap().id.clone();

    let step: Mutation = serde_json::from_value(json!({
        "op": "update_fields",
        "node_id": a,
        "fields": { "value": null }
    }))?;
    assert_eq!(
        serde_json::from_value::<Mutation>(serde_json::to_value(&step)?)?,
        step
    );

    assert!(session.apply(&step)?);
    assert_eq!(session.export_value()?, json!({ "a": null }));

    assert!(session.undo());
    assert_eq!(session.export_value()?, json!({ "a": 1 }));
    Ok(())
}

#[test]
fn test_list_item_moved_into_object_needs_a_name() -> anyhow::Result<()> {
    let mut session = session_with(json!({ "list": [1, 2], "obj": {} }))?;
    let item = session.tree().resolve_path("/list/0").unwrap().id.clone();
    let obj = session.tree().resolve_path("/obj").unwrap().id.clone();

    assert!(session.relocate(item.clone(), obj, Placement::Adopt)?);
    let err = session.export_text().unwrap_err();
    assert!(matches!(
        err,
        EditorError::Convert(ConvertError::InvalidName(ref id)) if *id == item
    ));

    session.update_fields(item, FieldUpdate::default().name("first"))?;
    assert_eq!(
        session.export_value()?,
        json!({ "list": [2], "obj": { "first": 1 } })
    );
    Ok(())
}

#[test]
fn test_named_node_moved_into_list_keeps_name_in_tree() -> anyhow::Result<()> {
    let mut session = session_with(json!({ "list": [1], "x": "moved" }))?;
    let x = session.tree().resolve_path("/x").unwrap().id.clone();
    let list = session.tree().resolve_path("/list").unwrap().id.clone();
    let root = session.tree().id.clone();

    assert!(session.relocate(x.clone(), list, Placement::Adopt)?);
    assert_eq!(session.export_value()?, json!({ "list": [1, "moved"] }));
    assert_eq!(
        session.tree().find(x.as_str()).unwrap().name.as_deref(),
        Some("x")
    );

    // Back in an object the retained name is the key again
    assert!(session.relocate(x, root, Placement::Adopt)?);
    assert_eq!(
        session.export_value()?,
        json!({ "list": [1], "x": "moved" })
    );
    Ok(())
}
