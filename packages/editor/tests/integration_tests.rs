//! Integration tests for editor crate

use anyhow::Result;
use procflow_editor::model::{DefinitionKind, ElementType, Point, ShapeOptions};
use procflow_editor::{Command, EditSession, EditorConfig, PasteTarget};

fn session() -> EditSession {
    let config = EditorConfig {
        id_seed: Some("it".to_string()),
        ..EditorConfig::default()
    };
    EditSession::with_config("integration", &config)
}

#[test]
fn test_session_workflow() -> Result<()> {
    let mut session = session();
    let signal = session.define(DefinitionKind::Signal, Some("Restock".to_string()));

    let start = session.create_shape(&ShapeOptions::new(ElementType::StartEvent).at(0.0, 22.0))?;
    let task = session.create_shape(
        &ShapeOptions::new(ElementType::UserTask)
            .with_name("Check stock")
            .at(100.0, 0.0),
    )?;
    let wait = session.create_shape(
        &ShapeOptions::new(ElementType::IntermediateCatchEvent)
            .at(260.0, 22.0)
            .with_event_definition(DefinitionKind::Signal)
            .referencing(signal.clone()),
    )?;
    session.connect(&start, &task, ElementType::SequenceFlow)?;
    session.connect(&task, &wait, ElementType::SequenceFlow)?;

    assert_eq!(session.document().elements().len(), 5);
    assert_eq!(session.document().root_definition_ids(), &[signal.clone()]);
    assert_eq!(session.stack().undo_levels(), 5);

    session.remove_shape(&task)?;
    assert_eq!(session.document().elements().len(), 2);
    assert_eq!(session.stack().undo_levels(), 6);

    session.undo()?;
    assert_eq!(session.document().elements().len(), 5);
    session.document().verify_references()?;
    Ok(())
}

#[test]
fn test_subprocess_children_follow_parent() -> Result<()> {
    let mut session = session();
    let sub = session.create_shape(&ShapeOptions::new(ElementType::SubProcess).at(0.0, 0.0))?;
    let inner = session.create_shape(
        &ShapeOptions::new(ElementType::StartEvent)
            .at(40.0, 82.0)
            .in_parent(sub.clone()),
    )?;

    session.move_elements(&[sub.clone()], Point::new(100.0, 0.0))?;
    let bounds = session.document().element(&inner).unwrap().bounds().unwrap();
    assert_eq!(bounds.origin(), Point::new(140.0, 82.0));

    session.copy(&[sub.clone()])?;
    let pasted = session.paste(&PasteTarget::at(0.0, 400.0))?;
    assert_eq!(pasted.len(), 2);
    let pasted_inner = session.document().element(&pasted[1]).unwrap();
    assert_eq!(pasted_inner.parent.as_ref(), Some(&pasted[0]));
    assert_eq!(pasted_inner.bounds().unwrap().origin(), Point::new(40.0, 482.0));
    assert_eq!(session.selection(), pasted.as_slice());

    session.remove_shape(&sub)?;
    assert!(!session.document().contains_element(&inner));
    assert_eq!(session.document().elements().len(), 2);
    Ok(())
}

#[test]
fn test_command_serialization() {
    let json = r#"{
        "type": "setReference",
        "elementId": "Event_1",
        "holder": 0,
        "target": "Error_1"
    }"#;

    let command: Command = serde_json::from_str(json).unwrap();
    assert_eq!(command.name(), "setReference");

    let back = serde_json::to_value(&command).unwrap();
    assert_eq!(back["elementId"], "Event_1");
    assert_eq!(back["target"], "Error_1");
}

#[test]
fn test_snapshot_lists_root_definitions() -> Result<()> {
    let mut session = session();
    let error = session.define(DefinitionKind::Error, Some("Out of stock".to_string()));
    let task = session.create_shape(&ShapeOptions::new(ElementType::Task))?;
    session.create_shape(
        &ShapeOptions::new(ElementType::BoundaryEvent)
            .attached_to(task)
            .with_event_definition(DefinitionKind::Error)
            .referencing(error.clone()),
    )?;

    let snapshot = serde_json::to_value(session.snapshot())?;
    assert_eq!(snapshot["rootDefinitions"][0]["id"], error.as_str());
    assert_eq!(snapshot["rootDefinitions"][0]["kind"], "error");
    assert_eq!(snapshot["elements"][1]["type"], "bpmn:BoundaryEvent");
    Ok(())
}
