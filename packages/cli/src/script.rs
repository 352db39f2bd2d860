//! Replay script format
//!
//! ```json
//! {
//!   "name": "order-process",
//!   "steps": [
//!     { "op": "define", "as": "payment", "kind": "error", "name": "Payment failed" },
//!     { "op": "createShape", "as": "task", "type": "bpmn:Task", "position": { "x": 100, "y": 100 } },
//!     { "op": "createShape", "as": "catch", "type": "bpmn:BoundaryEvent",
//!       "attachedTo": "task", "eventDefinition": "error", "reference": "payment" },
//!     { "op": "removeShape", "element": "task" },
//!     { "op": "undo" }
//!   ]
//! }
//! ```
//!
//! `as` binds a name to the created element or definition. Later steps may
//! use either a bound name or a raw id.

use procflow_editor::model::{DefinitionKind, ElementType, Point};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Document name (also the default id seed)
    #[serde(default = "default_name")]
    pub name: String,

    pub steps: Vec<Step>,
}

fn default_name() -> String {
    "replay".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    Define {
        #[serde(rename = "as")]
        alias: Option<String>,
        kind: DefinitionKind,
        name: Option<String>,
    },

    CreateShape {
        #[serde(rename = "as")]
        alias: Option<String>,
        #[serde(rename = "type")]
        element_type: ElementType,
        #[serde(default)]
        position: Point,
        name: Option<String>,
        parent: Option<String>,
        attached_to: Option<String>,
        is_expanded: Option<bool>,
        event_definition: Option<DefinitionKind>,
        reference: Option<String>,
    },

    Connect {
        #[serde(rename = "as")]
        alias: Option<String>,
        source: String,
        target: String,
        #[serde(rename = "type", default = "default_connection_type")]
        element_type: ElementType,
    },

    RemoveShape {
        element: String,
    },

    SetReference {
        element: String,
        #[serde(default)]
        holder: usize,
        definition: Option<String>,
    },

    Move {
        elements: Vec<String>,
        delta: Point,
    },

    Copy {
        elements: Vec<String>,
        /// Definitions cloned along with the elements
        #[serde(default)]
        definitions: Vec<String>,
    },

    Paste {
        /// Names bound to the pasted elements, in order
        #[serde(rename = "as", default)]
        aliases: Vec<String>,
        #[serde(default)]
        position: Point,
        parent: Option<String>,
        host: Option<String>,
    },

    Undo,
    Redo,
}

fn default_connection_type() -> ElementType {
    ElementType::SequenceFlow
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Define { .. } => "define",
            Step::CreateShape { .. } => "createShape",
            Step::Connect { .. } => "connect",
            Step::RemoveShape { .. } => "removeShape",
            Step::SetReference { .. } => "setReference",
            Step::Move { .. } => "move",
            Step::Copy { .. } => "copy",
            Step::Paste { .. } => "paste",
            Step::Undo => "undo",
            Step::Redo => "redo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"{
            "name": "order",
            "steps": [
                { "op": "define", "as": "payment", "kind": "error", "name": "Payment failed" },
                { "op": "createShape", "as": "task", "type": "bpmn:Task",
                  "position": { "x": 100, "y": 80 } },
                { "op": "createShape", "type": "bpmn:BoundaryEvent", "attachedTo": "task",
                  "eventDefinition": "error", "reference": "payment" },
                { "op": "connect", "source": "a", "target": "b" },
                { "op": "setReference", "element": "catch", "definition": null },
                { "op": "paste", "as": ["copy"], "position": { "x": 0, "y": 300 } },
                { "op": "undo" }
            ]
        }"#;

        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.name, "order");
        assert_eq!(script.steps.len(), 7);

        assert_eq!(
            script.steps[0],
            Step::Define {
                alias: Some("payment".to_string()),
                kind: DefinitionKind::Error,
                name: Some("Payment failed".to_string()),
            }
        );

        match &script.steps[2] {
            Step::CreateShape {
                attached_to,
                event_definition,
                position,
                ..
            } => {
                assert_eq!(attached_to.as_deref(), Some("task"));
                assert_eq!(*event_definition, Some(DefinitionKind::Error));
                assert_eq!(*position, Point::default());
            }
            other => panic!("unexpected step {:?}", other),
        }

        match &script.steps[3] {
            Step::Connect { element_type, .. } => {
                assert_eq!(*element_type, ElementType::SequenceFlow)
            }
            other => panic!("unexpected step {:?}", other),
        }

        assert_eq!(script.steps[4].name(), "setReference");
        assert_eq!(script.steps[6], Step::Undo);
    }

    #[test]
    fn test_default_name() {
        let script: Script = serde_json::from_str(r#"{ "steps": [] }"#).unwrap();
        assert_eq!(script.name, "replay");
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result: Result<Script, _> =
            serde_json::from_str(r#"{ "steps": [{ "op": "explode" }] }"#);
        assert!(result.is_err());
    }
}
