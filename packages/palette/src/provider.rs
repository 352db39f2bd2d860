//! # Palette Provider
//!
//! The ordered table of palette entries and their dispatch.
//!
//! Tool entries only name the tool to activate; the tools themselves live in
//! the UI. Create entries build shapes through the session's factory and
//! insert them as one undo step.

use procflow_editor::model::{ElementFactory, ElementId, ElementType, Point, ShapeOptions};
use procflow_editor::{EditSession, EditorError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::translate::{DefaultTranslator, Translator};

/// Offset of the start event nested in a new expanded sub-process
pub const SUBPROCESS_START_OFFSET: Point = Point { x: 40.0, y: 82.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Hand,
    Lasso,
    Space,
    GlobalConnect,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Hand => "hand",
            Tool::Lasso => "lasso",
            Tool::Space => "space",
            Tool::GlobalConnect => "global-connect",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaletteAction {
    /// Activate an interactive tool
    Tool { tool: Tool },

    /// Create a single shape of `element_type`
    #[serde(rename_all = "camelCase")]
    CreateShape {
        element_type: ElementType,
        is_expanded: Option<bool>,
    },

    /// Create an expanded sub-process containing a start event
    CreateSubProcess,

    /// Create an expanded pool
    CreateParticipant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteEntry {
    pub key: &'static str,
    pub group: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PaletteAction>,
}

/// What triggering an entry did
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteOutcome {
    ActivateTool(Tool),
    Created {
        elements: Vec<ElementId>,
        /// Elements the UI should select after creation
        auto_select: Vec<ElementId>,
    },
}

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Unknown palette entry: {0}")]
    UnknownEntry(String),

    #[error("Palette entry {0} has no action")]
    NotTriggerable(String),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

impl PaletteError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            PaletteError::UnknownEntry(_) => "unknown-entry",
            PaletteError::NotTriggerable(_) => "not-triggerable",
            PaletteError::Editor(e) => e.reason_code(),
        }
    }
}

pub struct PaletteProvider {
    entries: Vec<PaletteEntry>,
}

impl PaletteProvider {
    /// Create the provider with the built-in entries, titles kept as written
    pub fn new() -> Self {
        Self::with_translator(&DefaultTranslator)
    }

    pub fn with_translator(translate: &dyn Translator) -> Self {
        let tool_entry = |key, class_name, title: &str, tool| PaletteEntry {
            key,
            group: "tools",
            class_name: Some(class_name),
            title: Some(translate.translate(title, &[])),
            separator: false,
            action: Some(PaletteAction::Tool { tool }),
        };

        let create_entry = |key, group, class_name, element_type: ElementType, title: Option<&str>| {
            let title = match title {
                Some(title) => translate.translate(title, &[]),
                None => translate.translate("Create {type}", &[("type", element_type.short_name())]),
            };
            PaletteEntry {
                key,
                group,
                class_name: Some(class_name),
                title: Some(title),
                separator: false,
                action: Some(PaletteAction::CreateShape {
                    element_type,
                    is_expanded: None,
                }),
            }
        };

        let entries = vec![
            tool_entry("hand-tool", "bpmn-icon-hand-tool", "Activate the hand tool", Tool::Hand),
            tool_entry("lasso-tool", "bpmn-icon-lasso-tool", "Activate the lasso tool", Tool::Lasso),
            tool_entry(
                "space-tool",
                "bpmn-icon-space-tool",
                "Activate the create/remove space tool",
                Tool::Space,
            ),
            tool_entry(
                "global-connect-tool",
                "bpmn-icon-connection-multi",
                "Activate the global connect tool",
                Tool::GlobalConnect,
            ),
            PaletteEntry {
                key: "tool-separator",
                group: "tools",
                class_name: None,
                title: None,
                separator: true,
                action: None,
            },
            create_entry(
                "create.start-event",
                "event",
                "bpmn-icon-start-event-none",
                ElementType::StartEvent,
                Some("Create start event"),
            ),
            create_entry(
                "create.intermediate-event",
                "event",
                "bpmn-icon-intermediate-event-none",
                ElementType::IntermediateThrowEvent,
                Some("Create intermediate/boundary event"),
            ),
            create_entry(
                "create.end-event",
                "event",
                "bpmn-icon-end-event-none",
                ElementType::EndEvent,
                Some("Create end event"),
            ),
            create_entry(
                "create.exclusive-gateway",
                "gateway",
                "bpmn-icon-gateway-none",
                ElementType::ExclusiveGateway,
                Some("Create gateway"),
            ),
            create_entry(
                "create.task",
                "activity",
                "bpmn-icon-task",
                ElementType::Task,
                Some("Create task"),
            ),
            create_entry(
                "create.data-object",
                "data-object",
                "bpmn-icon-data-object",
                ElementType::DataObjectReference,
                Some("Create data object reference"),
            ),
            create_entry(
                "create.data-store",
                "data-store",
                "bpmn-icon-data-store",
                ElementType::DataStoreReference,
                Some("Create data store reference"),
            ),
            PaletteEntry {
                key: "create.subprocess-expanded",
                group: "activity",
                class_name: Some("bpmn-icon-subprocess-expanded"),
                title: Some(translate.translate("Create expanded sub-process", &[])),
                separator: false,
                action: Some(PaletteAction::CreateSubProcess),
            },
            PaletteEntry {
                key: "create.participant-expanded",
                group: "collaboration",
                class_name: Some("bpmn-icon-participant"),
                title: Some(translate.translate("Create pool/participant", &[])),
                separator: false,
                action: Some(PaletteAction::CreateParticipant),
            },
            create_entry(
                "create.group",
                "artifact",
                "bpmn-icon-group",
                ElementType::Group,
                None,
            ),
        ];

        Self { entries }
    }

    /// Get all entries, in display order
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Run the action of entry `key` with `position` as the drop point
    pub fn trigger<F: ElementFactory>(
        &self,
        key: &str,
        session: &mut EditSession<F>,
        position: Point,
    ) -> Result<PaletteOutcome, PaletteError> {
        let entry = self
            .entry(key)
            .ok_or_else(|| PaletteError::UnknownEntry(key.to_string()))?;
        let action = entry
            .action
            .as_ref()
            .ok_or_else(|| PaletteError::NotTriggerable(key.to_string()))?;
        let label = entry.title.clone().unwrap_or_else(|| key.to_string());

        let outcome = match action {
            PaletteAction::Tool { tool } => PaletteOutcome::ActivateTool(*tool),

            PaletteAction::CreateShape {
                element_type,
                is_expanded,
            } => {
                let mut options = ShapeOptions::new(*element_type).at(position.x, position.y);
                options.is_expanded = *is_expanded;
                let shape = session.build_shape(&options)?;
                let elements = session.insert_elements(label, vec![shape])?;
                PaletteOutcome::Created {
                    elements,
                    auto_select: Vec::new(),
                }
            }

            PaletteAction::CreateSubProcess => {
                let sub_process = session.build_shape(
                    &ShapeOptions::new(ElementType::SubProcess)
                        .at(position.x, position.y)
                        .expanded(true),
                )?;
                let start = position.translate(SUBPROCESS_START_OFFSET);
                let start_event = session.build_shape(
                    &ShapeOptions::new(ElementType::StartEvent)
                        .at(start.x, start.y)
                        .in_parent(sub_process.id.clone()),
                )?;
                let start_id = start_event.id.clone();

                let elements = session.insert_elements(label, vec![sub_process, start_event])?;
                PaletteOutcome::Created {
                    elements,
                    auto_select: vec![start_id],
                }
            }

            PaletteAction::CreateParticipant => {
                let participant = session.build_shape(
                    &ShapeOptions::new(ElementType::Participant)
                        .at(position.x, position.y)
                        .expanded(true),
                )?;
                let elements = session.insert_elements(label, vec![participant])?;
                PaletteOutcome::Created {
                    elements,
                    auto_select: Vec::new(),
                }
            }
        };

        info!(entry = key, "Triggered palette entry");
        Ok(outcome)
    }
}

impl Default for PaletteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PaletteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteProvider")
            .field("entries", &format!("{} entries", self.entries.len()))
            .finish()
    }
}
