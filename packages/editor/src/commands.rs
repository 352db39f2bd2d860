//! # Commands
//!
//! Primitive, reversible effects on a [`Document`].
//!
//! ## Design Principles
//!
//! 1. **Validated**: every command checks its preconditions against the
//!    current document before touching it
//! 2. **Exactly invertible**: the inverse is computed from the document state
//!    right before the command applies, so applying it restores that state
//! 3. **Minimal**: composite edits (remove a shape and everything attached to
//!    it, paste a tree) are lists of primitives committed as one unit
//!
//! ## Command Semantics
//!
//! ### AddElement / RemoveElement
//! - Add fails if the id exists or a parent/host/endpoint is missing
//! - Add fails if a holder references a definition the document does not know
//! - Remove fails while other elements still depend on the element; callers
//!   remove dependents first (see `EditSession::remove_elements`)
//! - The inverse of a remove re-inserts at the original index
//!
//! ### AddRootDefinition / RemoveRootDefinition
//! - Membership changes only; the definition instance stays in the store

use procflow_model::{
    DefinitionId, DefinitionKind, Document, Element, ElementId, ElementKind, ModelError, Point,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primitive reversible effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Insert an element (appended when `index` is `None`)
    AddElement {
        element: Element,
        index: Option<usize>,
    },

    /// Remove an element that nothing depends on
    RemoveElement { element_id: ElementId },

    /// Translate an element's geometry
    MoveElement { element_id: ElementId, delta: Point },

    /// Replace the element's name (atomic replacement)
    UpdateName {
        element_id: ElementId,
        name: Option<String>,
    },

    /// Point a reference holder at a definition (or clear it)
    SetReference {
        element_id: ElementId,
        holder: usize,
        target: Option<DefinitionId>,
    },

    /// Make a known definition a root definition
    AddRootDefinition {
        definition_id: DefinitionId,
        index: Option<usize>,
    },

    /// Drop a definition from the root set
    RemoveRootDefinition { definition_id: DefinitionId },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Element already exists: {0}")]
    DuplicateElement(ElementId),

    #[error("Parent not found: {0}")]
    ParentNotFound(ElementId),

    #[error("Host not found: {0}")]
    HostNotFound(ElementId),

    #[error("Connection endpoint not found: {0}")]
    EndpointNotFound(ElementId),

    #[error("Element {element} is still used by {dependent}")]
    ElementInUse {
        element: ElementId,
        dependent: ElementId,
    },

    #[error("Not a shape: {0}")]
    NotAShape(ElementId),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Definition not known to document: {0}")]
    DefinitionUnknown(DefinitionId),

    #[error("Definition {0} is already a root definition")]
    DefinitionAlreadyMember(DefinitionId),

    #[error("Definition {0} is not a root definition")]
    DefinitionNotMember(DefinitionId),

    #[error("Element {element} has no reference holder at index {index}")]
    HolderNotFound { element: ElementId, index: usize },

    #[error("Holder of kind {holder} cannot reference {definition} definition")]
    ReferenceKindMismatch {
        holder: DefinitionKind,
        definition: DefinitionKind,
    },

    #[error("Atomic unit contains no commands")]
    EmptyBatch,

    #[error("Rejected by {listener}: {reason}")]
    Rejected { listener: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CommandError {
    /// Stable reason code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::ElementNotFound(_) => "element-not-found",
            CommandError::DuplicateElement(_) => "duplicate-element",
            CommandError::ParentNotFound(_) => "parent-not-found",
            CommandError::HostNotFound(_) => "host-not-found",
            CommandError::EndpointNotFound(_) => "endpoint-not-found",
            CommandError::ElementInUse { .. } => "element-in-use",
            CommandError::NotAShape(_) => "not-a-shape",
            CommandError::InvalidStructure(_) => "invalid-structure",
            CommandError::DefinitionUnknown(_) => "definition-unknown",
            CommandError::DefinitionAlreadyMember(_) => "definition-already-member",
            CommandError::DefinitionNotMember(_) => "definition-not-member",
            CommandError::HolderNotFound { .. } => "holder-not-found",
            CommandError::ReferenceKindMismatch { .. } => "reference-kind-mismatch",
            CommandError::EmptyBatch => "empty-batch",
            CommandError::Rejected { .. } => "rejected",
            CommandError::Model(_) => "model",
        }
    }
}

/// Definitions a command adds references to or removes references from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceFootprint {
    /// Definitions gaining a reference, deduplicated, in holder order
    pub added: Vec<DefinitionId>,

    /// Definitions losing references, with the number of holders lost
    pub removed: Vec<(DefinitionId, usize)>,
}

impl ReferenceFootprint {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl Command {
    /// Debug name of this command
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddElement { .. } => "addElement",
            Command::RemoveElement { .. } => "removeElement",
            Command::MoveElement { .. } => "moveElement",
            Command::UpdateName { .. } => "updateName",
            Command::SetReference { .. } => "setReference",
            Command::AddRootDefinition { .. } => "addRootDefinition",
            Command::RemoveRootDefinition { .. } => "removeRootDefinition",
        }
    }

    /// Apply command to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), CommandError> {
        self.validate(doc)?;

        match self {
            Command::AddElement { element, index } => {
                doc.insert_element(*index, element.clone())?;
            }

            Command::RemoveElement { element_id } => {
                doc.remove_element(element_id)?;
            }

            Command::MoveElement { element_id, delta } => {
                Self::element_mut(doc, element_id)?.translate(*delta);
            }

            Command::UpdateName { element_id, name } => {
                Self::element_mut(doc, element_id)?.business_object.name = name.clone();
            }

            Command::SetReference {
                element_id,
                holder,
                target,
            } => {
                let element = Self::element_mut(doc, element_id)?;
                let slot = element
                    .business_object
                    .holder_mut(*holder)
                    .ok_or_else(|| CommandError::HolderNotFound {
                        element: element_id.clone(),
                        index: *holder,
                    })?;
                slot.reference = target.clone();
            }

            Command::AddRootDefinition {
                definition_id,
                index,
            } => {
                doc.insert_root_definition(*index, definition_id)?;
            }

            Command::RemoveRootDefinition { definition_id } => {
                doc.remove_root_definition(definition_id)?;
            }
        }

        Ok(())
    }

    /// Validate, compute the inverse, then apply. Returns the inverse.
    pub fn apply_with_inverse(&self, doc: &mut Document) -> Result<Command, CommandError> {
        let inverse = self.to_inverse(doc)?;
        self.apply(doc)?;
        Ok(inverse)
    }

    /// Create the inverse command for undo, against the state before applying
    pub fn to_inverse(&self, doc: &Document) -> Result<Command, CommandError> {
        self.validate(doc)?;

        let inverse = match self {
            Command::AddElement { element, .. } => Command::RemoveElement {
                element_id: element.id.clone(),
            },

            Command::RemoveElement { element_id } => {
                let index = doc
                    .element_index(element_id)
                    .ok_or_else(|| CommandError::ElementNotFound(element_id.clone()))?;
                Command::AddElement {
                    element: doc.elements()[index].clone(),
                    index: Some(index),
                }
            }

            Command::MoveElement { element_id, delta } => Command::MoveElement {
                element_id: element_id.clone(),
                delta: delta.negate(),
            },

            Command::UpdateName { element_id, .. } => {
                let element = Self::element(doc, element_id)?;
                Command::UpdateName {
                    element_id: element_id.clone(),
                    name: element.business_object.name.clone(),
                }
            }

            Command::SetReference {
                element_id, holder, ..
            } => {
                let element = Self::element(doc, element_id)?;
                let slot = element.business_object.holder(*holder).ok_or_else(|| {
                    CommandError::HolderNotFound {
                        element: element_id.clone(),
                        index: *holder,
                    }
                })?;
                Command::SetReference {
                    element_id: element_id.clone(),
                    holder: *holder,
                    target: slot.reference.clone(),
                }
            }

            Command::AddRootDefinition { definition_id, .. } => Command::RemoveRootDefinition {
                definition_id: definition_id.clone(),
            },

            Command::RemoveRootDefinition { definition_id } => {
                let index = doc
                    .root_definition_ids()
                    .iter()
                    .position(|member| member == definition_id)
                    .ok_or_else(|| CommandError::DefinitionNotMember(definition_id.clone()))?;
                Command::AddRootDefinition {
                    definition_id: definition_id.clone(),
                    index: Some(index),
                }
            }
        };

        Ok(inverse)
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), CommandError> {
        match self {
            Command::AddElement { element, .. } => Self::validate_add(doc, element),

            Command::RemoveElement { element_id } => {
                Self::element(doc, element_id)?;

                if let Some(dependent) = doc.dependents(element_id).next() {
                    return Err(CommandError::ElementInUse {
                        element: element_id.clone(),
                        dependent: dependent.id.clone(),
                    });
                }
                Ok(())
            }

            Command::MoveElement { element_id, .. } | Command::UpdateName { element_id, .. } => {
                Self::element(doc, element_id)?;
                Ok(())
            }

            Command::SetReference {
                element_id,
                holder,
                target,
            } => {
                let element = Self::element(doc, element_id)?;
                let slot = element.business_object.holder(*holder).ok_or_else(|| {
                    CommandError::HolderNotFound {
                        element: element_id.clone(),
                        index: *holder,
                    }
                })?;

                if let Some(target) = target {
                    Self::validate_reference(doc, slot.kind, target)?;
                }
                Ok(())
            }

            Command::AddRootDefinition { definition_id, .. } => {
                if !doc.knows_definition(definition_id) {
                    return Err(CommandError::DefinitionUnknown(definition_id.clone()));
                }
                if doc.has_root_definition(definition_id) {
                    return Err(CommandError::DefinitionAlreadyMember(definition_id.clone()));
                }
                Ok(())
            }

            Command::RemoveRootDefinition { definition_id } => {
                if !doc.has_root_definition(definition_id) {
                    return Err(CommandError::DefinitionNotMember(definition_id.clone()));
                }
                Ok(())
            }
        }
    }

    /// Definitions this command adds or removes references to, computed
    /// against the document before the command applies
    pub fn reference_footprint(&self, doc: &Document) -> ReferenceFootprint {
        let mut footprint = ReferenceFootprint::default();

        match self {
            Command::AddElement { element, .. } => {
                for reference in element.references() {
                    if !footprint.added.contains(reference) {
                        footprint.added.push(reference.clone());
                    }
                }
            }

            Command::RemoveElement { element_id } => {
                if let Some(element) = doc.element(element_id) {
                    for reference in element.references() {
                        match footprint.removed.iter_mut().find(|(id, _)| id == reference) {
                            Some((_, count)) => *count += 1,
                            None => footprint.removed.push((reference.clone(), 1)),
                        }
                    }
                }
            }

            Command::SetReference {
                element_id,
                holder,
                target,
            } => {
                let previous = doc
                    .element(element_id)
                    .and_then(|e| e.business_object.holder(*holder))
                    .and_then(|slot| slot.reference.clone());

                if previous != *target {
                    if let Some(previous) = previous {
                        footprint.removed.push((previous, 1));
                    }
                    if let Some(target) = target {
                        footprint.added.push(target.clone());
                    }
                }
            }

            Command::MoveElement { .. }
            | Command::UpdateName { .. }
            | Command::AddRootDefinition { .. }
            | Command::RemoveRootDefinition { .. } => {}
        }

        footprint
    }

    fn validate_add(doc: &Document, element: &Element) -> Result<(), CommandError> {
        if doc.contains_element(&element.id) {
            return Err(CommandError::DuplicateElement(element.id.clone()));
        }

        if let Some(parent_id) = &element.parent {
            let parent = doc
                .element(parent_id)
                .ok_or_else(|| CommandError::ParentNotFound(parent_id.clone()))?;
            if parent.is_connection() {
                return Err(CommandError::NotAShape(parent_id.clone()));
            }
        }

        match &element.kind {
            ElementKind::Shape { host, .. } => {
                if let Some(host_id) = host {
                    let host = doc
                        .element(host_id)
                        .ok_or_else(|| CommandError::HostNotFound(host_id.clone()))?;
                    if host.is_connection() {
                        return Err(CommandError::NotAShape(host_id.clone()));
                    }
                }
            }
            ElementKind::Connection { source, target, .. } => {
                for endpoint in [source, target] {
                    if !doc.contains_element(endpoint) {
                        return Err(CommandError::EndpointNotFound(endpoint.clone()));
                    }
                }
            }
        }

        for holder in &element.business_object.event_definitions {
            if let Some(reference) = &holder.reference {
                Self::validate_reference(doc, holder.kind, reference)?;
            }
        }

        Ok(())
    }

    fn validate_reference(
        doc: &Document,
        holder_kind: DefinitionKind,
        target: &DefinitionId,
    ) -> Result<(), CommandError> {
        let definition = doc
            .definition(target)
            .ok_or_else(|| CommandError::DefinitionUnknown(target.clone()))?;

        if definition.kind != holder_kind {
            return Err(CommandError::ReferenceKindMismatch {
                holder: holder_kind,
                definition: definition.kind,
            });
        }
        Ok(())
    }

    fn element<'a>(doc: &'a Document, id: &ElementId) -> Result<&'a Element, CommandError> {
        doc.element(id)
            .ok_or_else(|| CommandError::ElementNotFound(id.clone()))
    }

    fn element_mut<'a>(
        doc: &'a mut Document,
        id: &ElementId,
    ) -> Result<&'a mut Element, CommandError> {
        doc.element_mut(id)
            .ok_or_else(|| CommandError::ElementNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_model::{
        Bounds, ElementType, EventDefinition, GlobalDefinition, SemanticObject,
    };

    fn doc_with_error() -> Document {
        let mut doc = Document::new("test");
        doc.register_definition(GlobalDefinition::new(
            DefinitionId::new("Error_1"),
            DefinitionKind::Error,
        ));
        doc
    }

    fn shape(id: &str, element_type: ElementType, host: Option<&str>) -> Element {
        Element {
            id: ElementId::new(id),
            element_type,
            parent: None,
            kind: ElementKind::Shape {
                bounds: Bounds::new(0.0, 0.0, 100.0, 80.0),
                host: host.map(ElementId::new),
            },
            business_object: SemanticObject::default(),
        }
    }

    fn error_boundary(id: &str, host: &str, reference: &str) -> Element {
        let mut element = shape(id, ElementType::BoundaryEvent, Some(host));
        element.business_object.event_definitions.push(
            EventDefinition::new(format!("{}_ed", id), DefinitionKind::Error)
                .with_reference(DefinitionId::new(reference)),
        );
        element
    }

    #[test]
    fn test_command_serialization() {
        let command = Command::MoveElement {
            element_id: ElementId::new("Task_1"),
            delta: Point::new(10.0, 0.0),
        };

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "moveElement");
        assert_eq!(json["elementId"], "Task_1");

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_add_validates_links_and_references() {
        let doc = doc_with_error();

        let orphan = error_boundary("Boundary_1", "Task_1", "Error_1");
        assert_eq!(
            Command::AddElement {
                element: orphan,
                index: None
            }
            .validate(&doc),
            Err(CommandError::HostNotFound(ElementId::new("Task_1")))
        );

        let mut doc = doc;
        doc.insert_element(None, shape("Task_1", ElementType::Task, None))
            .unwrap();

        let unknown = error_boundary("Boundary_1", "Task_1", "Error_404");
        assert_eq!(
            Command::AddElement {
                element: unknown,
                index: None
            }
            .validate(&doc),
            Err(CommandError::DefinitionUnknown(DefinitionId::new("Error_404")))
        );

        let ok = error_boundary("Boundary_1", "Task_1", "Error_1");
        assert!(Command::AddElement {
            element: ok,
            index: None
        }
        .validate(&doc)
        .is_ok());
    }

    #[test]
    fn test_remove_rejected_while_in_use() {
        let mut doc = doc_with_error();
        doc.insert_element(None, shape("Task_1", ElementType::Task, None))
            .unwrap();
        doc.insert_element(None, error_boundary("Boundary_1", "Task_1", "Error_1"))
            .unwrap();

        let remove = Command::RemoveElement {
            element_id: ElementId::new("Task_1"),
        };
        let err = remove.apply(&mut doc).unwrap_err();
        assert_eq!(err.code(), "element-in-use");
        assert_eq!(doc.elements().len(), 2);
    }

    #[test]
    fn test_inverse_restores_index() {
        let mut doc = doc_with_error();
        for id in ["Task_1", "Task_2", "Task_3"] {
            doc.insert_element(None, shape(id, ElementType::Task, None))
                .unwrap();
        }
        let before = doc.clone();

        let remove = Command::RemoveElement {
            element_id: ElementId::new("Task_2"),
        };
        let inverse = remove.apply_with_inverse(&mut doc).unwrap();
        assert_eq!(doc.elements().len(), 2);

        inverse.apply(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_set_reference_checks_kind() {
        let mut doc = doc_with_error();
        doc.register_definition(GlobalDefinition::new(
            DefinitionId::new("Signal_1"),
            DefinitionKind::Signal,
        ));
        doc.insert_element(None, shape("Task_1", ElementType::Task, None))
            .unwrap();
        doc.insert_element(None, error_boundary("Boundary_1", "Task_1", "Error_1"))
            .unwrap();

        let command = Command::SetReference {
            element_id: ElementId::new("Boundary_1"),
            holder: 0,
            target: Some(DefinitionId::new("Signal_1")),
        };
        assert_eq!(
            command.validate(&doc),
            Err(CommandError::ReferenceKindMismatch {
                holder: DefinitionKind::Error,
                definition: DefinitionKind::Signal,
            })
        );

        let missing_holder = Command::SetReference {
            element_id: ElementId::new("Boundary_1"),
            holder: 3,
            target: None,
        };
        assert_eq!(missing_holder.validate(&doc).unwrap_err().code(), "holder-not-found");
    }

    #[test]
    fn test_reference_footprint() {
        let mut doc = doc_with_error();
        doc.insert_element(None, shape("Task_1", ElementType::Task, None))
            .unwrap();
        let mut twice = error_boundary("Boundary_1", "Task_1", "Error_1");
        twice.business_object.event_definitions.push(
            EventDefinition::new("second", DefinitionKind::Error)
                .with_reference(DefinitionId::new("Error_1")),
        );
        doc.insert_element(None, twice.clone()).unwrap();

        let remove = Command::RemoveElement {
            element_id: ElementId::new("Boundary_1"),
        };
        assert_eq!(
            remove.reference_footprint(&doc).removed,
            vec![(DefinitionId::new("Error_1"), 2)]
        );

        twice.id = ElementId::new("Boundary_2");
        let add = Command::AddElement {
            element: twice,
            index: None,
        };
        assert_eq!(
            add.reference_footprint(&doc).added,
            vec![DefinitionId::new("Error_1")]
        );

        let unchanged = Command::SetReference {
            element_id: ElementId::new("Boundary_1"),
            holder: 0,
            target: Some(DefinitionId::new("Error_1")),
        };
        assert!(unchanged.reference_footprint(&doc).is_empty());

        let rename = Command::UpdateName {
            element_id: ElementId::new("Task_1"),
            name: Some("Ship".to_string()),
        };
        assert!(rename.reference_footprint(&doc).is_empty());
    }
}
