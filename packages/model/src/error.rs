//! Error types for the document model

use thiserror::Error;

use crate::ids::{DefinitionId, ElementId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown element type: {0}")]
    UnknownElementType(String),

    #[error("Unknown definition kind: {0}")]
    UnknownDefinitionKind(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Element already exists: {0}")]
    DuplicateElement(ElementId),

    #[error("Definition not known to document: {0}")]
    DefinitionNotFound(DefinitionId),

    #[error("Definition {0} is already a root definition")]
    DefinitionAlreadyMember(DefinitionId),

    #[error("Definition {0} is not a root definition")]
    DefinitionNotMember(DefinitionId),

    #[error("Element {element} references unknown definition {definition}")]
    DanglingReference {
        element: ElementId,
        definition: DefinitionId,
    },

    #[error("Root definition {0} has no remaining references")]
    OrphanedDefinition(DefinitionId),

    #[error("Definition {0} is referenced but not a root definition")]
    MissingRootDefinition(DefinitionId),
}
