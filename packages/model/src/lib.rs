//! # procflow model
//!
//! In-memory document model for process diagrams.
//!
//! ```text
//! Document
//!  ├── elements: [Element]            shapes + connections
//!  │     └── business_object          SemanticObject
//!  │           └── event_definitions  reference holders ──┐
//!  ├── root_definitions: [DefinitionId]  membership        │
//!  └── definition_store: {id → GlobalDefinition} ◄─────────┘
//! ```
//!
//! References to global definitions are handles into the store, so
//! "the same definition" always means "the same handle".

pub mod definition;
pub mod document;
pub mod element;
pub mod error;
pub mod factory;
pub mod ids;
pub mod semantic;

pub use definition::{DefinitionKind, GlobalDefinition};
pub use document::{Document, DocumentSnapshot};
pub use element::{Bounds, Element, ElementKind, ElementType, Point};
pub use error::ModelError;
pub use factory::{ConnectionOptions, ElementFactory, ProcessElementFactory, ShapeOptions};
pub use ids::{get_document_seed, DefinitionId, ElementId, IdGenerator};
pub use semantic::{EventDefinition, SemanticObject};
