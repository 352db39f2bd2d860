//! Listeners that keep document-level rules intact across edits

mod definition_references;

pub use definition_references::{DefinitionReferenceBehavior, HINT_ADDED, HINT_REMOVED};
