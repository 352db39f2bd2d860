//! # Document
//!
//! Root container of one editing session.
//!
//! A document holds:
//! - **Elements**: shapes and connections, in insertion order
//! - **Root definitions**: the ordered set of global definitions that are
//!   members of the document
//! - **Definition store**: every global definition instance the document
//!   knows about, keyed by handle
//!
//! The store outlives membership: a definition removed from the root set
//! stays in the store, so re-adding it later restores the *same* instance.
//!
//! ## Reference-count invariant
//!
//! ```text
//! g ∈ root definitions  ⟺  reference_count(g) > 0
//! ```
//!
//! Mutating methods here are raw primitives. Editing code goes through the
//! command stack, which keeps the invariant; [`Document::verify_references`]
//! checks it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

use crate::definition::GlobalDefinition;
use crate::element::Element;
use crate::error::ModelError;
use crate::ids::{DefinitionId, ElementId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    name: String,
    elements: Vec<Element>,
    root_definitions: Vec<DefinitionId>,
    definition_store: BTreeMap<DefinitionId, GlobalDefinition>,
}

/// Observable state of a document: what persistence reads and what undo
/// must restore exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub elements: Vec<Element>,
    pub root_definitions: Vec<GlobalDefinition>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            root_definitions: Vec::new(),
            definition_store: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    pub fn element_index(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.element_index(id).is_some()
    }

    /// Insert an element at `index` (appended when `None` or out of range)
    pub fn insert_element(
        &mut self,
        index: Option<usize>,
        element: Element,
    ) -> Result<usize, ModelError> {
        if self.contains_element(&element.id) {
            return Err(ModelError::DuplicateElement(element.id));
        }

        let index = index
            .unwrap_or(self.elements.len())
            .min(self.elements.len());
        trace!(element = %element.id, index, "Inserting element");
        self.elements.insert(index, element);
        Ok(index)
    }

    /// Remove an element, returning its former index and the element
    pub fn remove_element(&mut self, id: &ElementId) -> Result<(usize, Element), ModelError> {
        let index = self
            .element_index(id)
            .ok_or_else(|| ModelError::ElementNotFound(id.clone()))?;
        trace!(element = %id, index, "Removing element");
        Ok((index, self.elements.remove(index)))
    }

    /// Shapes whose parent is `id`
    pub fn children<'a>(&'a self, id: &'a ElementId) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.parent.as_ref() == Some(id))
    }

    /// Boundary events attached to `id`
    pub fn attachers<'a>(&'a self, id: &'a ElementId) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.host() == Some(id))
    }

    /// Connections starting or ending at `id`
    pub fn connections<'a>(
        &'a self,
        id: &'a ElementId,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| {
            e.endpoints()
                .map(|(source, target)| source == id || target == id)
                .unwrap_or(false)
        })
    }

    /// Elements that depend on `id` through parent, host or endpoint links
    pub fn dependents<'a>(&'a self, id: &'a ElementId) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.depends_on(id))
    }

    /// Make a definition instance known to the document.
    ///
    /// Registration is not membership and is not recorded in history. An
    /// already known handle keeps its existing instance; returns whether the
    /// definition was new.
    pub fn register_definition(&mut self, definition: GlobalDefinition) -> bool {
        if self.definition_store.contains_key(&definition.id) {
            return false;
        }
        trace!(definition = %definition.id, kind = %definition.kind, "Registering definition");
        self.definition_store
            .insert(definition.id.clone(), definition);
        true
    }

    /// Drop a registration nothing depends on: the definition must be
    /// neither a member nor referenced. Returns the dropped instance.
    pub fn unregister_definition(&mut self, id: &DefinitionId) -> Option<GlobalDefinition> {
        if self.has_root_definition(id) || self.reference_count(id) > 0 {
            return None;
        }
        trace!(definition = %id, "Unregistering definition");
        self.definition_store.remove(id)
    }

    /// Look up a known definition (member or not)
    pub fn definition(&self, id: &DefinitionId) -> Option<&GlobalDefinition> {
        self.definition_store.get(id)
    }

    pub fn knows_definition(&self, id: &DefinitionId) -> bool {
        self.definition_store.contains_key(id)
    }

    pub fn root_definition_ids(&self) -> &[DefinitionId] {
        &self.root_definitions
    }

    /// Root definitions in membership order
    pub fn root_definitions(&self) -> impl Iterator<Item = &GlobalDefinition> {
        self.root_definitions
            .iter()
            .filter_map(|id| self.definition_store.get(id))
    }

    pub fn has_root_definition(&self, id: &DefinitionId) -> bool {
        self.root_definitions.contains(id)
    }

    /// Add a known definition to the root set at `index`
    pub fn insert_root_definition(
        &mut self,
        index: Option<usize>,
        id: &DefinitionId,
    ) -> Result<usize, ModelError> {
        if !self.knows_definition(id) {
            return Err(ModelError::DefinitionNotFound(id.clone()));
        }
        if self.has_root_definition(id) {
            return Err(ModelError::DefinitionAlreadyMember(id.clone()));
        }

        let index = index
            .unwrap_or(self.root_definitions.len())
            .min(self.root_definitions.len());
        self.root_definitions.insert(index, id.clone());
        Ok(index)
    }

    /// Remove a definition from the root set, returning its former index
    pub fn remove_root_definition(&mut self, id: &DefinitionId) -> Result<usize, ModelError> {
        let index = self
            .root_definitions
            .iter()
            .position(|member| member == id)
            .ok_or_else(|| ModelError::DefinitionNotMember(id.clone()))?;
        self.root_definitions.remove(index);
        Ok(index)
    }

    /// Number of live holders pointing at `id`
    pub fn reference_count(&self, id: &DefinitionId) -> usize {
        self.elements
            .iter()
            .map(|e| e.business_object.reference_count(id))
            .sum()
    }

    /// Reference count of every referenced definition
    pub fn reference_counts(&self) -> BTreeMap<&DefinitionId, usize> {
        let mut counts = BTreeMap::new();
        for reference in self.elements.iter().flat_map(|e| e.references()) {
            *counts.entry(reference).or_insert(0) += 1;
        }
        counts
    }

    /// Check the reference-count invariant
    pub fn verify_references(&self) -> Result<(), ModelError> {
        for element in &self.elements {
            for reference in element.references() {
                if !self.knows_definition(reference) {
                    return Err(ModelError::DanglingReference {
                        element: element.id.clone(),
                        definition: reference.clone(),
                    });
                }
            }
        }

        let counts = self.reference_counts();

        for member in &self.root_definitions {
            if !counts.contains_key(member) {
                return Err(ModelError::OrphanedDefinition(member.clone()));
            }
        }

        for referenced in counts.keys() {
            if !self.has_root_definition(referenced) {
                return Err(ModelError::MissingRootDefinition((*referenced).clone()));
            }
        }

        Ok(())
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            elements: self.elements.clone(),
            root_definitions: self.root_definitions().cloned().collect(),
        }
    }
}
