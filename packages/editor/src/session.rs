//! # Edit Session
//!
//! High-level editing operations over one document.
//!
//! An EditSession owns the document, its command stack (with the definition
//! reference behavior registered), id generation, the element factory, the
//! clipboard and the current selection. Every edit is expressed as commands
//! and committed as one atomic unit, so each call is one undo step.

use procflow_model::{
    ConnectionOptions, DefinitionId, DefinitionKind, Document, DocumentSnapshot, Element,
    ElementFactory, ElementId, ElementType, GlobalDefinition, IdGenerator, Point,
    ProcessElementFactory, ShapeOptions,
};
use std::collections::BTreeSet;
use tracing::debug;

use crate::behaviors::DefinitionReferenceBehavior;
use crate::clone::{self, ClipboardTree, CloneError, PasteTarget};
use crate::command_stack::CommandStack;
use crate::commands::{Command, CommandError};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::hooks::{CommandListener, ListenerId};

pub struct EditSession<F: ElementFactory = ProcessElementFactory> {
    document: Document,
    stack: CommandStack,
    ids: IdGenerator,
    factory: F,
    clipboard: Option<ClipboardTree>,
    selection: Vec<ElementId>,
}

impl EditSession<ProcessElementFactory> {
    /// Create a session with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &EditorConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: &EditorConfig) -> Self {
        Self::with_factory(name, config, ProcessElementFactory::new())
    }
}

impl<F: ElementFactory> EditSession<F> {
    /// Create a session using a custom element factory
    pub fn with_factory(name: impl Into<String>, config: &EditorConfig, factory: F) -> Self {
        let name = name.into();
        let ids = match &config.id_seed {
            Some(seed) => IdGenerator::from_seed(seed.clone()),
            None => IdGenerator::new(&name),
        };

        let mut stack = CommandStack::from_config(config);
        stack.register_listener(Box::new(DefinitionReferenceBehavior::new()));

        Self {
            document: Document::new(name),
            stack,
            ids,
            factory,
            clipboard: None,
            selection: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn stack(&self) -> &CommandStack {
        &self.stack
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.document.snapshot()
    }

    /// Register an additional command listener (after the built-in ones)
    pub fn register_listener(&mut self, listener: Box<dyn CommandListener>) -> ListenerId {
        self.stack.register_listener(listener)
    }

    /// Create a new global definition known to the document.
    ///
    /// The definition becomes a root definition once something references it.
    pub fn define(&mut self, kind: DefinitionKind, name: Option<String>) -> DefinitionId {
        let id = self.ids.definition_id(kind);
        let mut definition = GlobalDefinition::new(id.clone(), kind);
        definition.name = name;
        self.document.register_definition(definition);
        debug!(definition = %id, %kind, "Defined global definition");
        id
    }

    /// Make an existing definition instance known to the document
    pub fn register_definition(&mut self, definition: GlobalDefinition) -> bool {
        self.document.register_definition(definition)
    }

    /// Build a shape through the factory without inserting it
    pub fn build_shape(&mut self, options: &ShapeOptions) -> Result<Element, EditorError> {
        Ok(self.factory.create_shape(&mut self.ids, options)?)
    }

    /// Insert elements as one undo step, in the given order
    pub fn insert_elements(
        &mut self,
        label: impl Into<String>,
        elements: Vec<Element>,
    ) -> Result<Vec<ElementId>, EditorError> {
        let ids: Vec<ElementId> = elements.iter().map(|e| e.id.clone()).collect();
        let commands = elements
            .into_iter()
            .map(|element| Command::AddElement {
                element,
                index: None,
            })
            .collect();

        self.stack
            .execute_labeled(&mut self.document, label, commands)?;
        Ok(ids)
    }

    pub fn create_shape(&mut self, options: &ShapeOptions) -> Result<ElementId, EditorError> {
        let element = self.build_shape(options)?;
        let label = format!("Create {}", element.element_type.short_name());
        let mut ids = self.insert_elements(label, vec![element])?;
        ids.pop()
            .ok_or_else(|| EditorError::InvariantViolation("created element vanished".into()))
    }

    /// Connect two shapes; waypoints run between their centers
    pub fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        element_type: ElementType,
    ) -> Result<ElementId, EditorError> {
        let mut waypoints = Vec::new();
        let mut parent = None;

        for (index, endpoint) in [source, target].into_iter().enumerate() {
            let element = self
                .document
                .element(endpoint)
                .ok_or_else(|| CommandError::EndpointNotFound(endpoint.clone()))?;
            let bounds = element
                .bounds()
                .ok_or_else(|| CommandError::NotAShape(endpoint.clone()))?;
            if index == 0 {
                parent = element.parent.clone();
            }
            waypoints.push(bounds.center());
        }

        let mut options = ConnectionOptions::new(element_type, source.clone(), target.clone());
        options.parent = parent;
        options.waypoints = waypoints;

        let connection = self.factory.create_connection(&mut self.ids, &options)?;
        let id = connection.id.clone();
        self.stack.execute_labeled(
            &mut self.document,
            format!("Connect {} to {}", source, target),
            vec![Command::AddElement {
                element: connection,
                index: None,
            }],
        )?;
        Ok(id)
    }

    pub fn remove_shape(&mut self, id: &ElementId) -> Result<(), EditorError> {
        self.remove_elements(std::slice::from_ref(id))
    }

    /// Remove elements together with everything depending on them
    /// (connections, attached boundary events, children) in one undo step
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Result<(), EditorError> {
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();

        for id in ids {
            if !self.document.contains_element(id) {
                return Err(CommandError::ElementNotFound(id.clone()).into());
            }
            Self::collect_removal(&self.document, id, &mut visited, &mut order);
        }

        if order.is_empty() {
            return Err(CommandError::EmptyBatch.into());
        }

        let commands = order
            .iter()
            .map(|element_id| Command::RemoveElement {
                element_id: element_id.clone(),
            })
            .collect();

        self.stack.execute_labeled(
            &mut self.document,
            format!("Remove {} element(s)", order.len()),
            commands,
        )?;

        self.selection.retain(|id| !order.contains(id));
        Ok(())
    }

    /// Post-order walk: dependents before the element they depend on
    fn collect_removal(
        doc: &Document,
        id: &ElementId,
        visited: &mut BTreeSet<ElementId>,
        order: &mut Vec<ElementId>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }

        let dependents: Vec<ElementId> = doc.dependents(id).map(|e| e.id.clone()).collect();
        for dependent in &dependents {
            Self::collect_removal(doc, dependent, visited, order);
        }

        order.push(id.clone());
    }

    /// Move elements along with their children, attached events and the
    /// connections between them
    pub fn move_elements(&mut self, ids: &[ElementId], delta: Point) -> Result<(), EditorError> {
        if ids.is_empty() {
            return Err(CloneError::EmptySelection.into());
        }

        let (connections, shapes): (Vec<&ElementId>, Vec<&ElementId>) = ids
            .iter()
            .partition(|id| self.document.element(id).is_some_and(Element::is_connection));

        let mut moved: Vec<ElementId> = Vec::new();
        if !shapes.is_empty() {
            let shapes: Vec<ElementId> = shapes.into_iter().cloned().collect();
            moved.extend(
                clone::copy(&self.document, &shapes)?
                    .elements
                    .into_iter()
                    .map(|element| element.id),
            );
        }
        // Connections selected on their own still move their waypoints
        for id in connections {
            if !moved.contains(id) {
                moved.push(id.clone());
            }
        }

        let commands = moved
            .into_iter()
            .map(|element_id| Command::MoveElement { element_id, delta })
            .collect();

        self.stack
            .execute_labeled(&mut self.document, "Move elements", commands)?;
        Ok(())
    }

    pub fn set_name(&mut self, id: &ElementId, name: Option<String>) -> Result<(), EditorError> {
        self.stack.execute_labeled(
            &mut self.document,
            "Rename",
            vec![Command::UpdateName {
                element_id: id.clone(),
                name,
            }],
        )
    }

    /// Point an element's reference holder at a definition, or clear it
    pub fn set_reference(
        &mut self,
        id: &ElementId,
        holder: usize,
        target: Option<DefinitionId>,
    ) -> Result<(), EditorError> {
        self.stack.execute_labeled(
            &mut self.document,
            "Update reference",
            vec![Command::SetReference {
                element_id: id.clone(),
                holder,
                target,
            }],
        )
    }

    /// Copy elements to the clipboard; returns how many were captured
    pub fn copy(&mut self, ids: &[ElementId]) -> Result<usize, EditorError> {
        self.copy_with_definitions(ids, &[])
    }

    /// Copy elements, treating `definitions` as part of the copied tree so
    /// pasting creates fresh copies of them
    pub fn copy_with_definitions(
        &mut self,
        ids: &[ElementId],
        definitions: &[DefinitionId],
    ) -> Result<usize, EditorError> {
        let tree = clone::copy_with_definitions(&self.document, ids, definitions)?;
        let count = tree.len();
        self.clipboard = Some(tree);
        Ok(count)
    }

    pub fn clipboard(&self) -> Option<&ClipboardTree> {
        self.clipboard.as_ref()
    }

    /// Paste the clipboard as one undo step; selects and returns the new
    /// top-level elements in insertion order
    pub fn paste(&mut self, target: &PasteTarget) -> Result<Vec<ElementId>, EditorError> {
        let tree = self.clipboard.as_ref().ok_or(CloneError::EmptySelection)?;
        let cloned = clone::clone_tree(tree, &mut self.ids, target)?;

        let mut registered = Vec::new();
        for definition in cloned.definitions {
            let id = definition.id.clone();
            if self.document.register_definition(definition) {
                registered.push(id);
            }
        }

        match self.insert_elements("Paste", cloned.elements) {
            Ok(ids) => {
                self.selection = ids.clone();
                Ok(ids)
            }
            Err(err) => {
                for id in &registered {
                    self.document.unregister_definition(id);
                }
                Err(err)
            }
        }
    }

    pub fn undo(&mut self) -> Result<(), EditorError> {
        self.stack.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        self.stack.redo(&mut self.document)
    }

    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    /// Update selection
    pub fn select(&mut self, ids: Vec<ElementId>) {
        self.selection = ids;
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }
}
