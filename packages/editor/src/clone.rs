//! # Clone / paste engine
//!
//! Copies a subtree of elements into a [`ClipboardTree`] and produces fresh,
//! structurally identical copies of it with [`clone_tree`].
//!
//! ## Reference rules
//!
//! - Element links (parent, host, source, target) inside the tree are
//!   rewired to the new elements
//! - Definitions captured with the tree are cloned and references to them
//!   rewired to the clones
//! - Every other definition reference keeps pointing at the **same**
//!   definition handle
//!
//! The engine produces elements and definitions only. It never changes root
//! membership; committing the clone through the command stack lets the
//! reference behavior take care of that.

use procflow_model::{
    DefinitionId, Document, Element, ElementId, ElementKind, GlobalDefinition, IdGenerator, Point,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloneError {
    #[error("Nothing selected to copy")]
    EmptySelection,

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Definition not found: {0}")]
    DefinitionNotFound(DefinitionId),

    #[error("Element {0} is attached outside the copied tree and the paste target has no host")]
    MissingHost(ElementId),
}

impl CloneError {
    pub fn code(&self) -> &'static str {
        match self {
            CloneError::EmptySelection => "empty-selection",
            CloneError::ElementNotFound(_) => "element-not-found",
            CloneError::DefinitionNotFound(_) => "definition-not-found",
            CloneError::MissingHost(_) => "missing-host",
        }
    }
}

/// A copied subtree, ordered so that every element follows the elements it
/// links to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardTree {
    pub elements: Vec<Element>,

    /// Definitions that belong to the tree and are cloned with it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<GlobalDefinition>,

    /// Top-left corner of the copied shapes
    pub origin: Point,
}

impl ClipboardTree {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.iter().any(|e| &e.id == id)
    }
}

/// Where a clone lands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteTarget {
    /// The tree origin is moved here
    pub position: Point,

    /// Parent for elements whose parent lies outside the tree
    #[serde(default)]
    pub parent: Option<ElementId>,

    /// Host for boundary events whose host lies outside the tree
    #[serde(default)]
    pub host: Option<ElementId>,
}

impl PasteTarget {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    pub fn in_parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn attached_to(mut self, host: ElementId) -> Self {
        self.host = Some(host);
        self
    }
}

/// Result of cloning a tree
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedTree {
    /// New elements, in insertion order
    pub elements: Vec<Element>,

    /// Fresh copies of the tree's own definitions
    pub definitions: Vec<GlobalDefinition>,

    /// Old element id → new element id
    pub element_ids: BTreeMap<ElementId, ElementId>,

    /// Old definition id → new definition id (tree-owned definitions only)
    pub definition_ids: BTreeMap<DefinitionId, DefinitionId>,
}

/// Copy the selected elements together with everything that cannot live
/// without them: children, attached boundary events and connections whose
/// both ends are copied
pub fn copy(doc: &Document, ids: &[ElementId]) -> Result<ClipboardTree, CloneError> {
    copy_with_definitions(doc, ids, &[])
}

/// Like [`copy`], additionally capturing `definitions` as part of the tree
pub fn copy_with_definitions(
    doc: &Document,
    ids: &[ElementId],
    definitions: &[DefinitionId],
) -> Result<ClipboardTree, CloneError> {
    if ids.is_empty() {
        return Err(CloneError::EmptySelection);
    }

    let mut selected: BTreeSet<&ElementId> = BTreeSet::new();
    for id in ids {
        let element = doc
            .element(id)
            .ok_or_else(|| CloneError::ElementNotFound(id.clone()))?;
        selected.insert(&element.id);
    }

    // Grow to a fixpoint: structural dependents of anything selected
    loop {
        let before = selected.len();
        for element in doc.elements() {
            if selected.contains(&element.id) {
                continue;
            }
            let include = match &element.kind {
                ElementKind::Connection { source, target, .. } => {
                    selected.contains(source) && selected.contains(target)
                }
                ElementKind::Shape { host, .. } => {
                    element.parent.as_ref().is_some_and(|p| selected.contains(p))
                        || host.as_ref().is_some_and(|h| selected.contains(h))
                }
            };
            if include {
                selected.insert(&element.id);
            }
        }
        if selected.len() == before {
            break;
        }
    }

    // A selected connection only travels with both of its ends
    loop {
        let dangling: Vec<&ElementId> = doc
            .elements()
            .iter()
            .filter(|e| selected.contains(&e.id))
            .filter_map(|e| match &e.kind {
                ElementKind::Connection { source, target, .. }
                    if !(selected.contains(source) && selected.contains(target)) =>
                {
                    Some(&e.id)
                }
                _ => None,
            })
            .collect();
        if dangling.is_empty() {
            break;
        }
        for id in dangling {
            selected.remove(id);
        }
    }

    if selected.is_empty() {
        return Err(CloneError::EmptySelection);
    }

    let elements = order_by_links(
        doc.elements()
            .iter()
            .filter(|e| selected.contains(&e.id))
            .cloned()
            .collect(),
    );

    let definitions = definitions
        .iter()
        .map(|id| {
            doc.definition(id)
                .cloned()
                .ok_or_else(|| CloneError::DefinitionNotFound(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let origin = tree_origin(&elements);

    debug!(
        elements = elements.len(),
        definitions = definitions.len(),
        "Copied tree"
    );

    Ok(ClipboardTree {
        elements,
        definitions,
        origin,
    })
}

/// Produce fresh copies of a tree positioned at `target`
pub fn clone_tree(
    tree: &ClipboardTree,
    ids: &mut IdGenerator,
    target: &PasteTarget,
) -> Result<ClonedTree, CloneError> {
    if tree.is_empty() {
        return Err(CloneError::EmptySelection);
    }

    let mut definition_ids = BTreeMap::new();
    let mut definitions = Vec::with_capacity(tree.definitions.len());
    for definition in &tree.definitions {
        let new_id = ids.definition_id(definition.kind);
        definition_ids.insert(definition.id.clone(), new_id.clone());
        definitions.push(GlobalDefinition {
            id: new_id,
            ..definition.clone()
        });
    }

    let element_ids: BTreeMap<ElementId, ElementId> = tree
        .elements
        .iter()
        .map(|e| (e.id.clone(), ids.element_id(e.element_type)))
        .collect();

    let delta = Point::new(
        target.position.x - tree.origin.x,
        target.position.y - tree.origin.y,
    );

    let mut elements = Vec::with_capacity(tree.elements.len());
    for original in &tree.elements {
        let mut element = original.clone();
        element.id = element_ids[&original.id].clone();

        element.parent = match &original.parent {
            Some(parent) if element_ids.contains_key(parent) => Some(element_ids[parent].clone()),
            _ => target.parent.clone(),
        };

        match &mut element.kind {
            ElementKind::Shape { host, .. } => {
                if let Some(old_host) = host.take() {
                    *host = Some(match element_ids.get(&old_host) {
                        Some(new_host) => new_host.clone(),
                        None => target
                            .host
                            .clone()
                            .ok_or_else(|| CloneError::MissingHost(original.id.clone()))?,
                    });
                }
            }
            ElementKind::Connection {
                source,
                target: sink,
                ..
            } => {
                for endpoint in [source, sink] {
                    let rewired = element_ids
                        .get(&*endpoint)
                        .cloned()
                        .ok_or_else(|| CloneError::ElementNotFound((*endpoint).clone()))?;
                    *endpoint = rewired;
                }
            }
        }

        for holder in element.business_object.event_definitions.iter_mut() {
            holder.id = ids.event_definition_id(holder.kind);
            if let Some(reference) = &holder.reference {
                if let Some(rewired) = definition_ids.get(reference) {
                    holder.reference = Some(rewired.clone());
                }
            }
        }

        element.translate(delta);
        elements.push(element);
    }

    debug!(
        elements = elements.len(),
        definitions = definitions.len(),
        "Cloned tree"
    );

    Ok(ClonedTree {
        elements,
        definitions,
        element_ids,
        definition_ids,
    })
}

/// Stable order in which every element follows its in-tree links
fn order_by_links(mut pending: Vec<Element>) -> Vec<Element> {
    let mut ordered: Vec<Element> = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let in_tree: BTreeSet<ElementId> = pending.iter().map(|e| e.id.clone()).collect();
        let (ready, blocked): (Vec<Element>, Vec<Element>) = pending
            .into_iter()
            .partition(|e| e.element_links().into_iter().all(|l| !in_tree.contains(l)));

        if ready.is_empty() {
            // Cyclic links cannot come from a valid document; keep them as is
            ordered.extend(blocked);
            break;
        }

        ordered.extend(ready);
        pending = blocked;
    }

    ordered
}

fn tree_origin(elements: &[Element]) -> Point {
    let shapes: Vec<Point> = elements
        .iter()
        .filter_map(|e| e.bounds().map(|b| b.origin()))
        .collect();

    let points: Vec<Point> = if shapes.is_empty() {
        elements
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Connection { waypoints, .. } => Some(waypoints.iter().copied()),
                ElementKind::Shape { .. } => None,
            })
            .flatten()
            .collect()
    } else {
        shapes
    };

    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }

    Point::new(
        points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min),
        points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min),
    )
}
