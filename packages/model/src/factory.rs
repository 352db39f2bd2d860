//! # Element Factory
//!
//! Builds new elements with an initialized semantic payload. The editor
//! never constructs domain payloads itself; it asks a factory.

use serde::{Deserialize, Serialize};

use crate::definition::DefinitionKind;
use crate::element::{Bounds, Element, ElementKind, ElementType, Point};
use crate::error::ModelError;
use crate::ids::{DefinitionId, ElementId, IdGenerator};
use crate::semantic::{EventDefinition, SemanticObject};

/// Option bag for creating a shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeOptions {
    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Explicit id (generated when absent)
    #[serde(default)]
    pub id: Option<ElementId>,

    #[serde(default)]
    pub name: Option<String>,

    /// Top-left corner of the new shape
    #[serde(default)]
    pub position: Point,

    #[serde(default)]
    pub parent: Option<ElementId>,

    /// Host for boundary events
    #[serde(default)]
    pub host: Option<ElementId>,

    #[serde(default)]
    pub is_expanded: Option<bool>,

    #[serde(default)]
    pub event_definition: Option<DefinitionKind>,

    /// Definition the event definition references
    #[serde(default)]
    pub reference: Option<DefinitionId>,
}

impl ShapeOptions {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            id: None,
            name: None,
            position: Point::default(),
            parent: None,
            host: None,
            is_expanded: None,
            event_definition: None,
            reference: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn in_parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn attached_to(mut self, host: ElementId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn expanded(mut self, is_expanded: bool) -> Self {
        self.is_expanded = Some(is_expanded);
        self
    }

    pub fn with_event_definition(mut self, kind: DefinitionKind) -> Self {
        self.event_definition = Some(kind);
        self
    }

    pub fn referencing(mut self, reference: DefinitionId) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Option bag for creating a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    #[serde(rename = "type")]
    pub element_type: ElementType,

    #[serde(default)]
    pub id: Option<ElementId>,

    pub source: ElementId,
    pub target: ElementId,

    #[serde(default)]
    pub parent: Option<ElementId>,

    #[serde(default)]
    pub waypoints: Vec<Point>,
}

impl ConnectionOptions {
    pub fn new(element_type: ElementType, source: ElementId, target: ElementId) -> Self {
        Self {
            element_type,
            id: None,
            source,
            target,
            parent: None,
            waypoints: Vec::new(),
        }
    }
}

/// Creates elements from a type tag and options
pub trait ElementFactory {
    fn create_shape(
        &mut self,
        ids: &mut IdGenerator,
        options: &ShapeOptions,
    ) -> Result<Element, ModelError>;

    fn create_connection(
        &mut self,
        ids: &mut IdGenerator,
        options: &ConnectionOptions,
    ) -> Result<Element, ModelError>;
}

/// Factory for process-diagram element types
#[derive(Debug, Default, Clone)]
pub struct ProcessElementFactory;

impl ProcessElementFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ElementFactory for ProcessElementFactory {
    fn create_shape(
        &mut self,
        ids: &mut IdGenerator,
        options: &ShapeOptions,
    ) -> Result<Element, ModelError> {
        let element_type = options.element_type;

        if element_type.is_connection() {
            return Err(ModelError::InvalidOption(format!(
                "{} is a connection type",
                element_type
            )));
        }

        if element_type == ElementType::BoundaryEvent && options.host.is_none() {
            return Err(ModelError::InvalidOption(
                "boundary events require a host".to_string(),
            ));
        }

        if element_type != ElementType::BoundaryEvent && options.host.is_some() {
            return Err(ModelError::InvalidOption(format!(
                "{} cannot be attached to a host",
                element_type
            )));
        }

        if options.reference.is_some() && options.event_definition.is_none() {
            return Err(ModelError::InvalidOption(
                "a reference requires an event definition".to_string(),
            ));
        }

        let mut business_object = SemanticObject {
            name: options.name.clone(),
            ..SemanticObject::default()
        };

        if let Some(kind) = options.event_definition {
            if !element_type.is_event() {
                return Err(ModelError::InvalidOption(format!(
                    "{} cannot carry a {} event definition",
                    element_type, kind
                )));
            }

            let mut event_definition = EventDefinition::new(ids.event_definition_id(kind), kind);
            event_definition.reference = options.reference.clone();
            business_object.event_definitions.push(event_definition);
        }

        let is_expanded = match element_type {
            ElementType::SubProcess => {
                let expanded = options.is_expanded.unwrap_or(true);
                business_object.is_expanded = Some(expanded);
                expanded
            }
            _ => false,
        };

        let (width, height) = element_type.default_size(is_expanded);
        let id = match &options.id {
            Some(id) => id.clone(),
            None => ids.element_id(element_type),
        };

        Ok(Element {
            id,
            element_type,
            parent: options.parent.clone(),
            kind: ElementKind::Shape {
                bounds: Bounds::new(options.position.x, options.position.y, width, height),
                host: options.host.clone(),
            },
            business_object,
        })
    }

    fn create_connection(
        &mut self,
        ids: &mut IdGenerator,
        options: &ConnectionOptions,
    ) -> Result<Element, ModelError> {
        if !options.element_type.is_connection() {
            return Err(ModelError::InvalidOption(format!(
                "{} is not a connection type",
                options.element_type
            )));
        }

        let id = match &options.id {
            Some(id) => id.clone(),
            None => ids.element_id(options.element_type),
        };

        Ok(Element {
            id,
            element_type: options.element_type,
            parent: options.parent.clone(),
            kind: ElementKind::Connection {
                source: options.source.clone(),
                target: options.target.clone(),
                waypoints: options.waypoints.clone(),
            },
            business_object: SemanticObject::default(),
        })
    }
}
