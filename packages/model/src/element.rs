//! Diagram elements: shapes and connections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::{DefinitionId, ElementId};
use crate::semantic::SemanticObject;

/// Type tag of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "bpmn:StartEvent")]
    StartEvent,
    #[serde(rename = "bpmn:EndEvent")]
    EndEvent,
    #[serde(rename = "bpmn:IntermediateThrowEvent")]
    IntermediateThrowEvent,
    #[serde(rename = "bpmn:IntermediateCatchEvent")]
    IntermediateCatchEvent,
    #[serde(rename = "bpmn:BoundaryEvent")]
    BoundaryEvent,
    #[serde(rename = "bpmn:Task")]
    Task,
    #[serde(rename = "bpmn:UserTask")]
    UserTask,
    #[serde(rename = "bpmn:ExclusiveGateway")]
    ExclusiveGateway,
    #[serde(rename = "bpmn:ParallelGateway")]
    ParallelGateway,
    #[serde(rename = "bpmn:SubProcess")]
    SubProcess,
    #[serde(rename = "bpmn:Participant")]
    Participant,
    #[serde(rename = "bpmn:DataObjectReference")]
    DataObjectReference,
    #[serde(rename = "bpmn:DataStoreReference")]
    DataStoreReference,
    #[serde(rename = "bpmn:Group")]
    Group,
    #[serde(rename = "bpmn:SequenceFlow")]
    SequenceFlow,
    #[serde(rename = "bpmn:MessageFlow")]
    MessageFlow,
    #[serde(rename = "bpmn:Association")]
    Association,
}

impl ElementType {
    /// Type name without the `bpmn:` prefix
    pub fn short_name(self) -> &'static str {
        match self {
            ElementType::StartEvent => "StartEvent",
            ElementType::EndEvent => "EndEvent",
            ElementType::IntermediateThrowEvent => "IntermediateThrowEvent",
            ElementType::IntermediateCatchEvent => "IntermediateCatchEvent",
            ElementType::BoundaryEvent => "BoundaryEvent",
            ElementType::Task => "Task",
            ElementType::UserTask => "UserTask",
            ElementType::ExclusiveGateway => "ExclusiveGateway",
            ElementType::ParallelGateway => "ParallelGateway",
            ElementType::SubProcess => "SubProcess",
            ElementType::Participant => "Participant",
            ElementType::DataObjectReference => "DataObjectReference",
            ElementType::DataStoreReference => "DataStoreReference",
            ElementType::Group => "Group",
            ElementType::SequenceFlow => "SequenceFlow",
            ElementType::MessageFlow => "MessageFlow",
            ElementType::Association => "Association",
        }
    }

    pub fn is_connection(self) -> bool {
        matches!(
            self,
            ElementType::SequenceFlow | ElementType::MessageFlow | ElementType::Association
        )
    }

    pub fn is_event(self) -> bool {
        matches!(
            self,
            ElementType::StartEvent
                | ElementType::EndEvent
                | ElementType::IntermediateThrowEvent
                | ElementType::IntermediateCatchEvent
                | ElementType::BoundaryEvent
        )
    }

    /// Whether shapes of this type may contain child shapes
    pub fn is_container(self) -> bool {
        matches!(self, ElementType::SubProcess | ElementType::Participant)
    }

    /// Default shape size `(width, height)`
    pub fn default_size(self, is_expanded: bool) -> (f64, f64) {
        match self {
            ElementType::Task | ElementType::UserTask => (100.0, 80.0),
            ElementType::SubProcess if is_expanded => (350.0, 200.0),
            ElementType::SubProcess => (100.0, 80.0),
            ElementType::Participant => (600.0, 250.0),
            ElementType::ExclusiveGateway | ElementType::ParallelGateway => (50.0, 50.0),
            ElementType::DataObjectReference => (36.0, 50.0),
            ElementType::DataStoreReference => (50.0, 50.0),
            ElementType::Group => (300.0, 300.0),
            ElementType::SequenceFlow | ElementType::MessageFlow | ElementType::Association => {
                (0.0, 0.0)
            }
            _ => (36.0, 36.0),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bpmn:{}", self.short_name())
    }
}

impl FromStr for ElementType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix("bpmn:").unwrap_or(s);
        let element_type = match short {
            "StartEvent" => ElementType::StartEvent,
            "EndEvent" => ElementType::EndEvent,
            "IntermediateThrowEvent" => ElementType::IntermediateThrowEvent,
            "IntermediateCatchEvent" => ElementType::IntermediateCatchEvent,
            "BoundaryEvent" => ElementType::BoundaryEvent,
            "Task" => ElementType::Task,
            "UserTask" => ElementType::UserTask,
            "ExclusiveGateway" => ElementType::ExclusiveGateway,
            "ParallelGateway" => ElementType::ParallelGateway,
            "SubProcess" => ElementType::SubProcess,
            "Participant" => ElementType::Participant,
            "DataObjectReference" => ElementType::DataObjectReference,
            "DataStoreReference" => ElementType::DataStoreReference,
            "Group" => ElementType::Group,
            "SequenceFlow" => ElementType::SequenceFlow,
            "MessageFlow" => ElementType::MessageFlow,
            "Association" => ElementType::Association,
            _ => return Err(ModelError::UnknownElementType(s.to_string())),
        };
        Ok(element_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(self, delta: Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }

    pub fn negate(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate(self, delta: Point) -> Bounds {
        Bounds::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }
}

/// Geometry and structural links of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementKind {
    Shape {
        bounds: Bounds,
        /// Host shape a boundary event is attached to
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host: Option<ElementId>,
    },
    Connection {
        source: ElementId,
        target: ElementId,
        waypoints: Vec<Point>,
    },
}

/// A node or connection in the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub element_type: ElementType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,

    pub kind: ElementKind,

    pub business_object: SemanticObject,
}

impl Element {
    pub fn is_connection(&self) -> bool {
        matches!(self.kind, ElementKind::Connection { .. })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match &self.kind {
            ElementKind::Shape { bounds, .. } => Some(*bounds),
            ElementKind::Connection { .. } => None,
        }
    }

    pub fn host(&self) -> Option<&ElementId> {
        match &self.kind {
            ElementKind::Shape { host, .. } => host.as_ref(),
            ElementKind::Connection { .. } => None,
        }
    }

    /// `(source, target)` of a connection
    pub fn endpoints(&self) -> Option<(&ElementId, &ElementId)> {
        match &self.kind {
            ElementKind::Connection { source, target, .. } => Some((source, target)),
            ElementKind::Shape { .. } => None,
        }
    }

    /// Other elements this element structurally depends on
    pub fn element_links(&self) -> Vec<&ElementId> {
        let mut links: Vec<&ElementId> = self.parent.iter().collect();
        match &self.kind {
            ElementKind::Shape { host, .. } => links.extend(host.iter()),
            ElementKind::Connection { source, target, .. } => {
                links.push(source);
                links.push(target);
            }
        }
        links
    }

    /// Whether this element depends on `other` via parent, host or endpoint
    pub fn depends_on(&self, other: &ElementId) -> bool {
        self.element_links().into_iter().any(|link| link == other)
    }

    /// Definitions referenced by this element's holders
    pub fn references(&self) -> impl Iterator<Item = &DefinitionId> {
        self.business_object.references()
    }

    /// Shift the element's geometry by `delta`
    pub fn translate(&mut self, delta: Point) {
        match &mut self.kind {
            ElementKind::Shape { bounds, .. } => *bounds = bounds.translate(delta),
            ElementKind::Connection { waypoints, .. } => {
                for point in waypoints.iter_mut() {
                    *point = point.translate(delta);
                }
            }
        }
    }
}
