//! Semantic payload (business object) attached to elements

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::definition::DefinitionKind;
use crate::ids::DefinitionId;

/// Event definition on an event element.
///
/// This is the reference holder: it points at zero or one global
/// definition of its own kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: String,
    pub kind: DefinitionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<DefinitionId>,
}

impl EventDefinition {
    pub fn new(id: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: DefinitionId) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Business data carried by an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_definitions: Vec<EventDefinition>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl SemanticObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Definitions referenced by this object, one entry per holder
    pub fn references(&self) -> impl Iterator<Item = &DefinitionId> {
        self.event_definitions
            .iter()
            .filter_map(|def| def.reference.as_ref())
    }

    /// Number of holders pointing at `definition`
    pub fn reference_count(&self, definition: &DefinitionId) -> usize {
        self.references().filter(|r| *r == definition).count()
    }

    pub fn holder(&self, index: usize) -> Option<&EventDefinition> {
        self.event_definitions.get(index)
    }

    pub fn holder_mut(&mut self, index: usize) -> Option<&mut EventDefinition> {
        self.event_definitions.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_skip_empty_holders() {
        let shared = DefinitionId::new("Error_1");
        let bo = SemanticObject {
            event_definitions: vec![
                EventDefinition::new("ErrorEventDefinition_1", DefinitionKind::Error)
                    .with_reference(shared.clone()),
                EventDefinition::new("SignalEventDefinition_1", DefinitionKind::Signal),
                EventDefinition::new("ErrorEventDefinition_2", DefinitionKind::Error)
                    .with_reference(shared.clone()),
            ],
            ..SemanticObject::default()
        };

        assert_eq!(bo.references().count(), 2);
        assert_eq!(bo.reference_count(&shared), 2);
        assert_eq!(bo.reference_count(&DefinitionId::new("Error_2")), 0);
    }
}
