//! Global definitions shared across the document.
//!
//! Error, escalation, message and signal definitions live at the root of a
//! process document and are *referenced* (never owned) by event definitions
//! on elements. Any number of holders may point at the same definition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::DefinitionId;

/// Kind of a global definition, and of the event definition referencing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Error,
    Escalation,
    Message,
    Signal,
}

impl DefinitionKind {
    pub const ALL: [DefinitionKind; 4] = [
        DefinitionKind::Error,
        DefinitionKind::Escalation,
        DefinitionKind::Message,
        DefinitionKind::Signal,
    ];

    /// Type name of the root definition (`Error`, `Signal`, ...)
    pub fn type_name(self) -> &'static str {
        match self {
            DefinitionKind::Error => "Error",
            DefinitionKind::Escalation => "Escalation",
            DefinitionKind::Message => "Message",
            DefinitionKind::Signal => "Signal",
        }
    }

    /// Type name of the event definition holding the reference
    pub fn event_definition_type(self) -> &'static str {
        match self {
            DefinitionKind::Error => "ErrorEventDefinition",
            DefinitionKind::Escalation => "EscalationEventDefinition",
            DefinitionKind::Message => "MessageEventDefinition",
            DefinitionKind::Signal => "SignalEventDefinition",
        }
    }

    /// Attribute name of the reference on the event definition
    pub fn reference_attribute(self) -> &'static str {
        match self {
            DefinitionKind::Error => "errorRef",
            DefinitionKind::Escalation => "escalationRef",
            DefinitionKind::Message => "messageRef",
            DefinitionKind::Signal => "signalRef",
        }
    }

    /// Whether definitions of this kind carry a code
    pub fn has_code(self) -> bool {
        matches!(self, DefinitionKind::Error | DefinitionKind::Escalation)
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for DefinitionKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(DefinitionKind::Error),
            "escalation" => Ok(DefinitionKind::Escalation),
            "message" => Ok(DefinitionKind::Message),
            "signal" => Ok(DefinitionKind::Signal),
            _ => Err(ModelError::UnknownDefinitionKind(s.to_string())),
        }
    }
}

/// A globally scoped, identity-significant definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefinition {
    pub id: DefinitionId,
    pub kind: DefinitionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `errorCode` / `escalationCode`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl GlobalDefinition {
    pub fn new(id: DefinitionId, kind: DefinitionKind) -> Self {
        Self {
            id,
            kind,
            name: None,
            code: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Result<Self, ModelError> {
        if !self.kind.has_code() {
            return Err(ModelError::InvalidOption(format!(
                "{} definitions have no code",
                self.kind
            )));
        }
        self.code = Some(code.into());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DefinitionKind::Escalation.reference_attribute(), "escalationRef");
        assert_eq!(
            DefinitionKind::Message.event_definition_type(),
            "MessageEventDefinition"
        );
        assert_eq!("Signal".parse::<DefinitionKind>().unwrap(), DefinitionKind::Signal);
        assert!("timer".parse::<DefinitionKind>().is_err());
    }

    #[test]
    fn test_code_only_on_error_and_escalation() {
        let error = GlobalDefinition::new(DefinitionId::new("Error_1"), DefinitionKind::Error)
            .with_code("E42")
            .unwrap();
        assert_eq!(error.code.as_deref(), Some("E42"));

        let signal = GlobalDefinition::new(DefinitionId::new("Signal_1"), DefinitionKind::Signal);
        assert!(signal.with_code("S1").is_err());
    }

    #[test]
    fn test_definition_serialization() {
        let def = GlobalDefinition::new(DefinitionId::new("Message_1"), DefinitionKind::Message)
            .with_name("Order received");

        let json = serde_json::to_string(&def).unwrap();
        assert_eq!(
            json,
            r#"{"id":"Message_1","kind":"message","name":"Order received"}"#
        );

        let back: GlobalDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
