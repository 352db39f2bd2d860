use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::definition::DefinitionKind;
use crate::element::ElementType;

/// Stable identity of an element in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Handle of a global definition. Two references point at the same
/// definition exactly when their handles are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(String);

impl DefinitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefinitionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Generate document seed from a document name using CRC32
pub fn get_document_seed(name: &str) -> String {
    let mut buff = String::from(name);
    if !name.starts_with("diagram://") {
        buff = format!("diagram://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for elements, event definitions and global
/// definitions within one editing session
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(document_name: &str) -> Self {
        Self {
            seed: get_document_seed(document_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID with a type prefix
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.count += 1;
        format!("{}_{}-{}", prefix, self.seed, self.count)
    }

    pub fn element_id(&mut self, element_type: ElementType) -> ElementId {
        ElementId::new(self.next_id(element_type.short_name()))
    }

    pub fn definition_id(&mut self, kind: DefinitionKind) -> DefinitionId {
        DefinitionId::new(self.next_id(kind.type_name()))
    }

    pub fn event_definition_id(&mut self, kind: DefinitionKind) -> String {
        self.next_id(kind.event_definition_type())
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
