//! Error types for the editor

use thiserror::Error;

use crate::clone::CloneError;
use crate::commands::CommandError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CommandError),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Model error: {0}")]
    Model(#[from] procflow_model::ModelError),

    #[error("Clone error: {0}")]
    Clone(#[from] CloneError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EditorError {
    /// Stable reason code reported to callers
    pub fn reason_code(&self) -> &'static str {
        match self {
            EditorError::InvalidCommand(e) => e.code(),
            EditorError::NothingToUndo => "nothing-to-undo",
            EditorError::NothingToRedo => "nothing-to-redo",
            EditorError::InvariantViolation(_) => "invariant-violation",
            EditorError::Model(_) => "model",
            EditorError::Clone(e) => e.code(),
            EditorError::Io(_) => "io",
            EditorError::Config(_) => "config",
        }
    }

    /// Stack-boundary no-ops: the document is untouched and nothing failed
    pub fn is_boundary(&self) -> bool {
        matches!(self, EditorError::NothingToUndo | EditorError::NothingToRedo)
    }
}
