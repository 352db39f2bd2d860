//! # procflow editor
//!
//! Undoable editing engine for process diagrams.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ EditSession: high-level edits               │
//! │  - create / connect / remove / move         │
//! │  - copy / paste, selection                  │
//! └─────────────────────────────────────────────┘
//!                     ↓ commands
//! ┌─────────────────────────────────────────────┐
//! │ CommandStack: atomic units + undo/redo      │
//! │  - lifecycle hooks for listeners            │
//! │  - rollback on failure                      │
//! └─────────────────────────────────────────────┘
//!                     ↓ pre-execute
//! ┌─────────────────────────────────────────────┐
//! │ DefinitionReferenceBehavior                 │
//! │  - root membership follows references       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Commands are primitive**: each one is validated and exactly invertible
//! 2. **Units are atomic**: corrective effects ride along with the command
//!    that triggered them and undo together with it
//! 3. **Definitions keep their identity**: removing the last reference drops
//!    membership, never the instance
//!
//! ## Usage
//!
//! ```rust,ignore
//! use procflow_editor::EditSession;
//! use procflow_model::{DefinitionKind, ElementType, ShapeOptions};
//!
//! let mut session = EditSession::new("order-process");
//! let error = session.define(DefinitionKind::Error, Some("Payment failed".into()));
//!
//! let task = session.create_shape(&ShapeOptions::new(ElementType::Task))?;
//! session.create_shape(
//!     &ShapeOptions::new(ElementType::BoundaryEvent)
//!         .attached_to(task.clone())
//!         .with_event_definition(DefinitionKind::Error)
//!         .referencing(error.clone()),
//! )?;
//!
//! session.remove_shape(&task)?; // error definition leaves the root set
//! session.undo()?;              // ...and comes back, same handle
//! ```

pub mod behaviors;
pub mod clone;
mod command_stack;
mod commands;
mod config;
mod errors;
mod hooks;
mod session;

pub use behaviors::DefinitionReferenceBehavior;
pub use clone::{ClipboardTree, CloneError, ClonedTree, PasteTarget};
pub use command_stack::{CommandBatch, CommandStack};
pub use commands::{Command, CommandError, ReferenceFootprint};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::EditorError;
pub use hooks::{CommandListener, Hints, ListenerId, NotifyContext, Phase, PreExecuteContext};
pub use session::EditSession;

// Re-export common types for convenience
pub use procflow_model as model;
