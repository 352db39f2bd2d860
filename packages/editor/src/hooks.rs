//! # Command Lifecycle Hooks
//!
//! Listeners registered on a [`CommandStack`](crate::CommandStack) observe
//! every execute, undo and redo.
//!
//! ```text
//! execute_atomic([c1, c2])
//!   for c in [c1, c2]:
//!     pre_execute(c)        listeners may prepend / append effects
//!     apply  prepended ++ [c] ++ appended
//!   verify invariant
//!   post_execute(batch)     read-only
//!
//! undo / redo
//!   pre_undo(batch)  → apply inverses  → post_undo(batch)
//!   pre_redo(batch)  → apply effects   → post_redo(batch)
//! ```
//!
//! Only `pre_execute` can fold effects into the in-flight unit. Hooks get a
//! shared borrow of the document and never the stack, so a hook cannot
//! execute commands on the stack that is notifying it.

use procflow_model::Document;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::command_stack::CommandBatch;
use crate::commands::Command;
use crate::errors::EditorError;

/// Shared mutable context of one atomic unit, visible to every hook
pub type Hints = BTreeMap<String, Value>;

/// Lifecycle phase a notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreExecute,
    PostExecute,
    PreUndo,
    PostUndo,
    PreRedo,
    PostRedo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PreExecute => "pre-execute",
            Phase::PostExecute => "post-execute",
            Phase::PreUndo => "pre-undo",
            Phase::PostUndo => "post-undo",
            Phase::PreRedo => "pre-redo",
            Phase::PostRedo => "post-redo",
        };
        f.write_str(name)
    }
}

/// Handle returned by listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Context handed to `pre_execute` for one triggering command
pub struct PreExecuteContext<'a> {
    command: &'a Command,
    document: &'a Document,
    hints: &'a mut Hints,
    before: Vec<Command>,
    after: Vec<Command>,
}

impl<'a> PreExecuteContext<'a> {
    pub(crate) fn new(command: &'a Command, document: &'a Document, hints: &'a mut Hints) -> Self {
        Self {
            command,
            document,
            hints,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// The triggering command, not yet applied
    pub fn command(&self) -> &Command {
        self.command
    }

    /// Document state right before the triggering command
    pub fn document(&self) -> &Document {
        self.document
    }

    pub fn hints(&self) -> &Hints {
        &*self.hints
    }

    pub fn hints_mut(&mut self) -> &mut Hints {
        &mut *self.hints
    }

    /// Fold an effect into the unit, applied before the triggering command
    pub fn prepend(&mut self, command: Command) {
        self.before.push(command);
    }

    /// Fold an effect into the unit, applied after the triggering command
    pub fn append(&mut self, command: Command) {
        self.after.push(command);
    }

    /// Effects folded so far that run before the triggering command
    pub fn prepended(&self) -> &[Command] {
        &self.before
    }

    /// Effects folded so far that run after the triggering command
    pub fn appended(&self) -> &[Command] {
        &self.after
    }

    pub(crate) fn into_effects(self) -> (Vec<Command>, Vec<Command>) {
        (self.before, self.after)
    }
}

/// Read-only context for post-execute and all undo/redo notifications.
///
/// The hints gathered while the unit was committed travel with the batch.
pub struct NotifyContext<'a> {
    pub phase: Phase,
    pub batch: &'a CommandBatch,
    pub document: &'a Document,
}

/// Observer of command stack lifecycle events.
///
/// All methods default to no-ops. Listeners run synchronously, in
/// registration order, within each phase.
pub trait CommandListener {
    /// Name used in logs and rejection reasons
    fn name(&self) -> &'static str;

    /// Inspect a triggering command before it applies; may fold corrective
    /// effects into the unit or reject the whole unit by returning an error
    fn pre_execute(&mut self, _ctx: &mut PreExecuteContext<'_>) -> Result<(), EditorError> {
        Ok(())
    }

    fn post_execute(&mut self, _ctx: &NotifyContext<'_>) {}

    fn pre_undo(&mut self, _ctx: &NotifyContext<'_>) {}

    fn post_undo(&mut self, _ctx: &NotifyContext<'_>) {}

    fn pre_redo(&mut self, _ctx: &NotifyContext<'_>) {}

    fn post_redo(&mut self, _ctx: &NotifyContext<'_>) {}
}

impl fmt::Debug for dyn CommandListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandListener({})", self.name())
    }
}
