//! # Command Stack
//!
//! Executes, undoes and redoes commands as atomic units of work.
//!
//! ## Design
//!
//! - Each effect records its inverse right before being applied
//! - Listeners may fold corrective effects into the unit being committed
//! - A failure anywhere in a unit rolls back everything the unit applied
//! - Undo applies the inverses and moves the unit to the redo stack
//! - Redo reapplies the recorded effects
//! - New units clear the redo stack
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = CommandStack::new();
//! stack.register_listener(Box::new(DefinitionReferenceBehavior::new()));
//!
//! stack.execute(&mut doc, Command::RemoveElement { element_id })?;
//! stack.undo(&mut doc)?;
//! stack.redo(&mut doc)?;
//! ```

use procflow_model::Document;
use tracing::{debug, error, info, warn};

use crate::commands::{Command, CommandError};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::hooks::{CommandListener, Hints, ListenerId, NotifyContext, Phase, PreExecuteContext};

/// One history entry: a group of effects undone/redone together
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    /// The triggering commands, as submitted
    pub commands: Vec<Command>,

    /// Every applied effect, corrective effects included (in application order)
    pub effects: Vec<Command>,

    /// The inverse effects (in reverse order for undo)
    pub inverses: Vec<Command>,

    /// Shared context gathered by listeners while committing
    pub hints: Hints,

    /// Optional description of this unit
    pub description: Option<String>,
}

impl CommandBatch {
    /// Number of effects listeners folded into the unit
    pub fn corrective_count(&self) -> usize {
        self.effects.len().saturating_sub(self.commands.len())
    }
}

/// Undo/redo stack with lifecycle notifications
#[derive(Debug)]
pub struct CommandStack {
    /// Committed units (most recent last)
    undo_stack: Vec<CommandBatch>,

    /// Undone units (most recent last)
    redo_stack: Vec<CommandBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Check the reference-count invariant before committing a unit
    verify_invariants: bool,

    listeners: Vec<(ListenerId, Box<dyn CommandListener>)>,
    next_listener_id: u64,
}

impl CommandStack {
    /// Create a new command stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create a command stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            verify_invariants: true,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        let mut stack = Self::with_max_levels(config.max_undo_levels);
        stack.verify_invariants = config.verify_invariants;
        stack
    }

    /// Register a listener; it runs after every listener registered before it
    pub fn register_listener(&mut self, listener: Box<dyn CommandListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        debug!(listener = listener.name(), id = id.0, "Registering command listener");
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Execute a single command as its own history entry
    pub fn execute(&mut self, doc: &mut Document, command: Command) -> Result<(), EditorError> {
        self.commit(doc, vec![command], None)
    }

    /// Execute commands as one indivisible history entry
    pub fn execute_atomic(
        &mut self,
        doc: &mut Document,
        commands: Vec<Command>,
    ) -> Result<(), EditorError> {
        self.commit(doc, commands, None)
    }

    /// Execute commands as one history entry with a description
    pub fn execute_labeled(
        &mut self,
        doc: &mut Document,
        description: impl Into<String>,
        commands: Vec<Command>,
    ) -> Result<(), EditorError> {
        self.commit(doc, commands, Some(description.into()))
    }

    fn commit(
        &mut self,
        doc: &mut Document,
        commands: Vec<Command>,
        description: Option<String>,
    ) -> Result<(), EditorError> {
        if commands.is_empty() {
            return Err(CommandError::EmptyBatch.into());
        }

        let mut hints = Hints::new();
        let mut effects = Vec::new();
        let mut inverses = Vec::new();

        for command in &commands {
            if let Err(err) = self.stage(doc, command, &mut hints, &mut effects, &mut inverses) {
                warn!(
                    command = command.name(),
                    reason = err.reason_code(),
                    applied = inverses.len(),
                    "Rolling back atomic unit"
                );
                Self::rollback(doc, &inverses)?;
                return Err(err);
            }
        }

        if self.verify_invariants {
            if let Err(violation) = doc.verify_references() {
                warn!(%violation, "Unit breaks reference invariant, rolling back");
                Self::rollback(doc, &inverses)?;
                return Err(EditorError::InvariantViolation(violation.to_string()));
            }
        }

        inverses.reverse();
        let batch = CommandBatch {
            commands,
            effects,
            inverses,
            hints,
            description,
        };

        info!(
            commands = batch.commands.len(),
            effects = batch.effects.len(),
            corrective = batch.corrective_count(),
            description = batch.description.as_deref().unwrap_or(""),
            "Committed atomic unit"
        );

        self.push_batch(batch);

        if let Some(batch) = self.undo_stack.last() {
            Self::notify(&mut self.listeners, Phase::PostExecute, batch, doc);
        }

        Ok(())
    }

    /// Run pre-execute hooks for one triggering command, then apply it
    /// together with the effects the hooks folded in
    fn stage(
        &mut self,
        doc: &mut Document,
        command: &Command,
        hints: &mut Hints,
        effects: &mut Vec<Command>,
        inverses: &mut Vec<Command>,
    ) -> Result<(), EditorError> {
        command.validate(doc)?;

        let mut ctx = PreExecuteContext::new(command, doc, hints);
        for (_, listener) in self.listeners.iter_mut() {
            listener.pre_execute(&mut ctx)?;
        }
        let (before, after) = ctx.into_effects();

        for effect in before
            .into_iter()
            .chain(std::iter::once(command.clone()))
            .chain(after)
        {
            let inverse = effect.apply_with_inverse(doc)?;
            debug!(command = effect.name(), "Applied effect");
            effects.push(effect);
            inverses.push(inverse);
        }

        Ok(())
    }

    /// Undo applied effects; `inverses` is in application order
    fn rollback(doc: &mut Document, inverses: &[Command]) -> Result<(), EditorError> {
        for inverse in inverses.iter().rev() {
            if let Err(err) = inverse.apply(doc) {
                error!(command = inverse.name(), %err, "Rollback failed");
                return Err(EditorError::InvariantViolation(format!(
                    "rollback failed at {}: {}",
                    inverse.name(),
                    err
                )));
            }
        }
        Ok(())
    }

    /// Apply recorded commands in order; all or nothing
    fn replay(doc: &mut Document, commands: &[Command]) -> Result<(), EditorError> {
        let mut applied = Vec::with_capacity(commands.len());

        for command in commands {
            match command.apply_with_inverse(doc) {
                Ok(inverse) => applied.push(inverse),
                Err(err) => {
                    Self::rollback(doc, &applied)?;
                    return Err(EditorError::InvariantViolation(format!(
                        "history replay failed at {}: {}",
                        command.name(),
                        err
                    )));
                }
            }
        }

        Ok(())
    }

    /// Replay onto a copy of `doc`, so a history step that cannot complete
    /// is rejected before any listener hears of it
    fn stage_replay(doc: &Document, commands: &[Command]) -> Result<Document, EditorError> {
        let mut staged = doc.clone();
        Self::replay(&mut staged, commands)?;
        Ok(staged)
    }

    fn notify(
        listeners: &mut [(ListenerId, Box<dyn CommandListener>)],
        phase: Phase,
        batch: &CommandBatch,
        document: &Document,
    ) {
        let ctx = NotifyContext {
            phase,
            batch,
            document,
        };

        for (_, listener) in listeners.iter_mut() {
            match phase {
                Phase::PostExecute => listener.post_execute(&ctx),
                Phase::PreUndo => listener.pre_undo(&ctx),
                Phase::PostUndo => listener.post_undo(&ctx),
                Phase::PreRedo => listener.pre_redo(&ctx),
                Phase::PostRedo => listener.post_redo(&ctx),
                // Dispatched per command from `stage`
                Phase::PreExecute => {}
            }
        }
    }

    /// Push a unit to the undo stack
    fn push_batch(&mut self, batch: CommandBatch) {
        self.undo_stack.push(batch);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates the redo chain
        self.redo_stack.clear();
    }

    /// Undo the most recent unit
    pub fn undo(&mut self, doc: &mut Document) -> Result<(), EditorError> {
        let batch = self.undo_stack.pop().ok_or(EditorError::NothingToUndo)?;

        let staged = match Self::stage_replay(doc, &batch.inverses) {
            Ok(staged) => staged,
            Err(err) => {
                self.undo_stack.push(batch);
                return Err(err);
            }
        };

        Self::notify(&mut self.listeners, Phase::PreUndo, &batch, doc);
        *doc = staged;

        info!(
            effects = batch.inverses.len(),
            description = batch.description.as_deref().unwrap_or(""),
            "Undid atomic unit"
        );

        Self::notify(&mut self.listeners, Phase::PostUndo, &batch, doc);
        self.redo_stack.push(batch);
        Ok(())
    }

    /// Redo the most recently undone unit
    pub fn redo(&mut self, doc: &mut Document) -> Result<(), EditorError> {
        let batch = self.redo_stack.pop().ok_or(EditorError::NothingToRedo)?;

        let staged = match Self::stage_replay(doc, &batch.effects) {
            Ok(staged) => staged,
            Err(err) => {
                self.redo_stack.push(batch);
                return Err(err);
            }
        };

        Self::notify(&mut self.listeners, Phase::PreRedo, &batch, doc);
        *doc = staged;

        info!(
            effects = batch.effects.len(),
            description = batch.description.as_deref().unwrap_or(""),
            "Redid atomic unit"
        );

        Self::notify(&mut self.listeners, Phase::PostRedo, &batch, doc);
        self.undo_stack.push(batch);
        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// The unit the next undo reverts
    pub fn last_committed(&self) -> Option<&CommandBatch> {
        self.undo_stack.last()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_model::{Bounds, Element, ElementId, ElementKind, ElementType, SemanticObject};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn task(id: &str) -> Element {
        Element {
            id: ElementId::new(id),
            element_type: ElementType::Task,
            parent: None,
            kind: ElementKind::Shape {
                bounds: Bounds::new(0.0, 0.0, 100.0, 80.0),
                host: None,
            },
            business_object: SemanticObject::default(),
        }
    }

    fn add(id: &str) -> Command {
        Command::AddElement {
            element: task(id),
            index: None,
        }
    }

    fn rename(id: &str, name: &str) -> Command {
        Command::UpdateName {
            element_id: ElementId::new(id),
            name: Some(name.to_string()),
        }
    }

    /// Records every notification it receives
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl CommandListener for Recorder {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn pre_execute(&mut self, ctx: &mut PreExecuteContext<'_>) -> Result<(), EditorError> {
            self.log
                .borrow_mut()
                .push(format!("{}:pre-execute:{}", self.tag, ctx.command().name()));
            Ok(())
        }

        fn post_execute(&mut self, ctx: &NotifyContext<'_>) {
            self.log
                .borrow_mut()
                .push(format!("{}:{}:{}", self.tag, ctx.phase, ctx.batch.effects.len()));
        }

        fn pre_undo(&mut self, ctx: &NotifyContext<'_>) {
            self.log.borrow_mut().push(format!("{}:{}", self.tag, ctx.phase));
        }

        fn post_undo(&mut self, ctx: &NotifyContext<'_>) {
            self.log.borrow_mut().push(format!("{}:{}", self.tag, ctx.phase));
        }
    }

    #[test]
    fn test_command_stack_creation() {
        let stack = CommandStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_execute_undo_redo() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();

        stack.execute(&mut doc, add("Task_1")).unwrap();
        assert_eq!(stack.undo_levels(), 1);
        assert!(doc.contains_element(&ElementId::new("Task_1")));

        stack.undo(&mut doc).unwrap();
        assert!(!doc.contains_element(&ElementId::new("Task_1")));
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 1);

        stack.redo(&mut doc).unwrap();
        assert!(doc.contains_element(&ElementId::new("Task_1")));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_boundaries_report_nothing_to_do() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();

        assert!(matches!(stack.undo(&mut doc), Err(EditorError::NothingToUndo)));
        assert!(matches!(stack.redo(&mut doc), Err(EditorError::NothingToRedo)));
        assert_eq!(doc, Document::new("test"));
    }

    #[test]
    fn test_labeled_units_undo_together() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();

        stack
            .execute_labeled(
                &mut doc,
                "Add tasks",
                vec![add("Task_1"), add("Task_2"), rename("Task_1", "Review")],
            )
            .unwrap();

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("Add tasks"));
        assert_eq!(doc.elements().len(), 2);

        stack.undo(&mut doc).unwrap();
        assert!(doc.elements().is_empty());
        assert_eq!(stack.redo_description(), Some("Add tasks"));
    }

    #[test]
    fn test_failed_unit_rolls_back() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();
        stack.execute(&mut doc, add("Task_1")).unwrap();
        let before = doc.clone();

        // Second command is a duplicate: the first must not survive
        let result = stack.execute_atomic(&mut doc, vec![add("Task_2"), add("Task_1")]);

        assert!(matches!(
            result,
            Err(EditorError::InvalidCommand(CommandError::DuplicateElement(_)))
        ));
        assert_eq!(doc, before);
        assert_eq!(stack.undo_levels(), 1);
    }

    #[test]
    fn test_empty_unit_rejected() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();

        let err = stack.execute_atomic(&mut doc, vec![]).unwrap_err();
        assert_eq!(err.reason_code(), "empty-batch");
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();

        stack.execute(&mut doc, add("Task_1")).unwrap();
        stack.undo(&mut doc).unwrap();
        assert_eq!(stack.redo_levels(), 1);

        stack.execute(&mut doc, add("Task_2")).unwrap();
        assert_eq!(stack.redo_levels(), 0);
        assert!(matches!(stack.redo(&mut doc), Err(EditorError::NothingToRedo)));
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::with_max_levels(2);

        for i in 0..3 {
            stack.execute(&mut doc, add(&format!("Task_{}", i))).unwrap();
        }

        assert_eq!(stack.undo_levels(), 2);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        stack.register_listener(Box::new(Recorder {
            tag: "a",
            log: log.clone(),
        }));
        let b = stack.register_listener(Box::new(Recorder {
            tag: "b",
            log: log.clone(),
        }));

        stack.execute(&mut doc, add("Task_1")).unwrap();
        stack.undo(&mut doc).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "a:pre-execute:addElement",
                "b:pre-execute:addElement",
                "a:post-execute:1",
                "b:post-execute:1",
                "a:pre-undo",
                "b:pre-undo",
                "a:post-undo",
                "b:post-undo",
            ]
        );

        assert!(stack.unregister_listener(b));
        assert!(!stack.unregister_listener(b));
        assert_eq!(stack.listener_count(), 1);
    }

    #[test]
    fn test_failed_undo_is_not_announced() {
        let mut doc = Document::new("test");
        let mut stack = CommandStack::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        stack.register_listener(Box::new(Recorder {
            tag: "a",
            log: log.clone(),
        }));

        stack.execute(&mut doc, add("Task_1")).unwrap();
        stack
            .execute_labeled(&mut doc, "Rename", vec![rename("Task_1", "Review")])
            .unwrap();
        log.borrow_mut().clear();

        // Removing the element behind the stack's back breaks both entries
        doc.remove_element(&ElementId::new("Task_1")).unwrap();
        let before = doc.clone();

        let err = stack.undo(&mut doc).unwrap_err();
        assert_eq!(err.reason_code(), "invariant-violation");
        assert_eq!(doc, before);
        assert_eq!(stack.undo_levels(), 2);
        assert_eq!(stack.undo_description(), Some("Rename"));
        assert!(log.borrow().is_empty());
    }
}
