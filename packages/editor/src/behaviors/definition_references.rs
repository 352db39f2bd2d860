//! # Definition reference lifecycle
//!
//! Keeps root definition membership in step with references:
//!
//! ```text
//! g ∈ root definitions  ⟺  reference_count(g) > 0
//! ```
//!
//! Runs in the pre-execute phase of every triggering command:
//!
//! - a definition about to gain its first reference is made a member
//!   **before** the command applies, so the reference never dangles
//! - a definition about to lose its last reference is dropped from
//!   membership **after** the command applies
//!
//! Both corrections are ordinary primitive effects inside the same unit, so
//! undo and redo restore membership together with the references. The
//! definition instance itself is never touched; re-adding brings back the
//! same handle.

use procflow_model::DefinitionId;
use serde_json::Value;
use tracing::debug;

use crate::commands::Command;
use crate::errors::EditorError;
use crate::hooks::{CommandListener, PreExecuteContext};

/// Hint key listing definitions this behavior made members in the unit
pub const HINT_ADDED: &str = "definitionReferences.added";

/// Hint key listing definitions this behavior dropped in the unit
pub const HINT_REMOVED: &str = "definitionReferences.removed";

#[derive(Debug, Default)]
pub struct DefinitionReferenceBehavior;

impl DefinitionReferenceBehavior {
    pub fn new() -> Self {
        Self
    }

    fn record(ctx: &mut PreExecuteContext<'_>, key: &str, definition: &DefinitionId) {
        let entry = ctx
            .hints_mut()
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(ids) = entry {
            ids.push(Value::String(definition.to_string()));
        }
    }
}

impl CommandListener for DefinitionReferenceBehavior {
    fn name(&self) -> &'static str {
        "definition-references"
    }

    fn pre_execute(&mut self, ctx: &mut PreExecuteContext<'_>) -> Result<(), EditorError> {
        let document = ctx.document();
        let footprint = ctx.command().reference_footprint(document);
        if footprint.is_empty() {
            return Ok(());
        }

        let mut additions = Vec::new();
        for definition in &footprint.added {
            let pending = ctx.prepended().iter().any(|effect| {
                matches!(effect, Command::AddRootDefinition { definition_id, .. } if definition_id == definition)
            });
            if !document.has_root_definition(definition) && !pending {
                additions.push(definition.clone());
            }
        }

        let mut removals = Vec::new();
        for (definition, holders) in &footprint.removed {
            if !document.knows_definition(definition) {
                return Err(EditorError::InvariantViolation(format!(
                    "{} references unknown definition {}",
                    ctx.command().name(),
                    definition
                )));
            }

            let remaining = document.reference_count(definition).saturating_sub(*holders);
            if remaining == 0 && document.has_root_definition(definition) {
                removals.push(definition.clone());
            }
        }

        for definition in additions {
            debug!(definition = %definition, "Adding referenced definition to root");
            Self::record(ctx, HINT_ADDED, &definition);
            ctx.prepend(Command::AddRootDefinition {
                definition_id: definition,
                index: None,
            });
        }

        for definition in removals {
            debug!(definition = %definition, "Dropping unreferenced root definition");
            Self::record(ctx, HINT_REMOVED, &definition);
            ctx.append(Command::RemoveRootDefinition {
                definition_id: definition,
            });
        }

        Ok(())
    }
}
