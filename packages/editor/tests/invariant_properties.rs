//! Property tests: random edit sequences never break the reference
//! invariant, and every committed edit undoes and redoes exactly

use procflow_editor::model::{DefinitionId, DefinitionKind, ElementType, Point, ShapeOptions};
use procflow_editor::{EditSession, EditorConfig, EditorError, PasteTarget};
use proptest::prelude::*;

// ===================
// Strategies
// ===================

#[derive(Debug, Clone)]
enum Op {
    CreateTask,
    CreateEvent { kind: usize, definition: usize },
    Remove(usize),
    Retarget { element: usize, definition: usize },
    Clear(usize),
    Move(usize),
    CopyPaste(usize),
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::CreateTask),
        (0..4usize, 0..3usize).prop_map(|(kind, definition)| Op::CreateEvent { kind, definition }),
        (0..32usize).prop_map(Op::Remove),
        (0..32usize, 0..3usize).prop_map(|(element, definition)| Op::Retarget {
            element,
            definition
        }),
        (0..32usize).prop_map(Op::Clear),
        (0..32usize).prop_map(Op::Move),
        (0..32usize).prop_map(Op::CopyPaste),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

// ===================
// Harness
// ===================

struct Harness {
    session: EditSession,
    definitions: Vec<Vec<DefinitionId>>,
}

impl Harness {
    fn new() -> Self {
        let config = EditorConfig {
            id_seed: Some("prop".to_string()),
            ..EditorConfig::default()
        };
        let mut session = EditSession::with_config("properties", &config);
        let mut definitions: Vec<Vec<DefinitionId>> = Vec::new();
        for kind in DefinitionKind::ALL {
            definitions.push((0..3).map(|_| session.define(kind, None)).collect());
        }
        Self {
            session,
            definitions,
        }
    }

    fn pick(&self, index: usize) -> Option<procflow_editor::model::Element> {
        let elements = self.session.document().elements();
        if elements.is_empty() {
            return None;
        }
        Some(elements[index % elements.len()].clone())
    }

    /// Apply one op; `Ok(None)` when the op does not apply to this state
    fn apply(&mut self, op: &Op) -> Result<Option<()>, EditorError> {
        match op {
            Op::CreateTask => {
                self.session
                    .create_shape(&ShapeOptions::new(ElementType::Task))?;
            }
            Op::CreateEvent { kind, definition } => {
                let kind_value = DefinitionKind::ALL[*kind];
                self.session.create_shape(
                    &ShapeOptions::new(ElementType::IntermediateCatchEvent)
                        .with_event_definition(kind_value)
                        .referencing(self.definitions[*kind][*definition].clone()),
                )?;
            }
            Op::Remove(index) => match self.pick(*index) {
                Some(element) => self.session.remove_shape(&element.id)?,
                None => return Ok(None),
            },
            Op::Retarget { element, definition } => {
                let Some(element) = self.pick(*element) else {
                    return Ok(None);
                };
                let Some(holder) = element.business_object.holder(0) else {
                    return Ok(None);
                };
                let kind = DefinitionKind::ALL
                    .iter()
                    .position(|k| *k == holder.kind)
                    .unwrap_or(0);
                let target = self.definitions[kind][*definition].clone();
                if holder.reference.as_ref() == Some(&target) {
                    return Ok(None);
                }
                self.session.set_reference(&element.id, 0, Some(target))?;
            }
            Op::Clear(index) => {
                let Some(element) = self.pick(*index) else {
                    return Ok(None);
                };
                match element.business_object.holder(0) {
                    Some(holder) if holder.reference.is_some() => {
                        self.session.set_reference(&element.id, 0, None)?
                    }
                    _ => return Ok(None),
                }
            }
            Op::Move(index) => match self.pick(*index) {
                Some(element) => self
                    .session
                    .move_elements(&[element.id], Point::new(5.0, -5.0))?,
                None => return Ok(None),
            },
            Op::CopyPaste(index) => {
                let Some(element) = self.pick(*index) else {
                    return Ok(None);
                };
                self.session.copy(&[element.id])?;
                self.session.paste(&PasteTarget::at(10.0, 10.0))?;
            }
            Op::Undo => self.session.undo()?,
            Op::Redo => self.session.redo()?,
        }
        Ok(Some(()))
    }
}

// ===================
// Property Test Functions
// ===================

/// The invariant holds after every step, whatever succeeds or fails
fn check_invariant_preserved(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut harness = Harness::new();

    for op in &ops {
        let before = harness.session.snapshot();
        match harness.apply(op) {
            Ok(_) => {}
            Err(err) if err.is_boundary() => {
                prop_assert_eq!(&harness.session.snapshot(), &before);
            }
            Err(err) => {
                prop_assert_ne!(err.reason_code(), "invariant-violation", "{:?}", op);
                prop_assert_eq!(&harness.session.snapshot(), &before);
            }
        }
        prop_assert!(
            harness.session.document().verify_references().is_ok(),
            "after {:?}",
            op
        );
    }
    Ok(())
}

/// Each successful edit undoes to the prior state and redoes to the
/// post-edit state
fn check_undo_redo_round_trip(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut harness = Harness::new();

    for op in &ops {
        if matches!(op, Op::Undo | Op::Redo) {
            continue;
        }

        let before = harness.session.snapshot();
        if !matches!(harness.apply(op), Ok(Some(()))) {
            continue;
        }
        let after = harness.session.snapshot();

        prop_assert!(harness.session.undo().is_ok());
        prop_assert_eq!(&harness.session.snapshot(), &before, "undo {:?}", op);

        prop_assert!(harness.session.redo().is_ok());
        prop_assert_eq!(&harness.session.snapshot(), &after, "redo {:?}", op);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariant_preserved(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_invariant_preserved(ops)?;
    }

    #[test]
    fn undo_redo_round_trip(ops in prop::collection::vec(op_strategy(), 1..30)) {
        check_undo_redo_round_trip(ops)?;
    }
}
