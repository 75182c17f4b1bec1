//! Reducer for a single row of the list.

use crate::reducer::TodosEnvironment;
use crate::types::{FocusedField, TodoRowAction, TodoRowState};
use tally_core::{effect::Effect, reducer::Reducer, SmallVec};

/// Applies row-local edits to one projected row
///
/// The row never produces effects; anything list-wide (sorting) is the
/// list reducer's job.
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoRowReducer;

impl TodoRowReducer {
    /// Creates a new `TodoRowReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TodoRowReducer {
    type State = TodoRowState;
    type Action = TodoRowAction;
    type Environment = TodosEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoRowAction::CheckboxTapped => {
                state.todo.is_complete = !state.todo.is_complete;
            },
            TodoRowAction::TextFieldDidChange(text) => {
                state.todo.description = text;
            },
            TodoRowAction::DueDateDidChange(date) => {
                state.todo.due_date = Some(date);
            },
            TodoRowAction::FocusChanged(field) => {
                // The picker needs a value the moment it is shown
                if field == Some(FocusedField::DueDate) && state.todo.due_date.is_none() {
                    state.todo.due_date = Some(env.clock.now());
                }
                state.focus = field;
            },
        }
        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TodosConfig;
    use crate::types::{RowFocus, TodoId, TodoItem};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tally_core::environment::Clock;
    use tally_testing::{assertions, test_clock, IncrementingUuid, ReducerTest};
    use uuid::Uuid;

    fn env() -> TodosEnvironment {
        TodosEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(IncrementingUuid::new()),
            TodosConfig::default(),
        )
    }

    fn row() -> TodoRowState {
        TodoRowState {
            todo: TodoItem::new(TodoId::from_uuid(Uuid::from_u128(0)), "Milk"),
            focus: None,
        }
    }

    #[test]
    fn test_checkbox_toggles() {
        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(row())
            .when_action(TodoRowAction::CheckboxTapped)
            .then_state(|state| assert!(state.todo.is_complete))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_focus_due_date_sets_now() {
        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(row())
            .when_action(TodoRowAction::FocusChanged(Some(FocusedField::DueDate)))
            .then_state(|state| {
                assert_eq!(state.focus_state(), RowFocus::FocusedDueDate);
                assert_eq!(state.todo.due_date, Some(test_clock().now()));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_focus_due_date_keeps_existing_date() {
        let picked = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single();

        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(TodoRowState {
                todo: TodoItem {
                    due_date: picked,
                    ..row().todo
                },
                focus: Some(FocusedField::Description),
            })
            .when_action(TodoRowAction::FocusChanged(Some(FocusedField::DueDate)))
            .then_state(move |state| {
                assert_eq!(state.todo.due_date, picked);
                assert_eq!(state.focus, Some(FocusedField::DueDate));
            })
            .run();
    }

    #[test]
    fn test_focus_description_leaves_due_date_unset() {
        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(row())
            .when_action(TodoRowAction::FocusChanged(Some(FocusedField::Description)))
            .then_state(|state| {
                assert_eq!(state.focus_state(), RowFocus::FocusedDescription);
                assert_eq!(state.todo.due_date, None);
                assert!(state.show_due_date());
            })
            .run();
    }

    #[test]
    fn test_blur_clears_focus() {
        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(TodoRowState {
                focus: Some(FocusedField::DueDate),
                ..row()
            })
            .when_action(TodoRowAction::FocusChanged(None))
            .then_state(|state| assert_eq!(state.focus_state(), RowFocus::Unfocused))
            .run();
    }

    #[test]
    fn test_setters() {
        let date = test_clock().now();

        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(row())
            .when_action(TodoRowAction::TextFieldDidChange("Oat milk".into()))
            .then_state(|state| assert_eq!(state.todo.description, "Oat milk"))
            .run();

        ReducerTest::new(TodoRowReducer::new())
            .with_env(env())
            .given_state(row())
            .when_action(TodoRowAction::DueDateDidChange(date))
            .then_state(move |state| assert_eq!(state.todo.due_date, Some(date)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
