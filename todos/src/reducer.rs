//! Reducer logic for the to-do list.
//!
//! [`TodosReducer`] is the row reducer routed by id, followed by the
//! list-level logic in [`TodosCore`]:
//!
//! - adding an item inserts it at the top and focuses it after a deferral
//! - toggling an item schedules a debounced [`TodosAction::SortCompletedTodos`]
//! - sorting moves completed items below incomplete ones, stably
//!
//! Actions addressed to an id that is no longer in the list are ignored.

use crate::config::TodosConfig;
use crate::row::TodoRowReducer;
use crate::types::{
    FocusedField, TodoId, TodoItem, TodoRowAction, TodoRowState, TodosAction, TodosState,
};
use std::sync::Arc;
use tally_core::composition::{combine, for_each, Combined, ForEach, ForEachLens};
use tally_core::effect::{Effect, EffectId};
use tally_core::environment::{Clock, UuidGenerator};
use tally_core::{reducer::Reducer, smallvec, SmallVec};

/// Cancellation id shared by every pending sort
pub const SORT_COMPLETED_ID: EffectId = EffectId::new("todos.sort_completed");

/// Environment dependencies for the list reducer
#[derive(Clone)]
pub struct TodosEnvironment {
    /// Source of "now" for due dates
    pub clock: Arc<dyn Clock>,
    /// Source of ids for new items
    pub uuid: Arc<dyn UuidGenerator>,
    /// Effect timings
    pub config: TodosConfig,
}

impl TodosEnvironment {
    /// Creates a new `TodosEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, uuid: Arc<dyn UuidGenerator>, config: TodosConfig) -> Self {
        Self { clock, uuid, config }
    }
}

impl std::fmt::Debug for TodosEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// List-level logic, run after the row reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct TodosCore;

impl Reducer for TodosCore {
    type State = TodosState;
    type Action = TodosAction;
    type Environment = TodosEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodosAction::AddButtonTapped => {
                let id = TodoId::from_uuid(env.uuid.new_uuid());
                if !state.todos.insert(0, TodoItem::new(id, "")) {
                    tracing::warn!(%id, "Generated id already in use; item not added");
                    return SmallVec::new();
                }
                tracing::debug!(%id, "Added item");

                smallvec![Effect::deferred(
                    TodosAction::set_focus(id, Some(FocusedField::Description)),
                    env.config.focus_deferral,
                )]
            },
            TodosAction::SortCompletedTodos => {
                state.todos.stable_partition(|todo| todo.is_complete);
                tracing::debug!(completed = state.completed_count(), "Sorted completed items");
                SmallVec::new()
            },
            TodosAction::Todo {
                id,
                action: TodoRowAction::CheckboxTapped,
            } if state.todos.contains(&id) => {
                smallvec![Effect::debounce(
                    SORT_COMPLETED_ID,
                    env.config.sort_debounce,
                    TodosAction::SortCompletedTodos,
                )]
            },
            TodosAction::Todo { .. } => SmallVec::new(),
        }
    }
}

fn extract_row(action: &TodosAction) -> Option<(TodoId, TodoRowAction)> {
    match action {
        TodosAction::Todo { id, action } => Some((*id, action.clone())),
        TodosAction::AddButtonTapped | TodosAction::SortCompletedTodos => None,
    }
}

const fn embed_row(id: TodoId, action: TodoRowAction) -> TodosAction {
    TodosAction::Todo { id, action }
}

fn get_row(state: &TodosState, id: &TodoId) -> Option<TodoRowState> {
    state.row(id)
}

fn set_row(state: &mut TodosState, _id: &TodoId, row: TodoRowState) {
    state.set_row(row);
}

const fn row_environment(env: &TodosEnvironment) -> &TodosEnvironment {
    env
}

type Rows = ForEach<TodoRowReducer, TodosState, TodosAction, TodosEnvironment, TodoId>;

/// The complete list reducer: rows first, then list logic
#[derive(Clone)]
pub struct TodosReducer {
    inner: Combined<Rows, TodosCore>,
}

impl TodosReducer {
    /// Creates a new `TodosReducer`
    #[must_use]
    pub fn new() -> Self {
        let rows: Rows = for_each(
            TodoRowReducer::new(),
            ForEachLens {
                extract: extract_row,
                embed: embed_row,
                get: get_row,
                set: set_row,
                environment: row_environment,
            },
        );
        Self {
            inner: combine(rows, TodosCore),
        }
    }
}

impl Default for TodosReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TodosReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosReducer").finish_non_exhaustive()
    }
}

impl Reducer for TodosReducer {
    type State = TodosState;
    type Action = TodosAction;
    type Environment = TodosEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}
