//! Domain types for the to-do list.
//!
//! The list owns every item and the single focused field. Rows never hold
//! state of their own: a [`TodoRowState`] is projected out of [`TodosState`]
//! by id and written back after the row reducer runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::environment::UuidGenerator;
use tally_core::identified::{Identifiable, IdentifiedVec};
use uuid::Uuid;

/// Unique identifier for a to-do item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The editable fields of a row that can hold keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusedField {
    /// The description text field
    Description,
    /// The due-date picker
    DueDate,
}

/// The focused field, and which item it belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoFocus {
    /// Item holding focus
    pub id: TodoId,
    /// Field within that item
    pub field: FocusedField,
}

/// A single to-do item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier, fixed at creation
    pub id: TodoId,
    /// Free-form description
    pub description: String,
    /// Whether the item is done
    pub is_complete: bool,
    /// Absent until the due-date field is first focused
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Creates an incomplete item with no due date
    #[must_use]
    pub fn new(id: TodoId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            is_complete: false,
            due_date: None,
        }
    }

    /// Marks the item complete (builder style)
    #[must_use]
    pub const fn completed(mut self) -> Self {
        self.is_complete = true;
        self
    }
}

impl Identifiable for TodoItem {
    type Id = TodoId;

    fn id(&self) -> TodoId {
        self.id
    }
}

/// Where focus sits within one row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFocus {
    /// Neither field is focused
    Unfocused,
    /// The description field is focused
    FocusedDescription,
    /// The due-date picker is focused
    FocusedDueDate,
}

/// One row's view of the list: its item plus its share of the focus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRowState {
    /// The item this row edits
    pub todo: TodoItem,
    /// The focused field, if this row holds focus
    pub focus: Option<FocusedField>,
}

impl TodoRowState {
    /// The due-date picker is shown once a date is set or while the row is focused
    #[must_use]
    pub const fn show_due_date(&self) -> bool {
        self.todo.due_date.is_some() || self.focus.is_some()
    }

    /// The date a picker should display
    #[must_use]
    pub fn due_date_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.todo.due_date.unwrap_or(now)
    }

    /// Current focus state of the row
    #[must_use]
    pub const fn focus_state(&self) -> RowFocus {
        match self.focus {
            None => RowFocus::Unfocused,
            Some(FocusedField::Description) => RowFocus::FocusedDescription,
            Some(FocusedField::DueDate) => RowFocus::FocusedDueDate,
        }
    }
}

/// State of the whole list
///
/// Invariant: when `focus` is set, its id names an item in `todos`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodosState {
    /// Items in display order
    pub todos: IdentifiedVec<TodoItem>,
    /// At most one focused field across the list
    pub focus: Option<TodoFocus>,
}

impl TodosState {
    /// Creates an unfocused list from `todos`
    #[must_use]
    pub const fn new(todos: IdentifiedVec<TodoItem>) -> Self {
        Self { todos, focus: None }
    }

    /// The sample list shown on first launch
    #[must_use]
    pub fn seeded(uuid: &dyn UuidGenerator) -> Self {
        let next = || TodoId::from_uuid(uuid.new_uuid());
        let todos = [
            TodoItem::new(next(), "Milk"),
            TodoItem::new(next(), "Eggs"),
            TodoItem::new(next(), "Dust filter for Hoover Max Extract Pressure Pro model 60"),
            TodoItem::new(next(), "Hand soap").completed(),
        ];
        Self::new(todos.into_iter().collect())
    }

    /// Project the row for `id`
    #[must_use]
    pub fn row(&self, id: &TodoId) -> Option<TodoRowState> {
        let todo = self.todos.get(id)?.clone();
        let focus = self.focus.filter(|f| f.id == *id).map(|f| f.field);
        Some(TodoRowState { todo, focus })
    }

    /// Project every row, in display order
    #[must_use]
    pub fn rows(&self) -> Vec<TodoRowState> {
        self.todos
            .iter()
            .map(|todo| TodoRowState {
                todo: todo.clone(),
                focus: self.focus.filter(|f| f.id == todo.id).map(|f| f.field),
            })
            .collect()
    }

    /// Number of completed items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.is_complete).count()
    }

    /// Give `id` focus on `field`, or release the focus `id` holds
    ///
    /// Releasing does nothing unless `id` currently holds focus, and an
    /// absent id never gains it.
    pub fn set_focus(&mut self, id: TodoId, field: Option<FocusedField>) {
        match field {
            Some(field) if self.todos.contains(&id) => self.focus = Some(TodoFocus { id, field }),
            Some(_) => {},
            None => {
                if self.focus.is_some_and(|f| f.id == id) {
                    self.focus = None;
                }
            },
        }
    }

    /// Write one row back into the list
    ///
    /// A no-op if the row's item is no longer present.
    pub fn set_row(&mut self, row: TodoRowState) {
        let id = row.todo.id;
        if self.todos.update(&id, |todo| *todo = row.todo).is_some() {
            self.set_focus(id, row.focus);
        }
    }

    /// Write several rows back at once
    ///
    /// When more than one row claims focus, the claimant that sits lowest
    /// in the list (highest index) wins.
    pub fn set_rows(&mut self, rows: Vec<TodoRowState>) {
        let mut claim: Option<(usize, TodoFocus)> = None;
        let mut released = false;

        for row in rows {
            let id = row.todo.id;
            let Some(index) = self.todos.position(&id) else {
                continue;
            };
            let _ = self.todos.update(&id, |todo| *todo = row.todo);

            match row.focus {
                Some(field) if claim.is_none_or(|(at, _)| index > at) => {
                    claim = Some((index, TodoFocus { id, field }));
                },
                Some(_) => {},
                None => released |= self.focus.is_some_and(|f| f.id == id),
            }
        }

        if let Some((_, focus)) = claim {
            self.focus = Some(focus);
        } else if released {
            self.focus = None;
        }
    }

    /// Remove an item, clearing focus if it held it
    pub fn remove(&mut self, id: &TodoId) -> Option<TodoItem> {
        let removed = self.todos.remove(id)?;
        if self.focus.is_some_and(|f| f.id == *id) {
            self.focus = None;
        }
        Some(removed)
    }
}

/// Actions a single row handles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoRowAction {
    /// The completion checkbox was tapped
    CheckboxTapped,
    /// The description text changed
    TextFieldDidChange(String),
    /// A due date was picked
    DueDateDidChange(DateTime<Utc>),
    /// The row gained focus on a field, or lost it
    FocusChanged(Option<FocusedField>),
}

/// Actions for the whole list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodosAction {
    /// Insert a blank item at the top and focus it
    AddButtonTapped,
    /// Move completed items below incomplete ones
    SortCompletedTodos,
    /// An action for the row with `id`
    Todo {
        /// Target row
        id: TodoId,
        /// What happened in that row
        action: TodoRowAction,
    },
}

impl TodosAction {
    /// Focus `field` of `id`, or release `id`'s focus with `None`
    #[must_use]
    pub const fn set_focus(id: TodoId, field: Option<FocusedField>) -> Self {
        Self::Todo {
            id,
            action: TodoRowAction::FocusChanged(field),
        }
    }

    /// Flip the completion flag of `id`
    #[must_use]
    pub const fn toggle_complete(id: TodoId) -> Self {
        Self::Todo {
            id,
            action: TodoRowAction::CheckboxTapped,
        }
    }

    /// Replace the description of `id`
    #[must_use]
    pub fn text_field_changed(id: TodoId, text: impl Into<String>) -> Self {
        Self::Todo {
            id,
            action: TodoRowAction::TextFieldDidChange(text.into()),
        }
    }

    /// Replace the due date of `id`
    #[must_use]
    pub const fn due_date_changed(id: TodoId, date: DateTime<Utc>) -> Self {
        Self::Todo {
            id,
            action: TodoRowAction::DueDateDidChange(date),
        }
    }
}
