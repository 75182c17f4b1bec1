//! Keeping list focus and platform focus in step.
//!
//! The list state says which field *should* be focused; the platform
//! reports which field *is*. [`FocusSync`] sits between the two: platform
//! reports become [`TodosAction`]s, and state updates become the focus the
//! platform must apply. Values already known to the other side are never
//! sent back, so neither side can trigger an update loop.

use crate::types::{TodoFocus, TodosAction};
use tally_core::binding::Binding;

/// Two-way focus synchronisation for the whole list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSync {
    binding: Binding<Option<TodoFocus>>,
}

impl FocusSync {
    /// Start from the list's focus, with nothing focused on the platform
    #[must_use]
    pub const fn new(model: Option<TodoFocus>) -> Self {
        Self {
            binding: Binding::new(model, None),
        }
    }

    /// Focus last applied to, or reported by, the platform
    #[must_use]
    pub const fn platform_focus(&self) -> Option<TodoFocus> {
        *self.binding.view()
    }

    /// First appearance: the focus the platform must apply, if any
    pub fn appear(&mut self) -> Option<Option<TodoFocus>> {
        self.binding.appear()
    }

    /// The platform moved focus; returns the actions to send
    ///
    /// Moving between rows releases the old row before focusing the new
    /// one, so the list never sees two claimants at once.
    pub fn platform_focus_changed(&mut self, focus: Option<TodoFocus>) -> Vec<TodosAction> {
        let previous = *self.binding.model();
        let Some(next) = self.binding.view_changed(focus) else {
            return Vec::new();
        };

        match (previous, next) {
            (Some(old), Some(new)) if old.id != new.id => vec![
                TodosAction::set_focus(old.id, None),
                TodosAction::set_focus(new.id, Some(new.field)),
            ],
            (_, Some(new)) => vec![TodosAction::set_focus(new.id, Some(new.field))],
            (Some(old), None) => vec![TodosAction::set_focus(old.id, None)],
            (None, None) => Vec::new(),
        }
    }

    /// The list's focus changed; returns the focus the platform must apply
    pub fn model_changed(&mut self, focus: Option<TodoFocus>) -> Option<Option<TodoFocus>> {
        let apply = self.binding.model_changed(focus);
        if let Some(focus) = &apply {
            tracing::trace!(?focus, "Applying focus to platform");
        }
        apply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FocusedField, TodoId};
    use uuid::Uuid;

    fn focus(n: u128, field: FocusedField) -> TodoFocus {
        TodoFocus {
            id: TodoId::from_uuid(Uuid::from_u128(n)),
            field,
        }
    }

    #[test]
    fn test_appear_pushes_model_focus() {
        let target = focus(0, FocusedField::Description);
        let mut sync = FocusSync::new(Some(target));

        assert_eq!(sync.appear(), Some(Some(target)));
        assert_eq!(sync.platform_focus(), Some(target));
        // The platform confirms: nothing goes back to the list
        assert!(sync.platform_focus_changed(Some(target)).is_empty());
    }

    #[test]
    fn test_platform_gain_and_loss() {
        let target = focus(1, FocusedField::DueDate);
        let mut sync = FocusSync::new(None);
        let _ = sync.appear();

        assert_eq!(
            sync.platform_focus_changed(Some(target)),
            vec![TodosAction::set_focus(target.id, Some(FocusedField::DueDate))]
        );
        assert_eq!(
            sync.platform_focus_changed(None),
            vec![TodosAction::set_focus(target.id, None)]
        );
    }

    #[test]
    fn test_platform_move_between_rows_releases_first() {
        let from = focus(0, FocusedField::Description);
        let to = focus(1, FocusedField::Description);
        let mut sync = FocusSync::new(Some(from));
        let _ = sync.appear();

        assert_eq!(
            sync.platform_focus_changed(Some(to)),
            vec![
                TodosAction::set_focus(from.id, None),
                TodosAction::set_focus(to.id, Some(FocusedField::Description)),
            ]
        );
    }

    #[test]
    fn test_platform_move_within_row() {
        let from = focus(0, FocusedField::Description);
        let to = focus(0, FocusedField::DueDate);
        let mut sync = FocusSync::new(Some(from));
        let _ = sync.appear();

        assert_eq!(
            sync.platform_focus_changed(Some(to)),
            vec![TodosAction::set_focus(to.id, Some(FocusedField::DueDate))]
        );
    }

    #[test]
    fn test_model_update_is_not_echoed() {
        let target = focus(2, FocusedField::Description);
        let mut sync = FocusSync::new(None);
        let _ = sync.appear();

        assert_eq!(sync.model_changed(Some(target)), Some(Some(target)));
        assert!(sync.platform_focus_changed(Some(target)).is_empty());
        assert_eq!(sync.model_changed(Some(target)), None);
    }
}
