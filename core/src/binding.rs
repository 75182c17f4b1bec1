//! Two-way synchronisation between model state and view state.
//!
//! Some state lives on both sides of the UI boundary: the model owns the
//! truth (e.g. which field *should* have keyboard focus) while the platform
//! owns its own copy (which field *does* have focus). A [`Binding`] is the
//! explicit synchronisation step run after either side changes. It copies the
//! changed side into the other, and only when the values actually differ, so
//! a write never echoes back and causes an update cycle.
//!
//! ```
//! use tally_core::binding::Binding;
//!
//! let mut focus = Binding::new(Some("title"), None);
//!
//! // First appearance pushes the model value into the view
//! assert_eq!(focus.appear(), Some(Some("title")));
//!
//! // The view reports the value we just wrote: nothing to send back
//! assert_eq!(focus.view_changed(Some("title")), None);
//!
//! // The user moves focus: the model needs to hear about it
//! assert_eq!(focus.view_changed(Some("notes")), Some(Some("notes")));
//! ```

/// Last-known model and view values for one piece of mirrored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<V> {
    model: V,
    view: V,
    appeared: bool,
}

impl<V: PartialEq + Clone> Binding<V> {
    /// Start tracking a model value and the view's current value
    #[must_use]
    pub const fn new(model: V, view: V) -> Self {
        Self {
            model,
            view,
            appeared: false,
        }
    }

    /// The last value the model reported
    #[must_use]
    pub const fn model(&self) -> &V {
        &self.model
    }

    /// The last value the view reported or was given
    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Initial synchronisation, performed once
    ///
    /// Returns the value the view must adopt, if the two sides disagree.
    /// Later calls do nothing.
    pub fn appear(&mut self) -> Option<V> {
        if self.appeared {
            return None;
        }
        self.appeared = true;
        if self.view == self.model {
            return None;
        }
        self.view = self.model.clone();
        Some(self.view.clone())
    }

    /// The model changed; returns the value to write into the view, if any
    pub fn model_changed(&mut self, value: V) -> Option<V> {
        self.model = value;
        if self.view == self.model {
            return None;
        }
        self.view = self.model.clone();
        Some(self.view.clone())
    }

    /// The view changed; returns the value to send to the model, if any
    pub fn view_changed(&mut self, value: V) -> Option<V> {
        self.view = value;
        if self.model == self.view {
            return None;
        }
        self.model = self.view.clone();
        Some(self.model.clone())
    }
}
