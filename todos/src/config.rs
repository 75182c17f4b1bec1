//! Timing configuration for the to-do list.
//!
//! Both delays can be overridden through the environment, in milliseconds:
//!
//! - `TODOS_SORT_DEBOUNCE_MS`: quiet period after the last checkbox tap
//!   before completed items are sorted down (default 1000)
//! - `TODOS_FOCUS_DEFERRAL_MS`: delay between adding an item and focusing
//!   it (default 0, meaning "after the current update")

use std::time::Duration;
use thiserror::Error;

/// Variable holding the sort debounce, in milliseconds
pub const SORT_DEBOUNCE_VAR: &str = "TODOS_SORT_DEBOUNCE_MS";

/// Variable holding the focus deferral, in milliseconds
pub const FOCUS_DEFERRAL_VAR: &str = "TODOS_FOCUS_DEFERRAL_MS";

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but is not a whole number of milliseconds
    #[error("{key} must be a whole number of milliseconds, got {value:?}")]
    InvalidMillis {
        /// Variable name
        key: &'static str,
        /// Raw value found
        value: String,
    },

    /// The sort debounce was zero
    #[error("sort debounce must be greater than zero")]
    ZeroSortDebounce,
}

/// Delays used by the list reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodosConfig {
    /// Quiet period after the last completion toggle before sorting
    pub sort_debounce: Duration,
    /// Delay before a newly added item receives focus
    pub focus_deferral: Duration,
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            sort_debounce: Duration::from_secs(1),
            focus_deferral: Duration::ZERO,
        }
    }
}

impl TodosConfig {
    /// Set the sort debounce
    #[must_use]
    pub const fn with_sort_debounce(mut self, debounce: Duration) -> Self {
        self.sort_debounce = debounce;
        self
    }

    /// Set the focus deferral
    #[must_use]
    pub const fn with_focus_deferral(mut self, deferral: Duration) -> Self {
        self.focus_deferral = deferral;
        self
    }

    /// Load from process environment variables, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or the result
    /// fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or the result
    /// fails [`validate`](Self::validate).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &'static str, default: Duration| match lookup(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidMillis { key, value }),
        };

        let config = Self {
            sort_debounce: read(SORT_DEBOUNCE_VAR, defaults.sort_debounce)?,
            focus_deferral: read(FOCUS_DEFERRAL_VAR, defaults.focus_deferral)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSortDebounce`] if the sort debounce is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sort_debounce.is_zero() {
            return Err(ConfigError::ZeroSortDebounce);
        }
        Ok(())
    }
}
