//! A focused to-do list built on reducers and effects.
//!
//! The list is one [`TodosState`] driven by [`TodosReducer`]:
//!
//! - each row is edited through [`TodoRowReducer`], routed by item id
//! - completing an item sorts completed items down once the checkbox has
//!   been left alone for [`TodosConfig::sort_debounce`]
//! - a new item is inserted at the top and focused right after
//! - focusing a row's due date gives it a date of "now" if it had none
//! - [`FocusSync`] mirrors list focus to and from the platform
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_core::environment::{RandomUuid, SystemClock};
//! use tally_runtime::Store;
//! use tally_todos::{TodosAction, TodosConfig, TodosEnvironment, TodosReducer, TodosState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodosEnvironment::new(Arc::new(SystemClock), Arc::new(RandomUuid), TodosConfig::from_env()?);
//! let store = Store::new(TodosState::seeded(&RandomUuid), TodosReducer::new(), env);
//!
//! let mut added = store.send(TodosAction::AddButtonTapped).await?;
//! added.wait().await;
//!
//! let focus = store.state(|s| s.focus).await;
//! println!("Focused: {focus:?}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod focus;
pub mod reducer;
pub mod row;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, TodosConfig};
pub use focus::FocusSync;
pub use reducer::{TodosCore, TodosEnvironment, TodosReducer, SORT_COMPLETED_ID};
pub use row::TodoRowReducer;
pub use types::{
    FocusedField, RowFocus, TodoFocus, TodoId, TodoItem, TodoRowAction, TodoRowState,
    TodosAction, TodosState,
};
