//! # Tally Testing
//!
//! Testing utilities for reducer-driven features.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//! - [`ReducerTest`], a given/when/then harness for single reductions
//! - [`TestStore`], an exhaustive store driven by a virtual clock
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tally_testing::{test_clock, IncrementingUuid, TestStore};
//!
//! #[test]
//! fn completing_sorts_after_a_second() {
//!     let mut store = TestStore::new(state, TodosReducer::new(), test_environment());
//!
//!     store.send(TodosAction::toggle_complete(id), |s| { /* ... */ });
//!     store.advance(Duration::from_secs(1));
//!     store.receive(TodosAction::SortCompletedTodos, |s| { /* ... */ });
//!     store.finish();
//! }
//! ```

use chrono::{DateTime, Utc};
use tally_core::environment::{Clock, UuidGenerator};
use uuid::Uuid;

pub mod test_store;

/// Deterministic implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc, Uuid, UuidGenerator};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_testing::mocks::FixedClock;
    /// use tally_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Hands out `Uuid::from_u128(0)`, `Uuid::from_u128(1)`, ... in order
    ///
    /// ```
    /// use tally_testing::mocks::IncrementingUuid;
    /// use tally_core::environment::UuidGenerator;
    /// use uuid::Uuid;
    ///
    /// let uuids = IncrementingUuid::new();
    /// assert_eq!(uuids.new_uuid(), Uuid::from_u128(0));
    /// assert_eq!(uuids.new_uuid(), Uuid::from_u128(1));
    /// ```
    #[derive(Debug, Default)]
    pub struct IncrementingUuid {
        next: AtomicU64,
    }

    impl IncrementingUuid {
        /// Start counting from zero
        #[must_use]
        pub const fn new() -> Self {
            Self::starting_at(0)
        }

        /// Start counting from `first`
        #[must_use]
        pub const fn starting_at(first: u64) -> Self {
            Self {
                next: AtomicU64::new(first),
            }
        }
    }

    impl UuidGenerator for IncrementingUuid {
        fn new_uuid(&self) -> Uuid {
            Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
        }
    }
}

/// Test helpers
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output through the test harness
    ///
    /// Honours `RUST_LOG`; defaults to `debug`. Safe to call from every
    /// test: only the first call installs a subscriber.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{test_clock, FixedClock, IncrementingUuid};
pub use reducer_test::{assertions, ReducerTest};
pub use test_store::{TestScheduler, TestStore};
