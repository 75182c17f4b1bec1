//! # Tally Core
//!
//! Core traits and types for building UI features as reducers.
//!
//! A feature is described by three things:
//!
//! - **State**: the data the feature owns
//! - **Action**: everything that can happen to it (user input, effect results)
//! - **Reducer**: a pure function `(State, Action, Environment) → (State, Effects)`
//!
//! Effects are *descriptions* of asynchronous work (delays, futures, cancellable
//! work). A runtime executes them and feeds the actions they produce back into
//! the reducer.
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell
//! - Unidirectional data flow
//! - Explicit effects (no hidden I/O)
//! - Dependency injection via the environment
//!
//! ## Example
//!
//! ```
//! use tally_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let effects = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! assert!(effects.is_empty());
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Two-way synchronisation between model state and view state
pub mod binding;

/// Reducer composition utilities
pub mod composition;

/// Ordered collections addressable by element id
pub mod identified;

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed by a runtime
        ///
        /// Most reductions produce zero or one effect, so effects are
        /// returned in a `SmallVec` that stays on the stack for up to four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. They are composable, mappable into a
/// parent action type, and cancellable by [`EffectId`](effect::EffectId).
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identifies a family of in-flight effects so they can be cancelled.
    ///
    /// Ids are compared by value, so a `const` declared next to the reducer
    /// that owns the effect is the usual way to name one.
    ///
    /// ```
    /// use tally_core::effect::EffectId;
    ///
    /// const AUTOSAVE: EffectId = EffectId::new("autosave");
    /// assert_eq!(AUTOSAVE.as_str(), "autosave");
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an effect id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// The name this id was created with
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by a runtime
    /// (`Store` in production, `TestStore` in tests).
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action
        ///
        /// A zero duration defers the action until the runtime has finished
        /// the current reduction.
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect`, first cancelling anything still in flight under `id`
        Cancellable {
            /// Cancellation key
            id: EffectId,
            /// The work to run under that key
            effect: Box<Effect<Action>>,
        },

        /// Cancel everything in flight under the given id
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Dispatch `action` as soon as the current reduction finishes
        #[must_use]
        pub fn send(action: Action) -> Effect<Action> {
            Effect::deferred(action, Duration::ZERO)
        }

        /// Dispatch `action` after `duration`
        ///
        /// The deferral cannot be cancelled and always fires exactly once.
        #[must_use]
        pub fn deferred(action: Action, duration: Duration) -> Effect<Action> {
            Effect::Delay {
                duration,
                action: Box::new(action),
            }
        }

        /// Dispatch `action` once `duration` passes without another debounce
        /// under the same `id`
        ///
        /// Each new debounce cancels the pending one, so a burst of triggers
        /// produces a single action, `duration` after the last trigger.
        #[must_use]
        pub fn debounce(id: EffectId, duration: Duration, action: Action) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(Effect::deferred(action, duration)),
            }
        }

        /// Cancel in-flight effects registered under `id`
        #[must_use]
        pub const fn cancel(id: EffectId) -> Effect<Action> {
            Effect::Cancel(id)
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Transform the actions this effect produces
        ///
        /// Used to lift a child feature's effects into its parent's action
        /// type. Delays, ordering and cancellation ids are preserved.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            let f: Arc<dyn Fn(Action) -> B + Send + Sync> = Arc::new(f);
            self.map_shared(&f)
        }

        fn map_shared<B>(self, f: &Arc<dyn Fn(Action) -> B + Send + Sync>) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Effect::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new((**f)(*action)),
                },
                Effect::Future(fut) => {
                    let f = Arc::clone(f);
                    Effect::Future(Box::pin(async move { fut.await.map(|a| (*f)(a)) }))
                },
                Effect::Cancellable { id, effect } => Effect::Cancellable {
                    id,
                    effect: Box::new(effect.map_shared(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_core::environment::{Clock, SystemClock};
    ///
    /// let before = chrono::Utc::now();
    /// assert!(SystemClock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of fresh identifiers for new entities
    pub trait UuidGenerator: Send + Sync {
        /// Produce an identifier not handed out before
        fn new_uuid(&self) -> Uuid;
    }

    /// Production generator producing random (v4) UUIDs
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RandomUuid;

    impl UuidGenerator for RandomUuid {
        fn new_uuid(&self) -> Uuid {
            Uuid::new_v4()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::effect::{Effect, EffectId};
    use std::time::Duration;

    const SORT: EffectId = EffectId::new("sort");

    #[derive(Clone, Debug, PartialEq)]
    enum Child {
        Ping,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Parent {
        Child(u32, Child),
    }

    #[test]
    fn test_debounce_wraps_delay_in_cancellable() {
        let effect = Effect::debounce(SORT, Duration::from_secs(1), Child::Ping);

        match effect {
            Effect::Cancellable { id, effect } => {
                assert_eq!(id, SORT);
                assert!(matches!(
                    *effect,
                    Effect::Delay { duration, .. } if duration == Duration::from_secs(1)
                ));
            },
            other => panic!("expected cancellable effect, got {other:?}"),
        }
    }

    #[test]
    fn test_map_preserves_delay_and_cancellation_id() {
        let effect = Effect::debounce(SORT, Duration::from_millis(250), Child::Ping)
            .map(|child| Parent::Child(7, child));

        let Effect::Cancellable { id, effect } = effect else {
            panic!("map dropped the cancellation wrapper");
        };
        assert_eq!(id, SORT);
        let Effect::Delay { duration, action } = *effect else {
            panic!("map dropped the delay");
        };
        assert_eq!(duration, Duration::from_millis(250));
        assert_eq!(*action, Parent::Child(7, Child::Ping));
    }

    #[test]
    fn test_map_future_output() {
        let effect: Effect<Child> = Effect::Future(Box::pin(async { Some(Child::Ping) }));
        let Effect::Future(fut) = effect.map(|child| Parent::Child(1, child)) else {
            panic!("expected future");
        };

        let output = futures::executor::block_on(fut);
        assert_eq!(output, Some(Parent::Child(1, Child::Ping)));
    }

    #[test]
    fn test_map_nested_parallel() {
        let effect = Effect::merge(vec![
            Effect::None,
            Effect::deferred(Child::Ping, Duration::ZERO),
            Effect::cancel(SORT),
        ])
        .map(|child| Parent::Child(2, child));

        let Effect::Parallel(effects) = effect else {
            panic!("expected parallel");
        };
        assert!(effects[0].is_none());
        assert!(matches!(&effects[1], Effect::Delay { action, .. } if **action == Parent::Child(2, Child::Ping)));
        assert!(matches!(effects[2], Effect::Cancel(id) if id == SORT));
    }

    #[test]
    fn test_effect_id_display() {
        assert_eq!(SORT.to_string(), "sort");
    }
}
