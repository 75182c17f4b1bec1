//! Reducer composition utilities
//!
//! This module provides the two ways features are glued together:
//! - **`combine`**: Run two reducers on the same state/action, in order
//! - **`for_each`**: Run an element reducer on one element of a keyed
//!   collection, routed by id
//!
//! # Examples
//!
//! ## Routing to collection elements
//!
//! ```
//! use tally_core::{effect::Effect, reducer::Reducer, SmallVec};
//! use tally_core::composition::{for_each, ForEachLens};
//!
//! #[derive(Clone, Default)]
//! struct Row {
//!     hits: u32,
//! }
//!
//! #[derive(Clone)]
//! enum RowAction {
//!     Hit,
//! }
//!
//! struct RowReducer;
//!
//! impl Reducer for RowReducer {
//!     type State = Row;
//!     type Action = RowAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Row, _action: RowAction, _env: &()) -> SmallVec<[Effect<RowAction>; 4]> {
//!         state.hits += 1;
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Clone)]
//! enum ListAction {
//!     Row(usize, RowAction),
//! }
//!
//! let rows = for_each(
//!     RowReducer,
//!     ForEachLens {
//!         extract: |action: &ListAction| match action {
//!             ListAction::Row(id, action) => Some((*id, action.clone())),
//!         },
//!         embed: ListAction::Row,
//!         get: |state: &Vec<Row>, id: &usize| state.get(*id).cloned(),
//!         set: |state: &mut Vec<Row>, id: &usize, row: Row| state[*id] = row,
//!         environment: |env| env,
//!     },
//! );
//!
//! let mut state = vec![Row::default(), Row::default()];
//! let _ = rows.reduce(&mut state, ListAction::Row(1, RowAction::Hit), &());
//! assert_eq!(state[1].hits, 1);
//!
//! // Unknown ids are ignored
//! let effects = rows.reduce(&mut state, ListAction::Row(9, RowAction::Hit), &());
//! assert!(effects.is_empty());
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::fmt::Debug;

/// Combines two reducers that operate on the same state and action types.
///
/// `first` runs before `second`, and both see the same action. Effects are
/// concatenated in that order.
#[must_use]
pub const fn combine<R1, R2>(first: R1, second: R2) -> Combined<R1, R2>
where
    R1: Reducer,
    R2: Reducer<State = R1::State, Action = R1::Action, Environment = R1::Environment>,
    R1::Action: Clone,
{
    Combined { first, second }
}

/// Two reducers run in sequence.
///
/// Created by [`combine`].
#[derive(Debug, Clone, Copy)]
pub struct Combined<R1, R2> {
    first: R1,
    second: R2,
}

impl<R1, R2> Reducer for Combined<R1, R2>
where
    R1: Reducer,
    R2: Reducer<State = R1::State, Action = R1::Action, Environment = R1::Environment>,
    R1::Action: Clone,
{
    type State = R1::State;
    type Action = R1::Action;
    type Environment = R1::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut effects = self.first.reduce(state, action.clone(), env);
        effects.extend(self.second.reduce(state, action, env));
        effects
    }
}

/// How a parent feature reaches one element of a keyed collection.
///
/// All members are plain function pointers so lenses are `Copy` and
/// reducers built from them stay `Clone + Send + Sync`.
///
/// # Type Parameters
///
/// - `S` / `A` / `E`: parent state, action and environment
/// - `Id`: element key
/// - `ES` / `EA` / `EE`: element state, action and environment
pub struct ForEachLens<S, A, E, Id, ES, EA, EE> {
    /// Pull `(id, element action)` out of a parent action, if it targets an element
    pub extract: fn(&A) -> Option<(Id, EA)>,
    /// Lift an element action back into the parent action type
    pub embed: fn(Id, EA) -> A,
    /// Read the element state for `id` (a projection of the parent state)
    pub get: fn(&S, &Id) -> Option<ES>,
    /// Write an updated element state back into the parent
    pub set: fn(&mut S, &Id, ES),
    /// Derive the element environment from the parent one
    pub environment: fn(&E) -> &EE,
}

impl<S, A, E, Id, ES, EA, EE> Clone for ForEachLens<S, A, E, Id, ES, EA, EE> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A, E, Id, ES, EA, EE> Copy for ForEachLens<S, A, E, Id, ES, EA, EE> {}

/// Runs `reducer` on the collection element addressed by each matching
/// parent action.
///
/// The router looks the element up by id, applies the element reducer,
/// writes the result back, and maps the element's effects into parent
/// actions. Actions addressed to an id that is no longer present are
/// ignored: no state change, no effects.
#[must_use]
pub const fn for_each<R, S, A, E, Id>(
    reducer: R,
    lens: ForEachLens<S, A, E, Id, R::State, R::Action, R::Environment>,
) -> ForEach<R, S, A, E, Id>
where
    R: Reducer,
{
    ForEach { reducer, lens }
}

/// A reducer routed to keyed collection elements.
///
/// Created by [`for_each`].
pub struct ForEach<R, S, A, E, Id>
where
    R: Reducer,
{
    reducer: R,
    lens: ForEachLens<S, A, E, Id, R::State, R::Action, R::Environment>,
}

impl<R, S, A, E, Id> Clone for ForEach<R, S, A, E, Id>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            lens: self.lens,
        }
    }
}

impl<R, S, A, E, Id> Reducer for ForEach<R, S, A, E, Id>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
    Id: Clone + Debug + Send + Sync + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some((id, element_action)) = (self.lens.extract)(&action) else {
            return SmallVec::new();
        };

        let Some(mut element) = (self.lens.get)(state, &id) else {
            tracing::debug!(id = ?id, "Ignoring action for missing element");
            return SmallVec::new();
        };

        let effects = self
            .reducer
            .reduce(&mut element, element_action, (self.lens.environment)(env));
        (self.lens.set)(state, &id, element);

        let embed = self.lens.embed;
        effects
            .into_iter()
            .map(|effect| {
                let id = id.clone();
                effect.map(move |action| embed(id.clone(), action))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::smallvec;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        value: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Add(i32),
        AddLater(i32),
    }

    #[derive(Clone)]
    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = Counter;
        type Action = CounterAction;
        type Environment = i32;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            step: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Add(n) => {
                    state.value += n * step;
                    SmallVec::new()
                },
                CounterAction::AddLater(n) => smallvec![Effect::deferred(
                    CounterAction::Add(n),
                    Duration::from_millis(5)
                )],
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Board {
        counters: BTreeMap<u8, Counter>,
        log: Vec<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum BoardAction {
        Counter(u8, CounterAction),
        Note(String),
    }

    struct BoardEnv {
        step: i32,
    }

    #[derive(Clone)]
    struct LogReducer;

    impl Reducer for LogReducer {
        type State = Board;
        type Action = BoardAction;
        type Environment = BoardEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                BoardAction::Note(note) => state.log.push(note),
                BoardAction::Counter(id, _) => {
                    let value = state.counters.get(&id).map_or(0, |c| c.value);
                    state.log.push(format!("{id}={value}"));
                },
            }
            SmallVec::new()
        }
    }

    fn counters() -> ForEach<CounterReducer, Board, BoardAction, BoardEnv, u8> {
        for_each(
            CounterReducer,
            ForEachLens {
                extract: |action| match action {
                    BoardAction::Counter(id, action) => Some((*id, action.clone())),
                    BoardAction::Note(_) => None,
                },
                embed: BoardAction::Counter,
                get: |state, id| state.counters.get(id).cloned(),
                set: |state, id, counter| {
                    state.counters.insert(*id, counter);
                },
                environment: |env| &env.step,
            },
        )
    }

    fn board() -> Board {
        let mut board = Board::default();
        board.counters.insert(1, Counter { value: 10 });
        board.counters.insert(2, Counter { value: 20 });
        board
    }

    #[test]
    fn test_for_each_routes_by_id() {
        let reducer = counters();
        let mut state = board();

        let effects = reducer.reduce(
            &mut state,
            BoardAction::Counter(2, CounterAction::Add(3)),
            &BoardEnv { step: 2 },
        );

        assert!(effects.is_empty());
        assert_eq!(state.counters[&1].value, 10);
        assert_eq!(state.counters[&2].value, 26);
    }

    #[test]
    fn test_for_each_missing_id_is_noop() {
        let reducer = counters();
        let mut state = board();

        let effects = reducer.reduce(
            &mut state,
            BoardAction::Counter(9, CounterAction::AddLater(1)),
            &BoardEnv { step: 1 },
        );

        assert!(effects.is_empty());
        assert_eq!(state, board());
    }

    #[test]
    fn test_for_each_lifts_element_effects() {
        let reducer = counters();
        let mut state = board();

        let effects = reducer.reduce(
            &mut state,
            BoardAction::Counter(1, CounterAction::AddLater(4)),
            &BoardEnv { step: 1 },
        );

        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::Delay { action, .. } => {
                assert_eq!(**action, BoardAction::Counter(1, CounterAction::Add(4)));
            },
            other => panic!("expected delay, got {other:?}"),
        }
    }

    #[test]
    fn test_for_each_ignores_other_actions() {
        let reducer = counters();
        let mut state = board();

        let effects = reducer.reduce(&mut state, BoardAction::Note("hi".into()), &BoardEnv { step: 1 });

        assert!(effects.is_empty());
        assert_eq!(state, board());
    }

    #[test]
    fn test_combine_runs_in_order() {
        let reducer = combine(counters(), LogReducer);
        let mut state = board();

        let _ = reducer.reduce(
            &mut state,
            BoardAction::Counter(1, CounterAction::Add(5)),
            &BoardEnv { step: 1 },
        );
        let _ = reducer.reduce(&mut state, BoardAction::Note("done".into()), &BoardEnv { step: 1 });

        // The log reducer observes the counter after the element reducer ran
        assert_eq!(state.log, vec!["1=15".to_string(), "done".to_string()]);
    }
}
