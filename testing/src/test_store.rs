//! Deterministic store for exhaustive reducer tests
//!
//! [`TestStore`] runs a reducer the way the runtime `Store` does, but
//! synchronously and on a virtual clock. Every state change must be
//! described by the test and every action an effect produces must be
//! explicitly received, so a test fails as soon as the feature does
//! something the test did not expect.
//!
//! ```ignore
//! let mut store = TestStore::new(state, reducer, env);
//!
//! store.send(Action::Start, |state| state.running = true);
//! store.advance(Duration::from_secs(1));
//! store.receive(Action::Tick, |state| state.ticks = 1);
//! store.finish();
//! ```

#![allow(clippy::module_name_repetitions)] // TestStore/TestScheduler are the natural names

use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;
use tally_core::effect::{Effect, EffectId};
use tally_core::reducer::Reducer;

/// An action waiting on the virtual clock
#[derive(Debug)]
struct Scheduled<A> {
    due: Duration,
    seq: u64,
    id: Option<EffectId>,
    action: A,
}

/// Virtual-time executor for effects
///
/// Delays are queued against a clock that only moves when
/// [`advance`](Self::advance) is called. Futures are driven to completion
/// as soon as they are scheduled. Actions due at the same instant are
/// delivered in the order they were scheduled.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tally_core::effect::{Effect, EffectId};
/// use tally_testing::TestScheduler;
///
/// const SEARCH: EffectId = EffectId::new("search");
///
/// let mut scheduler = TestScheduler::new();
/// scheduler.schedule(Effect::debounce(SEARCH, Duration::from_millis(300), "a"));
/// scheduler.advance(Duration::from_millis(200));
/// scheduler.schedule(Effect::debounce(SEARCH, Duration::from_millis(300), "ab"));
///
/// assert!(scheduler.advance(Duration::from_millis(200)).is_empty());
/// assert_eq!(scheduler.advance(Duration::from_millis(100)), vec!["ab"]);
/// ```
#[derive(Debug)]
pub struct TestScheduler<A> {
    now: Duration,
    next_seq: u64,
    immediate: bool,
    pending: Vec<Scheduled<A>>,
}

impl<A> TestScheduler<A> {
    /// A scheduler whose clock starts at zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            immediate: false,
            pending: Vec::new(),
        }
    }

    /// A scheduler that treats every delay as zero
    ///
    /// Useful when a test cares about which actions arrive, not when.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            immediate: true,
            pending: Vec::new(),
        }
    }

    /// Virtual time elapsed since creation
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of actions still waiting to fire
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of actions waiting under `id`
    #[must_use]
    pub fn pending_for(&self, id: EffectId) -> usize {
        self.pending.iter().filter(|s| s.id == Some(id)).count()
    }

    /// Schedule an effect starting now
    pub fn schedule(&mut self, effect: Effect<A>) {
        let _ = self.schedule_at(effect, self.now, None);
    }

    /// Queue `action` to fire `after` from now, optionally under a cancellation id
    pub fn schedule_action(&mut self, action: A, after: Duration, id: Option<EffectId>) {
        let due = if self.immediate { self.now } else { self.now + after };
        self.push(due, id, action);
    }

    /// Drop everything waiting under `id`; returns how many were dropped
    pub fn cancel(&mut self, id: EffectId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != Some(id));
        before - self.pending.len()
    }

    /// Move the clock forward by `by`, returning every action that fell due
    ///
    /// Actions are returned in firing order. `advance(Duration::ZERO)`
    /// collects the actions that are already due.
    pub fn advance(&mut self, by: Duration) -> Vec<A> {
        let target = self.now + by;
        let mut fired = Vec::new();
        while let Some(action) = self.pop_due(target) {
            fired.push(action);
        }
        self.now = target;
        fired
    }

    /// Remove the earliest action due at or before `until`, moving the
    /// clock to its due time
    fn pop_due(&mut self, until: Duration) -> Option<A> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(index, _)| index)?;

        let next = self.pending.swap_remove(index);
        self.now = self.now.max(next.due);
        Some(next.action)
    }

    /// Advance until nothing is pending, returning everything that fired
    pub fn run(&mut self) -> Vec<A> {
        let last = self.pending.iter().map(|s| s.due).max();
        match last {
            Some(due) => self.advance(due.saturating_sub(self.now)),
            None => Vec::new(),
        }
    }

    fn push(&mut self, due: Duration, id: Option<EffectId>, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled { due, seq, id, action });
    }

    /// Schedule `effect` to start at `start`; returns when it completes
    fn schedule_at(&mut self, effect: Effect<A>, start: Duration, id: Option<EffectId>) -> Duration {
        match effect {
            Effect::None => start,
            Effect::Delay { duration, action } => {
                let due = if self.immediate { start } else { start + duration };
                self.push(due, id, *action);
                due
            },
            Effect::Future(fut) => {
                if let Some(action) = futures::executor::block_on(fut) {
                    self.push(start, id, action);
                }
                start
            },
            Effect::Parallel(effects) => effects
                .into_iter()
                .map(|effect| self.schedule_at(effect, start, id))
                .max()
                .unwrap_or(start),
            Effect::Sequential(effects) => effects
                .into_iter()
                .fold(start, |at, effect| self.schedule_at(effect, at, id)),
            Effect::Cancellable { id: key, effect } => {
                let _ = self.cancel(key);
                self.schedule_at(*effect, start, Some(key))
            },
            Effect::Cancel(key) => {
                let _ = self.cancel(key);
                start
            },
        }
    }
}

impl<A> Default for TestScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exhaustive, deterministic store for reducer tests
///
/// - [`send`](Self::send) reduces an action and checks the resulting state
///   against the test's expectation.
/// - Effects are handed to a [`TestScheduler`]; the actions they produce
///   are reduced as they fall due and must be claimed, in order, with
///   [`receive`](Self::receive).
/// - [`finish`](Self::finish) fails if anything is left unclaimed or still
///   scheduled.
///
/// All checks panic with a description of the mismatch.
pub struct TestStore<R>
where
    R: Reducer,
{
    reducer: R,
    environment: R::Environment,
    /// State as of the last asserted step
    state: R::State,
    /// State including effect actions reduced but not yet received
    live: R::State,
    scheduler: TestScheduler<R::Action>,
    received: VecDeque<(R::Action, R::State)>,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: Clone + PartialEq + Debug,
{
    /// Create a store over `state` with a virtual clock at zero
    #[must_use]
    pub fn new(state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self::with_scheduler(state, reducer, environment, TestScheduler::new())
    }

    /// Create a store whose effects fire without waiting for time to pass
    #[must_use]
    pub fn immediate(state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self::with_scheduler(state, reducer, environment, TestScheduler::immediate())
    }

    fn with_scheduler(
        state: R::State,
        reducer: R,
        environment: R::Environment,
        scheduler: TestScheduler<R::Action>,
    ) -> Self {
        Self {
            reducer,
            environment,
            live: state.clone(),
            state,
            scheduler,
            received: VecDeque::new(),
        }
    }

    /// The current state
    #[must_use]
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// The virtual scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &TestScheduler<R::Action> {
        &self.scheduler
    }

    /// Actions produced by effects that have not been received yet
    #[must_use]
    pub fn unreceived(&self) -> Vec<R::Action> {
        self.received.iter().map(|(action, _)| action.clone()).collect()
    }

    /// Send a user action and assert the resulting state
    ///
    /// `update` receives a copy of the state from before the action and
    /// must mutate it into the expected state.
    ///
    /// # Panics
    ///
    /// Panics if effect actions are still waiting to be received, or if the
    /// reduced state differs from the expectation.
    #[allow(clippy::panic)] // Test assertion
    pub fn send<F>(&mut self, action: R::Action, update: F)
    where
        F: FnOnce(&mut R::State),
    {
        assert!(
            self.received.is_empty(),
            "Must receive all effect actions before sending {action:?}. Unreceived: {:?}",
            self.unreceived()
        );

        let mut expected = self.state.clone();
        update(&mut expected);

        let effects = self
            .reducer
            .reduce(&mut self.live, action.clone(), &self.environment);
        Self::check(&self.live, &expected, "send", &action);
        self.state = self.live.clone();

        for effect in effects {
            self.scheduler.schedule(effect);
        }
        self.advance(Duration::ZERO);
    }

    /// Claim the next effect-produced action and assert the resulting state
    ///
    /// # Panics
    ///
    /// Panics if no action is waiting, the waiting action differs from
    /// `expected`, or the reduced state differs from the expectation.
    #[allow(clippy::panic)] // Test assertion
    pub fn receive<F>(&mut self, expected: R::Action, update: F)
    where
        F: FnOnce(&mut R::State),
    {
        let Some((action, reduced)) = self.received.pop_front() else {
            panic!(
                "Expected to receive {expected:?}, but no action was received \
                 ({} still scheduled at {:?})",
                self.scheduler.pending(),
                self.scheduler.now()
            );
        };
        assert_eq!(action, expected, "Received an unexpected action");

        let mut expected_state = self.state.clone();
        update(&mut expected_state);
        Self::check(&reduced, &expected_state, "receive", &action);
        self.state = reduced;
    }

    /// Move virtual time forward, reducing every action that falls due
    ///
    /// Due actions are reduced one by one at their own due time, so effects
    /// they return start from that instant and a cancel they issue applies
    /// to the rest of the window. Each result is queued for
    /// [`receive`](Self::receive).
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now() + by;
        while let Some(action) = self.scheduler.pop_due(target) {
            let effects = self
                .reducer
                .reduce(&mut self.live, action.clone(), &self.environment);
            for effect in effects {
                self.scheduler.schedule(effect);
            }
            self.received.push_back((action, self.live.clone()));
        }
        self.scheduler.now = target;
    }

    /// Discard every action waiting to be received, accepting the state
    /// they produced
    pub fn skip_received_actions(&mut self) {
        self.received.clear();
        self.state = self.live.clone();
    }

    /// Assert the test accounted for every effect
    ///
    /// # Panics
    ///
    /// Panics if actions are waiting to be received or effects are still
    /// scheduled.
    #[allow(clippy::panic)] // Test assertion
    pub fn finish(self) {
        assert!(
            self.received.is_empty(),
            "Test finished with unreceived actions: {:?}",
            self.unreceived()
        );
        assert_eq!(
            self.scheduler.pending(),
            0,
            "Test finished with {} effect(s) still scheduled",
            self.scheduler.pending()
        );
    }

    #[allow(clippy::panic)] // Test assertion
    fn check(actual: &R::State, expected: &R::State, verb: &str, action: &R::Action) {
        assert_eq!(
            actual, expected,
            "State after {verb} {action:?} did not match expectation (left: actual, right: expected)"
        );
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tally_core::{smallvec, SmallVec};

    const TICK_ID: EffectId = EffectId::new("tick");

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Timer {
        ticks: u32,
        armed: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TimerAction {
        Arm,
        Disarm,
        Tick,
        Burst,
    }

    #[derive(Clone)]
    struct TimerReducer;

    impl Reducer for TimerReducer {
        type State = Timer;
        type Action = TimerAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Timer,
            action: TimerAction,
            _env: &(),
        ) -> SmallVec<[Effect<TimerAction>; 4]> {
            match action {
                TimerAction::Arm => {
                    state.armed = true;
                    smallvec![Effect::debounce(TICK_ID, Duration::from_secs(1), TimerAction::Tick)]
                },
                TimerAction::Disarm => {
                    state.armed = false;
                    smallvec![Effect::cancel(TICK_ID)]
                },
                TimerAction::Tick => {
                    state.ticks += 1;
                    state.armed = false;
                    SmallVec::new()
                },
                TimerAction::Burst => smallvec![Effect::chain(vec![
                    Effect::send(TimerAction::Tick),
                    Effect::deferred(TimerAction::Tick, Duration::from_secs(2)),
                ])],
            }
        }
    }

    #[test]
    fn test_debounce_fires_after_window() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());

        store.send(TimerAction::Arm, |s| s.armed = true);
        store.advance(Duration::from_millis(999));
        assert!(store.unreceived().is_empty());

        store.advance(Duration::from_millis(1));
        store.receive(TimerAction::Tick, |s| {
            s.ticks = 1;
            s.armed = false;
        });
        store.finish();
    }

    #[test]
    fn test_rearm_restarts_window() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());

        store.send(TimerAction::Arm, |s| s.armed = true);
        store.advance(Duration::from_millis(500));
        store.send(TimerAction::Arm, |_| {});
        assert_eq!(store.scheduler().pending_for(TICK_ID), 1);

        store.advance(Duration::from_millis(600));
        assert!(store.unreceived().is_empty());

        store.advance(Duration::from_millis(400));
        store.receive(TimerAction::Tick, |s| {
            s.ticks = 1;
            s.armed = false;
        });
        store.finish();
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());

        store.send(TimerAction::Arm, |s| s.armed = true);
        store.send(TimerAction::Disarm, |s| s.armed = false);
        store.advance(Duration::from_secs(5));
        store.finish();
    }

    #[test]
    fn test_sequential_offsets_accumulate() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());

        store.send(TimerAction::Burst, |_| {});
        store.receive(TimerAction::Tick, |s| s.ticks = 1);

        store.advance(Duration::from_secs(2));
        store.receive(TimerAction::Tick, |s| s.ticks = 2);
        store.finish();
    }

    #[test]
    fn test_immediate_scheduler_ignores_delays() {
        let mut store = TestStore::immediate(Timer::default(), TimerReducer, ());

        store.send(TimerAction::Arm, |s| s.armed = true);
        store.receive(TimerAction::Tick, |s| {
            s.ticks = 1;
            s.armed = false;
        });
        store.finish();
    }

    #[test]
    fn test_scheduler_run_drains_everything() {
        let mut scheduler = TestScheduler::new();
        scheduler.schedule(Effect::merge(vec![
            Effect::deferred(2, Duration::from_secs(2)),
            Effect::deferred(1, Duration::from_secs(1)),
            Effect::Future(Box::pin(async { Some(0) })),
        ]));

        assert_eq!(scheduler.run(), vec![0, 1, 2]);
        assert_eq!(scheduler.now(), Duration::from_secs(2));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "did not match expectation")]
    fn test_state_mismatch_fails() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());
        store.send(TimerAction::Arm, |_| {});
    }

    #[test]
    #[should_panic(expected = "Must receive all effect actions")]
    fn test_send_with_unreceived_action_fails() {
        let mut store = TestStore::immediate(Timer::default(), TimerReducer, ());
        store.send(TimerAction::Arm, |s| s.armed = true);
        store.send(TimerAction::Disarm, |s| s.armed = false);
    }

    #[test]
    #[should_panic(expected = "Received an unexpected action")]
    fn test_wrong_action_fails() {
        let mut store = TestStore::immediate(Timer::default(), TimerReducer, ());
        store.send(TimerAction::Arm, |s| s.armed = true);
        store.receive(TimerAction::Arm, |_| {});
    }

    #[test]
    #[should_panic(expected = "still scheduled")]
    fn test_finish_with_pending_effect_fails() {
        let mut store = TestStore::new(Timer::default(), TimerReducer, ());
        store.send(TimerAction::Arm, |s| s.armed = true);
        store.finish();
    }

    const PING_ID: EffectId = EffectId::new("ping");

    #[derive(Clone, Debug, PartialEq)]
    enum RelayAction {
        Start,
        First,
        Second,
        Pinged,
    }

    #[derive(Clone)]
    struct RelayReducer;

    impl Reducer for RelayReducer {
        type State = Vec<&'static str>;
        type Action = RelayAction;
        type Environment = ();

        fn reduce(
            &self,
            log: &mut Vec<&'static str>,
            action: RelayAction,
            _env: &(),
        ) -> SmallVec<[Effect<RelayAction>; 4]> {
            match action {
                RelayAction::Start => smallvec![
                    Effect::deferred(RelayAction::First, Duration::from_secs(1)),
                    Effect::debounce(PING_ID, Duration::from_secs(2), RelayAction::Pinged),
                ],
                RelayAction::First => {
                    log.push("first");
                    smallvec![
                        Effect::cancel(PING_ID),
                        Effect::deferred(RelayAction::Second, Duration::from_secs(1)),
                    ]
                },
                RelayAction::Second => {
                    log.push("second");
                    SmallVec::new()
                },
                RelayAction::Pinged => {
                    log.push("pinged");
                    SmallVec::new()
                },
            }
        }
    }

    #[test]
    fn test_actions_in_one_advance_run_at_their_due_time() {
        let mut store = TestStore::new(Vec::new(), RelayReducer, ());

        store.send(RelayAction::Start, |_| {});
        store.advance(Duration::from_secs(3));

        // First cancelled the ping before it fell due and chained Second at 2s
        assert_eq!(store.unreceived(), vec![RelayAction::First, RelayAction::Second]);
        assert_eq!(store.scheduler().pending(), 0);
        assert_eq!(store.scheduler().now(), Duration::from_secs(3));

        store.receive(RelayAction::First, |log| log.push("first"));
        store.receive(RelayAction::Second, |log| log.push("second"));
        store.finish();
    }

    #[test]
    fn test_chained_delay_starts_from_due_time() {
        let mut store = TestStore::new(Vec::new(), RelayReducer, ());

        store.send(RelayAction::Start, |_| {});
        store.advance(Duration::from_millis(1500));
        store.receive(RelayAction::First, |log| log.push("first"));
        assert_eq!(store.scheduler().pending_for(PING_ID), 0);

        store.advance(Duration::from_millis(500));
        store.receive(RelayAction::Second, |log| log.push("second"));
        store.finish();
    }

    #[test]
    fn test_skip_received_actions_accepts_their_state() {
        let mut store = TestStore::new(Vec::new(), RelayReducer, ());

        store.send(RelayAction::Start, |_| {});
        store.advance(Duration::from_secs(3));
        store.skip_received_actions();

        assert_eq!(store.state(), &vec!["first", "second"]);
        store.finish();
    }
}
