//! Test utilities for intent-dispatch applications
//!
//! This module provides helpers for testing containers and stores:
//!
//! - [`TestHarness`]: subscribes to a container's streams up front and drains them
//! - [`collect_effects`]: wait for a number of effects with a timeout
//! - Assertion macros for verifying emitted effects
//!
//! # Example
//!
//! ```ignore
//! use intent_dispatch::testing::TestHarness;
//!
//! let store = Store::new(State::default(), reducer);
//! let mut harness = TestHarness::attach(store.container());
//!
//! store.dispatch(MyIntent::Save).await?;
//!
//! let effects = harness.drain_effects();
//! assert_emitted!(effects, Effect::Toast { .. });
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::container::Container;
use crate::subscription::{EffectSubscription, StateSubscription};

/// Harness that observes a container from the moment it is attached.
///
/// Holds one state subscription and one effect subscription so tests can
/// assert on the exact sequence of commits and effects.
pub struct TestHarness<S, E> {
    container: Container<S, E>,
    states: StateSubscription<S>,
    effects: EffectSubscription<E>,
}

impl<S, E> TestHarness<S, E>
where
    S: Send + Sync + 'static,
    E: Clone + Send + 'static,
{
    /// Create a fresh container with the given initial state and attach to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(state: S) -> Self {
        Self::attach(&Container::new(state))
    }

    /// Attach to an existing container.
    ///
    /// The state stream starts with the container's current state.
    pub fn attach(container: &Container<S, E>) -> Self {
        Self {
            container: container.clone(),
            states: container.subscribe_state(),
            effects: container.subscribe_effects(),
        }
    }

    /// The observed container.
    pub fn container(&self) -> &Container<S, E> {
        &self.container
    }

    /// Drain all states received so far.
    pub fn drain_states(&mut self) -> Vec<Arc<S>> {
        self.states.drain()
    }

    /// Drain all effects received so far.
    pub fn drain_effects(&mut self) -> Vec<E> {
        self.effects.drain()
    }

    /// Check if any effects were received (drains them).
    pub fn has_effects(&mut self) -> bool {
        !self.drain_effects().is_empty()
    }

    /// Wait for `count` effects, giving up after `timeout`.
    pub async fn wait_effects(&mut self, count: usize, timeout: Duration) -> Vec<E> {
        collect_effects(&mut self.effects, count, timeout).await
    }
}

/// Receive up to `count` effects, stopping early on timeout or stream end.
pub async fn collect_effects<E>(
    effects: &mut EffectSubscription<E>,
    count: usize,
    timeout: Duration,
) -> Vec<E> {
    let mut collected = Vec::with_capacity(count);
    let _ = tokio::time::timeout(timeout, async {
        while collected.len() < count {
            match effects.recv().await {
                Some(effect) => collected.push(effect),
                None => break,
            }
        }
    })
    .await;
    collected
}

/// Pause tokio time so simulated latency can be stepped manually.
///
/// Requires the `testing-time` feature and a current-thread runtime.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume tokio time after [`pause_time`].
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance paused tokio time by `duration`.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: Duration) {
    tokio::time::advance(duration).await;
}

/// Assert that a specific effect was emitted.
///
/// # Example
///
/// ```ignore
/// let effects = harness.drain_effects();
/// assert_emitted!(effects, Effect::Toast { .. });
/// assert_emitted!(effects, Effect::Loading { show: true, .. });
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($effects:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $effects.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected effect matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $effects
        );
    };
}

/// Assert that a specific effect was NOT emitted.
///
/// # Example
///
/// ```ignore
/// let effects = harness.drain_effects();
/// assert_not_emitted!(effects, Effect::Loading { .. });
/// ```
#[macro_export]
macro_rules! assert_not_emitted {
    ($effects:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$effects.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected effect matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $effects
        );
    };
}

/// Find and return the first effect matching a pattern.
#[macro_export]
macro_rules! find_emitted {
    ($effects:expr, $pattern:pat $(if $guard:expr)?) => {
        $effects.iter().find(|e| matches!(e, $pattern $(if $guard)?))
    };
}

/// Count how many effects match a pattern.
///
/// # Example
///
/// ```ignore
/// assert_eq!(count_emitted!(effects, Effect::Toast { .. }), 1);
/// ```
#[macro_export]
macro_rules! count_emitted {
    ($effects:expr, $pattern:pat $(if $guard:expr)?) => {
        $effects.iter().filter(|e| matches!(e, $pattern $(if $guard)?)).count()
    };
}
