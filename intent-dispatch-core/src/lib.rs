//! Core traits and types for intent-dispatch
//!
//! This crate provides the foundational abstractions for screen-level state
//! management in the Model-View-Intent style: one authoritative state per
//! screen, a queue of intents that transform it, and one-shot effects for
//! the view layer.
//!
//! # Core Concepts
//!
//! - **Intent**: A named user request that drives a unit of work
//! - **Container**: Owns the state, serializes intents, fans out state and effects
//! - **Store**: Binds a fixed reducer function to a container
//! - **Middleware**: Hooks that run around every dispatched intent
//!
//! # Basic Example
//!
//! ```ignore
//! use intent_dispatch_core::prelude::*;
//!
//! #[derive(Intent, Clone, Debug)]
//! enum CounterIntent {
//!     Increment,
//! }
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterEffect {
//!     Bumped(i32),
//! }
//!
//! fn reducer(intent: CounterIntent, scope: IntentScope<Counter, CounterEffect>) -> IntentFuture {
//!     Box::pin(async move {
//!         match intent {
//!             CounterIntent::Increment => {
//!                 let next = scope.reduce(|s| Counter { value: s.value + 1 });
//!                 scope.post_effect(CounterEffect::Bumped(next.value));
//!             }
//!         }
//!         Ok(())
//!     })
//! }
//!
//! let store = Store::new(Counter::default(), reducer);
//! store.dispatch(CounterIntent::Increment).await?;
//! ```
//!
//! # Suspending Intents
//!
//! Intent bodies are async and may suspend on timers or I/O. The container
//! keeps serving [`Container::state`] and accepting new intents meanwhile,
//! but starts the next queued intent only after the running one finished.
//! Always re-read state through the scope after a suspension point instead
//! of holding on to a snapshot taken before it.

pub mod container;
pub mod error;
pub mod intent;
pub mod log;
pub mod store;
pub mod subscription;
pub mod testing;

// Core trait exports
pub use intent::Intent;

// Container exports
pub use container::{Container, IntentFuture, IntentHandle, IntentScope};
pub use error::{BoxError, IntentError, IntentOutcome, IntentResult};
pub use subscription::{EffectSubscription, Observer, StateSubscription, Subscription};

// Store exports
pub use store::{
    ComposedMiddleware, IntentReducer, LoggingMiddleware, Middleware, NoopMiddleware, Store,
    StoreWithMiddleware,
};

// Intent log exports
pub use log::{
    IntentLog, IntentLogConfig, IntentLogEntry, IntentLoggerConfig, IntentLoggerMiddleware,
    LoggedOutcome, SharedIntentLog,
};

// Testing exports
pub use testing::{collect_effects, TestHarness};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::container::{Container, IntentFuture, IntentHandle, IntentScope};
    pub use crate::error::{BoxError, IntentError, IntentOutcome, IntentResult};
    pub use crate::intent::Intent;
    pub use crate::log::{IntentLog, IntentLoggerConfig, IntentLoggerMiddleware, SharedIntentLog};
    pub use crate::store::{
        ComposedMiddleware, IntentReducer, LoggingMiddleware, Middleware, NoopMiddleware, Store,
        StoreWithMiddleware,
    };
    pub use crate::subscription::{EffectSubscription, Observer, StateSubscription, Subscription};
}
