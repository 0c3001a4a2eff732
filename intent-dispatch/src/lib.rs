//! intent-dispatch: Intent-driven state containers for screen logic
//!
//! Model-View-Intent for Rust. Each screen owns one container: intents are
//! queued and executed one at a time, state is published to subscribers as
//! immutable snapshots, and one-shot effects (toasts, loading indicators)
//! are delivered to whoever is listening when they happen.
//!
//! # Example
//! ```ignore
//! use intent_dispatch::prelude::*;
//!
//! #[derive(Intent, Clone, Debug)]
//! enum CounterIntent {
//!     Increment,
//! }
//!
//! fn reducer(intent: CounterIntent, scope: IntentScope<Counter, Effect>) -> IntentFuture {
//!     Box::pin(async move {
//!         match intent {
//!             CounterIntent::Increment => {
//!                 scope.reduce(|s| Counter { value: s.value + 1 });
//!             }
//!         }
//!         Ok(())
//!     })
//! }
//!
//! let store = Store::new(Counter::default(), reducer);
//! let mut states = store.subscribe_state();
//! store.dispatch(CounterIntent::Increment).await?;
//! ```

// Re-export everything from core
pub use intent_dispatch_core::*;

// Re-export derive macros
pub use intent_dispatch_macros::Intent;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use intent_dispatch_core::Intent;

    // Container
    pub use intent_dispatch_core::{
        BoxError, Container, EffectSubscription, IntentError, IntentFuture, IntentHandle,
        IntentOutcome, IntentResult, IntentScope, Observer, StateSubscription, Subscription,
    };

    // Store
    pub use intent_dispatch_core::{
        ComposedMiddleware, IntentReducer, LoggingMiddleware, Middleware, NoopMiddleware, Store,
        StoreWithMiddleware,
    };

    // Intent log
    pub use intent_dispatch_core::{
        IntentLog, IntentLogConfig, IntentLoggerConfig, IntentLoggerMiddleware, SharedIntentLog,
    };

    // Derive macros
    pub use intent_dispatch_macros::Intent;
}
