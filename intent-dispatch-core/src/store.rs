//! Intent store with reducer pattern and middleware
//!
//! A [`Store`] pairs a [`Container`] with an intent reducer: a function or closure
//! that turns an intent value into the async body executed by the container.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::container::{Container, IntentFuture, IntentHandle, IntentHooks, IntentScope};
use crate::error::IntentResult;
use crate::intent::Intent;
use crate::subscription::{EffectSubscription, StateSubscription};

/// A reducer that maps an intent to the work it performs
///
/// The returned future reads state, posts effects, and reduces state through the scope.
/// Plain functions and closures capturing screen configuration both qualify.
pub type IntentReducer<S, I, E> = Arc<dyn Fn(I, IntentScope<S, E>) -> IntentFuture + Send + Sync>;

/// Centralized state store with Redux-like reducer pattern
///
/// # Type Parameters
/// * `S` - The screen state type
/// * `I` - The intent type (must implement `Intent`)
/// * `E` - The one-shot effect type
///
/// # Example
/// ```ignore
/// #[derive(Intent, Clone, Debug)]
/// enum CounterIntent {
///     Increment,
/// }
///
/// fn reducer(intent: CounterIntent, scope: IntentScope<Counter, Effect>) -> IntentFuture {
///     Box::pin(async move {
///         match intent {
///             CounterIntent::Increment => {
///                 scope.reduce(|s| Counter { value: s.value + 1 });
///             }
///         }
///         Ok(())
///     })
/// }
///
/// let store = Store::new(Counter::default(), reducer);
/// store.dispatch(CounterIntent::Increment).await?;
/// assert_eq!(store.state().value, 1);
/// ```
pub struct Store<S, I: Intent, E> {
    container: Container<S, E>,
    reducer: IntentReducer<S, I, E>,
    _marker: PhantomData<I>,
}

impl<S, I, E> Store<S, I, E>
where
    S: Send + Sync + 'static,
    I: Intent,
    E: Clone + Send + 'static,
{
    /// Create a new store with initial state and reducer
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<R>(state: S, reducer: R) -> Self
    where
        R: Fn(I, IntentScope<S, E>) -> IntentFuture + Send + Sync + 'static,
    {
        Self::from_container(Container::new(state), reducer)
    }

    /// Create a store around an existing container
    pub fn from_container<R>(container: Container<S, E>, reducer: R) -> Self
    where
        R: Fn(I, IntentScope<S, E>) -> IntentFuture + Send + Sync + 'static,
    {
        Self {
            container,
            reducer: Arc::new(reducer),
            _marker: PhantomData,
        }
    }

    /// Dispatch an intent to the store
    ///
    /// The intent is queued behind any intent still executing.
    pub fn dispatch(&self, intent: I) -> IntentHandle {
        let reducer = self.reducer.clone();
        self.container
            .run_intent(intent.name(), move |scope| reducer(intent, scope))
    }

    /// Get the current state
    pub fn state(&self) -> Arc<S> {
        self.container.state()
    }

    /// Subscribe to committed states, starting with the current one
    pub fn subscribe_state(&self) -> StateSubscription<S> {
        self.container.subscribe_state()
    }

    /// Subscribe to effects posted from now on
    pub fn subscribe_effects(&self) -> EffectSubscription<E> {
        self.container.subscribe_effects()
    }

    /// Get the underlying container
    pub fn container(&self) -> &Container<S, E> {
        &self.container
    }
}

/// Store with middleware support
///
/// Middleware sees each intent when it starts executing and again with its
/// result when it finishes. Intents cancelled while still queued reach neither hook.
pub struct StoreWithMiddleware<S, I: Intent, E, M: Middleware<I>> {
    store: Store<S, I, E>,
    middleware: Arc<Mutex<M>>,
}

impl<S, I, E, M> StoreWithMiddleware<S, I, E, M>
where
    S: Send + Sync + 'static,
    I: Intent,
    E: Clone + Send + 'static,
    M: Middleware<I>,
{
    /// Create a new store with middleware
    pub fn new<R>(state: S, reducer: R, middleware: M) -> Self
    where
        R: Fn(I, IntentScope<S, E>) -> IntentFuture + Send + Sync + 'static,
    {
        Self {
            store: Store::new(state, reducer),
            middleware: Arc::new(Mutex::new(middleware)),
        }
    }

    /// Dispatch an intent through middleware and store
    pub fn dispatch(&self, intent: I) -> IntentHandle {
        let reducer = self.store.reducer.clone();
        let name = intent.name();

        let before = self.middleware.clone();
        let before_intent = intent.clone();
        let after = self.middleware.clone();
        let after_intent = intent.clone();
        let hooks = IntentHooks {
            start: Box::new(move || before.lock().before(&before_intent)),
            finish: Box::new(move |result: &IntentResult| {
                after.lock().after(&after_intent, result)
            }),
        };

        self.store.container.enqueue(
            name,
            Box::new(move |scope: IntentScope<S, E>| reducer(intent, scope)),
            Some(hooks),
        )
    }

    /// Get the current state
    pub fn state(&self) -> Arc<S> {
        self.store.state()
    }

    /// Subscribe to committed states, starting with the current one
    pub fn subscribe_state(&self) -> StateSubscription<S> {
        self.store.subscribe_state()
    }

    /// Subscribe to effects posted from now on
    pub fn subscribe_effects(&self) -> EffectSubscription<E> {
        self.store.subscribe_effects()
    }

    /// Get the underlying container
    pub fn container(&self) -> &Container<S, E> {
        self.store.container()
    }

    /// Lock the middleware for inspection
    pub fn middleware(&self) -> MutexGuard<'_, M> {
        self.middleware.lock()
    }
}

/// Middleware trait for intercepting intents
///
/// Implement this trait to add logging, auditing, or other
/// cross-cutting concerns to your store.
pub trait Middleware<I: Intent>: Send + 'static {
    /// Called when the intent starts executing
    fn before(&mut self, intent: &I);

    /// Called after the intent finished, failed, or was cancelled
    fn after(&mut self, intent: &I, result: &IntentResult);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<I: Intent> Middleware<I> for NoopMiddleware {
    fn before(&mut self, _intent: &I) {}
    fn after(&mut self, _intent: &I, _result: &IntentResult) {}
}

/// Middleware that logs intents (for debugging)
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log when an intent starts
    pub log_before: bool,
    /// Whether to log when an intent finishes
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Create a logging middleware that logs both before and after
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl<I: Intent> Middleware<I> for LoggingMiddleware {
    fn before(&mut self, intent: &I) {
        if self.log_before {
            tracing::debug!(intent = %intent.name(), "Executing intent");
        }
    }

    fn after(&mut self, intent: &I, result: &IntentResult) {
        if self.log_after {
            match result {
                Ok(outcome) => tracing::debug!(
                    intent = %intent.name(),
                    outcome = ?outcome,
                    "Intent processed"
                ),
                Err(err) => tracing::debug!(
                    intent = %intent.name(),
                    error = %err,
                    "Intent failed"
                ),
            }
        }
    }
}

/// Compose multiple middleware into a single middleware
pub struct ComposedMiddleware<I: Intent> {
    middlewares: Vec<Box<dyn Middleware<I>>>,
}

impl<I: Intent> std::fmt::Debug for ComposedMiddleware<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl<I: Intent> Default for ComposedMiddleware<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Intent> ComposedMiddleware<I> {
    /// Create a new composed middleware
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware<I>>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }
}

impl<I: Intent> Middleware<I> for ComposedMiddleware<I> {
    fn before(&mut self, intent: &I) {
        for middleware in &mut self.middlewares {
            middleware.before(intent);
        }
    }

    fn after(&mut self, intent: &I, result: &IntentResult) {
        // Call in reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(intent, result);
        }
    }
}
