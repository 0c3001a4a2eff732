//! State container with serialized intent execution
//!
//! A [`Container`] owns the authoritative state of one screen, a queue of
//! pending intents, and the observer lists for the state and effect streams.
//!
//! # Execution model
//!
//! Each container spawns a single worker task. Intents submitted through
//! [`Container::run_intent`] are queued and executed strictly one at a time,
//! in submission order. An intent body may suspend (timers, I/O) without
//! blocking reads of the current state or further submissions; the next
//! queued intent starts only after the running one finished, so a body that
//! re-reads state after suspending always sees the latest commit.
//!
//! # Example
//!
//! ```ignore
//! let container = Container::new(Counter { value: 0 });
//! let mut effects = container.subscribe_effects();
//!
//! let handle = container.run_intent("Increment", |scope| {
//!     Box::pin(async move {
//!         scope.post_effect(Effect::Busy(true));
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         scope.reduce(|s| Counter { value: s.value + 1 });
//!         scope.post_effect(Effect::Busy(false));
//!         Ok(())
//!     })
//! });
//!
//! assert_eq!(handle.await?, IntentOutcome::Completed);
//! assert_eq!(container.state().value, 1);
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BoxError, IntentError, IntentOutcome, IntentResult};
use crate::subscription::{EffectSubscription, Observer, Observers, StateSubscription, Subscription};

/// Future returned by an intent body.
pub type IntentFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

type IntentBody<S, E> = Box<dyn FnOnce(IntentScope<S, E>) -> IntentFuture + Send>;
type ErrorHandler = Arc<dyn Fn(&IntentError) + Send + Sync>;

/// Callbacks run by the worker around an intent's execution.
pub(crate) struct IntentHooks {
    pub(crate) start: Box<dyn FnOnce() + Send>,
    pub(crate) finish: Box<dyn FnOnce(&IntentResult) + Send>,
}

struct QueuedIntent<S, E> {
    name: &'static str,
    body: IntentBody<S, E>,
    hooks: Option<IntentHooks>,
    done: oneshot::Sender<IntentResult>,
}

struct Shared<S, E> {
    state_tx: watch::Sender<Arc<S>>,
    state_observers: Mutex<Observers<Arc<S>>>,
    effect_observers: Mutex<Observers<E>>,
    error_handler: Mutex<Option<ErrorHandler>>,
    cancel: CancellationToken,
}

impl<S, E: Clone> Shared<S, E> {
    fn current(&self) -> Arc<S> {
        self.state_tx.borrow().clone()
    }

    fn commit(&self, intent: &'static str, active: &CancellationToken, next: S) -> Arc<S> {
        let next = Arc::new(next);
        let mut observers = self.state_observers.lock();
        if active.is_cancelled() {
            self.discarded(intent, "commit");
            return self.current();
        }
        self.state_tx.send_replace(next.clone());
        let delivered = observers.publish(&next);
        debug!(intent, observers = delivered, "state committed");
        next
    }

    fn emit(&self, intent: &'static str, active: &CancellationToken, effect: E) {
        let mut observers = self.effect_observers.lock();
        if active.is_cancelled() {
            self.discarded(intent, "effect");
            return;
        }
        let delivered = observers.publish(&effect);
        if delivered == 0 {
            debug!(intent, "effect dropped, no subscribers");
        }
    }

    fn discarded(&self, intent: &'static str, what: &'static str) {
        if self.cancel.is_cancelled() {
            debug!(intent, what, "container closed, discarded");
        } else {
            debug!(intent, what, "intent already finished, discarded");
        }
    }

    fn report(&self, intent: &'static str, result: &IntentResult) {
        match result {
            Ok(outcome) => debug!(intent, ?outcome, "intent finished"),
            Err(err) => {
                warn!(intent, error = %err, "intent failed");
                let handler = self.error_handler.lock().clone();
                if let Some(handler) = handler {
                    guarded(intent, "error handler", || handler(err));
                }
            }
        }
    }

    /// Mark an intent's scope as finished.
    ///
    /// Taken under both observer locks so no commit or effect from that
    /// scope can land after this returns.
    fn retire(&self, active: &CancellationToken) {
        let _states = self.state_observers.lock();
        let _effects = self.effect_observers.lock();
        active.cancel();
    }
}

/// Run a user callback on the worker, containing any panic.
fn guarded<F: FnOnce()>(intent: &'static str, hook: &'static str, f: F) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(intent, hook, "hook panicked");
    }
}

/// Handle given to an intent body for reading state, reducing it, and posting effects.
///
/// A scope is only live while its intent executes. Once the intent finished
/// or the owning container is closed, reductions and effects posted through
/// the scope (or any clone of it) are silently discarded.
pub struct IntentScope<S, E> {
    shared: Arc<Shared<S, E>>,
    intent: &'static str,
    active: CancellationToken,
}

impl<S, E> Clone for IntentScope<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            intent: self.intent,
            active: self.active.clone(),
        }
    }
}

impl<S, E: Clone> IntentScope<S, E> {
    /// Name of the intent this scope belongs to.
    pub fn intent(&self) -> &'static str {
        self.intent
    }

    /// The state as of now. Re-read after every suspension point.
    pub fn state(&self) -> Arc<S> {
        self.shared.current()
    }

    /// Compute a new state from the current one and publish it.
    ///
    /// The previous value is left untouched; observers receive the new one.
    /// Returns the committed state, or the current one if the scope is no longer live.
    pub fn reduce<F>(&self, f: F) -> Arc<S>
    where
        F: FnOnce(&S) -> S,
    {
        let current = self.shared.current();
        let next = f(&current);
        self.shared.commit(self.intent, &self.active, next)
    }

    /// Like [`reduce`](Self::reduce), but commits nothing if `f` fails.
    pub fn try_reduce<F, Er>(&self, f: F) -> Result<Arc<S>, Er>
    where
        F: FnOnce(&S) -> Result<S, Er>,
    {
        let current = self.shared.current();
        let next = f(&current)?;
        Ok(self.shared.commit(self.intent, &self.active, next))
    }

    /// Post a one-shot effect to current effect subscribers.
    pub fn post_effect(&self, effect: E) {
        self.shared.emit(self.intent, &self.active, effect);
    }

    /// Whether the owning container has been closed or this intent already finished.
    pub fn is_cancelled(&self) -> bool {
        self.active.is_cancelled()
    }
}

/// Pending result of a submitted intent.
///
/// Awaiting the handle yields the intent's result. Dropping it does not
/// cancel the intent; failures are still logged and passed to the error
/// handler registered with [`Container::on_error`].
#[derive(Debug)]
pub struct IntentHandle {
    intent: &'static str,
    rx: oneshot::Receiver<IntentResult>,
}

impl IntentHandle {
    fn resolved(intent: &'static str, result: IntentResult) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { intent, rx }
    }

    /// Name of the submitted intent.
    pub fn intent(&self) -> &'static str {
        self.intent
    }
}

impl Future for IntentHandle {
    type Output = IntentResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the worker went away with the runtime
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Ok(IntentOutcome::Cancelled)))
    }
}

/// Authoritative state holder for one screen.
///
/// Cloning is cheap and yields another handle to the same container.
///
/// # Type Parameters
/// * `S` - The state type. Each commit publishes a fresh `Arc<S>`
/// * `E` - The one-shot effect type
pub struct Container<S, E> {
    shared: Arc<Shared<S, E>>,
    queue_tx: mpsc::UnboundedSender<QueuedIntent<S, E>>,
}

impl<S, E> Clone for Container<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            queue_tx: self.queue_tx.clone(),
        }
    }
}

impl<S, E> Container<S, E>
where
    S: Send + Sync + 'static,
    E: Clone + Send + 'static,
{
    /// Create a container holding `initial` and start its worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(initial: S) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(initial));
        let shared = Arc::new(Shared {
            state_tx,
            state_observers: Mutex::new(Observers::new()),
            effect_observers: Mutex::new(Observers::new()),
            error_handler: Mutex::new(None),
            cancel: CancellationToken::new(),
        });

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(shared.clone(), queue_rx));

        Self { shared, queue_tx }
    }

    /// The latest committed state. Never blocks.
    pub fn state(&self) -> Arc<S> {
        self.shared.current()
    }

    /// Subscribe to committed states.
    ///
    /// The current state is delivered first, then every later commit in order.
    /// On a closed container the subscription yields the final state and ends.
    pub fn subscribe_state(&self) -> StateSubscription<S> {
        let mut observers = self.shared.state_observers.lock();
        let current = self.shared.current();
        if self.shared.cancel.is_cancelled() {
            let mut detached = Observers::new();
            return Subscription::new(detached.subscribe_with(current));
        }
        Subscription::new(observers.subscribe_with(current))
    }

    /// A coalescing view of the state for consumers that only need the latest value.
    pub fn watch_state(&self) -> watch::Receiver<Arc<S>> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribe to effects posted from now on. Past effects are never replayed.
    pub fn subscribe_effects(&self) -> EffectSubscription<E> {
        let mut observers = self.shared.effect_observers.lock();
        if self.shared.cancel.is_cancelled() {
            let mut detached = Observers::new();
            return Subscription::new(detached.subscribe());
        }
        Subscription::new(observers.subscribe())
    }

    /// Register a handler called for every failed intent.
    ///
    /// Replaces any previously registered handler.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&IntentError) + Send + Sync + 'static,
    {
        *self.shared.error_handler.lock() = Some(Arc::new(handler));
    }

    /// Queue a unit of work.
    ///
    /// The body runs after every previously queued intent has finished. It
    /// may read state, post effects, and reduce state through its scope.
    pub fn run_intent<F>(&self, name: &'static str, body: F) -> IntentHandle
    where
        F: FnOnce(IntentScope<S, E>) -> IntentFuture + Send + 'static,
    {
        self.enqueue(name, Box::new(body), None)
    }

    pub(crate) fn enqueue(
        &self,
        name: &'static str,
        body: IntentBody<S, E>,
        hooks: Option<IntentHooks>,
    ) -> IntentHandle {
        if self.shared.cancel.is_cancelled() {
            return IntentHandle::resolved(name, Err(IntentError::Closed { intent: name }));
        }

        let (done, rx) = oneshot::channel();
        let queued = QueuedIntent {
            name,
            body,
            hooks,
            done,
        };
        if self.queue_tx.send(queued).is_err() {
            return IntentHandle::resolved(name, Err(IntentError::Closed { intent: name }));
        }
        debug!(intent = name, "intent queued");
        IntentHandle { intent: name, rx }
    }

    /// Forward both streams to callbacks until the observer is dropped or the container closes.
    pub fn observe<FS, FE>(&self, mut on_state: FS, mut on_effect: FE) -> Observer
    where
        FS: FnMut(Arc<S>) + Send + 'static,
        FE: FnMut(E) + Send + 'static,
    {
        let mut states = self.subscribe_state();
        let mut effects = self.subscribe_effects();
        let token = self.shared.cancel.child_token();
        let stop = token.clone();

        let handle = tokio::spawn(async move {
            let mut states_open = true;
            let mut effects_open = true;
            while states_open || effects_open {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    state = states.recv(), if states_open => match state {
                        Some(state) => on_state(state),
                        None => states_open = false,
                    },
                    effect = effects.recv(), if effects_open => match effect {
                        Some(effect) => on_effect(effect),
                        None => effects_open = false,
                    },
                }
            }
        });

        Observer::new(token, handle)
    }

    /// Tear the container down.
    ///
    /// The running intent is cancelled at its next suspension point, queued
    /// intents resolve as [`IntentOutcome::Cancelled`], later commits and
    /// effects are discarded, and every subscription ends. Idempotent.
    pub fn close(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        self.shared.cancel.cancel();
        self.shared.state_observers.lock().clear();
        self.shared.effect_observers.lock().clear();
        debug!("container closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Number of live state subscriptions.
    pub fn state_subscriber_count(&self) -> usize {
        self.shared.state_observers.lock().len()
    }

    /// Number of live effect subscriptions.
    pub fn effect_subscriber_count(&self) -> usize {
        self.shared.effect_observers.lock().len()
    }
}

async fn run_worker<S, E>(
    shared: Arc<Shared<S, E>>,
    mut queue_rx: mpsc::UnboundedReceiver<QueuedIntent<S, E>>,
) where
    S: Send + Sync + 'static,
    E: Clone + Send + 'static,
{
    loop {
        let queued = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            next = queue_rx.recv() => match next {
                Some(queued) => queued,
                None => break,
            },
        };

        let QueuedIntent {
            name,
            body,
            hooks,
            done,
        } = queued;

        let finish = hooks.map(|hooks| {
            guarded(name, "before", hooks.start);
            hooks.finish
        });

        let result = execute(&shared, name, body).await;
        if let Some(finish) = finish {
            guarded(name, "after", || finish(&result));
        }
        shared.report(name, &result);
        let _ = done.send(result);
    }

    queue_rx.close();
    while let Ok(queued) = queue_rx.try_recv() {
        debug!(intent = queued.name, "queued intent cancelled");
        let _ = queued.done.send(Ok(IntentOutcome::Cancelled));
    }
    debug!("container worker stopped");
}

async fn execute<S, E>(
    shared: &Arc<Shared<S, E>>,
    name: &'static str,
    body: IntentBody<S, E>,
) -> IntentResult
where
    S: Send + Sync + 'static,
    E: Clone + Send + 'static,
{
    debug!(intent = name, "intent started");
    let active = shared.cancel.child_token();
    let scope = IntentScope {
        shared: shared.clone(),
        intent: name,
        active: active.clone(),
    };
    let cancel = shared.cancel.clone();

    // Spawned so a panicking body cannot take the worker down
    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = body(scope) => Some(result),
        }
    });

    let joined = task.await;
    shared.retire(&active);

    match joined {
        Ok(Some(Ok(()))) => Ok(IntentOutcome::Completed),
        Ok(Some(Err(source))) => Err(IntentError::Failed {
            intent: name,
            source,
        }),
        Ok(None) => Ok(IntentOutcome::Cancelled),
        Err(err) if err.is_panic() => Err(IntentError::Panicked { intent: name }),
        Err(_) => Ok(IntentOutcome::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestEffect {
        Note(&'static str),
    }

    fn container() -> Container<Counter, TestEffect> {
        Container::new(Counter { value: 0 })
    }

    fn increment(scope: IntentScope<Counter, TestEffect>) -> IntentFuture {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            scope.reduce(|s| Counter { value: s.value + 1 });
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_initial_state() {
        let container = container();
        assert_eq!(*container.state(), Counter { value: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_intents_do_not_lose_updates() {
        let container = container();

        let first = container.run_intent("Increment", increment);
        let second = container.run_intent("Increment", increment);

        assert_eq!(first.await.unwrap(), IntentOutcome::Completed);
        assert_eq!(second.await.unwrap(), IntentOutcome::Completed);
        assert_eq!(container.state().value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_intents_run_in_submission_order() {
        let container = container();
        let mut effects = container.subscribe_effects();

        let slow = container.run_intent("Slow", |scope| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                scope.post_effect(TestEffect::Note("slow"));
                Ok(())
            })
        });
        let fast = container.run_intent("Fast", |scope| {
            Box::pin(async move {
                scope.post_effect(TestEffect::Note("fast"));
                Ok(())
            })
        });

        slow.await.unwrap();
        fast.await.unwrap();

        assert_eq!(
            effects.drain(),
            vec![TestEffect::Note("slow"), TestEffect::Note("fast")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_readable_while_intent_suspended() {
        let container = container();
        let handle = container.run_intent("Increment", increment);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(container.state().value, 0);

        handle.await.unwrap();
        assert_eq!(container.state().value, 1);
    }

    #[tokio::test]
    async fn test_failed_intent_keeps_state_and_surfaces_error() {
        let container = container();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        container.on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = container
            .run_intent("Broken", |scope| {
                Box::pin(async move {
                    scope.try_reduce(|_| Err::<Counter, BoxError>("rejected".into()))?;
                    Ok::<(), BoxError>(())
                })
            })
            .await;

        assert!(matches!(
            result,
            Err(IntentError::Failed { intent: "Broken", .. })
        ));
        assert_eq!(container.state().value, 0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_intent_does_not_stop_worker() {
        let container = container();

        let result = container
            .run_intent("Panics", |_scope| {
                Box::pin(async move {
                    let explode = true;
                    if explode {
                        panic!("boom");
                    }
                    Ok(())
                })
            })
            .await;
        assert!(matches!(result, Err(IntentError::Panicked { .. })));

        let result = container
            .run_intent("Increment", |scope| {
                Box::pin(async move {
                    scope.reduce(|s| Counter { value: s.value + 1 });
                    Ok(())
                })
            })
            .await;
        assert_eq!(result.unwrap(), IntentOutcome::Completed);
        assert_eq!(container.state().value, 1);
    }

    #[tokio::test]
    async fn test_panicking_error_handler_keeps_worker_alive() {
        let container = container();
        container.on_error(|_| panic!("handler exploded"));

        let result = container
            .run_intent("Broken", |_scope| {
                Box::pin(async move { Err::<(), BoxError>(BoxError::from("rejected")) })
            })
            .await;
        assert!(matches!(
            result,
            Err(IntentError::Failed { intent: "Broken", .. })
        ));

        let result = container
            .run_intent("Increment", |scope| {
                Box::pin(async move {
                    scope.reduce(|s| Counter { value: s.value + 1 });
                    Ok(())
                })
            })
            .await;
        assert_eq!(result.unwrap(), IntentOutcome::Completed);
        assert_eq!(container.state().value, 1);
        assert!(!container.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_escaped_scope_is_retired() {
        let container = container();
        let mut effects = container.subscribe_effects();
        let (tx, rx) = oneshot::channel();

        container
            .run_intent("Leak", move |scope| {
                Box::pin(async move {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        let seen = scope.reduce(|s| Counter { value: s.value + 100 });
                        scope.post_effect(TestEffect::Note("late"));
                        let _ = tx.send((scope.is_cancelled(), seen.value));
                    });
                    Ok(())
                })
            })
            .await
            .unwrap();

        let queued = container.run_intent("Increment", increment);

        let (cancelled, seen) = rx.await.unwrap();
        assert!(cancelled);
        assert_eq!(seen, 0);

        queued.await.unwrap();
        assert_eq!(container.state().value, 1);
        assert!(effects.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_suspended_intent() {
        let container = container();
        let mut states = container.subscribe_state();
        assert_eq!(states.recv().await.unwrap().value, 0);

        let running = container.run_intent("Increment", increment);
        let queued = container.run_intent("Increment", increment);

        tokio::time::sleep(Duration::from_millis(50)).await;
        container.close();

        assert_eq!(running.await.unwrap(), IntentOutcome::Cancelled);
        assert_eq!(queued.await.unwrap(), IntentOutcome::Cancelled);
        assert_eq!(container.state().value, 0);
        assert_eq!(states.recv().await, None);
    }

    #[tokio::test]
    async fn test_run_after_close_is_rejected() {
        let container = container();
        container.close();
        container.close();

        let result = container.run_intent("Increment", increment).await;
        assert!(matches!(result, Err(IntentError::Closed { intent: "Increment" })));
        assert!(container.is_closed());
    }

    #[tokio::test]
    async fn test_effects_without_subscribers_are_dropped() {
        let container = container();

        container
            .run_intent("Note", |scope| {
                Box::pin(async move {
                    scope.post_effect(TestEffect::Note("unseen"));
                    Ok(())
                })
            })
            .await
            .unwrap();

        let mut effects = container.subscribe_effects();
        assert!(effects.drain().is_empty());
    }

    #[tokio::test]
    async fn test_watch_state_sees_latest() {
        let container = container();
        let mut latest = container.watch_state();

        container
            .run_intent("Increment", |scope| {
                Box::pin(async move {
                    scope.reduce(|s| Counter { value: s.value + 1 });
                    Ok(())
                })
            })
            .await
            .unwrap();

        latest.changed().await.unwrap();
        assert_eq!(latest.borrow().value, 1);
    }

    #[tokio::test]
    async fn test_observe_forwards_until_stopped() {
        let container = container();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let effect_tx = tx.clone();

        let observer = container.observe(
            move |state: Arc<Counter>| {
                let _ = tx.send(format!("state {}", state.value));
            },
            move |effect: TestEffect| {
                let _ = effect_tx.send(format!("{:?}", effect));
            },
        );

        assert_eq!(rx.recv().await.unwrap(), "state 0");

        container
            .run_intent("Note", |scope| {
                Box::pin(async move {
                    scope.post_effect(TestEffect::Note("hi"));
                    Ok(())
                })
            })
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), "Note(\"hi\")");

        observer.stop();
        tokio::task::yield_now().await;
        container.close();
    }
}
