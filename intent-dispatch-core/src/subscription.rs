//! Observer lists and subscription handles for state and effect streams
//!
//! Both streams fan out through an explicit observer list of unbounded
//! channels: nothing is coalesced or dropped for a live subscriber, and
//! delivery order matches publish order. The state stream replays the
//! latest value on subscribe; the effect stream never replays.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

/// Fan-out list of live observers.
pub(crate) struct Observers<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Register a new observer and return its receiving end.
    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Register a new observer that first receives `initial`.
    pub(crate) fn subscribe_with(&mut self, initial: T) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        // rx is alive, send cannot fail
        let _ = tx.send(initial);
        self.senders.push(tx);
        rx
    }

    /// Deliver `value` to every observer, pruning the ones that went away.
    ///
    /// Returns the number of observers that received it.
    pub(crate) fn publish(&mut self, value: &T) -> usize {
        self.senders.retain(|tx| tx.send(value.clone()).is_ok());
        self.senders.len()
    }

    /// Drop every observer; their streams end once drained.
    pub(crate) fn clear(&mut self) {
        self.senders.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}

/// A live subscription to one of a container's streams.
///
/// Dropping the subscription or calling [`unsubscribe`](Subscription::unsubscribe)
/// stops delivery. Values already buffered are discarded on unsubscribe.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Option<mpsc::UnboundedReceiver<T>>,
}

/// Subscription to committed states. The first value is the state current at subscribe time.
pub type StateSubscription<S> = Subscription<Arc<S>>;

/// Subscription to one-shot effects emitted after subscribe time.
pub type EffectSubscription<E> = Subscription<E>;

impl<T> Subscription<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Wait for the next value.
    ///
    /// Returns `None` once unsubscribed or when the container was closed
    /// and all buffered values have been received.
    pub async fn recv(&mut self) -> Option<T> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Take the next buffered value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.as_mut().and_then(|rx| rx.try_recv().ok())
    }

    /// Take every buffered value without waiting.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.try_recv() {
            values.push(value);
        }
        values
    }

    /// Stop delivery. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }

    /// Whether this subscription has not been unsubscribed.
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Convert into a [`Stream`](tokio_stream::Stream) of values.
    pub fn into_stream(self) -> UnboundedReceiverStream<T> {
        let rx = self.rx.unwrap_or_else(|| {
            // Sender dropped immediately: the stream is already finished
            let (_, rx) = mpsc::unbounded_channel();
            rx
        });
        UnboundedReceiverStream::new(rx)
    }
}

/// Lifecycle-bound binding of a container's streams to callbacks.
///
/// Returned by [`Container::observe`](crate::Container::observe). Delivery
/// stops when the observer is stopped or dropped, or when the container
/// closes. Values still buffered at that point are not delivered.
#[derive(Debug)]
pub struct Observer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Observer {
    pub(crate) fn new(token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self { token, handle }
    }

    /// Stop forwarding. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether the forwarding task has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
