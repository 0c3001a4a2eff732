//! View model - the like screen's container, bound to the screen lifecycle
//!
//! FRAMEWORK PATTERN: One store per screen
//! - The view forwards taps as intents and renders what it observes
//! - Dropping the view model tears the screen down: the running intent
//!   is cancelled and subscriptions end

use std::sync::Arc;

use intent_dispatch::{
    Container, EffectSubscription, IntentError, IntentHandle, IntentLog, IntentLogConfig,
    IntentLoggerConfig, IntentLoggerMiddleware, Observer, SharedIntentLog, StateSubscription,
    StoreWithMiddleware,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::LikeConfig;
use crate::effect::LikeEffect;
use crate::intent::LikeIntent;
use crate::reducer::reducer;
use crate::state::LikeState;

type LikeStore = StoreWithMiddleware<LikeState, LikeIntent, LikeEffect, IntentLoggerMiddleware>;

/// Owner of the like screen's state
///
/// Must be created from within a Tokio runtime.
pub struct LikeViewModel {
    store: LikeStore,
    intent_log: SharedIntentLog,
    config: Arc<LikeConfig>,
}

impl LikeViewModel {
    /// View model with the default configuration
    pub fn new() -> Self {
        Self::with_config(LikeConfig::default())
    }

    /// View model with a custom configuration
    pub fn with_config(config: LikeConfig) -> Self {
        let config = Arc::new(config);
        let intent_log = Arc::new(Mutex::new(IntentLog::new(IntentLogConfig::with_capacity(
            config.intent_log_capacity,
        ))));
        let middleware =
            IntentLoggerMiddleware::with_shared_log(IntentLoggerConfig::default(), intent_log.clone());

        let store = StoreWithMiddleware::new(
            LikeState::with_count(config.initial_like_count),
            reducer(config.clone()),
            middleware,
        );
        debug!(like_count = config.initial_like_count, "like screen created");

        Self {
            store,
            intent_log,
            config,
        }
    }

    /// Tap on the like button
    ///
    /// Returns immediately; the intent runs after any tap still in flight.
    pub fn like(&self) -> IntentHandle {
        self.store.dispatch(LikeIntent::Like)
    }

    /// Current state
    pub fn state(&self) -> Arc<LikeState> {
        self.store.state()
    }

    /// Current state followed by every later one
    pub fn subscribe_state(&self) -> StateSubscription<LikeState> {
        self.store.subscribe_state()
    }

    /// Effects posted from now on
    pub fn subscribe_effects(&self) -> EffectSubscription<LikeEffect> {
        self.store.subscribe_effects()
    }

    /// Bind both streams to view callbacks for as long as the returned observer lives
    pub fn observe<FS, FE>(&self, on_state: FS, on_effect: FE) -> Observer
    where
        FS: FnMut(Arc<LikeState>) + Send + 'static,
        FE: FnMut(LikeEffect) + Send + 'static,
    {
        self.store.container().observe(on_state, on_effect)
    }

    /// Register a handler for failed intents
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&IntentError) + Send + Sync + 'static,
    {
        self.store.container().on_error(handler);
    }

    /// Intents handled by this screen, oldest first
    pub fn intent_log(&self) -> SharedIntentLog {
        self.intent_log.clone()
    }

    /// Configuration this screen was built with
    pub fn config(&self) -> &LikeConfig {
        &self.config
    }

    /// The underlying container
    pub fn container(&self) -> &Container<LikeState, LikeEffect> {
        self.store.container()
    }

    /// Tear the screen down. Idempotent.
    pub fn close(&self) {
        self.store.container().close();
    }

    /// Whether the screen was torn down
    pub fn is_closed(&self) -> bool {
        self.store.container().is_closed()
    }
}

impl Default for LikeViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LikeViewModel {
    fn drop(&mut self) {
        self.close();
    }
}
