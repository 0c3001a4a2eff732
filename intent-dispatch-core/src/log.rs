//! Intent logging with pattern-based filtering and in-memory storage
//!
//! Provides configurable intent logging using glob patterns to include/exclude
//! specific intents from logs. Supports both tracing output and an in-memory
//! ring buffer that can be inspected or exported as JSON.
//!
//! # Example
//!
//! ```ignore
//! use intent_dispatch_core::log::{IntentLogConfig, IntentLoggerMiddleware};
//!
//! let middleware = IntentLoggerMiddleware::with_log(IntentLogConfig::default());
//! let log = middleware.log_handle().expect("storage enabled");
//! let store = StoreWithMiddleware::new(State::default(), reducer, middleware);
//!
//! store.dispatch(MyIntent::Refresh).await?;
//! for entry in log.lock().recent(10) {
//!     println!("{}: {}", entry.elapsed_display(), entry.summary);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::{IntentOutcome, IntentResult};
use crate::intent::Intent;
use crate::store::Middleware;

/// Configuration for intent logging with glob pattern filtering.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `Like*` matches Like, LikeUndo, etc.
/// - `*Refresh` matches PullRefresh, AutoRefresh
#[derive(Debug, Clone, Default)]
pub struct IntentLoggerConfig {
    /// If non-empty, only log intents matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude intents matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl IntentLoggerConfig {
    /// Create a new config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use intent_dispatch_core::log::IntentLoggerConfig;
    ///
    /// let config = IntentLoggerConfig::new(Some("Like*,Share"), Some("LikeUndo"));
    /// assert!(config.should_log("Like"));
    /// assert!(config.should_log("Share"));
    /// assert!(!config.should_log("LikeUndo"));
    /// assert!(!config.should_log("Refresh"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |s: &str| -> Vec<String> {
            s.split(',').map(|p| p.trim().to_string()).collect()
        };
        Self {
            include_patterns: include.map(split).unwrap_or_default(),
            exclude_patterns: exclude.map(split).unwrap_or_default(),
        }
    }

    /// Check if an intent name should be logged based on include/exclude patterns
    pub fn should_log(&self, intent_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, intent_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, intent_name))
    }
}

// ============================================================================
// In-Memory Intent Log
// ============================================================================

/// Final outcome recorded for a logged intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoggedOutcome {
    Completed,
    Cancelled,
    Failed { error: String },
}

impl From<&IntentResult> for LoggedOutcome {
    fn from(result: &IntentResult) -> Self {
        match result {
            Ok(IntentOutcome::Completed) => LoggedOutcome::Completed,
            Ok(IntentOutcome::Cancelled) => LoggedOutcome::Cancelled,
            Err(err) => LoggedOutcome::Failed {
                error: err.to_string(),
            },
        }
    }
}

/// An entry in the intent log
#[derive(Debug, Clone, Serialize)]
pub struct IntentLogEntry {
    /// Intent name (from Intent::name())
    pub name: &'static str,
    /// Summary representation (from Intent::summary())
    pub summary: String,
    /// Sequence number for ordering
    pub sequence: u64,
    /// When the intent started executing
    #[serde(skip)]
    pub timestamp: Instant,
    /// Set once the intent finished
    pub outcome: Option<LoggedOutcome>,
}

impl IntentLogEntry {
    /// Create a new log entry
    pub fn new(name: &'static str, summary: String, sequence: u64) -> Self {
        Self {
            name,
            summary,
            sequence,
            timestamp: Instant::now(),
            outcome: None,
        }
    }

    /// Time since this intent started
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the intent log ring buffer
#[derive(Debug, Clone)]
pub struct IntentLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    /// Filter applied before storing
    pub filter: IntentLoggerConfig,
}

impl Default for IntentLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: IntentLoggerConfig::default(),
        }
    }
}

impl IntentLogConfig {
    /// Create with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// In-memory ring buffer of recent intents
///
/// Older entries are discarded when capacity is reached.
#[derive(Debug, Clone)]
pub struct IntentLog {
    entries: VecDeque<IntentLogEntry>,
    config: IntentLogConfig,
    next_sequence: u64,
}

/// Intent log shared between a middleware and its readers.
pub type SharedIntentLog = Arc<Mutex<IntentLog>>;

impl Default for IntentLog {
    fn default() -> Self {
        Self::new(IntentLogConfig::default())
    }
}

impl IntentLog {
    /// Create a new intent log with configuration
    pub fn new(config: IntentLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Log an intent (if it passes the filter)
    ///
    /// Returns the entry if it was logged, None if filtered out.
    pub fn log<I: Intent>(&mut self, intent: &I) -> Option<&IntentLogEntry> {
        let name = intent.name();
        if !self.config.filter.should_log(name) {
            return None;
        }

        let entry = IntentLogEntry::new(name, intent.summary(), self.next_sequence);
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    /// Record the outcome of the entry with the given sequence number
    pub fn finish(&mut self, sequence: u64, outcome: LoggedOutcome) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| entry.sequence == sequence)
        {
            entry.outcome = Some(outcome);
        }
    }

    /// Get all entries (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &IntentLogEntry> {
        self.entries.iter()
    }

    /// Get the most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &IntentLogEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Export the stored entries as a JSON array (oldest first)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Middleware that logs intents with configurable pattern filtering.
///
/// Supports two modes:
/// - **Tracing only** (default): logs via `tracing::debug!()`
/// - **With storage**: also stores entries in a [`SharedIntentLog`]
#[derive(Debug, Clone)]
pub struct IntentLoggerMiddleware {
    config: IntentLoggerConfig,
    log: Option<SharedIntentLog>,
    /// Sequence of the entry written by the last `before`, if any
    pending: Option<u64>,
}

impl IntentLoggerMiddleware {
    /// Create a new intent logger with tracing only (no in-memory storage)
    pub fn new(config: IntentLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            pending: None,
        }
    }

    /// Create middleware with in-memory storage
    pub fn with_log(config: IntentLogConfig) -> Self {
        Self {
            config: config.filter.clone(),
            log: Some(Arc::new(Mutex::new(IntentLog::new(config)))),
            pending: None,
        }
    }

    /// Create middleware writing to a log owned by the caller
    pub fn with_shared_log(config: IntentLoggerConfig, log: SharedIntentLog) -> Self {
        Self {
            config,
            log: Some(log),
            pending: None,
        }
    }

    /// Create with default config and in-memory storage
    pub fn with_default_log() -> Self {
        Self::with_log(IntentLogConfig::default())
    }

    /// Shared handle to the in-memory log (if storage is enabled)
    pub fn log_handle(&self) -> Option<SharedIntentLog> {
        self.log.clone()
    }

    /// Get a reference to the config
    pub fn config(&self) -> &IntentLoggerConfig {
        &self.config
    }
}

impl<I: Intent> Middleware<I> for IntentLoggerMiddleware {
    fn before(&mut self, intent: &I) {
        let name = intent.name();
        if self.config.should_log(name) {
            tracing::debug!(intent = %name, summary = %intent.summary(), "intent");
        }

        self.pending = self
            .log
            .as_ref()
            .and_then(|log| log.lock().log(intent).map(|entry| entry.sequence));
    }

    fn after(&mut self, intent: &I, result: &IntentResult) {
        if self.config.should_log(intent.name()) {
            tracing::debug!(intent = %intent.name(), ok = result.is_ok(), "intent done");
        }

        if let (Some(sequence), Some(log)) = (self.pending.take(), self.log.as_ref()) {
            log.lock().finish(sequence, LoggedOutcome::from(result));
        }
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star_pi = None;
    let mut star_ti = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(spi) = star_pi {
            pi = spi + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}
