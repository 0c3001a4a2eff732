//! Intent trait for user-triggered business operations

use std::fmt::Debug;

/// Marker trait for intents that can be dispatched to a store
///
/// Intents describe what the user asked for, not how state changes. They should be:
/// - Clone: Intents may be logged or handed to several middleware
/// - Debug: For debugging and logging
/// - Send + Sync + 'static: They travel to the container's worker task
///
/// Use `#[derive(Intent)]` from `intent-dispatch-macros` to auto-implement this trait.
pub trait Intent: Clone + Debug + Send + Sync + 'static {
    /// Get the intent name for logging and filtering
    fn name(&self) -> &'static str;

    /// One-line description used by the intent log
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
