//! Error types surfaced by intent execution

use thiserror::Error;

/// Boxed error returned by intent bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a finished intent, as seen by callers and middleware.
pub type IntentResult = Result<IntentOutcome, IntentError>;

/// How an intent that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The body ran to completion.
    Completed,
    /// The container was closed while the intent was queued or suspended.
    /// Any later commit or effect from the body was discarded.
    Cancelled,
}

/// Errors surfaced by a container when an intent could not complete.
///
/// None of these leave the committed state partially applied.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("intent `{intent}` failed: {source}")]
    Failed {
        intent: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("intent `{intent}` panicked")]
    Panicked { intent: &'static str },

    #[error("intent `{intent}` rejected: container is closed")]
    Closed { intent: &'static str },
}

impl IntentError {
    /// Name of the intent that produced this error.
    pub fn intent(&self) -> &'static str {
        match self {
            IntentError::Failed { intent, .. }
            | IntentError::Panicked { intent }
            | IntentError::Closed { intent } => intent,
        }
    }
}
