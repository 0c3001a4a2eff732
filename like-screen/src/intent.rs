//! Intents the like screen accepts
//!
//! FRAMEWORK PATTERN: Intent naming
//! - Variants name what the user asked for, not the resulting state change
//! - `name()` is derived from the variant and shows up in logs

use intent_dispatch::Intent;

/// User requests forwarded by the view
#[derive(Intent, Clone, Debug, PartialEq, Eq)]
pub enum LikeIntent {
    /// The like button was tapped
    Like,
}
