//! Screen state - single source of truth
//!
//! FRAMEWORK PATTERN: State is an immutable snapshot
//! - Subscribers receive `Arc<LikeState>` values
//! - Only intents produce new values, through `IntentScope::reduce`
//! - A committed value is never mutated afterwards

use serde::Serialize;

/// Like count shown before the user interacts with the screen
pub const DEFAULT_LIKE_COUNT: u32 = 232;

/// Everything the like button needs to render
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    /// Whether the current user has liked the item
    pub is_like: bool,

    /// Total number of likes
    pub like_count: u32,
}

impl Default for LikeState {
    fn default() -> Self {
        Self::with_count(DEFAULT_LIKE_COUNT)
    }
}

impl LikeState {
    /// Not-yet-liked state with the given count
    pub fn with_count(like_count: u32) -> Self {
        Self {
            is_like: false,
            like_count,
        }
    }

    /// The state after a successful like
    pub fn liked(&self) -> Self {
        Self {
            is_like: true,
            like_count: self.like_count.saturating_add(1),
        }
    }
}
