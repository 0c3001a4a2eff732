//! Screen configuration

use std::time::Duration;

use crate::state::DEFAULT_LIKE_COUNT;

/// Tunables for the like screen
#[derive(Debug, Clone)]
pub struct LikeConfig {
    /// Like count the screen starts with
    pub initial_like_count: u32,
    /// Simulated request latency
    pub latency: Duration,
    /// Toast shown when the item is already liked
    pub already_liked_text: String,
    /// Text next to the busy indicator
    pub loading_text: String,
    /// Toast shown after a successful like
    pub success_text: String,
    /// Capacity of the in-memory intent log
    pub intent_log_capacity: usize,
}

impl Default for LikeConfig {
    fn default() -> Self {
        Self {
            initial_like_count: DEFAULT_LIKE_COUNT,
            latency: Duration::from_millis(500),
            already_liked_text: "already liked".to_string(),
            loading_text: "please wait".to_string(),
            success_text: "liked successfully".to_string(),
            intent_log_capacity: 100,
        }
    }
}

impl LikeConfig {
    /// Default config with a different simulated latency
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }
}
