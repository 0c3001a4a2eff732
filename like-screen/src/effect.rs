//! Effects - one-shot instructions for the presentation layer
//!
//! Effects are posted by the like intent and delivered to whoever is
//! subscribed at that moment. They never become part of `LikeState`.

use serde::Serialize;

/// Side effects emitted while handling intents
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum LikeEffect {
    /// Show or hide the busy indicator
    Loading { show: bool, text: Option<String> },

    /// Show a short message to the user
    Toast { text: String },
}

impl LikeEffect {
    /// Show the busy indicator with a message
    pub fn show_loading(text: impl Into<String>) -> Self {
        LikeEffect::Loading {
            show: true,
            text: Some(text.into()),
        }
    }

    /// Hide the busy indicator
    pub fn hide_loading() -> Self {
        LikeEffect::Loading {
            show: false,
            text: None,
        }
    }

    /// Show a message to the user
    pub fn toast(text: impl Into<String>) -> Self {
        LikeEffect::Toast { text: text.into() }
    }
}
