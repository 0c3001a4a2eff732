//! Reducer - maps each intent to the async work it performs
//!
//! FRAMEWORK PATTERN: Intent body
//! - Reads state through the scope, never from a captured snapshot
//! - Re-reads after every suspension point
//! - Posts effects for the view, reduces state for subscribers

use std::sync::Arc;

use intent_dispatch::{BoxError, IntentFuture, IntentScope};
use tracing::debug;

use crate::config::LikeConfig;
use crate::effect::LikeEffect;
use crate::intent::LikeIntent;
use crate::state::LikeState;

pub type LikeScope = IntentScope<LikeState, LikeEffect>;

/// Build the reducer for the like screen
pub fn reducer(
    config: Arc<LikeConfig>,
) -> impl Fn(LikeIntent, LikeScope) -> IntentFuture + Send + Sync + 'static {
    move |intent: LikeIntent, scope: LikeScope| -> IntentFuture {
        let config = config.clone();
        Box::pin(async move {
            match intent {
                LikeIntent::Like => like(&config, &scope).await,
            }
        })
    }
}

/// Handle a tap on the like button
///
/// A queued tap runs only after the previous one finished, so the guard
/// below already sees the earlier commit and skips the latency.
pub async fn like(config: &LikeConfig, scope: &LikeScope) -> Result<(), BoxError> {
    if scope.state().is_like {
        debug!("already liked, skipping");
        scope.post_effect(LikeEffect::toast(&config.already_liked_text));
        return Ok(());
    }

    scope.post_effect(LikeEffect::show_loading(&config.loading_text));

    tokio::time::sleep(config.latency).await;

    // Commit against the state as of now
    let state = scope.reduce(LikeState::liked);
    debug!(like_count = state.like_count, "like committed");

    scope.post_effect(LikeEffect::hide_loading());
    scope.post_effect(LikeEffect::toast(&config.success_text));
    Ok(())
}
