//! End-to-end tests for the like screen
//!
//! FRAMEWORK PATTERN: Paused time
//! - `start_paused = true` makes the simulated latency instant and deterministic
//! - Sleeping in the test lets queued intents run up to a chosen point

use std::sync::Arc;
use std::time::Duration;

use intent_dispatch::testing::TestHarness;
use intent_dispatch::{assert_emitted, count_emitted, IntentOutcome, LoggedOutcome};
use like_screen::{LikeConfig, LikeEffect, LikeState, LikeViewModel};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn liked(count: u32) -> LikeState {
    LikeState {
        is_like: true,
        like_count: count,
    }
}

#[tokio::test(start_paused = true)]
async fn test_fresh_screen_state() {
    let screen = LikeViewModel::new();
    assert_eq!(*screen.state(), LikeState::with_count(232));
    assert_eq!(*screen.state(), LikeState::default());
}

#[tokio::test(start_paused = true)]
async fn test_successful_like() {
    init_tracing();
    let screen = LikeViewModel::new();
    let mut effects = screen.subscribe_effects();

    let outcome = screen.like().await.unwrap();

    assert_eq!(outcome, IntentOutcome::Completed);
    assert_eq!(*screen.state(), liked(233));
    assert_eq!(
        effects.drain(),
        vec![
            LikeEffect::Loading {
                show: true,
                text: Some("please wait".into()),
            },
            LikeEffect::Loading {
                show: false,
                text: None,
            },
            LikeEffect::Toast {
                text: "liked successfully".into(),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_like_only_toasts() {
    let screen = LikeViewModel::new();
    let mut harness = TestHarness::attach(screen.container());

    screen.like().await.unwrap();
    let _ = harness.drain_effects();
    let _ = harness.drain_states();

    screen.like().await.unwrap();

    assert_eq!(*screen.state(), liked(233));
    assert_eq!(harness.drain_effects(), vec![LikeEffect::toast("already liked")]);
    assert!(harness.drain_states().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_effect_subscriber_sees_nothing() {
    let screen = LikeViewModel::new();
    screen.like().await.unwrap();

    let mut effects = screen.subscribe_effects();
    tokio::task::yield_now().await;
    assert!(effects.drain().is_empty());

    // State, unlike effects, is replayed
    let mut states = screen.subscribe_state();
    assert_eq!(*states.recv().await.unwrap(), liked(233));
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_likes_commit_once() {
    init_tracing();
    let screen = LikeViewModel::new();
    let mut harness = TestHarness::attach(screen.container());

    let start = tokio::time::Instant::now();
    let first = screen.like();
    let second = screen.like();

    assert_eq!(first.await.unwrap(), IntentOutcome::Completed);
    assert_eq!(second.await.unwrap(), IntentOutcome::Completed);

    assert_eq!(screen.state().like_count, 233);
    let effects = harness.drain_effects();
    assert_eq!(
        count_emitted!(effects, LikeEffect::Toast { text } if text == "already liked"),
        1
    );
    assert_eq!(
        count_emitted!(effects, LikeEffect::Toast { text } if text == "liked successfully"),
        1
    );
    assert_eq!(
        count_emitted!(effects, LikeEffect::Loading { show: true, .. }),
        1
    );

    let states: Vec<u32> = harness
        .drain_states()
        .iter()
        .map(|s| s.like_count)
        .collect();
    assert_eq!(states, vec![232, 233]);

    // The queued tap re-checks the guard instead of waiting out the latency again
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_states_are_fresh_values() {
    let screen = LikeViewModel::new();
    let before = screen.state();

    screen.like().await.unwrap();
    let after = screen.state();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(*before, LikeState::with_count(232));
    assert_eq!(*after, liked(233));
}

#[tokio::test(start_paused = true)]
async fn test_state_readable_during_latency() {
    let screen = LikeViewModel::new();
    let mut effects = screen.subscribe_effects();

    let handle = screen.like();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(*screen.state(), LikeState::default());
    assert_eq!(effects.drain(), vec![LikeEffect::show_loading("please wait")]);

    handle.await.unwrap();
    assert_eq!(*screen.state(), liked(233));
    assert_eq!(
        effects.drain(),
        vec![
            LikeEffect::hide_loading(),
            LikeEffect::toast("liked successfully"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_teardown_mid_latency_discards_commit() {
    init_tracing();
    let screen = LikeViewModel::new();
    let mut effects = screen.subscribe_effects();
    let mut states = screen.subscribe_state();

    let handle = screen.like();
    tokio::time::sleep(Duration::from_millis(250)).await;
    screen.close();

    assert_eq!(handle.await.unwrap(), IntentOutcome::Cancelled);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(*screen.state(), LikeState::default());
    assert_eq!(effects.drain(), vec![LikeEffect::show_loading("please wait")]);
    assert_eq!(effects.recv().await, None);

    assert_eq!(*states.recv().await.unwrap(), LikeState::default());
    assert_eq!(states.recv().await, None);
    assert!(screen.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_screen_cancels_pending_like() {
    let screen = LikeViewModel::new();
    let mut effects = screen.subscribe_effects();

    let handle = screen.like();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(screen);

    assert_eq!(handle.await.unwrap(), IntentOutcome::Cancelled);
    let remaining: Vec<LikeEffect> = effects.into_stream().collect().await;
    assert_eq!(remaining, vec![LikeEffect::show_loading("please wait")]);
}

#[tokio::test(start_paused = true)]
async fn test_like_after_close_is_rejected() {
    let screen = LikeViewModel::new();
    screen.close();

    let result = screen.like().await;
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().intent(), "Like");
}

#[tokio::test(start_paused = true)]
async fn test_observe_binds_view_callbacks() {
    let screen = LikeViewModel::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let effect_tx = tx.clone();

    let _observer = screen.observe(
        move |state: Arc<LikeState>| {
            let _ = tx.send(format!("state {} {}", state.is_like, state.like_count));
        },
        move |effect: LikeEffect| {
            let _ = effect_tx.send(format!("{:?}", effect));
        },
    );
    assert_eq!(rx.recv().await.unwrap(), "state false 232");

    screen.like().await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(rx.recv().await.unwrap());
    }
    assert!(seen.contains(&"state true 233".to_string()));
    let effects: Vec<&String> = seen.iter().filter(|s| !s.starts_with("state")).collect();
    assert_eq!(
        effects,
        vec![
            "Loading { show: true, text: Some(\"please wait\") }",
            "Loading { show: false, text: None }",
            "Toast { text: \"liked successfully\" }",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_intent_log_records_taps() {
    let screen = LikeViewModel::new();

    screen.like().await.unwrap();
    screen.like().await.unwrap();

    let log = screen.intent_log();
    let log = log.lock();
    let names: Vec<&str> = log.entries().map(|e| e.name).collect();
    assert_eq!(names, vec!["Like", "Like"]);
    assert!(log
        .entries()
        .all(|e| e.outcome == Some(LoggedOutcome::Completed)));

    let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
    assert_eq!(json[1]["summary"], "Like");
    assert_eq!(json[1]["outcome"]["status"], "completed");
}

#[tokio::test(start_paused = true)]
async fn test_custom_config() {
    let screen = LikeViewModel::with_config(LikeConfig {
        initial_like_count: 0,
        already_liked_text: "you already did".into(),
        ..LikeConfig::with_latency(Duration::from_millis(10))
    });
    let mut effects = screen.subscribe_effects();

    screen.like().await.unwrap();
    screen.like().await.unwrap();

    assert_eq!(*screen.state(), liked(1));
    let effects = effects.drain();
    assert_emitted!(effects, LikeEffect::Toast { text } if text == "you already did");
    assert_eq!(screen.config().latency, Duration::from_millis(10));
}

#[test]
fn test_state_and_effect_serialize() {
    let state = serde_json::to_value(liked(233)).unwrap();
    assert_eq!(state, serde_json::json!({ "isLike": true, "likeCount": 233 }));

    let effect = serde_json::to_value(LikeEffect::show_loading("please wait")).unwrap();
    assert_eq!(
        effect,
        serde_json::json!({ "type": "Loading", "show": true, "text": "please wait" })
    );
}
