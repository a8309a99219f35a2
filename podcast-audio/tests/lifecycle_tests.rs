//! Engine lifecycle: cleanup, shutdown and teardown of background tasks

mod helpers;

use helpers::*;
use podcast_audio::backend::SimulatedSource;
use podcast_audio::LoadOutcome;
use podcast_common::events::{CastEvent, PlaybackStatus, RecordingStatus};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_cleanup_twice_reaches_same_clean_state() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.set_playback_speed(1.75).await.unwrap();
    h.engine.play().await.unwrap();
    h.engine.start_recording().await.unwrap();
    sleep(Duration::from_secs(2)).await;

    h.engine.cleanup().await;
    let first = h.engine.snapshot().await;
    h.engine.cleanup().await;
    let second = h.engine.snapshot().await;

    assert_eq!(first, second);
    assert_eq!(second.playback.status, PlaybackStatus::Empty);
    assert_eq!(second.playback.position_ms, 0);
    assert_eq!(second.playback.duration_ms, 0);
    assert_eq!(second.playback.playback_speed, 1.0);
    assert!(!second.playback.has_error());
    assert_eq!(second.recording.status, RecordingStatus::Idle);
    assert_eq!(second.recording.duration_ms, 0);
    assert_eq!(h.stats.live_players(), 0);
    assert_eq!(h.stats.live_recorders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_progress_after_cleanup() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();
    h.engine.start_recording().await.unwrap();
    sleep(Duration::from_millis(1_500)).await;

    h.engine.cleanup().await;
    let mut rx = h.engine.subscribe_events();
    sleep(Duration::from_secs(5)).await;

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_supersedes_inflight_load() {
    let h = harness(|b| {
        b.with_default_source(SimulatedSource::default().with_latency(Duration::from_secs(1)))
    });

    let engine = h.engine.clone();
    let load = tokio::spawn(async move { engine.load_episode(episode_a()).await });
    tokio::task::yield_now().await;

    h.engine.cleanup().await;

    assert_eq!(load.await.unwrap().unwrap(), LoadOutcome::Superseded);
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Empty);
    assert_eq!(h.stats.players_opened(), 1);
    assert_eq!(h.stats.live_players(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_engine_is_reusable_after_cleanup() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.cleanup().await;

    h.engine.load_episode(episode_b()).await.unwrap();
    h.engine.play().await.unwrap();
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_event_sequence() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    let mut rx = h.engine.subscribe_events();

    h.engine.shutdown().await;

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [
            CastEvent::PlaybackStateChanged {
                old_state: PlaybackStatus::Paused,
                new_state: PlaybackStatus::Empty,
                ..
            },
            CastEvent::EngineCleanedUp { .. },
            CastEvent::EngineShutdown { .. },
        ]
    ));
    assert_eq!(h.stats.live_players(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_engine_stops_tracker() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();
    let mut rx = h.engine.subscribe_events();

    let Harness { engine, backend, .. } = h;
    drop(engine);
    drop(backend);

    // The tracker holds the last event sender; the channel closes once it is gone
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Err(RecvError::Closed) = rx.recv().await {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}
