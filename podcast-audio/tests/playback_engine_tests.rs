//! Integration tests for the playback sub-machine
//!
//! Covers handle exclusivity, stale-load discard, seek clamping, progress,
//! transport no-ops while loading, failure recovery and end of media. All
//! tests run on a paused tokio clock so positions are exact.

mod helpers;

use helpers::*;
use podcast_audio::backend::SimulatedSource;
use podcast_audio::{Error, LoadOutcome};
use podcast_common::events::{CastEvent, PlaybackStatus};
use std::time::Duration;
use tokio::time::sleep;

fn source(duration_ms: u64) -> SimulatedSource {
    SimulatedSource::default().with_duration_ms(duration_ms)
}

#[tokio::test(start_paused = true)]
async fn test_sequential_loads_keep_one_live_player() {
    let h = harness(|b| b);

    for episode in [episode_a(), episode_b(), episode_c()] {
        h.engine.load_episode(episode).await.unwrap();
        assert_eq!(h.stats.live_players(), 1);
    }

    assert_eq!(h.stats.players_opened(), 3);
    assert_eq!(h.stats.release_count(URL_A), 1);
    assert_eq!(h.stats.release_count(URL_B), 1);
    assert_eq!(h.stats.release_count(URL_C), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reload_while_playing_releases_old_player() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();
    sleep(Duration::from_secs(1)).await;

    h.engine.load_episode(episode_b()).await.unwrap();

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.status, PlaybackStatus::Paused);
    assert_eq!(view.position_ms, 0);
    assert_eq!(h.stats.live_players(), 1);
    assert_eq!(h.stats.release_count(URL_A), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_load_result_is_discarded() {
    let h = harness(|b| {
        b.with_source(URL_A, source(60_000).with_latency(Duration::from_millis(500)))
            .with_source(URL_B, source(90_000).with_latency(Duration::from_millis(100)))
    });

    let engine = h.engine.clone();
    let slow = tokio::spawn(async move { engine.load_episode(episode_a()).await });
    tokio::task::yield_now().await;

    let fast = h.engine.load_episode(episode_b()).await.unwrap();
    assert_eq!(fast, LoadOutcome::Loaded);

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow, LoadOutcome::Superseded);

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.episode.map(|e| e.id), Some("b".to_string()));
    assert_eq!(view.duration_ms, 90_000);
    assert!(!view.is_loading);
    assert_eq!(h.stats.release_count(URL_A), 1);
    assert_eq!(h.stats.live_players(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_seek_is_clamped_to_duration() {
    let h = harness(|b| b.with_default_source(source(60_000)));
    h.engine.load_episode(episode_a()).await.unwrap();

    let cases = [
        (-5_000, 0),
        (12_345, 12_345),
        (90_000, 60_000),
        (i64::MAX, 60_000),
    ];
    for (requested, expected) in cases {
        h.engine.seek_to(requested).await.unwrap();
        assert_eq!(h.engine.snapshot().await.playback.position_ms, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_unknown_duration_pins_position_and_progress() {
    let h = harness(|b| b.with_default_source(SimulatedSource::default().without_duration()));
    h.engine.load_episode(episode_a()).await.unwrap();

    h.engine.seek_to(5_000).await.unwrap();
    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.duration_ms, 0);
    assert_eq!(view.position_ms, 0);
    assert_eq!(view.progress(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_progress_tracks_playhead_while_playing() {
    let h = harness(|b| b.with_default_source(source(10_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();

    let mut last = 0.0;
    for _ in 0..8 {
        sleep(Duration::from_millis(1_000)).await;
        let view = h.engine.snapshot().await.playback;
        let expected = view.position_ms as f64 / view.duration_ms as f64;
        assert!((view.progress() - expected).abs() < f64::EPSILON);
        assert!(view.progress() >= last);
        last = view.progress();
    }
    assert!(last > 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_tracker_emits_progress_events() {
    let h = harness(|b| b.with_default_source(source(60_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    let mut rx = h.engine.subscribe_events();

    h.engine.play().await.unwrap();
    sleep(Duration::from_millis(1_600)).await;

    let positions: Vec<u64> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            CastEvent::PlaybackProgress { position_ms, .. } => Some(position_ms),
            _ => None,
        })
        .collect();
    assert_eq!(positions, vec![0, 500, 1_000, 1_500]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_url_is_rejected() {
    let h = harness(|b| b);

    for url in ["", "   "] {
        let result = h.engine.load_episode(episode("blank", url)).await;
        assert!(matches!(result, Err(Error::InvalidSource { .. })));
    }

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.status, PlaybackStatus::Empty);
    assert!(view.episode.is_none());
    assert_eq!(h.stats.players_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transport_is_noop_while_loading() {
    let h = harness(|b| b.with_default_source(source(60_000).with_latency(Duration::from_secs(1))));

    let engine = h.engine.clone();
    let load = tokio::spawn(async move { engine.load_episode(episode_a()).await });
    tokio::task::yield_now().await;

    h.engine.play().await.unwrap();
    h.engine.seek_to(5_000).await.unwrap();
    h.engine.set_playback_speed(1.5).await.unwrap();

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.status, PlaybackStatus::Loading);
    assert!(!view.is_playing);
    assert!(!view.can_play());

    assert_eq!(load.await.unwrap().unwrap(), LoadOutcome::Loaded);
    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.status, PlaybackStatus::Paused);
    assert_eq!(view.position_ms, 0);
    assert_eq!(view.playback_speed, 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_forward_near_end_clamps() {
    let h = harness(|b| b.with_default_source(source(60_000)));
    h.engine.load_episode(episode_a()).await.unwrap();

    h.engine.seek_to(50_000).await.unwrap();
    h.engine.skip_forward().await.unwrap();
    assert_eq!(h.engine.snapshot().await.playback.position_ms, 60_000);

    h.engine.skip_backward().await.unwrap();
    assert_eq!(h.engine.snapshot().await.playback.position_ms, 45_000);

    h.engine.skip_backward_by(120).await.unwrap();
    assert_eq!(h.engine.snapshot().await.playback.position_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_round_trip() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();

    h.engine.toggle_play_pause().await.unwrap();
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Playing);

    h.engine.toggle_play_pause().await.unwrap();
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_returns_to_empty_with_error() {
    let h = harness(|b| b.with_source(URL_A, SimulatedSource::default().failing("HTTP 404")));
    let mut rx = h.engine.subscribe_events();

    let result = h.engine.load_episode(episode_a()).await;
    assert!(matches!(result, Err(Error::Load { .. })));

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.status, PlaybackStatus::Empty);
    assert!(view.has_error());
    assert!(!view.can_play());
    assert!(view.error_message().is_some_and(|m| m.contains("HTTP 404")));
    assert_eq!(
        event_types(&drain(&mut rx)),
        vec!["PlaybackStateChanged", "PlaybackFailed", "PlaybackStateChanged"]
    );

    h.engine.load_episode(episode_b()).await.unwrap();
    let view = h.engine.snapshot().await.playback;
    assert!(!view.has_error());
    assert!(view.can_play());
}

#[tokio::test(start_paused = true)]
async fn test_play_failure_keeps_episode() {
    let h = harness(|b| b.with_source(URL_A, source(60_000).failing_play()));
    h.engine.load_episode(episode_a()).await.unwrap();

    assert!(matches!(h.engine.play().await, Err(Error::Playback(_))));

    let view = h.engine.snapshot().await.playback;
    assert!(!view.is_playing);
    assert_eq!(view.episode.clone().map(|e| e.id), Some("a".to_string()));
    assert!(view.has_error());
    assert!(!view.can_play());

    // Stays failed until a fresh load
    assert!(matches!(h.engine.play().await, Err(Error::Playback(_))));
    h.engine.load_episode(episode_b()).await.unwrap();
    h.engine.play().await.unwrap();
    assert!(h.engine.snapshot().await.playback.is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_media_then_replay_from_start() {
    let h = harness(|b| b.with_default_source(source(2_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    let mut rx = h.engine.subscribe_events();

    h.engine.play().await.unwrap();
    sleep(Duration::from_secs(3)).await;

    let view = h.engine.snapshot().await.playback;
    assert!(view.finished);
    assert!(!view.is_playing);
    assert_eq!(view.position_ms, 2_000);
    assert_eq!(view.progress(), 1.0);
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, CastEvent::PlaybackFinished { episode_id, .. } if episode_id == "a")));

    h.engine.play().await.unwrap();
    let view = h.engine.snapshot().await.playback;
    assert!(view.is_playing);
    assert!(!view.finished);
    assert_eq!(view.position_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn test_scrub_holds_position_until_commit() {
    let h = harness(|b| b.with_default_source(source(120_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();

    h.engine.begin_scrub().await;
    h.engine.scrub_to(40_000).await;
    sleep(Duration::from_secs(2)).await;

    let view = h.engine.snapshot().await.playback;
    assert!(view.scrubbing);
    assert_eq!(view.position_ms, 40_000);

    h.engine.end_scrub(40_000).await.unwrap();
    sleep(Duration::from_millis(1_000)).await;

    let view = h.engine.snapshot().await.playback;
    assert!(!view.scrubbing);
    assert!(view.position_ms > 40_000 && view.position_ms <= 41_000);
}

#[tokio::test(start_paused = true)]
async fn test_no_position_updates_after_stop() {
    let h = harness(|b| b.with_default_source(source(60_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();
    sleep(Duration::from_millis(1_200)).await;

    h.engine.stop().await.unwrap();
    let mut rx = h.engine.subscribe_events();
    sleep(Duration::from_secs(5)).await;

    assert!(drain(&mut rx).is_empty());
    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.position_ms, 0);
    assert_eq!(view.status, PlaybackStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_stored_speed_applies_to_next_load() {
    let h = harness(|b| b.with_default_source(source(60_000)));
    h.engine.set_playback_speed(2.0).await.unwrap();
    h.engine.load_episode(episode_a()).await.unwrap();

    h.engine.play().await.unwrap();
    sleep(Duration::from_millis(1_000)).await;
    h.engine.pause().await.unwrap();

    let view = h.engine.snapshot().await.playback;
    assert_eq!(view.position_ms, 2_000);
    assert_eq!(view.speed_label(), "2x");
}

#[tokio::test(start_paused = true)]
async fn test_load_emits_lifecycle_events() {
    let h = harness(|b| b.with_default_source(source(42_000)));
    let mut rx = h.engine.subscribe_events();

    h.engine.load_episode(episode_a()).await.unwrap();

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [
            CastEvent::PlaybackStateChanged {
                old_state: PlaybackStatus::Empty,
                new_state: PlaybackStatus::Loading,
                ..
            },
            CastEvent::EpisodeLoaded { duration_ms: 42_000, .. },
            CastEvent::PlaybackStateChanged {
                old_state: PlaybackStatus::Loading,
                new_state: PlaybackStatus::Paused,
                ..
            },
        ]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_end_of_media_during_drag_keeps_drag_position() {
    let h = harness(|b| b.with_default_source(source(2_000)));
    h.engine.load_episode(episode_a()).await.unwrap();
    h.engine.play().await.unwrap();

    h.engine.begin_scrub().await;
    h.engine.scrub_to(500).await;
    sleep(Duration::from_secs(3)).await;

    let view = h.engine.snapshot().await.playback;
    assert!(view.scrubbing);
    assert!(view.finished);
    assert!(!view.is_playing);
    assert_eq!(view.position_ms, 500);

    h.engine.end_scrub(500).await.unwrap();
    let view = h.engine.snapshot().await.playback;
    assert!(!view.scrubbing);
    assert!(!view.finished);
    assert_eq!(view.position_ms, 500);

    // Resumes from the committed position, not from 0
    h.engine.play().await.unwrap();
    sleep(Duration::from_millis(1_000)).await;
    let view = h.engine.snapshot().await.playback;
    assert!(view.position_ms > 500 && view.position_ms <= 1_500);
}

#[tokio::test(start_paused = true)]
async fn test_rate_failure_is_recorded() {
    let h = harness(|b| b.with_source(URL_A, source(60_000).failing_rate()));
    h.engine.load_episode(episode_a()).await.unwrap();
    let mut rx = h.engine.subscribe_events();

    let result = h.engine.set_playback_speed(1.5).await;
    assert!(matches!(result, Err(Error::Playback(_))));

    let view = h.engine.snapshot().await.playback;
    assert!(view.has_error());
    assert!(!view.can_play());
    assert!(view.error_message().is_some_and(|m| m.contains("rate 1.5")));
    assert_eq!(view.playback_speed, 1.0);
    assert_eq!(view.episode.map(|e| e.id), Some("a".to_string()));
    let failed = drain(&mut rx).into_iter().any(|e| match e {
        CastEvent::PlaybackFailed { episode_id, .. } => episode_id.as_deref() == Some("a"),
        _ => false,
    });
    assert!(failed);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_while_loading_reports_unchanged_speed() {
    let h = harness(|b| {
        b.with_default_source(source(60_000).with_latency(Duration::from_secs(1)))
    });

    let engine = h.engine.clone();
    let load = tokio::spawn(async move { engine.load_episode(episode_a()).await });
    tokio::task::yield_now().await;

    let reported = h.engine.cycle_playback_speed().await.unwrap();
    let view = h.engine.snapshot().await.playback;
    assert_eq!(reported, 1.0);
    assert_eq!(view.playback_speed, reported);
    assert_eq!(view.speed_label(), "1x");

    assert_eq!(load.await.unwrap().unwrap(), LoadOutcome::Loaded);
    assert_eq!(h.engine.cycle_playback_speed().await.unwrap(), 1.25);
    assert_eq!(h.engine.snapshot().await.playback.playback_speed, 1.25);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_toggles_alternate() {
    let h = harness(|b| b);
    h.engine.load_episode(episode_a()).await.unwrap();

    let (first, second) = tokio::join!(
        h.engine.toggle_play_pause(),
        h.engine.toggle_play_pause()
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_is_noop_while_loading() {
    let h = harness(|b| {
        b.with_default_source(source(60_000).with_latency(Duration::from_secs(1)))
    });

    let engine = h.engine.clone();
    let load = tokio::spawn(async move { engine.load_episode(episode_a()).await });
    tokio::task::yield_now().await;

    h.engine.toggle_play_pause().await.unwrap();
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Loading);

    load.await.unwrap().unwrap();
    assert_eq!(h.engine.snapshot().await.status(), PlaybackStatus::Paused);
}
