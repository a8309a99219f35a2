//! Podcast audio engine harness (podcast-audio) - Main entry point
//!
//! Drives an `AudioEngine` over the simulated backend from the command line:
//! play an episode URL for a while, or make a recording. Engine events are
//! logged, or printed as JSON lines with `--json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use podcast_audio::backend::SimulatedBackend;
use podcast_audio::{AudioEngine, EngineConfig};
use podcast_common::events::CastEvent;
use podcast_common::human_time::format_duration;
use podcast_common::Episode;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for podcast-audio
#[derive(Parser, Debug)]
#[command(name = "podcast-audio")]
#[command(about = "Podcast playback and recording engine harness")]
#[command(version)]
struct Args {
    /// Config file (overrides PODCAST_AUDIO_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print engine events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an episode and play it
    Play {
        /// Audio URL of the episode
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "Untitled episode")]
        title: String,

        /// Stop after this many seconds (default: until finished or Ctrl+C)
        #[arg(long)]
        seconds: Option<u64>,

        /// Playback speed multiplier
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Record from the (simulated) microphone
    Record {
        /// Recording length in seconds
        #[arg(long, default_value = "10")]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load engine config")?;

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("podcast_audio={level},podcast_common={level}"))
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting podcast audio engine harness");
    let recordings_dir = config.recordings_dir();
    info!("Recordings directory: {}", recordings_dir.display());

    let backend = Arc::new(SimulatedBackend::new(recordings_dir));
    let engine = Arc::new(AudioEngine::new(backend, config));

    let printer = tokio::spawn(print_events(engine.subscribe_events(), args.json));

    let outcome = match args.command {
        Command::Play {
            url,
            title,
            seconds,
            speed,
        } => run_play(&engine, url, title, seconds, speed).await,
        Command::Record { seconds } => run_record(&engine, seconds).await,
    };

    engine.shutdown().await;
    // Let the printer drain the shutdown events before exiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();

    info!("Shutdown complete");
    outcome
}

async fn run_play(
    engine: &AudioEngine,
    url: String,
    title: String,
    seconds: Option<u64>,
    speed: Option<f64>,
) -> Result<()> {
    let episode = Episode::new(uuid::Uuid::new_v4().to_string(), title, url);
    let finished = engine.subscribe_events();

    engine.load_episode(episode).await.context("Failed to load episode")?;
    if let Some(speed) = speed {
        engine.set_playback_speed(speed).await.context("Invalid speed")?;
    }
    engine.play().await.context("Failed to start playback")?;

    let limit = async {
        match seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = limit => info!("Time limit reached"),
        _ = wait_for_finish(finished) => info!("Episode finished"),
        _ = shutdown_signal() => {},
    }

    let snapshot = engine.snapshot().await;
    info!(
        "Stopped at {} / {} ({:.0}%)",
        snapshot.playback.formatted_position(),
        snapshot.playback.formatted_duration(),
        snapshot.playback.progress() * 100.0
    );
    Ok(())
}

async fn run_record(engine: &AudioEngine, seconds: u64) -> Result<()> {
    if seconds == 0 {
        bail!("Recording length must be at least one second");
    }

    engine.start_recording().await.context("Failed to start recording")?;
    info!("Recording for {}", format_duration(seconds));

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {},
        _ = shutdown_signal() => {},
    }

    match engine.stop_recording().await.context("Failed to stop recording")? {
        Some(uri) => info!("Recording saved: {}", uri),
        None => warn!("Nothing was recorded"),
    }
    Ok(())
}

async fn wait_for_finish(mut rx: broadcast::Receiver<CastEvent>) {
    loop {
        match rx.recv().await {
            Ok(CastEvent::PlaybackFinished { .. }) => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<CastEvent>, json: bool) {
    loop {
        match rx.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Could not serialize {}: {}", event.event_type(), e),
            },
            Ok(CastEvent::PlaybackProgress { position_ms, duration_ms, .. }) => {
                info!(
                    "{} / {}",
                    podcast_common::human_time::format_time(position_ms),
                    podcast_common::human_time::format_time(duration_ms)
                );
            }
            Ok(event) => info!("Event: {}", event.event_type()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} events skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Resolves on Ctrl+C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
