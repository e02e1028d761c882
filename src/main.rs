//! face-retarget - Real-time face retargeting
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use face_retarget::{
    config::Config,
    output::{JsonLinesRenderer, Renderer, TraceRenderer},
    retarget::{FrameDriver, FrameTick, RetargetCycle, VocabularyMap},
    tracking::mediapipe::MpReceiver,
};

/// face-retarget - drive an avatar rig from MediaPipe face tracking
#[derive(Parser, Debug)]
#[command(name = "face-retarget", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MediaPipe UDP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Display refresh rate in Hz (overrides config)
    #[arg(long)]
    refresh_hz: Option<u32>,

    /// Write one JSON rig snapshot per frame to stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the expression vocabulary and exit
    #[arg(long)]
    print_vocabulary: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging. Logs go to stderr so stdout stays clean for snapshots.
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!(
        "Starting {} v{}",
        face_retarget::NAME,
        face_retarget::VERSION
    );

    if args.print_vocabulary {
        print_vocabulary();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    if let Some(port) = args.port {
        config.mediapipe.port = port;
    }
    if let Some(hz) = args.refresh_hz {
        config.driver.refresh_hz = hz;
    }
    if args.json {
        config.output.json = true;
    }

    config.validate()?;

    let cycle = RetargetCycle::from_config(&config)?;
    info!(
        "Rig ready: {} meshes, eyes {}/{}, head {}",
        cycle.rig().meshes().len(),
        config.rig.left_eye,
        config.rig.right_eye,
        config.rig.head
    );

    let mut tracker = MpReceiver::new(&config.mediapipe);
    tracker.start()?;

    let renderer: Box<dyn Renderer> = if config.output.json {
        Box::new(JsonLinesRenderer::new(std::io::stdout()))
    } else {
        Box::new(TraceRenderer::new(u64::from(config.driver.refresh_hz) * 10))
    };

    let driver = FrameDriver::new(
        cycle,
        tracker,
        renderer,
        config.driver.video_plane_pixels_per_unit,
    );

    // Everything runs on this thread; the detector call is synchronous
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()?;

    let mut driver = runtime.block_on(run_host_loop(driver, config.driver.refresh_hz));

    let stats = driver.cycle().stats().clone();
    info!(
        "Frames: {} applied, {} not ready, {} detector failures, {} malformed poses",
        stats.applied, stats.not_ready, stats.detector_failures, stats.malformed_poses
    );
    if let Some(err) = &stats.last_error {
        warn!("Last error: {}", err);
    }

    driver.tracker_mut().stop();
    info!("face-retarget stopped");
    Ok(())
}

/// Tick the driver at the refresh rate until Ctrl+C / SIGTERM
async fn run_host_loop<D: FrameTick>(mut driver: D, refresh_hz: u32) -> D {
    let period = Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1)));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Driving frames at {} Hz", refresh_hz);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            _ = interval.tick() => {
                let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                driver.tick(timestamp_ms);
            }
        }
    }

    driver
}

fn print_vocabulary() {
    let vocabulary = VocabularyMap::shared();
    let mut entries: Vec<_> = vocabulary.entries().collect();
    entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));

    println!("{} expression mappings:", vocabulary.len());
    for (detector_name, rig_target) in entries {
        println!("  {:<20} -> {}", detector_name, rig_target);
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
