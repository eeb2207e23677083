use anyhow::{Context, Result, bail};
use clap::Parser;
use color_probe::acquisition::{CaptureSession, SessionState, StillImageSource};
use color_probe::{ColorProbe, FrameChannel, ProbeConfig};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Samples and classifies colors at chosen points of an image, run through a
/// capture session exactly as live camera frames would be.
#[derive(Parser, Debug)]
#[command(name = "probe_tester")]
struct Args {
    /// Image file to serve as the camera frame.
    #[arg(long)]
    image: PathBuf,

    /// TOML configuration file.
    #[arg(long, env = "COLOR_PROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Point to sample, as `row,col`. May be repeated.
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<(i64, i64)>,

    /// Number of frames to capture before sampling.
    #[arg(long, default_value_t = 3)]
    frames: u64,
}

fn parse_point(raw: &str) -> Result<(i64, i64), String> {
    let (row, col) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected row,col but got {raw:?}"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row in {raw:?}: {e}"))?;
    let col = col.trim().parse().map_err(|e| format!("bad column in {raw:?}: {e}"))?;
    Ok((row, col))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // --- 1. Configuration ---
    let config = ProbeConfig::load_from(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("loading config {}", path.display()),
        None => "loading default config".to_string(),
    })?;
    let probe = ColorProbe::new(&config)?;
    let frame_limit = config.capture.max_frames.map_or(args.frames, |cap| cap.min(args.frames));
    if frame_limit == 0 {
        bail!("nothing to capture: frame limit is 0");
    }

    // --- 2. Capture ---
    let channel = Arc::new(FrameChannel::new());
    let mut session = CaptureSession::new(Arc::clone(&channel));
    let mut states = session.subscribe();
    let source_info = session.open(StillImageSource::new(&args.image).with_frame_limit(frame_limit))?;
    session.start_capture(config.capture.fps)?;
    let final_state = states
        .wait_for(|s| matches!(s, SessionState::Stopped | SessionState::Error(_)))
        .await?
        .clone();
    if let Err(e) = session.stop_capture().await {
        warn!("Capture task did not shut down cleanly: {e}");
    }
    if let SessionState::Error(reason) = &final_state {
        warn!("Capture ended with an error: {reason}");
    }
    info!(
        "Captured {} frame(s) of {}x{}",
        channel.frames_published(),
        source_info.width,
        source_info.height
    );

    // --- 3. Sampling ---
    let points = if args.points.is_empty() {
        vec![(source_info.height as i64 / 2, source_info.width as i64 / 2)]
    } else {
        args.points.clone()
    };
    let Some(samples) = probe.sample_latest(&channel, &points) else {
        bail!("no frame was captured from {}", args.image.display());
    };

    // --- 4. Report ---
    for sample in samples {
        match sample.classification {
            Some(hit) => println!(
                "({}, {}) {} -> {} (distance {:.2})",
                sample.row, sample.col, sample.color, hit.name, hit.distance
            ),
            None => println!("({}, {}) {} -> unclassified", sample.row, sample.col, sample.color),
        }
    }

    session.close().await?;
    Ok(())
}
