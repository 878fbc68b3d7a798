//! Demo CLI: reads a CSV of synthetic per-frame detections and drives the
//! tracker frame by frame, printing active and terminated tracks as it goes.
//!
//! Not part of the library surface — a thin embedding example showing how a
//! pipeline would call [`vidtrack_core::Tracker`].

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use vidtrack_core::{Detection, Rect, Timestamp, Tracker, TrackerConfig};

/// Drive the tracker over a CSV of detections.
#[derive(Debug, Parser)]
#[command(name = "vidtrack-demo", author, version)]
struct Args {
    /// CSV with columns: frame,seconds,x,y,width,height
    #[arg(short, long)]
    detections: PathBuf,

    /// Optional TOML config overriding the tracker defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct DetectionRow {
    frame: u64,
    seconds: f64,
    x: f64,
    y: f64,
    width: f32,
    height: f32,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TrackerConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(TrackerConfig::from_toml_str(&text)?)
        }
        None => Ok(TrackerConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "vidtrack_core=info,warn");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let mut tracker = Tracker::new(config)?;

    let mut reader = csv::Reader::from_path(&args.detections)?;
    let mut rows_by_frame: Vec<(u64, f64, Vec<DetectionRow>)> = Vec::new();
    for result in reader.deserialize() {
        let row: DetectionRow = result?;
        match rows_by_frame.last_mut() {
            Some((frame, _, rows)) if *frame == row.frame => rows.push(row),
            _ => rows_by_frame.push((row.frame, row.seconds, vec![row])),
        }
    }

    for (frame, seconds, rows) in rows_by_frame {
        let detections: Vec<Detection> = rows
            .into_iter()
            .map(|row| {
                Detection::new(
                    (row.x, row.y),
                    (row.x, row.y, 0.0),
                    Rect::new(row.x as f32, row.y as f32, row.width, row.height),
                )
            })
            .collect();

        if let Err(err) = tracker.step(Timestamp::new(frame, seconds), &detections, None) {
            tracing::error!(frame, %err, "rejected frame");
            continue;
        }

        for track in tracker.active_tracks() {
            let state = track.last_state();
            println!(
                "frame {frame}: track {} status={:?} location=({:.2}, {:.2})",
                track.id, track.status, state.location.0, state.location.1
            );
        }
        for track in tracker.terminated_tracks() {
            println!(
                "frame {frame}: track {} terminated, cause={:?}, states={}",
                track.id,
                track.termination_cause,
                track.history.len()
            );
        }
    }

    Ok(())
}
