//! kirinuki: replay a recorded pointer trace through the capture
//! engine and write the extracted sticker.
//!
//! Reads a source image and a JSON pointer trace (an array of
//! `{"phase": "down|move|up|cancel", "position": {"x": .., "y": ..}}`
//! events in viewport coordinates), drives a `CaptureSession` with
//! them, and saves the extracted region as a PNG with a transparent
//! background. Useful for testing traces offline and for scripting
//! batch cut-outs.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kirinuki -- photo.png trace.json -o sticker.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kirinuki_core::{
    CaptureConfig, CaptureSession, Dimensions, PointerEvent, PointerOutcome, StrokePhase,
};

/// Replay a pointer trace through the kirinuki capture engine.
#[derive(Parser)]
#[command(name = "kirinuki", version)]
struct Cli {
    /// Path to the source image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Path to the JSON pointer trace.
    trace_path: PathBuf,

    /// Output path for the extracted sticker (PNG recommended).
    #[arg(short, long)]
    output: PathBuf,

    /// Viewport size as "WIDTHxHEIGHT". Defaults to the source image
    /// dimensions.
    #[arg(long, value_name = "WxH")]
    viewport: Option<String>,

    /// Closeness threshold in viewport pixels.
    #[arg(long)]
    close_distance: Option<u32>,

    /// Minimum number of stroke samples.
    #[arg(long)]
    min_samples: Option<usize>,

    /// Disable the magnifier inset in preview frames.
    #[arg(long)]
    no_magnifier: bool,

    /// Also write the final preview frame (image, dashed overlay,
    /// magnifier inset) to this path.
    #[arg(long, value_name = "PATH")]
    preview_out: Option<PathBuf>,

    /// Full capture config as a JSON string. When provided, the other
    /// config flags are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

fn main() -> ExitCode {
    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Reading image from {}", cli.image_path.display());
    let source = image::open(&cli.image_path)?.to_rgba8();

    let viewport = match &cli.viewport {
        Some(spec) => parse_viewport(spec)?,
        None => {
            let (w, h) = source.dimensions();
            Dimensions::new(w, h)
        }
    };

    let config = build_config(cli)?;

    eprintln!("Reading trace from {}", cli.trace_path.display());
    let trace_bytes = std::fs::read(&cli.trace_path)?;
    let events: Vec<PointerEvent> = serde_json::from_slice(&trace_bytes)?;
    if events.is_empty() {
        return Err("trace contains no pointer events".into());
    }

    let mut session = CaptureSession::new(config, viewport);
    session.set_image(source);

    eprintln!(
        "Replaying {} events over a {}x{} viewport...",
        events.len(),
        viewport.width,
        viewport.height,
    );

    let mut sticker = None;
    for event in events {
        match session.handle_pointer(event)? {
            PointerOutcome::Ignored | PointerOutcome::StrokeExtended => {}
            PointerOutcome::ClosureReady => {
                // Unattended replay: accept the extraction directly.
                sticker = Some(session.confirm()?);
            }
        }
    }

    let Some(sticker) = sticker else {
        return Err(match session.phase() {
            StrokePhase::Active => "trace never released the pointer (no up/cancel event)".into(),
            _ => "trace produced no extraction".into(),
        });
    };

    let (w, h) = sticker.dimensions();
    eprintln!("Extracted {w}x{h} sticker, saving to {}", cli.output.display());
    sticker.save(&cli.output)?;

    if let Some(preview_path) = &cli.preview_out {
        let frame = session.render_preview()?;
        eprintln!("Saving preview frame to {}", preview_path.display());
        frame.save(preview_path)?;
    }

    eprintln!("Done.");
    Ok(())
}

/// Build the capture config from CLI flags, or from `--config-json`.
fn build_config(cli: &Cli) -> Result<CaptureConfig, Box<dyn std::error::Error>> {
    if let Some(json) = &cli.config_json {
        return Ok(serde_json::from_str(json)?);
    }

    let mut config = CaptureConfig::default();
    if let Some(distance) = cli.close_distance {
        config.close_distance = distance;
    }
    if let Some(minimum) = cli.min_samples {
        config.min_samples = minimum;
    }
    if cli.no_magnifier {
        config.magnifier_enabled = false;
    }
    Ok(config)
}

/// Parse a "WIDTHxHEIGHT" viewport specification.
fn parse_viewport(spec: &str) -> Result<Dimensions, String> {
    let (w_str, h_str) = spec
        .split_once('x')
        .ok_or_else(|| format!("viewport must be 'WIDTHxHEIGHT', got: '{spec}'"))?;
    let width: u32 = w_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid viewport width '{w_str}': {e}"))?;
    let height: u32 = h_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid viewport height '{h_str}': {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("viewport dimensions must be positive, got: '{spec}'"));
    }
    Ok(Dimensions::new(width, height))
}
