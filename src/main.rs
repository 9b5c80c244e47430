mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cli::Cli;
use pulsescope::audio::analysis::FeatureExtractor;
use pulsescope::audio::decode::{find_audio_file, SymphoniaDecoder};
use pulsescope::capture::{self, CaptureSource, DeviceCapture};
use pulsescope::config::{self, Config};
use pulsescope::render::{run_render_loop, write_feature_set, JsonLinesSink};
use pulsescope::session::buffer::SessionBuffer;
use pulsescope::session::slot::chunk_slot;
use pulsescope::session::Session;
use pulsescope::visualization::VisualizationKind;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_visualizations {
        println!("Available visualizations:");
        for kind in VisualizationKind::ALL {
            println!("  {}", kind.name());
        }
        return Ok(());
    }

    if cli.list_devices {
        let devices = capture::list_input_devices().context("Failed to list input devices")?;
        println!("Input devices:");
        for name in &devices {
            println!("  {}", name);
        }
        return Ok(());
    }

    // Load config: explicit --config path, or auto-detect pulsescope.toml / user config
    let mut cfg = match cli.config.clone() {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => match config::discover_config() {
            Some(path) => match config::load_config(&path) {
                Ok(cfg) => {
                    log::info!("Loaded config from {}", path.display());
                    cfg
                }
                Err(err) => {
                    log::warn!("Ignoring config {}: {:#}", path.display(), anyhow::Error::from(err));
                    Config::default()
                }
            },
            None => Config::default(),
        },
    };
    cli.apply_to(&mut cfg);
    cfg.validate()?;

    let input: Option<PathBuf> = match (&cli.input, &cli.dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => {
            let found = find_audio_file(dir)
                .with_context(|| format!("Failed to read directory {}", dir.display()))?
                .with_context(|| format!("No audio file found in {}", dir.display()))?;
            log::info!("Using file '{}'", found.display());
            Some(found)
        }
        (None, None) => None,
    };

    match input {
        Some(path) => analyze_file(&path, &cfg, cli.output.as_deref()),
        None => run_live(&cfg, cli.duration, cli.output.as_deref()),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn analyze_file(path: &Path, cfg: &Config, output: Option<&Path>) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extractor = FeatureExtractor::new(cfg.analysis.frame_length, cfg.analysis.hop_length)?;
    let mut buffer = SessionBuffer::new(cfg.capture.sample_rate);
    buffer
        .load(path, &SymphoniaDecoder)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    log::info!(
        "Extracting features (frame={}, hop={})...",
        extractor.frame_length(),
        extractor.hop_length()
    );
    let features = buffer.recompute(&extractor);
    log::info!(
        "Waveform: {} points, spectral centroid: {} frames, zero-crossing rate: {} frames",
        features.waveform.len(),
        features.spectral_centroid.len(),
        features.zero_crossing_rate.len()
    );

    let mut out = open_output(output)?;
    write_feature_set(&mut out, &features).context("Failed to write features")?;
    writeln!(out)?;
    out.flush()?;

    if let Some(path) = output {
        log::info!("Done! Output: {}", path.display());
    }
    Ok(())
}

fn run_live(cfg: &Config, duration: Option<f32>, output: Option<&Path>) -> Result<()> {
    let interval = Duration::from_millis(cfg.render.interval_ms);
    let cycles = match duration {
        Some(secs) if secs <= 0.0 || !secs.is_finite() => {
            anyhow::bail!("Duration must be a positive number of seconds (got {})", secs)
        }
        Some(secs) => Some((secs * 1000.0 / cfg.render.interval_ms as f32).ceil() as u64),
        None => None,
    };

    let (writer, reader) = chunk_slot(cfg.capture.chunk_size);
    let mut session = Session::from_config(cfg, reader)?;
    match session.current() {
        Some(kind) => log::info!("Visualization: {}", kind),
        None => log::info!("No visualization selected"),
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Stopping...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let mut capture = DeviceCapture::open(
        cfg.capture.device.as_deref(),
        cfg.capture.sample_rate,
        cfg.capture.chunk_size,
        writer,
    )
    .context("Failed to open capture device")?;
    capture.start().context("Failed to start capture")?;
    if cycles.is_none() {
        log::info!("Press Ctrl+C to stop");
    }

    let pb = cycles.map(|total| {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} cycles ({eta} remaining)")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb
    });

    let mut sink = JsonLinesSink::new(open_output(output)?);
    let result = run_render_loop(&mut session, &mut sink, interval, cycles, &running, |n| {
        if let Some(ref pb) = pb {
            pb.set_position(n);
        }
    });

    if let Err(err) = capture.stop() {
        log::warn!("Failed to stop capture cleanly: {}", err);
    }
    if let Some(pb) = pb {
        pb.finish_with_message("Capture complete");
    }

    let ran = result.context("Failed to write render output")?;
    let frames = sink.frames();
    sink.into_inner().flush()?;

    log::info!("Rendered {} cycles, {} frames written", ran, frames);
    Ok(())
}
