use clap::Parser;
use std::path::PathBuf;

use pulsescope::config::{self, Config};

#[derive(Parser, Debug)]
#[command(name = "pulsescope", about = "Audio feature extraction and visualization data pipeline")]
pub struct Cli {
    /// Audio file to analyze (WAV, MP3, FLAC, OGG, M4A). Omit for live capture.
    pub input: Option<PathBuf>,

    /// Analyze the first supported audio file found in this directory
    #[arg(long, conflicts_with = "input")]
    pub dir: Option<PathBuf>,

    /// Output file (JSON). Writes to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Live visualization (e.g. "Frequency Bars", circular-spectrum)
    #[arg(short, long)]
    pub visualization: Option<String>,

    /// Live capture length in seconds. Runs until interrupted when omitted.
    #[arg(long)]
    pub duration: Option<f32>,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = config::default_sample_rate())]
    pub sample_rate: u32,

    /// Samples per capture chunk
    #[arg(long, default_value_t = config::default_chunk_size())]
    pub chunk_size: usize,

    /// Render cycle interval in milliseconds
    #[arg(long, default_value_t = config::default_interval_ms())]
    pub interval_ms: u64,

    /// Input device name (see --list-devices)
    #[arg(long)]
    pub device: Option<String>,

    /// Spectrum gain applied before clipping to 0-1
    #[arg(long)]
    pub amplification: Option<f32>,

    /// Config file (defaults to ./pulsescope.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List available visualizations and exit
    #[arg(long)]
    pub list_visualizations: bool,

    /// List audio input devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Cli {
    /// CLI values win over the config file wherever they differ from their defaults.
    pub fn apply_to(&self, cfg: &mut Config) {
        if self.sample_rate != config::default_sample_rate() { cfg.capture.sample_rate = self.sample_rate; }
        if self.chunk_size != config::default_chunk_size() { cfg.capture.chunk_size = self.chunk_size; }
        if self.interval_ms != config::default_interval_ms() { cfg.render.interval_ms = self.interval_ms; }
        if self.device.is_some() {
            cfg.capture.device = self.device.clone();
        }
        if self.visualization.is_some() {
            cfg.render.visualization = self.visualization.clone();
        }
        if let Some(gain) = self.amplification {
            cfg.analysis.amplification = gain;
        }
    }
}
