//! Live input: a cpal stream that downmixes to mono, re-blocks device buffers into
//! fixed-size chunks, and publishes each chunk into the session slot.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::session::slot::ChunkWriter;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,
    #[error("input device '{0}' not found")]
    DeviceNotFound(String),
    #[error("failed to enumerate input devices")]
    Devices(#[from] cpal::DevicesError),
    #[error("failed to query input device config")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream")]
    Play(#[from] cpal::PlayStreamError),
    #[error("failed to pause input stream")]
    Pause(#[from] cpal::PauseStreamError),
}

/// Something that produces chunks on its own thread until stopped.
pub trait CaptureSource {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<(), CaptureError>;
    fn is_active(&self) -> bool;
}

/// Turns interleaved device buffers of any size into mono chunks of exactly
/// `chunk_size` samples.
pub struct ChunkAssembler {
    chunk_size: usize,
    staging: Vec<f32>,
    writer: ChunkWriter,
}

impl ChunkAssembler {
    pub fn new(chunk_size: usize, writer: ChunkWriter) -> Self {
        Self {
            chunk_size,
            staging: Vec::with_capacity(chunk_size),
            writer,
        }
    }

    /// Feed one device buffer. While the gate is closed nothing is published and any
    /// partially filled chunk is dropped, so capture resumes on a clean boundary.
    pub fn push(&mut self, data: &[f32], channels: usize, open: bool) -> usize {
        if !open {
            self.discard_partial();
            return 0;
        }
        self.push_interleaved(data, channels)
    }

    /// Returns how many complete chunks were published.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let mut published = 0;
        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            self.staging.push(mono);
            if self.staging.len() == self.chunk_size {
                self.writer.publish(&self.staging);
                self.staging.clear();
                published += 1;
            }
        }
        published
    }

    pub fn discard_partial(&mut self) {
        self.staging.clear();
    }
}

/// Shared on/off switch between the control thread and the audio callback.
#[derive(Clone, Debug, Default)]
pub struct CaptureGate {
    open: Arc<AtomicBool>,
}

impl CaptureGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Run `start` and open the gate only if it succeeds.
    pub fn open_after<E>(&self, start: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
        start()?;
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    /// Close the gate, then run `stop`. The gate stays closed whatever `stop` returns.
    pub fn close_then<E>(&self, stop: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
        self.open.store(false, Ordering::Release);
        stop()
    }
}

/// cpal-backed capture from the default (or a named) input device.
pub struct DeviceCapture {
    stream: Stream,
    gate: CaptureGate,
    device_name: String,
}

impl DeviceCapture {
    /// Open the device and build its stream in the stopped state.
    pub fn open(
        device_name: Option<&str>,
        sample_rate: u32,
        chunk_size: usize,
        writer: ChunkWriter,
    ) -> Result<Self, CaptureError> {
        let device = find_device(device_name)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let default_config = device.default_input_config()?;
        let config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let channels = config.channels as usize;

        log::info!("Using audio device: {}", name);
        log::info!(
            "Capture config: {} channel(s) @ {} Hz, {}-sample chunks",
            channels,
            sample_rate,
            chunk_size
        );

        let gate = CaptureGate::new();
        let callback_gate = gate.clone();
        let mut assembler = ChunkAssembler::new(chunk_size, writer);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                assembler.push(data, channels, callback_gate.is_open());
            },
            |err| {
                log::warn!("Audio stream error: {}", err);
            },
            None,
        )?;

        // Some hosts start a stream as soon as it is built.
        if let Err(err) = stream.pause() {
            log::debug!("Could not pause freshly built stream: {}", err);
        }

        Ok(Self {
            stream,
            gate,
            device_name: name,
        })
    }
}

impl CaptureSource for DeviceCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        let stream = &self.stream;
        self.gate.open_after(|| stream.play())?;
        log::info!("Capture started on {}", self.device_name);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        // Closing the gate first stops publication even if the host refuses to pause.
        let stream = &self.stream;
        self.gate.close_then(|| stream.pause())?;
        log::info!("Capture stopped");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.gate.is_open()
    }
}

fn find_device(name: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_string())),
        None => host.default_input_device().ok_or(CaptureError::NoDevice),
    }
}

/// Names of every input device on the default host.
pub fn list_input_devices() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    Ok(host
        .input_devices()?
        .filter_map(|d| d.name().ok())
        .collect())
}
