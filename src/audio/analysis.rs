use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

use super::decode::AudioData;
use super::features::{sample_time, FeatureSeries, FeatureSet};
use super::spectrum::hamming_window;

pub const FRAME_LENGTH: usize = 2048;
pub const HOP_LENGTH: usize = 512;

/// Samples with magnitude at or below this count as zero for crossing detection.
const ZERO_THRESHOLD: f32 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("frame length and hop length must be non-zero (got {frame_length}/{hop_length})")]
    InvalidFraming {
        frame_length: usize,
        hop_length: usize,
    },
}

/// How a centered frame is filled where it hangs over either end of the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Padding {
    Zero,
    Edge,
}

/// Whole-buffer framed analysis.
///
/// Every call to [`FeatureExtractor::analyze`] processes the entire buffer from
/// scratch: cost is O(total samples) per call. Frames are centered on
/// `j * hop_length`, so a non-empty buffer always yields at least one frame.
pub struct FeatureExtractor {
    frame_length: usize,
    hop_length: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl FeatureExtractor {
    pub fn new(frame_length: usize, hop_length: usize) -> Result<Self, AnalysisError> {
        if frame_length == 0 || hop_length == 0 {
            return Err(AnalysisError::InvalidFraming {
                frame_length,
                hop_length,
            });
        }
        let mut planner = FftPlanner::<f32>::new();
        Ok(Self {
            frame_length,
            hop_length,
            fft: planner.plan_fft_forward(frame_length),
            window: hamming_window(frame_length),
        })
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn analyze(&self, audio: &AudioData) -> FeatureSet {
        let samples = &audio.samples;
        let sr = audio.sample_rate;
        if samples.is_empty() || sr == 0 {
            return FeatureSet {
                sample_rate: sr,
                ..Default::default()
            };
        }

        let num_frames = self.frame_count(samples.len());
        log::debug!(
            "Analyzing {} samples @ {}Hz ({} frames, frame={}, hop={})",
            samples.len(),
            sr,
            num_frames,
            self.frame_length,
            self.hop_length
        );

        let centroids = self.spectral_centroids(samples, sr, num_frames);
        let zcr = self.zero_crossing_rates(samples, num_frames);

        FeatureSet {
            waveform: waveform_series(samples, sr),
            spectral_centroid: FeatureSeries::from_frames(centroids, self.hop_length, sr),
            zero_crossing_rate: FeatureSeries::from_frames(zcr, self.hop_length, sr),
            sample_rate: sr,
        }
    }

    fn frame_count(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let padded = len + 2 * (self.frame_length / 2);
        if padded < self.frame_length {
            return 0;
        }
        1 + (padded - self.frame_length) / self.hop_length
    }

    fn frame(&self, samples: &[f32], index: usize, padding: Padding) -> Vec<f32> {
        let start = (index * self.hop_length) as isize - (self.frame_length / 2) as isize;
        let last = samples.len() - 1;
        (0..self.frame_length)
            .map(|i| {
                let pos = start + i as isize;
                if pos < 0 {
                    match padding {
                        Padding::Zero => 0.0,
                        Padding::Edge => samples[0],
                    }
                } else if pos as usize > last {
                    match padding {
                        Padding::Zero => 0.0,
                        Padding::Edge => samples[last],
                    }
                } else {
                    samples[pos as usize]
                }
            })
            .collect()
    }

    fn spectral_centroids(&self, samples: &[f32], sample_rate: u32, num_frames: usize) -> Vec<f32> {
        let bins = self.frame_length / 2 + 1;
        let bin_hz = sample_rate as f32 / self.frame_length as f32;

        (0..num_frames)
            .into_par_iter()
            .map(|j| {
                let mut buffer: Vec<Complex<f32>> = self
                    .frame(samples, j, Padding::Zero)
                    .iter()
                    .zip(self.window.iter())
                    .map(|(&s, &w)| Complex::new(s * w, 0.0))
                    .collect();
                self.fft.process(&mut buffer);

                let magnitudes: Vec<f32> = buffer[..bins].iter().map(|c| c.norm()).collect();
                spectral_centroid(&magnitudes, bin_hz)
            })
            .collect()
    }

    fn zero_crossing_rates(&self, samples: &[f32], num_frames: usize) -> Vec<f32> {
        (0..num_frames)
            .into_par_iter()
            .map(|j| zero_crossing_rate(&self.frame(samples, j, Padding::Edge)))
            .collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            frame_length: FRAME_LENGTH,
            hop_length: HOP_LENGTH,
            fft: planner.plan_fft_forward(FRAME_LENGTH),
            window: hamming_window(FRAME_LENGTH),
        }
    }
}

/// Full-resolution sample curve; `times[i] = i / sample_rate`.
pub fn waveform_series(samples: &[f32], sample_rate: u32) -> FeatureSeries {
    FeatureSeries {
        times: (0..samples.len())
            .map(|i| sample_time(i, sample_rate))
            .collect(),
        values: samples.to_vec(),
    }
}

/// Magnitude-weighted mean frequency; 0 for a silent frame.
pub fn spectral_centroid(magnitudes: &[f32], bin_hz: f32) -> f32 {
    let total_energy: f32 = magnitudes.iter().sum();
    if total_energy > 1e-10 {
        magnitudes
            .iter()
            .enumerate()
            .map(|(k, &mag)| k as f32 * bin_hz * mag)
            .sum::<f32>()
            / total_energy
    } else {
        0.0
    }
}

/// Fraction of adjacent sample pairs whose sign differs, over the frame length.
/// Zero (and anything within [`ZERO_THRESHOLD`] of it) counts as positive.
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let negative = |x: f32| x < -ZERO_THRESHOLD;
    let crossings = frame
        .windows(2)
        .filter(|w| negative(w[0]) != negative(w[1]))
        .count();
    crossings as f32 / frame.len() as f32
}
