use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;
use thiserror::Error;

/// Gain applied on top of the `|X| / N` normalization before clipping.
pub const DEFAULT_AMPLIFICATION: f32 = 100.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    #[error("requested {requested} bins, but a {chunk_len}-sample chunk only has {available}")]
    TooManyBins {
        requested: usize,
        available: usize,
        chunk_len: usize,
    },
}

/// Number of non-negative frequency bins a real FFT of `chunk_len` samples produces.
pub fn max_bins(chunk_len: usize) -> usize {
    chunk_len / 2 + 1
}

/// Symmetric Hamming window (`0.54 - 0.46 cos(2πn / (N-1))`).
pub fn hamming_window(size: usize) -> Vec<f32> {
    match size {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / (size - 1) as f32).cos())
            .collect(),
    }
}

/// Per-chunk magnitude spectrum.
///
/// Output is `|X_k| * amplification / N` for the first `bin_count` bins, clipped to
/// `[0, 1]`. The FFT plan and window are cached for the last chunk length seen; there
/// is no other state, so identical input always gives identical output.
pub struct SpectrumEngine {
    planner: FftPlanner<f32>,
    fft: Option<Arc<dyn Fft<f32>>>,
    window: Vec<f32>,
    amplification: f32,
}

impl SpectrumEngine {
    pub fn new(amplification: f32) -> Self {
        Self {
            planner: FftPlanner::new(),
            fft: None,
            window: Vec::new(),
            amplification,
        }
    }

    fn resize(&mut self, size: usize) -> Arc<dyn Fft<f32>> {
        match &self.fft {
            Some(fft) if self.window.len() == size => Arc::clone(fft),
            _ => {
                let fft = self.planner.plan_fft_forward(size);
                self.window = hamming_window(size);
                self.fft = Some(Arc::clone(&fft));
                fft
            }
        }
    }

    pub fn compute(&mut self, chunk: &[f32], bin_count: usize) -> Result<Vec<f32>, SpectrumError> {
        let n = chunk.len();
        let available = max_bins(n);
        if bin_count > available {
            return Err(SpectrumError::TooManyBins {
                requested: bin_count,
                available,
                chunk_len: n,
            });
        }
        if n == 0 {
            return Ok(vec![0.0; bin_count]);
        }

        let fft = self.resize(n);
        let mut buffer: Vec<Complex<f32>> = chunk
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buffer);

        let scale = self.amplification / n as f32;
        // max/min rather than clamp so a NaN magnitude collapses to 0
        Ok(buffer[..bin_count]
            .iter()
            .map(|c| (c.norm() * scale).max(0.0).min(1.0))
            .collect())
    }
}

impl Default for SpectrumEngine {
    fn default() -> Self {
        Self::new(DEFAULT_AMPLIFICATION)
    }
}
