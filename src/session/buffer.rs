use std::path::Path;

use crate::audio::analysis::FeatureExtractor;
use crate::audio::decode::{AudioData, DecodeError, Decoder};
use crate::audio::features::FeatureSet;

/// Growable sample accumulator backing both file mode and stream-accumulate mode.
///
/// After [`reset`](SessionBuffer::reset) the buffer holds a single zero sample so there
/// is always something to plot. That placeholder is dropped by the next append, which
/// makes `reset → append(X)` hold exactly the samples of X.
#[derive(Clone, Debug)]
pub struct SessionBuffer {
    audio: AudioData,
    placeholder: bool,
}

impl SessionBuffer {
    /// Empty session at `sample_rate`, already in the reset state.
    pub fn new(sample_rate: u32) -> Self {
        let mut buffer = Self {
            audio: AudioData {
                samples: Vec::new(),
                sample_rate,
            },
            placeholder: false,
        };
        buffer.reset();
        buffer
    }

    pub fn from_audio(audio: AudioData) -> Self {
        Self {
            audio,
            placeholder: false,
        }
    }

    pub fn audio(&self) -> &AudioData {
        &self.audio
    }

    pub fn len(&self) -> usize {
        self.audio.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.samples.is_empty()
    }

    /// Replace the whole buffer with a decoded file. On failure nothing changes.
    pub fn load(&mut self, path: &Path, decoder: &dyn Decoder) -> Result<(), DecodeError> {
        log::info!("Loading {}...", path.display());
        let audio = decoder.load(path)?;
        log::info!(
            "Loaded {} (SR: {} Hz, {:.1}s)",
            path.display(),
            audio.sample_rate,
            audio.duration()
        );
        self.audio = audio;
        self.placeholder = false;
        Ok(())
    }

    pub fn append_chunk(&mut self, chunk: &[f32]) {
        if chunk.is_empty() {
            return;
        }
        if self.placeholder {
            self.audio.samples.clear();
            self.placeholder = false;
        }
        self.audio.samples.extend_from_slice(chunk);
    }

    /// Truncate to a single zero sample, keeping the sample rate.
    pub fn reset(&mut self) {
        self.audio.samples.clear();
        self.audio.samples.push(0.0);
        self.placeholder = true;
    }

    /// Rerun every analysis over the entire current buffer (not incremental).
    pub fn recompute(&self, extractor: &FeatureExtractor) -> FeatureSet {
        extractor.analyze(&self.audio)
    }
}
