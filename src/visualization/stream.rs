use crate::audio::analysis::FeatureExtractor;
use crate::audio::features::FeatureSet;
use crate::session::buffer::SessionBuffer;

/// Live chunks treated as a growing file: every update appends the chunk and reruns
/// the batch extractor over everything captured since the state was entered.
#[derive(Clone, Debug)]
pub struct AudioStream {
    buffer: SessionBuffer,
}

impl AudioStream {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            buffer: SessionBuffer::new(sample_rate),
        }
    }

    pub fn buffer(&self) -> &SessionBuffer {
        &self.buffer
    }

    pub fn update(&mut self, chunk: &[f32], extractor: &FeatureExtractor) -> FeatureSet {
        self.buffer.append_chunk(chunk);
        self.buffer.recompute(extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_every_update() {
        let extractor = FeatureExtractor::default();
        let mut stream = AudioStream::new(44100);
        stream.update(&[0.1; 1024], &extractor);
        let set = stream.update(&[0.2; 1024], &extractor);
        assert_eq!(set.waveform.len(), 2048);
        assert_eq!(set.waveform.values[0], 0.1);
        assert_eq!(set.waveform.values[2047], 0.2);
        assert_eq!(set.spectral_centroid.len(), 1 + 2048 / 512);
    }

    #[test]
    fn fresh_state_starts_from_placeholder() {
        let stream = AudioStream::new(48000);
        assert_eq!(stream.buffer().audio().samples, vec![0.0]);
        assert_eq!(stream.buffer().audio().sample_rate, 48000);
    }
}
