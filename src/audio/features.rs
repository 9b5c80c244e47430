use serde::Serialize;

/// Seconds at which sample `index` sits. Kept in f64 so every sample of an hours-long
/// buffer still gets its own timestamp.
pub fn sample_time(index: usize, sample_rate: u32) -> f64 {
    index as f64 / sample_rate as f64
}

/// A time-aligned feature curve. `times` is in seconds and never decreases.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeatureSeries {
    pub times: Vec<f64>,
    pub values: Vec<f32>,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frame-indexed series: `times[j] = j * hop / sample_rate`.
    pub fn from_frames(values: Vec<f32>, hop: usize, sample_rate: u32) -> Self {
        let times = (0..values.len())
            .map(|j| sample_time(j * hop, sample_rate))
            .collect();
        Self { times, values }
    }
}

/// The three whole-buffer views produced by the batch extractor.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Raw samples against time (volume over time)
    pub waveform: FeatureSeries,
    /// Spectral centroid in Hz per analysis frame (brightness)
    pub spectral_centroid: FeatureSeries,
    /// Zero-crossing rate per analysis frame, 0.0-1.0 (percussiveness)
    pub zero_crossing_rate: FeatureSeries,
    pub sample_rate: u32,
}
