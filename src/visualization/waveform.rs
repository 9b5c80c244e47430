use serde::Serialize;

/// Weight of the previous smoothed waveform in the exponential average.
pub const HISTORY_WEIGHT: f32 = 0.8;

/// RMS below which the waveform is drawn in the calm color.
pub const CALM_THRESHOLD: f32 = 0.0025;
/// RMS below which (and at or above [`CALM_THRESHOLD`]) it is drawn in the active color.
pub const ACTIVE_THRESHOLD: f32 = 0.010;

/// Loudness bucket for the waveform pen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveColor {
    Calm,
    Active,
    Loud,
}

impl WaveColor {
    pub fn from_amplitude(amplitude: f32) -> Self {
        if amplitude < CALM_THRESHOLD {
            WaveColor::Calm
        } else if amplitude < ACTIVE_THRESHOLD {
            WaveColor::Active
        } else {
            WaveColor::Loud
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            WaveColor::Calm => [0, 180, 255],
            WaveColor::Active => [0, 255, 150],
            WaveColor::Loud => [255, 50, 180],
        }
    }
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Exponentially smoothed waveform, colored by its loudness.
#[derive(Clone, Debug, Default)]
pub struct Waveform {
    smoothed: Option<Vec<f32>>,
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[f32]) -> (WaveColor, Vec<f32>) {
        let smoothed = match self.smoothed.take() {
            Some(mut prev) if prev.len() == chunk.len() => {
                for (p, &c) in prev.iter_mut().zip(chunk) {
                    *p = HISTORY_WEIGHT * *p + (1.0 - HISTORY_WEIGHT) * c;
                }
                prev
            }
            _ => chunk.to_vec(),
        };
        let color = WaveColor::from_amplitude(rms(&smoothed));
        self.smoothed = Some(smoothed.clone());
        (color, smoothed)
    }
}
