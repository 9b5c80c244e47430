//! Per-type visualization states and the selector that switches between them.
//!
//! Each [`Visualization`] variant owns its own history. Switching type always builds a
//! fresh state, so smoothing never carries over from one view to another.

pub mod bars;
pub mod circular;
pub mod stream;
pub mod waveform;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::audio::analysis::FeatureExtractor;
use crate::audio::features::FeatureSet;
use crate::audio::spectrum::{SpectrumEngine, SpectrumError};
use crate::session::slot::CaptureFrame;

use bars::FrequencyBars;
use circular::CIRCLE_BINS;
use stream::AudioStream;
use waveform::{WaveColor, Waveform};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualizationKind {
    FrequencyBars,
    Waveform,
    SpectrumLine,
    CircularSpectrum,
    StereoBars,
    AudioStream,
}

impl VisualizationKind {
    pub const ALL: [VisualizationKind; 6] = [
        VisualizationKind::FrequencyBars,
        VisualizationKind::Waveform,
        VisualizationKind::SpectrumLine,
        VisualizationKind::CircularSpectrum,
        VisualizationKind::StereoBars,
        VisualizationKind::AudioStream,
    ];

    /// Display name, as offered in the type selector.
    pub fn name(self) -> &'static str {
        match self {
            VisualizationKind::FrequencyBars => "Frequency Bars",
            VisualizationKind::Waveform => "Waveform",
            VisualizationKind::SpectrumLine => "Spectrum Line",
            VisualizationKind::CircularSpectrum => "Circular Spectrum",
            VisualizationKind::StereoBars => "Stereo Bars",
            VisualizationKind::AudioStream => "Audio Stream",
        }
    }

    /// Spectrum length this view consumes for a chunk of `chunk_len` samples.
    /// `None` for views that work on the raw chunk.
    pub fn bin_count(self, chunk_len: usize) -> Option<usize> {
        match self {
            VisualizationKind::FrequencyBars | VisualizationKind::SpectrumLine => Some(chunk_len / 2),
            VisualizationKind::CircularSpectrum => Some(CIRCLE_BINS),
            VisualizationKind::StereoBars => Some(chunk_len / 8),
            VisualizationKind::Waveform | VisualizationKind::AudioStream => None,
        }
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown visualization '{0}'")]
pub struct UnknownSelector(pub String);

impl FromStr for VisualizationKind {
    type Err = UnknownSelector;

    /// Accepts display names ("Circular Spectrum") as well as kebab/snake spellings
    /// ("circular-spectrum", "circular_spectrum"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        VisualizationKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownSelector(s.to_string()))
    }
}

/// What a render sink draws for one cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Renderable {
    Bars { heights: Vec<f32> },
    Waveform { color: WaveColor, rgb: [u8; 3], samples: Vec<f32> },
    Line { values: Vec<f32> },
    Polygon { points: Vec<[f32; 2]> },
    MirroredBars { top: Vec<f32>, bottom: Vec<f32> },
    Series(FeatureSet),
}

/// Shared analysis machinery handed to whichever state is active.
pub struct AnalysisContext {
    pub spectrum: SpectrumEngine,
    pub extractor: FeatureExtractor,
}

/// The active visualization and its private history.
#[derive(Clone, Debug)]
pub enum Visualization {
    FrequencyBars(FrequencyBars),
    Waveform(Waveform),
    SpectrumLine,
    CircularSpectrum,
    StereoBars,
    AudioStream(AudioStream),
}

impl Visualization {
    pub fn new(kind: VisualizationKind, chunk_size: usize, sample_rate: u32) -> Self {
        match kind {
            VisualizationKind::FrequencyBars => {
                Visualization::FrequencyBars(FrequencyBars::new(chunk_size / 2))
            }
            VisualizationKind::Waveform => Visualization::Waveform(Waveform::new()),
            VisualizationKind::SpectrumLine => Visualization::SpectrumLine,
            VisualizationKind::CircularSpectrum => Visualization::CircularSpectrum,
            VisualizationKind::StereoBars => Visualization::StereoBars,
            VisualizationKind::AudioStream => Visualization::AudioStream(AudioStream::new(sample_rate)),
        }
    }

    pub fn kind(&self) -> VisualizationKind {
        match self {
            Visualization::FrequencyBars(_) => VisualizationKind::FrequencyBars,
            Visualization::Waveform(_) => VisualizationKind::Waveform,
            Visualization::SpectrumLine => VisualizationKind::SpectrumLine,
            Visualization::CircularSpectrum => VisualizationKind::CircularSpectrum,
            Visualization::StereoBars => VisualizationKind::StereoBars,
            Visualization::AudioStream(_) => VisualizationKind::AudioStream,
        }
    }

    pub fn update(
        &mut self,
        chunk: &[f32],
        context: &mut AnalysisContext,
    ) -> Result<Renderable, SpectrumError> {
        let bins = self.kind().bin_count(chunk.len());
        let spectrum = match bins {
            // an empty chunk has no frequency content, whatever the view asks for
            Some(count) if chunk.is_empty() => vec![0.0; count],
            Some(count) => context.spectrum.compute(chunk, count)?,
            None => Vec::new(),
        };

        Ok(match self {
            Visualization::FrequencyBars(bars) => Renderable::Bars {
                heights: bars.update(&spectrum),
            },
            Visualization::Waveform(wave) => {
                let (color, samples) = wave.update(chunk);
                Renderable::Waveform {
                    color,
                    rgb: color.rgb(),
                    samples,
                }
            }
            Visualization::SpectrumLine => Renderable::Line { values: spectrum },
            Visualization::CircularSpectrum => Renderable::Polygon {
                points: circular::polygon(&spectrum),
            },
            Visualization::StereoBars => {
                let (top, bottom) = bars::stereo_bars(&spectrum);
                Renderable::MirroredBars { top, bottom }
            }
            Visualization::AudioStream(stream) => {
                Renderable::Series(stream.update(chunk, &context.extractor))
            }
        })
    }
}

/// Selector plus the active state.
///
/// `update` only advances history for a frame it has not seen yet; handing it the same
/// capture frame again returns the previous output unchanged.
pub struct Visualizer {
    context: AnalysisContext,
    chunk_size: usize,
    sample_rate: u32,
    current: Option<Visualization>,
    last: Option<(u64, Renderable)>,
}

impl Visualizer {
    pub fn new(context: AnalysisContext, chunk_size: usize, sample_rate: u32) -> Self {
        Self {
            context,
            chunk_size,
            sample_rate,
            current: None,
            last: None,
        }
    }

    pub fn current(&self) -> Option<VisualizationKind> {
        self.current.as_ref().map(Visualization::kind)
    }

    /// Switch to `kind`, discarding all history, even when `kind` is already active.
    pub fn select(&mut self, kind: VisualizationKind) {
        log::debug!("Switching visualization to {}", kind);
        self.current = Some(Visualization::new(kind, self.chunk_size, self.sample_rate));
        self.last = None;
    }

    /// Select by display name. Unknown names leave the current state as it was.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match name.parse::<VisualizationKind>() {
            Ok(kind) => {
                self.select(kind);
                true
            }
            Err(err) => {
                log::debug!("Ignoring selection: {}", err);
                false
            }
        }
    }

    pub fn update(&mut self, frame: &CaptureFrame) -> Result<Option<Renderable>, SpectrumError> {
        let Some(state) = self.current.as_mut() else {
            return Ok(None);
        };
        if let Some((seq, renderable)) = &self.last {
            if *seq == frame.seq {
                return Ok(Some(renderable.clone()));
            }
        }
        let renderable = state.update(&frame.samples, &mut self.context)?;
        self.last = Some((frame.seq, renderable.clone()));
        Ok(Some(renderable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const CHUNK: usize = 2048;
    const SR: u32 = 44100;

    fn visualizer() -> Visualizer {
        let context = AnalysisContext {
            spectrum: SpectrumEngine::default(),
            extractor: FeatureExtractor::default(),
        };
        Visualizer::new(context, CHUNK, SR)
    }

    fn frame(seq: u64, samples: Vec<f32>) -> CaptureFrame {
        CaptureFrame { seq, samples }
    }

    fn tone(freq: f32, amplitude: f32) -> Vec<f32> {
        (0..CHUNK)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    #[test]
    fn parses_display_and_cli_names() {
        assert_eq!("Frequency Bars".parse::<VisualizationKind>(), Ok(VisualizationKind::FrequencyBars));
        assert_eq!("circular-spectrum".parse::<VisualizationKind>(), Ok(VisualizationKind::CircularSpectrum));
        assert_eq!("stereo_bars".parse::<VisualizationKind>(), Ok(VisualizationKind::StereoBars));
        assert_eq!(" AUDIO STREAM ".parse::<VisualizationKind>(), Ok(VisualizationKind::AudioStream));
        assert!("Spectrogram".parse::<VisualizationKind>().is_err());
        for kind in VisualizationKind::ALL {
            assert_eq!(kind.name().parse::<VisualizationKind>(), Ok(kind));
        }
    }

    #[test]
    fn nothing_renders_before_first_selection() {
        let mut viz = visualizer();
        assert_eq!(viz.current(), None);
        assert_eq!(viz.update(&frame(1, tone(440.0, 0.5))).unwrap(), None);
    }

    #[test]
    fn unknown_selector_is_a_no_op() {
        let mut viz = visualizer();
        viz.select(VisualizationKind::Waveform);
        assert!(!viz.select_by_name("Laser Show"));
        assert_eq!(viz.current(), Some(VisualizationKind::Waveform));
    }

    #[test]
    fn reselecting_discards_history() {
        let mut viz = visualizer();
        viz.select(VisualizationKind::FrequencyBars);
        viz.update(&frame(1, tone(440.0, 0.5))).unwrap();
        viz.select(VisualizationKind::FrequencyBars);
        let Some(Renderable::Bars { heights }) = viz.update(&frame(2, vec![0.0; CHUNK])).unwrap()
        else {
            panic!("expected bars");
        };
        assert!(heights.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn output_shapes_match_view() {
        let mut viz = visualizer();
        let input = frame(1, tone(1000.0, 0.3));

        viz.select(VisualizationKind::FrequencyBars);
        assert!(matches!(viz.update(&input).unwrap(), Some(Renderable::Bars { heights }) if heights.len() == CHUNK / 2));

        viz.select(VisualizationKind::SpectrumLine);
        assert!(matches!(viz.update(&input).unwrap(), Some(Renderable::Line { values }) if values.len() == CHUNK / 2));

        viz.select(VisualizationKind::CircularSpectrum);
        let Some(Renderable::Polygon { points }) = viz.update(&input).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(points.len(), 181);
        assert_eq!(points[0], points[180]);

        viz.select(VisualizationKind::StereoBars);
        let Some(Renderable::MirroredBars { top, bottom }) = viz.update(&input).unwrap() else {
            panic!("expected mirrored bars");
        };
        assert_eq!(top.len(), CHUNK / 4);
        assert!(top.iter().zip(&bottom).all(|(t, b)| *t == -*b));

        viz.select(VisualizationKind::Waveform);
        assert!(matches!(viz.update(&input).unwrap(), Some(Renderable::Waveform { color: WaveColor::Loud, rgb: [255, 50, 180], samples }) if samples.len() == CHUNK));

        viz.select(VisualizationKind::AudioStream);
        let Some(Renderable::Series(set)) = viz.update(&input).unwrap() else {
            panic!("expected series");
        };
        assert_eq!(set.waveform.len(), CHUNK);
    }

    #[test]
    fn repeated_frame_gives_identical_output_for_every_view() {
        for kind in VisualizationKind::ALL {
            let mut viz = visualizer();
            viz.select(kind);
            viz.update(&frame(1, tone(300.0, 0.8))).unwrap();
            let repeated = frame(2, tone(2500.0, 0.01));
            let first = viz.update(&repeated).unwrap();
            let second = viz.update(&repeated).unwrap();
            assert_eq!(first, second, "{} changed on a repeated frame", kind);
        }
    }

    #[test]
    fn small_chunk_cannot_feed_circular_view() {
        let mut viz = visualizer();
        viz.select(VisualizationKind::CircularSpectrum);
        assert!(viz.update(&frame(1, vec![0.0; 256])).is_err());
    }

    #[test]
    fn empty_chunk_renders_every_view_without_error() {
        for kind in VisualizationKind::ALL {
            let mut viz = visualizer();
            viz.select(kind);
            let rendered = viz.update(&frame(1, Vec::new())).unwrap();
            assert!(rendered.is_some(), "{} gave nothing", kind);
        }

        let mut viz = visualizer();
        viz.select(VisualizationKind::CircularSpectrum);
        let Some(Renderable::Polygon { points }) = viz.update(&frame(1, Vec::new())).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(points.len(), CIRCLE_BINS + 1);
        assert_eq!(points[0], [circular::BASE_RADIUS, 0.0]);
    }
}
