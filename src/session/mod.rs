pub mod buffer;
pub mod slot;

use crate::audio::analysis::{AnalysisError, FeatureExtractor};
use crate::audio::spectrum::{SpectrumEngine, SpectrumError};
use crate::config::Config;
use crate::visualization::{AnalysisContext, Renderable, VisualizationKind, Visualizer};

use slot::ChunkReader;

/// Render-side half of a live session: the slot reader plus the active visualization.
pub struct Session {
    reader: ChunkReader,
    visualizer: Visualizer,
}

impl Session {
    pub fn new(reader: ChunkReader, visualizer: Visualizer) -> Self {
        Self { reader, visualizer }
    }

    /// Build the analysis stack from `config` and pre-select its startup view.
    pub fn from_config(config: &Config, reader: ChunkReader) -> Result<Self, AnalysisError> {
        let context = AnalysisContext {
            spectrum: SpectrumEngine::new(config.analysis.amplification),
            extractor: FeatureExtractor::new(config.analysis.frame_length, config.analysis.hop_length)?,
        };
        let mut visualizer = Visualizer::new(
            context,
            config.capture.chunk_size,
            config.capture.sample_rate,
        );
        if let Some(kind) = config.initial_visualization() {
            visualizer.select(kind);
        }
        Ok(Self::new(reader, visualizer))
    }

    pub fn current(&self) -> Option<VisualizationKind> {
        self.visualizer.current()
    }

    pub fn select(&mut self, kind: VisualizationKind) {
        self.visualizer.select(kind);
    }

    pub fn select_by_name(&mut self, name: &str) -> bool {
        self.visualizer.select_by_name(name)
    }

    /// One render cycle: take the freshest chunk and run the active view over it.
    pub fn tick(&mut self) -> Result<Option<Renderable>, SpectrumError> {
        let frame = self.reader.latest();
        self.visualizer.update(frame)
    }
}
