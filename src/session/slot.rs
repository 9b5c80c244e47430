//! Single-slot hand-off between the capture callback and the render cycle.
//!
//! The writer overwrites, the reader always sees the most recent complete chunk. There
//! is no queue: chunks the reader never got to are dropped, and a reader that runs
//! faster than capture sees the same frame (same `seq`) again.

use triple_buffer::{Input, Output, TripleBuffer};

/// A published chunk. `seq` grows by one per publish; 0 is the silent startup chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureFrame {
    pub seq: u64,
    pub samples: Vec<f32>,
}

impl CaptureFrame {
    pub fn silent(chunk_size: usize) -> Self {
        Self {
            seq: 0,
            samples: vec![0.0; chunk_size],
        }
    }
}

pub struct ChunkWriter {
    input: Input<CaptureFrame>,
    seq: u64,
}

pub struct ChunkReader {
    output: Output<CaptureFrame>,
}

/// Create a connected writer/reader pair, primed with a silent chunk.
pub fn chunk_slot(chunk_size: usize) -> (ChunkWriter, ChunkReader) {
    let (input, output) = TripleBuffer::new(&CaptureFrame::silent(chunk_size)).split();
    (ChunkWriter { input, seq: 0 }, ChunkReader { output })
}

impl ChunkWriter {
    /// Publish a copy of `samples`, replacing whatever the reader has not picked up yet.
    ///
    /// The copy goes into the back buffer the slot already owns, so publishing chunks no
    /// longer than the slot was primed with never allocates.
    pub fn publish(&mut self, samples: &[f32]) -> u64 {
        self.seq += 1;
        let frame = self.input.input_buffer();
        frame.seq = self.seq;
        frame.samples.clear();
        frame.samples.extend_from_slice(samples);
        self.input.publish();
        self.seq
    }

    pub fn published(&self) -> u64 {
        self.seq
    }
}

impl ChunkReader {
    /// Freshest frame available. Never blocks.
    pub fn latest(&mut self) -> &CaptureFrame {
        self.output.read()
    }
}
