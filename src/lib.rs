//! Audio feature pipeline for real-time and file-based visualization.
//!
//! Raw PCM comes in either as a decoded file or as fixed-size capture chunks and
//! leaves as drawable arrays: bar heights, lines, polygons, or whole-buffer
//! feature series (waveform, spectral centroid, zero-crossing rate).

pub mod audio;
pub mod capture;
pub mod config;
pub mod render;
pub mod session;
pub mod visualization;
