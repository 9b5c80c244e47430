//! End-to-end tests through the public API: capture slot → session → renderables,
//! and file decode → batch features.

use std::f32::consts::PI;
use std::path::Path;

use pulsescope::audio::analysis::FeatureExtractor;
use pulsescope::audio::decode::{DecodeError, SymphoniaDecoder};
use pulsescope::audio::spectrum::SpectrumEngine;
use pulsescope::config::Config;
use pulsescope::session::buffer::SessionBuffer;
use pulsescope::session::slot::chunk_slot;
use pulsescope::session::Session;
use pulsescope::visualization::{Renderable, VisualizationKind};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SAMPLE_RATE: u32 = 44100;
const CHUNK: usize = 2048;

fn sine(freq_hz: f32, num_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Deterministic pseudo-noise in [-1, 1].
fn noise(num_samples: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn session(chunk_size: usize, amplification: f32) -> (pulsescope::session::slot::ChunkWriter, Session) {
    let mut config = Config::default();
    config.capture.chunk_size = chunk_size;
    config.analysis.amplification = amplification;
    config.validate().unwrap();
    let (writer, reader) = chunk_slot(chunk_size);
    (writer, Session::from_config(&config, reader).unwrap())
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

// ===========================================================================
// 1. Live chunk path
// ===========================================================================

#[test]
fn tone_peaks_at_expected_bin() {
    let expected_bin = (440.0f32 * CHUNK as f32 / SAMPLE_RATE as f32).round() as usize;
    let (mut writer, mut session) = session(CHUNK, 100.0);
    writer.publish(&sine(440.0, CHUNK, 0.5));

    session.select(VisualizationKind::FrequencyBars);
    let Some(Renderable::Bars { heights }) = session.tick().unwrap() else {
        panic!("expected bars");
    };
    let peak = argmax(&heights);
    assert!(
        (peak as i32 - expected_bin as i32).unsigned_abs() <= 2,
        "peak bin {peak} should be near {expected_bin}"
    );

    session.select(VisualizationKind::SpectrumLine);
    let Some(Renderable::Line { values }) = session.tick().unwrap() else {
        panic!("expected line");
    };
    let max = values.iter().copied().fold(0.0f32, f32::max);
    assert_eq!(values[expected_bin], max);
}

#[test]
fn unclipped_tone_peaks_exactly_at_bin() {
    let expected_bin = (440.0f32 * CHUNK as f32 / SAMPLE_RATE as f32).round() as usize;
    let (mut writer, mut session) = session(CHUNK, 1.0);
    writer.publish(&sine(440.0, CHUNK, 0.5));
    session.select(VisualizationKind::SpectrumLine);
    let Some(Renderable::Line { values }) = session.tick().unwrap() else {
        panic!("expected line");
    };
    assert_eq!(argmax(&values), expected_bin);
}

#[test]
fn bars_decay_after_signal_stops() {
    let (mut writer, mut session) = session(CHUNK, 100.0);
    session.select(VisualizationKind::FrequencyBars);
    writer.publish(&sine(440.0, CHUNK, 0.5));
    let Some(Renderable::Bars { heights: loud }) = session.tick().unwrap() else {
        panic!("expected bars");
    };
    let bin = argmax(&loud);
    assert_eq!(loud[bin], 1.0);

    let mut expected = 1.0f32;
    for _ in 0..4 {
        writer.publish(&vec![0.0; CHUNK]);
        let Some(Renderable::Bars { heights }) = session.tick().unwrap() else {
            panic!("expected bars");
        };
        expected *= 0.7;
        assert!((heights[bin] - expected).abs() < 1e-6);
    }
}

#[test]
fn spectrum_stays_in_unit_range_for_any_input() {
    let mut engine = SpectrumEngine::default();
    for seed in 1..20 {
        let chunk = noise(1024, seed);
        for bins in [1, 128, 180, 512, 513] {
            let spectrum = engine.compute(&chunk, bins).unwrap();
            assert_eq!(spectrum.len(), bins);
            assert!(spectrum.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}

#[test]
fn every_view_is_idempotent_under_repeated_chunk() {
    for kind in VisualizationKind::ALL {
        let (mut writer, mut session) = session(1024, 100.0);
        session.select(kind);
        writer.publish(&noise(1024, 7));
        session.tick().unwrap();
        writer.publish(&sine(3000.0, 1024, 0.05));
        let first = session.tick().unwrap();
        let second = session.tick().unwrap();
        assert!(first.is_some());
        assert_eq!(first, second, "{kind} is not idempotent");
    }
}

#[test]
fn circular_and_stereo_invariants_hold_on_noise() {
    let (mut writer, mut session) = session(1024, 100.0);
    writer.publish(&noise(1024, 42));

    session.select(VisualizationKind::CircularSpectrum);
    let Some(Renderable::Polygon { points }) = session.tick().unwrap() else {
        panic!("expected polygon");
    };
    assert_eq!(points.len(), 181);
    assert_eq!(points.first(), points.last());

    session.select(VisualizationKind::StereoBars);
    let Some(Renderable::MirroredBars { top, bottom }) = session.tick().unwrap() else {
        panic!("expected mirrored bars");
    };
    assert_eq!(top.len(), 1024 / 4);
    assert!(top.iter().zip(&bottom).all(|(t, b)| *t == -*b));
    // mirrored around the centre
    let half = top.len() / 2;
    for i in 0..half {
        assert_eq!(top[half - 1 - i], top[half + i]);
    }
}

// ===========================================================================
// 2. File / accumulate path
// ===========================================================================

#[test]
fn streamed_chunks_match_loaded_file() {
    let signal: Vec<f32> = sine(660.0, 3 * 1024, 0.4)
        .iter()
        .zip(noise(3 * 1024, 3))
        .map(|(s, n)| s + 0.05 * n)
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_wav(&path, &signal);

    let extractor = FeatureExtractor::default();

    let mut from_file = SessionBuffer::new(SAMPLE_RATE);
    from_file.load(&path, &SymphoniaDecoder).unwrap();
    let file_features = from_file.recompute(&extractor);

    let mut streamed = SessionBuffer::new(SAMPLE_RATE);
    streamed.append_chunk(&[0.9; 16]);
    streamed.reset();
    for chunk in signal.chunks(1024) {
        streamed.append_chunk(chunk);
    }
    let stream_features = streamed.recompute(&extractor);

    assert_eq!(file_features, stream_features);
}

#[test]
fn bad_file_leaves_buffer_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.wav");
    std::fs::write(&path, b"RIFF\x00\x00\x00\x00garbage").unwrap();

    let mut buffer = SessionBuffer::new(SAMPLE_RATE);
    buffer.append_chunk(&[0.25; 100]);
    let err = buffer.load(&path, &SymphoniaDecoder).unwrap_err();
    assert!(!matches!(err, DecodeError::Open { .. }));
    assert_eq!(buffer.audio().samples, vec![0.25; 100]);

    let missing = buffer.load(&dir.path().join("nope.flac"), &SymphoniaDecoder);
    assert!(matches!(missing, Err(DecodeError::Open { .. })));
    assert_eq!(buffer.len(), 100);
}

#[test]
fn feature_series_are_aligned_for_any_length() {
    let extractor = FeatureExtractor::default();
    for len in [1, 2, 100, 2047, 2049, 9000] {
        let mut buffer = SessionBuffer::new(SAMPLE_RATE);
        buffer.append_chunk(&noise(len, len as u32));
        let set = buffer.recompute(&extractor);
        for series in [&set.waveform, &set.spectral_centroid, &set.zero_crossing_rate] {
            assert_eq!(series.times.len(), series.values.len());
            assert!(series.times.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
