//! Render sinks and the timer-driven render cycle.

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::audio::features::FeatureSet;
use crate::session::Session;
use crate::visualization::Renderable;

/// Whatever draws the output. The pipeline never looks at how.
pub trait RenderSink {
    fn present(&mut self, renderable: &Renderable) -> std::io::Result<()>;
}

#[derive(Serialize)]
struct Line<'a> {
    frame: u64,
    output: &'a Renderable,
}

/// One JSON object per presented frame, newline separated.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    frames: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn present(&mut self, renderable: &Renderable) -> std::io::Result<()> {
        let line = Line {
            frame: self.frames,
            output: renderable,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }
}

/// Pretty-printed feature set, as written by file mode.
pub fn write_feature_set<W: Write>(writer: W, features: &FeatureSet) -> std::io::Result<()> {
    serde_json::to_writer_pretty(writer, features)?;
    Ok(())
}

/// Drive `session` at a fixed `interval`, presenting every renderable to `sink`.
///
/// Runs `cycles` times, or until `running` is cleared when `None`. `running` is checked
/// before every cycle in both cases. A cycle whose view cannot be computed is skipped
/// with a warning (logged once per run). `on_cycle` sees the cycle count after each
/// cycle. Returns the number of cycles run.
pub fn run_render_loop<S: RenderSink>(
    session: &mut Session,
    sink: &mut S,
    interval: Duration,
    cycles: Option<u64>,
    running: &AtomicBool,
    mut on_cycle: impl FnMut(u64),
) -> std::io::Result<u64> {
    let mut count = 0u64;
    let mut warned = false;

    while running.load(Ordering::SeqCst) && cycles.map_or(true, |limit| count < limit) {
        let started = Instant::now();

        match session.tick() {
            Ok(Some(renderable)) => sink.present(&renderable)?,
            Ok(None) => {}
            Err(err) => {
                if !warned {
                    log::warn!("Skipping render cycle: {}", err);
                    warned = true;
                }
            }
        }

        count += 1;
        on_cycle(count);

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    Ok(count)
}
