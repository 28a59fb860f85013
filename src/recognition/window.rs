//! Utterance windowing with flush-on-threshold accumulation.
//!
//! Converts a stream of fixed-size frames into variable-length utterance
//! windows sized for one recognition call. Flushing happens when accumulated
//! duration crosses `min_duration_ms`, not at a fixed frame count, so natural
//! pauses decide where an utterance ends; `max_duration_ms` is a forced-flush
//! safety valve bounding memory and latency.

use crate::config::BufferConfig;

/// Mutable accumulator of audio frames plus cumulative duration.
///
/// At most one window is open per recognition stage; it resets to empty
/// after each flush.
pub struct UtteranceWindow {
    frames: Vec<Vec<f32>>,
    duration_ms: f64,
    config: BufferConfig,
    sample_rate: u32,
}

impl UtteranceWindow {
    pub fn new(config: BufferConfig, sample_rate: u32) -> Self {
        Self {
            frames: Vec::new(),
            duration_ms: 0.0,
            config,
            sample_rate,
        }
    }

    /// Appends a frame; returns a contiguous utterance when a flush triggers.
    ///
    /// A flush triggers when accumulated duration reaches `min_duration_ms`,
    /// or `max_duration_ms` as the forced ceiling. No single emitted
    /// utterance exceeds the ceiling by more than one frame.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        self.duration_ms += samples.len() as f64 * 1000.0 / self.sample_rate as f64;
        self.frames.push(samples.to_vec());

        if self.duration_ms >= self.config.min_duration_ms as f64
            || self.duration_ms >= self.config.max_duration_ms as f64
        {
            self.flush()
        } else {
            None
        }
    }

    /// Concatenates and clears the accumulated frames, if any.
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.frames.is_empty() {
            return None;
        }

        let total: usize = self.frames.iter().map(|f| f.len()).sum();
        let mut utterance = Vec::with_capacity(total);
        for frame in self.frames.drain(..) {
            utterance.extend_from_slice(&frame);
        }
        self.duration_ms = 0.0;
        Some(utterance)
    }

    /// Accumulated duration of the open window in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Discards the open window without emitting.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.duration_ms = 0.0;
    }
}
