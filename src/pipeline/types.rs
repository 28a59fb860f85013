//! Message types flowing between pipeline stages.

use std::time::SystemTime;

/// A frame of raw mono audio samples at a declared sample rate.
///
/// Immutable once produced; ownership moves through the channel to the
/// consuming stage.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Mono samples, normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
    /// Wall-clock capture time.
    pub captured_at: SystemTime,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32, sequence: u64) -> Self {
        Self {
            samples,
            sample_rate,
            sequence,
            captured_at: SystemTime::now(),
        }
    }

    /// Frame duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Recognized text for one utterance, with optional speaker attribution.
#[derive(Debug, Clone)]
pub struct RecognizedSegment {
    pub text: String,
    /// `None` when diarization is disabled or the utterance was too short
    /// for a reliable embedding.
    pub speaker_id: Option<u32>,
    pub timestamp: SystemTime,
}

/// Translated text routed to synthesis and the display overlay.
#[derive(Debug, Clone)]
pub struct TranslatedSegment {
    pub text: String,
    pub speaker_id: Option<u32>,
    pub timestamp: SystemTime,
}

/// Translation plus its source text, for the transcript merger.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub text: String,
    pub original: String,
    pub speaker_id: Option<u32>,
    pub timestamp: SystemTime,
}

/// Synthesized speech ready for playback.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Operator commands for the capture stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
}
