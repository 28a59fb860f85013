//! Speech synthesis stage and its synthesizer collaborator.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{SynthesizedAudio, TranslatedSegment};
use crate::registry::Channel;
use crossbeam_channel::Receiver;
use std::time::Duration;

/// Renders translated text as speech.
pub trait SpeechSynthesizer: Send + 'static {
    /// Synthesizes one segment of text.
    fn synthesize(&mut self, text: &str) -> Result<SynthesizedAudio>;

    /// Returns the name of this synthesizer for logging.
    fn name(&self) -> &str;
}

/// Deterministic synthesizer for tests and the demo run.
///
/// Produces a short burst of silence whose length tracks the text length,
/// so playback timing is roughly speech-shaped without any model.
pub struct MockSynthesizer {
    sample_rate: u32,
    /// Every text this synthesizer was asked to render.
    pub calls: Vec<String>,
}

impl MockSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            calls: Vec::new(),
        }
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn synthesize(&mut self, text: &str) -> Result<SynthesizedAudio> {
        self.calls.push(text.to_string());
        // Roughly 60ms of audio per character.
        let samples = text.chars().count() * self.sample_rate as usize * 60 / 1000;
        Ok(SynthesizedAudio {
            samples: vec![0.0; samples.max(1)],
            sample_rate: self.sample_rate,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Turns translated segments into audio for the playback stage.
///
/// Synthesized audio goes through a drop-oldest hop like captured audio:
/// when playback lags, stale speech is discarded rather than queued into
/// ever-growing delay. A synthesizer failure skips that one segment.
pub struct SynthesisStage {
    input: Receiver<TranslatedSegment>,
    output: Channel<SynthesizedAudio>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl SynthesisStage {
    pub fn new(
        synthesizer: Box<dyn SpeechSynthesizer>,
        input: Receiver<TranslatedSegment>,
        output: Channel<SynthesizedAudio>,
    ) -> Self {
        Self {
            input,
            output,
            synthesizer,
        }
    }
}

impl Stage for SynthesisStage {
    fn name(&self) -> &'static str {
        "synthesis"
    }

    fn step(&mut self) -> std::result::Result<(), StageError> {
        let segment = match self
            .input
            .recv_timeout(Duration::from_millis(defaults::STAGE_POLL_MS))
        {
            Ok(segment) => segment,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return Ok(()),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(StageError::Fatal("input channel closed".to_string()));
            }
        };

        let audio = self
            .synthesizer
            .synthesize(&segment.text)
            .map_err(|e| StageError::Recoverable(format!("synthesis failed: {}", e)))?;
        self.output.send_drop_oldest(audio);
        Ok(())
    }
}
