//! Audio playback stage and its sink collaborator.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::SynthesizedAudio;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Plays synthesized audio on an output device.
pub trait AudioSink: Send + 'static {
    /// Plays one burst of audio, blocking until it has been handed to the
    /// device.
    fn play(&mut self, audio: &SynthesizedAudio) -> Result<()>;

    /// Returns the name of this sink for logging.
    fn name(&self) -> &str;
}

/// Sink that collects everything it is asked to play, for tests and the
/// demo run.
#[derive(Clone, Default)]
pub struct CollectorSink {
    played: Arc<Mutex<Vec<SynthesizedAudio>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SynthesizedAudio> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().map(|played| played.len()).unwrap_or(0)
    }
}

impl AudioSink for CollectorSink {
    fn play(&mut self, audio: &SynthesizedAudio) -> Result<()> {
        if let Ok(mut played) = self.played.lock() {
            played.push(audio.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Drains the playback channel into the sink.
///
/// A failed play skips that burst; the device owning the sink decides
/// whether to buffer or block.
pub struct PlaybackStage {
    input: Receiver<SynthesizedAudio>,
    sink: Box<dyn AudioSink>,
}

impl PlaybackStage {
    pub fn new(sink: Box<dyn AudioSink>, input: Receiver<SynthesizedAudio>) -> Self {
        Self { input, sink }
    }
}

impl Stage for PlaybackStage {
    fn name(&self) -> &'static str {
        "playback"
    }

    fn step(&mut self) -> std::result::Result<(), StageError> {
        let audio = match self
            .input
            .recv_timeout(Duration::from_millis(defaults::STAGE_POLL_MS))
        {
            Ok(audio) => audio,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return Ok(()),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(StageError::Fatal("input channel closed".to_string()));
            }
        };

        self.sink
            .play(&audio)
            .map_err(|e| StageError::Recoverable(format!("playback failed: {}", e)))
    }
}
