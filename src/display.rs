//! Display overlay stage and its sink collaborator.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::TranslatedSegment;
use crossbeam_channel::Receiver;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Presents translated segments to the operator as they arrive.
pub trait DisplaySink: Send + 'static {
    fn show(&mut self, segment: &TranslatedSegment) -> Result<()>;

    /// Returns the name of this sink for logging.
    fn name(&self) -> &str;
}

/// Writes each segment to stdout as a subtitle-style line.
#[derive(Debug, Default)]
pub struct StdoutDisplay;

impl DisplaySink for StdoutDisplay {
    fn show(&mut self, segment: &TranslatedSegment) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        match segment.speaker_id {
            Some(id) => writeln!(stdout, "[Speaker {}] {}", id, segment.text)?,
            None => writeln!(stdout, "{}", segment.text)?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// Sink that collects shown segments, for tests.
#[derive(Clone, Default)]
pub struct CollectorDisplay {
    shown: Arc<Mutex<Vec<TranslatedSegment>>>,
}

impl CollectorDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<TranslatedSegment> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }
}

impl DisplaySink for CollectorDisplay {
    fn show(&mut self, segment: &TranslatedSegment) -> Result<()> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(segment.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Forwards the display branch of the translation fan-out to a sink.
pub struct DisplayStage {
    input: Receiver<TranslatedSegment>,
    sink: Box<dyn DisplaySink>,
}

impl DisplayStage {
    pub fn new(sink: Box<dyn DisplaySink>, input: Receiver<TranslatedSegment>) -> Self {
        Self { input, sink }
    }
}

impl Stage for DisplayStage {
    fn name(&self) -> &'static str {
        "display"
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

        self.sink
            .show(&segment)
            .map_err(|e| StageError::Recoverable(format!("display failed: {}", e)))
    }
}
