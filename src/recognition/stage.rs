//! Recognition stage: frames in, attributed sentences out.

use crate::config::{AudioConfig, BufferConfig};
use crate::defaults;
use crate::diarization::SpeakerTracker;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{AudioFrame, RecognizedSegment};
use crate::recognition::recognizer::SpeechRecognizer;
use crate::recognition::sentence::SentenceAssembler;
use crate::recognition::window::UtteranceWindow;
use crossbeam_channel::{Receiver, Sender};
use std::time::{Duration, SystemTime};

/// Consumes audio frames, windows them into utterances, attributes a speaker,
/// transcribes, and emits complete sentences.
///
/// A recognizer failure on one utterance is recoverable: the utterance is
/// dropped and the stream continues. Only a closed output channel is fatal.
pub struct RecognitionStage {
    input: Receiver<AudioFrame>,
    output: Sender<RecognizedSegment>,
    recognizer: Box<dyn SpeechRecognizer>,
    tracker: Option<SpeakerTracker>,
    window: UtteranceWindow,
    assembler: SentenceAssembler,
    sample_rate: u32,
}

impl RecognitionStage {
    pub fn new(
        audio: &AudioConfig,
        buffer: BufferConfig,
        recognizer: Box<dyn SpeechRecognizer>,
        tracker: Option<SpeakerTracker>,
        input: Receiver<AudioFrame>,
        output: Sender<RecognizedSegment>,
    ) -> Self {
        Self {
            input,
            output,
            recognizer,
            tracker,
            window: UtteranceWindow::new(buffer, audio.sample_rate),
            assembler: SentenceAssembler::new(),
            sample_rate: audio.sample_rate,
        }
    }

    /// Runs one utterance through identification and transcription, emitting
    /// any completed sentences.
    fn process_utterance(&mut self, utterance: &[f32]) -> Result<(), StageError> {
        // Identification failure degrades to an unattributed segment; the
        // error is still surfaced after the segment has been emitted.
        let mut embed_error = None;
        let speaker_id = match &mut self.tracker {
            Some(tracker) => match tracker.identify(utterance, self.sample_rate) {
                Ok(id) => id,
                Err(error) => {
                    embed_error = Some(error.to_string());
                    None
                }
            },
            None => None,
        };

        let text = self
            .recognizer
            .transcribe(utterance, self.sample_rate)
            .map_err(|e| StageError::Recoverable(format!("transcription failed: {}", e)))?;

        for sentence in self.assembler.push(&text) {
            self.emit(sentence, speaker_id)?;
        }

        match embed_error {
            Some(message) => Err(StageError::Recoverable(format!(
                "speaker identification failed: {}",
                message
            ))),
            None => Ok(()),
        }
    }

    fn emit(&self, text: String, speaker_id: Option<u32>) -> Result<(), StageError> {
        let segment = RecognizedSegment {
            text,
            speaker_id,
            timestamp: SystemTime::now(),
        };
        match self
            .output
            .send_timeout(segment, Duration::from_millis(defaults::SEND_BACKOFF_MS))
        {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::SendTimeoutError::Timeout(segment)) => Err(
                StageError::Recoverable(format!("output full, dropped: '{}'", segment.text)),
            ),
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                Err(StageError::Fatal("output channel closed".to_string()))
            }
        }
    }
}

impl Stage for RecognitionStage {
    fn name(&self) -> &'static str {
        "recognition"
    }

    fn setup(&mut self) -> Result<(), StageError> {
        if !self.recognizer.is_ready() {
            return Err(StageError::Fatal(format!(
                "recognizer '{}' not ready",
                self.recognizer.name()
            )));
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), StageError> {
        let frame = match self
            .input
            .recv_timeout(Duration::from_millis(defaults::STAGE_POLL_MS))
        {
            Ok(frame) => frame,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return Ok(()),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(StageError::Fatal("input channel closed".to_string()));
            }
        };

        match self.window.push(&frame.samples) {
            Some(utterance) => self.process_utterance(&utterance),
            None => Ok(()),
        }
    }

    fn cleanup(&mut self) {
        // Drain the open window and the sentence buffer so trailing speech
        // still reaches the transcript.
        if let Some(utterance) = self.window.flush()
            && let Ok(text) = self.recognizer.transcribe(&utterance, self.sample_rate)
        {
            let _ = self.assembler.push(&text);
        }
        if let Some(text) = self.assembler.flush() {
            let speaker_id = self.tracker.as_ref().and_then(|t| t.current_speaker());
            let _ = self.output.try_send(RecognizedSegment {
                text,
                speaker_id,
                timestamp: SystemTime::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiarizationConfig;
    use crate::diarization::MockEmbeddingExtractor;
    use crate::recognition::recognizer::MockRecognizer;
    use crossbeam_channel::bounded;

    fn frame(samples: usize) -> AudioFrame {
        AudioFrame::new(vec![0.1; samples], 16000, 0)
    }

    fn stage(
        recognizer: MockRecognizer,
        tracker: Option<SpeakerTracker>,
    ) -> (RecognitionStage, Sender<AudioFrame>, Receiver<RecognizedSegment>) {
        let (in_tx, in_rx) = bounded(100);
        let (out_tx, out_rx) = bounded(100);
        let stage = RecognitionStage::new(
            &AudioConfig::default(),
            BufferConfig::default(),
            Box::new(recognizer),
            tracker,
            in_rx,
            out_tx,
        );
        (stage, in_tx, out_rx)
    }

    #[test]
    fn test_forty_frames_produce_one_sentence() {
        let recognizer = MockRecognizer::with_responses(&["Hello everyone."]);
        let (mut stage, in_tx, out_rx) = stage(recognizer, None);

        // 40 frames x 64ms = 2560ms, crossing the 2500ms flush threshold.
        for _ in 0..40 {
            in_tx.send(frame(1024)).unwrap();
            stage.step().unwrap();
        }

        let segment = out_rx.try_recv().unwrap();
        assert_eq!(segment.text, "Hello everyone.");
        assert!(segment.speaker_id.is_none());
        assert!(out_rx.try_recv().is_err(), "exactly one segment expected");
    }

    #[test]
    fn test_incomplete_sentence_is_held_until_punctuated() {
        let recognizer = MockRecognizer::with_responses(&["this is the start", "and the end."]);
        let (mut stage, in_tx, out_rx) = stage(recognizer, None);

        for _ in 0..80 {
            in_tx.send(frame(1024)).unwrap();
            stage.step().unwrap();
        }

        let segment = out_rx.try_recv().unwrap();
        assert_eq!(segment.text, "this is the start and the end.");
    }

    #[test]
    fn test_recognizer_failure_is_recoverable() {
        let mut recognizer = MockRecognizer::new();
        recognizer.push_error(crate::error::VoxlateError::Recognition {
            message: "backend busy".to_string(),
        });
        let (mut stage, in_tx, out_rx) = stage(recognizer, None);

        let mut saw_error = false;
        for _ in 0..40 {
            in_tx.send(frame(1024)).unwrap();
            match stage.step() {
                Ok(()) => {}
                Err(StageError::Recoverable(_)) => saw_error = true,
                Err(other) => panic!("unexpected {:?}", other),
            }
        }
        assert!(saw_error);
        assert!(out_rx.try_recv().is_err(), "failed utterance is dropped");
    }

    #[test]
    fn test_empty_transcription_emits_nothing() {
        let recognizer = MockRecognizer::new(); // always returns ""
        let (mut stage, in_tx, out_rx) = stage(recognizer, None);

        for _ in 0..40 {
            in_tx.send(frame(1024)).unwrap();
            stage.step().unwrap();
        }
        assert!(out_rx.try_recv().is_err());
    }

    #[test]
    fn test_segments_carry_speaker_attribution() {
        let extractor = MockEmbeddingExtractor::constant(vec![1.0, 0.0, 0.0]);
        let tracker = SpeakerTracker::new(DiarizationConfig::default(), Box::new(extractor));
        let recognizer = MockRecognizer::with_responses(&["Attributed sentence."]);
        let (mut stage, in_tx, out_rx) = stage(recognizer, Some(tracker));

        for _ in 0..40 {
            in_tx.send(frame(1024)).unwrap();
            stage.step().unwrap();
        }

        let segment = out_rx.try_recv().unwrap();
        assert_eq!(segment.speaker_id, Some(1));
    }

    #[test]
    fn test_cleanup_flushes_trailing_text() {
        let recognizer = MockRecognizer::with_responses(&["trailing words"]);
        let (mut stage, in_tx, out_rx) = stage(recognizer, None);

        for _ in 0..40 {
            in_tx.send(frame(1024)).unwrap();
            stage.step().unwrap();
        }
        assert!(out_rx.try_recv().is_err(), "no terminal punctuation yet");

        stage.cleanup();
        let segment = out_rx.try_recv().unwrap();
        assert_eq!(segment.text, "trailing words");
    }
}
