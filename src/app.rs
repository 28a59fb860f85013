//! Composition root: builds the channels, wires the stages, and hands back
//! a handle for the running pipeline.

use crate::capture::{AudioSource, CaptureStage};
use crate::config::Config;
use crate::diarization::{EmbeddingExtractor, SpeakerTracker};
use crate::display::{DisplaySink, DisplayStage};
use crate::error::Result;
use crate::pipeline::error::ErrorReporter;
use crate::pipeline::supervisor::Supervisor;
use crate::pipeline::types::{
    AudioFrame, ControlCommand, RecognizedSegment, SynthesizedAudio, TranscriptSegment,
    TranslatedSegment,
};
use crate::playback::{AudioSink, PlaybackStage};
use crate::recognition::{RecognitionStage, SpeechRecognizer};
use crate::registry::ChannelRegistry;
use crate::synthesis::{SpeechSynthesizer, SynthesisStage};
use crate::transcript::TranscriptWriter;
use crate::translation::{TranslationStage, Translator};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Channel names, fixed for one pipeline shape.
pub mod channels {
    pub const AUDIO_IN: &str = "audio-in";
    pub const RECOGNITION_OUT: &str = "recognition-out";
    pub const SYNTHESIS_IN: &str = "synthesis-in";
    pub const DISPLAY_IN: &str = "display-in";
    pub const TRANSCRIPT_IN: &str = "transcript-in";
    pub const PLAYBACK_IN: &str = "playback-in";
    pub const CONTROL: &str = "control";
}

/// Every external collaborator the pipeline needs, injected by the caller.
///
/// Production builds plug in real devices and engines; tests and the demo
/// run plug in mocks. The pipeline itself never constructs a collaborator.
pub struct Collaborators {
    pub source: Box<dyn AudioSource>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    /// Voice embedding backend; `None` disables diarization regardless of
    /// configuration.
    pub embedder: Option<Box<dyn EmbeddingExtractor>>,
    pub translator: Box<dyn Translator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub audio_sink: Box<dyn AudioSink>,
    pub display: Box<dyn DisplaySink>,
}

/// A running pipeline.
///
/// Holds the channel registry alive so no hop disconnects mid-run, and the
/// control sender for pause and resume. Dropping the handle without calling
/// `stop` detaches the stages; they die with the process.
pub struct PipelineHandle {
    supervisor: Supervisor,
    registry: ChannelRegistry,
    control: Sender<ControlCommand>,
}

impl PipelineHandle {
    /// Pauses audio capture; downstream stages drain naturally.
    pub fn pause(&self) -> Result<()> {
        self.control
            .send(ControlCommand::Pause)
            .map_err(|_| crate::error::VoxlateError::Other("control channel closed".to_string()))
    }

    /// Resumes audio capture.
    pub fn resume(&self) -> Result<()> {
        self.control
            .send(ControlCommand::Resume)
            .map_err(|_| crate::error::VoxlateError::Other("control channel closed".to_string()))
    }

    /// Names of stages that died while the run was live.
    pub fn poll_health(&self) -> Vec<&'static str> {
        self.supervisor.poll_health()
    }

    /// True when at least one stage has died.
    pub fn any_dead(&self) -> bool {
        self.supervisor.any_dead()
    }

    pub fn stage_count(&self) -> usize {
        self.supervisor.stage_count()
    }

    /// The run-scoped channel registry, for inspection.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Stops the pipeline cooperatively and waits for the stages.
    pub fn stop(self) {
        self.supervisor.stop();
    }
}

/// Builds the channels, spawns every configured stage, and starts the flow.
pub fn start(
    config: &Config,
    collaborators: Collaborators,
    reporter: Arc<dyn ErrorReporter>,
) -> Result<PipelineHandle> {
    config.validate()?;

    let mut registry = ChannelRegistry::new();
    let caps = config.channels;
    let audio = registry.create::<AudioFrame>(channels::AUDIO_IN, caps.audio)?;
    let recognition =
        registry.create::<RecognizedSegment>(channels::RECOGNITION_OUT, caps.recognition)?;
    let synthesis = registry.create::<TranslatedSegment>(channels::SYNTHESIS_IN, caps.synthesis)?;
    let display = registry.create::<TranslatedSegment>(channels::DISPLAY_IN, caps.display)?;
    let transcript =
        registry.create::<TranscriptSegment>(channels::TRANSCRIPT_IN, caps.transcript)?;
    let playback = registry.create::<SynthesizedAudio>(channels::PLAYBACK_IN, caps.playback)?;
    let control = registry.create::<ControlCommand>(channels::CONTROL, caps.control)?;

    let tracker = match collaborators.embedder {
        Some(embedder) if config.diarization.enabled => {
            Some(SpeakerTracker::new(config.diarization, embedder))
        }
        _ => None,
    };

    let mut supervisor = Supervisor::with_reporter(reporter);

    supervisor.spawn(CaptureStage::new(
        &config.audio,
        collaborators.source,
        audio.clone(),
        control.rx.clone(),
    ));
    supervisor.spawn(RecognitionStage::new(
        &config.audio,
        config.buffer,
        collaborators.recognizer,
        tracker,
        audio.rx.clone(),
        recognition.tx.clone(),
    ));
    supervisor.spawn(TranslationStage::new(
        &config.translation,
        collaborators.translator,
        recognition.rx.clone(),
        synthesis.tx.clone(),
        display.tx.clone(),
        config.transcript.enabled.then(|| transcript.tx.clone()),
    ));
    supervisor.spawn(SynthesisStage::new(
        collaborators.synthesizer,
        synthesis.rx.clone(),
        playback.clone(),
    ));
    supervisor.spawn(PlaybackStage::new(
        collaborators.audio_sink,
        playback.rx.clone(),
    ));
    supervisor.spawn(DisplayStage::new(
        collaborators.display,
        display.rx.clone(),
    ));
    if config.transcript.enabled {
        supervisor.spawn(TranscriptWriter::new(
            config.transcript.clone(),
            transcript.rx.clone(),
        ));
    }

    Ok(PipelineHandle {
        supervisor,
        registry,
        control: control.tx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockAudioSource;
    use crate::display::CollectorDisplay;
    use crate::pipeline::error::LogReporter;
    use crate::playback::CollectorSink;
    use crate::recognition::MockRecognizer;
    use crate::synthesis::MockSynthesizer;
    use crate::translation::MockTranslator;

    fn mock_collaborators() -> Collaborators {
        Collaborators {
            source: Box::new(MockAudioSource::new()),
            recognizer: Box::new(MockRecognizer::new()),
            embedder: None,
            translator: Box::new(MockTranslator::new("vi")),
            synthesizer: Box::new(MockSynthesizer::new(16000)),
            audio_sink: Box::new(CollectorSink::new()),
            display: Box::new(CollectorDisplay::new()),
        }
    }

    #[test]
    fn test_start_spawns_all_stages() {
        let mut config = Config::default();
        config.transcript.enabled = false;

        let handle = start(&config, mock_collaborators(), Arc::new(LogReporter)).unwrap();
        assert_eq!(handle.stage_count(), 6);
        assert!(handle.registry().contains(channels::AUDIO_IN));
        assert!(handle.registry().contains(channels::CONTROL));
        handle.stop();
    }

    #[test]
    fn test_transcript_stage_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.transcript.enabled = true;
        config.transcript.output_dir = dir.path().to_path_buf();

        let handle = start(&config, mock_collaborators(), Arc::new(LogReporter)).unwrap();
        assert_eq!(handle.stage_count(), 7);
        handle.stop();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(start(&config, mock_collaborators(), Arc::new(LogReporter)).is_err());
    }

    #[test]
    fn test_pause_and_resume_reach_control_channel() {
        let mut config = Config::default();
        config.transcript.enabled = false;

        let handle = start(&config, mock_collaborators(), Arc::new(LogReporter)).unwrap();
        handle.pause().unwrap();
        handle.resume().unwrap();
        handle.stop();
    }
}
