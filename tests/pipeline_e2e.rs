//! End-to-end pipeline run against scripted collaborators.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use voxlate::app::{self, Collaborators};
use voxlate::capture::MockAudioSource;
use voxlate::config::Config;
use voxlate::diarization::MockEmbeddingExtractor;
use voxlate::display::CollectorDisplay;
use voxlate::pipeline::error::LogReporter;
use voxlate::playback::CollectorSink;
use voxlate::recognition::MockRecognizer;
use voxlate::synthesis::MockSynthesizer;
use voxlate::translation::MockTranslator;

fn test_config(transcript_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    // Shorter windows so the test finishes quickly: 16 frames of 1024
    // samples make one utterance.
    config.buffer.min_duration_ms = 1000;
    config.buffer.max_duration_ms = 2000;
    config.transcript.output_dir = transcript_dir.to_path_buf();
    config
}

#[test]
fn test_speech_flows_to_display_playback_and_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let recognizer = MockRecognizer::with_responses(&["Hello everyone.", "See you soon."]);
    let display = CollectorDisplay::new();
    let sink = CollectorSink::new();

    let collaborators = Collaborators {
        // Two utterances' worth of audio, then silence.
        source: Box::new(MockAudioSource::with_tone(32, 1024)),
        recognizer: Box::new(recognizer),
        embedder: Some(Box::new(MockEmbeddingExtractor::constant(vec![
            1.0, 0.0, 0.0,
        ]))),
        translator: Box::new(MockTranslator::new("vi")),
        synthesizer: Box::new(MockSynthesizer::new(16000)),
        audio_sink: Box::new(sink.clone()),
        display: Box::new(display.clone()),
    };

    let handle = app::start(&config, collaborators, Arc::new(LogReporter)).unwrap();
    assert_eq!(handle.stage_count(), 7);

    // Wait for both sentences to reach the display branch.
    let deadline = Instant::now() + Duration::from_secs(10);
    while display.shown().len() < 2 && Instant::now() < deadline {
        assert!(!handle.any_dead(), "no stage may die during the run");
        thread::sleep(Duration::from_millis(50));
    }
    handle.stop();

    let shown = display.shown();
    assert_eq!(shown.len(), 2, "both sentences must reach the display");
    assert_eq!(shown[0].text, "[vi] Hello everyone.");
    assert_eq!(shown[1].text, "[vi] See you soon.");
    assert_eq!(shown[0].speaker_id, Some(1), "one constant voice, one speaker");
    assert_eq!(shown[1].speaker_id, Some(1));

    assert!(sink.play_count() >= 2, "both sentences must be played");

    // The transcript stage merged both same-speaker sentences into one line.
    let transcript_file = fs::read_dir(dir.path())
        .unwrap()
        .next()
        .expect("a transcript file must exist")
        .unwrap()
        .path();
    let contents = fs::read_to_string(transcript_file).unwrap();
    assert!(contents.starts_with("=== Conversation Transcript ==="));
    assert!(contents.contains("[Speaker 1]: [vi] Hello everyone. [vi] See you soon."));
    assert!(contents.contains("(Orig: Hello everyone. See you soon.)"));
    assert!(contents.contains("Ended:"));
}

#[test]
fn test_pause_stops_the_flow_and_resume_restarts_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.transcript.enabled = false;
    config.audio.start_paused = true;

    let display = CollectorDisplay::new();
    let collaborators = Collaborators {
        source: Box::new(MockAudioSource::with_tone(16, 1024)),
        recognizer: Box::new(MockRecognizer::with_responses(&["After the pause."])),
        embedder: None,
        translator: Box::new(MockTranslator::new("vi")),
        synthesizer: Box::new(MockSynthesizer::new(16000)),
        audio_sink: Box::new(CollectorSink::new()),
        display: Box::new(display.clone()),
    };

    let handle = app::start(&config, collaborators, Arc::new(LogReporter)).unwrap();

    // Paused from the start: nothing shows up.
    thread::sleep(Duration::from_millis(600));
    assert!(display.shown().is_empty(), "paused pipeline must stay quiet");

    handle.resume().unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while display.shown().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    handle.stop();

    let shown = display.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].text, "[vi] After the pause.");
}
