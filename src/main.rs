use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use voxlate::app::{self, Collaborators};
use voxlate::capture::MockAudioSource;
use voxlate::cli::Cli;
use voxlate::config::{Config, EngineKind};
use voxlate::defaults;
use voxlate::diarization::MockEmbeddingExtractor;
use voxlate::display::StdoutDisplay;
use voxlate::pipeline::error::{ErrorReporter, LogReporter, QuietReporter};
use voxlate::playback::CollectorSink;
use voxlate::recognition::MockRecognizer;
use voxlate::synthesis::MockSynthesizer;
use voxlate::translation::{MockTranslator, RetryTranslator, Translator};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.config_path {
        println!("{}", Config::default_path().display());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?
        .with_env_overrides();

    if cli.verbose >= 1 {
        eprintln!("voxlate: configuration from {}", config_path.display());
    }

    if let Some(lang) = cli.source_lang {
        config.translation.source_lang = lang;
    }
    if let Some(lang) = cli.target_lang {
        config.translation.target_lang = lang;
    }
    if cli.no_transcript {
        config.transcript.enabled = false;
    }
    if cli.paused {
        config.audio.start_paused = true;
    }

    if cli.show_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let reporter: Arc<dyn ErrorReporter> = if cli.quiet {
        Arc::new(QuietReporter)
    } else {
        Arc::new(LogReporter)
    };

    run_demo(&config, cli.duration, reporter)
}

/// Runs the pipeline against scripted collaborators for a fixed duration.
///
/// Real audio and model backends plug in through [`Collaborators`]; the
/// binary ships with mocks so the pipeline can be exercised end to end on
/// any machine.
fn run_demo(
    config: &Config,
    duration_secs: u64,
    reporter: Arc<dyn ErrorReporter>,
) -> anyhow::Result<()> {
    let frame = config.audio.frame_samples;
    let frames_per_utterance =
        (config.buffer.min_duration_ms as usize * config.audio.sample_rate as usize)
            .div_ceil(1000 * frame);

    let mut recognizer = MockRecognizer::new();
    for text in [
        "Good morning everyone.",
        "Today we are testing the translation pipeline.",
        "Each sentence flows through recognition and translation.",
        "Thank you for listening.",
    ] {
        recognizer.push_text(text);
    }

    let collaborators = Collaborators {
        source: Box::new(MockAudioSource::with_tone(frames_per_utterance * 4, frame)),
        recognizer: Box::new(recognizer),
        embedder: Some(Box::new(MockEmbeddingExtractor::constant(vec![
            1.0, 0.0, 0.0, 0.0,
        ]))),
        translator: build_translator(config),
        synthesizer: Box::new(MockSynthesizer::new(config.audio.sample_rate)),
        audio_sink: Box::new(CollectorSink::new()),
        display: Box::new(StdoutDisplay),
    };

    eprintln!(
        "voxlate: starting pipeline ({} -> {}, engine {:?}, {}s demo)",
        config.translation.source_lang,
        config.translation.target_lang,
        config.translation.engine,
        duration_secs
    );

    let handle = app::start(config, collaborators, reporter)?;

    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    while Instant::now() < deadline {
        if handle.any_dead() {
            let dead = handle.poll_health().join(", ");
            handle.stop();
            anyhow::bail!("pipeline stage(s) died: {}", dead);
        }
        thread::sleep(Duration::from_millis(defaults::STAGE_POLL_MS));
    }

    handle.stop();
    eprintln!("voxlate: done");
    Ok(())
}

/// Maps the configured engine tag to a concrete translator.
///
/// All demo engines are mocks; the context-capable kinds exercise the
/// per-speaker context path, and every engine gets the retry wrapper hosted
/// services need.
fn build_translator(config: &Config) -> Box<dyn Translator> {
    let target = &config.translation.target_lang;
    let inner: Box<dyn Translator> = match config.translation.engine {
        EngineKind::Marian | EngineKind::Nllb => {
            Box::new(MockTranslator::with_context_support(target))
        }
        EngineKind::Google => Box::new(MockTranslator::new(target)),
    };
    Box::new(RetryTranslator::new(inner, 3, Duration::from_millis(200)))
}
