//! voxlate - Live speech translation
//!
//! Staged pipeline from microphone capture to translated speech, subtitles,
//! and a conversation transcript.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod capture;
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod diarization;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod recognition;
pub mod registry;
pub mod synthesis;
pub mod transcript;
pub mod translation;

// Collaborator traits (capture → recognize → translate → synthesize → play)
pub use capture::AudioSource;
pub use diarization::EmbeddingExtractor;
pub use display::DisplaySink;
pub use playback::AudioSink;
pub use recognition::SpeechRecognizer;
pub use synthesis::SpeechSynthesizer;
pub use translation::Translator;

// Pipeline
pub use app::{Collaborators, PipelineHandle, start};
pub use pipeline::error::{ErrorReporter, LogReporter, QuietReporter, StageError};
pub use pipeline::stage::Stage;
pub use pipeline::supervisor::Supervisor;
pub use registry::{Channel, ChannelRegistry};

// Error handling
pub use error::{Result, VoxlateError};

// Config
pub use config::{Config, EngineKind};

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
