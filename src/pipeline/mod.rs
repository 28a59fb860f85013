//! Staged streaming pipeline: isolated stage workers connected by bounded
//! channels, driven by an explicit supervisor.

pub mod error;
pub mod stage;
pub mod supervisor;
pub mod types;

pub use error::{ErrorReporter, LogReporter, QuietReporter, StageError};
pub use stage::{Stage, StageRunner};
pub use supervisor::Supervisor;
pub use types::{
    AudioFrame, ControlCommand, RecognizedSegment, SynthesizedAudio, TranscriptSegment,
    TranslatedSegment,
};
