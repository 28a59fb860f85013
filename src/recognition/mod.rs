//! Speech recognition: utterance windowing, sentence assembly, and the
//! recognition stage.

pub mod recognizer;
pub mod sentence;
pub mod stage;
pub mod window;

pub use recognizer::{MockRecognizer, SpeechRecognizer};
pub use sentence::SentenceAssembler;
pub use stage::RecognitionStage;
pub use window::UtteranceWindow;
