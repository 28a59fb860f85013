//! Online speaker diarization: voice embeddings and incremental clustering.

pub mod embedding;
pub mod tracker;

pub use embedding::{EmbeddingExtractor, MockEmbeddingExtractor};
pub use tracker::{SpeakerChange, SpeakerTracker, TrackerStats};
