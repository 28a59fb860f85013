//! Conversation transcript: segment merging and file output.

pub mod merger;
pub mod writer;

pub use merger::{TranscriptLine, TranscriptMerger};
pub use writer::{TranscriptWriter, format_line};
