//! Context-aware cached translation.

pub mod cache;
pub mod context;
pub mod engine;
pub mod stage;

pub use cache::TranslationCache;
pub use context::ContextBuffers;
pub use engine::{MockTranslator, RetryTranslator, Translator};
pub use stage::{TranslationMetrics, TranslationStage};
