//! Voice embedding collaborator interface.

use crate::error::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Produces a fixed-dimension voice embedding for one utterance.
///
/// Implementations wrap a concrete speaker-embedding backend. Vectors from
/// one extractor must be mutually comparable; mixing extractors within a run
/// is not supported.
pub trait EmbeddingExtractor: Send + 'static {
    /// Computes an embedding for a contiguous utterance of mono samples.
    fn embed(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>>;

    /// Returns the name of this extractor for logging.
    fn name(&self) -> &str;
}

/// Scripted extractor for tests and the demo run.
///
/// Returns queued embeddings in order; once the queue is empty it repeats
/// the last queued vector, or the constant if built with [`constant`].
///
/// [`constant`]: MockEmbeddingExtractor::constant
pub struct MockEmbeddingExtractor {
    queue: Mutex<VecDeque<Result<Vec<f32>>>>,
    fallback: Vec<f32>,
}

impl MockEmbeddingExtractor {
    /// Always returns the same embedding.
    pub fn constant(embedding: Vec<f32>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: embedding,
        }
    }

    /// Returns the queued embeddings in order, then the last one repeatedly.
    pub fn with_sequence(embeddings: Vec<Vec<f32>>) -> Self {
        let fallback = embeddings.last().cloned().unwrap_or_default();
        Self {
            queue: Mutex::new(embeddings.into_iter().map(Ok).collect()),
            fallback,
        }
    }

    pub fn push_error(&self, error: crate::error::VoxlateError) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Err(error));
        }
    }
}

impl EmbeddingExtractor for MockEmbeddingExtractor {
    fn embed(&self, _samples: &[f32], _sample_rate: u32) -> Result<Vec<f32>> {
        let queued = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        match queued {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_extractor_repeats() {
        let extractor = MockEmbeddingExtractor::constant(vec![1.0, 0.0]);
        assert_eq!(extractor.embed(&[0.0; 8], 16000).unwrap(), vec![1.0, 0.0]);
        assert_eq!(extractor.embed(&[0.0; 8], 16000).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_sequence_extractor_then_fallback() {
        let extractor =
            MockEmbeddingExtractor::with_sequence(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(extractor.embed(&[0.0; 8], 16000).unwrap(), vec![1.0, 0.0]);
        assert_eq!(extractor.embed(&[0.0; 8], 16000).unwrap(), vec![0.0, 1.0]);
        assert_eq!(extractor.embed(&[0.0; 8], 16000).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_queued_error_is_returned_once() {
        let extractor = MockEmbeddingExtractor::constant(vec![1.0]);
        extractor.push_error(crate::error::VoxlateError::Embedding {
            message: "gpu gone".to_string(),
        });
        assert!(extractor.embed(&[0.0; 8], 16000).is_err());
        assert!(extractor.embed(&[0.0; 8], 16000).is_ok());
    }
}
