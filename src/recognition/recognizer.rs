//! Speech recognition collaborator interface.

use crate::error::Result;

/// Converts one utterance of audio into text.
///
/// Implementations wrap a concrete recognition backend; the pipeline only
/// sees this interface. The recognizer is called from the recognition stage
/// thread and may block for the duration of one utterance.
pub trait SpeechRecognizer: Send + 'static {
    /// Transcribes a contiguous utterance of mono samples.
    ///
    /// An empty string means "no speech detected" and is dropped upstream of
    /// the text channels; it is not an error.
    fn transcribe(&mut self, samples: &[f32], sample_rate: u32) -> Result<String>;

    /// Returns the name of this recognizer for logging.
    fn name(&self) -> &str;

    /// True once the backend is loaded and ready to transcribe.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Scripted recognizer for tests and the demo run.
///
/// Returns queued responses in order, then empty strings.
pub struct MockRecognizer {
    responses: std::collections::VecDeque<Result<String>>,
    /// Every (sample count, sample rate) pair this recognizer was called with.
    pub calls: Vec<(usize, u32)>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            responses: std::collections::VecDeque::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_responses(texts: &[&str]) -> Self {
        let mut mock = Self::new();
        for text in texts {
            mock.push_text(text);
        }
        mock
    }

    pub fn push_text(&mut self, text: &str) {
        self.responses.push_back(Ok(text.to_string()));
    }

    pub fn push_error(&mut self, error: crate::error::VoxlateError) {
        self.responses.push_back(Err(error));
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn transcribe(&mut self, samples: &[f32], sample_rate: u32) -> Result<String> {
        self.calls.push((samples.len(), sample_rate));
        self.responses.pop_front().unwrap_or(Ok(String::new()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoxlateError;

    #[test]
    fn test_mock_returns_queued_responses_in_order() {
        let mut mock = MockRecognizer::with_responses(&["hello", "world"]);
        assert_eq!(mock.transcribe(&[0.0; 8], 16000).unwrap(), "hello");
        assert_eq!(mock.transcribe(&[0.0; 8], 16000).unwrap(), "world");
        assert_eq!(mock.transcribe(&[0.0; 8], 16000).unwrap(), "");
    }

    #[test]
    fn test_mock_records_calls() {
        let mut mock = MockRecognizer::new();
        mock.transcribe(&[0.0; 1024], 16000).unwrap();
        assert_eq!(mock.calls, vec![(1024, 16000)]);
    }

    #[test]
    fn test_mock_queued_error_is_returned() {
        let mut mock = MockRecognizer::new();
        mock.push_error(VoxlateError::Recognition {
            message: "backend busy".to_string(),
        });
        assert!(mock.transcribe(&[0.0; 8], 16000).is_err());
    }
}
