//! Sentence assembly for recognized text.
//!
//! Recognition output arrives in window-sized pieces that rarely align with
//! sentence boundaries. The assembler buffers text until terminal punctuation
//! appears, so downstream translation works on whole sentences, with a length
//! bound so a speaker who never punctuates still flows through.

use crate::defaults;

/// Accumulates recognized text and emits complete sentences.
pub struct SentenceAssembler {
    buffer: String,
    max_chars: usize,
}

impl SentenceAssembler {
    pub fn new() -> Self {
        Self::with_max_chars(defaults::MAX_SENTENCE_CHARS)
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            max_chars,
        }
    }

    /// Appends recognized text; returns complete sentences ready to emit.
    ///
    /// A sentence is complete at terminal punctuation, or when the buffer
    /// grows past the length bound without any.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(trimmed);

        let mut sentences = Vec::new();
        while let Some(end) = self.first_sentence_end() {
            let rest = self.buffer.split_off(end);
            let sentence = std::mem::replace(&mut self.buffer, rest);
            self.buffer = self.buffer.trim_start().to_string();
            sentences.push(sentence);
        }

        if self.buffer.chars().count() > self.max_chars {
            sentences.push(std::mem::take(&mut self.buffer));
        }

        sentences
    }

    /// Byte index just past the first sentence-ending character, if any.
    fn first_sentence_end(&self) -> Option<usize> {
        self.buffer
            .char_indices()
            .find(|(_, c)| defaults::SENTENCE_ENDINGS.contains(c))
            .map(|(i, c)| i + c.len_utf8())
    }

    /// Emits whatever is buffered, complete or not.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for SentenceAssembler {
    fn default() -> Self {
        Self::new()
    }
}
