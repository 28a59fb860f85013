//! Translation engine interface and decorators.

use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Translates one sentence, optionally guided by recent conversation
/// context.
///
/// Engines that cannot use context simply ignore it and report
/// `supports_context() == false`, which lets the caller skip building the
/// context string at all.
pub trait Translator: Send + 'static {
    /// Translates `text` for the engine's configured language pair.
    fn translate(&mut self, text: &str, context: Option<&str>) -> Result<String>;

    /// True when the engine makes use of the context argument.
    fn supports_context(&self) -> bool {
        false
    }

    /// Returns the name of this engine for logging.
    fn name(&self) -> &str;
}

/// Retries a flaky engine with a growing delay between attempts.
///
/// Wire and service hiccups are common with hosted engines; a few spaced
/// retries absorb them without stalling the pipeline for long. The last
/// error is returned once attempts are exhausted.
pub struct RetryTranslator {
    inner: Box<dyn Translator>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryTranslator {
    pub fn new(inner: Box<dyn Translator>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }
}

impl Translator for RetryTranslator {
    fn translate(&mut self, text: &str, context: Option<&str>) -> Result<String> {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.inner.translate(text, context) {
                Ok(translation) => return Ok(translation),
                Err(error) => {
                    last_error = Some(error);
                    if attempt < self.max_attempts {
                        thread::sleep(self.base_delay * attempt);
                    }
                }
            }
        }
        // max_attempts >= 1, so at least one attempt ran.
        Err(last_error.unwrap_or_else(|| crate::error::VoxlateError::Translation {
            message: "no attempts made".to_string(),
        }))
    }

    fn supports_context(&self) -> bool {
        self.inner.supports_context()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Scripted engine for tests and the demo run.
///
/// Translates by tagging the text with the target language, e.g.
/// `"hello"` becomes `"[vi] hello"`, and records every call.
pub struct MockTranslator {
    target_lang: String,
    supports_context: bool,
    /// Errors consumed before successful translations resume.
    failures: std::collections::VecDeque<crate::error::VoxlateError>,
    /// Every (text, context) pair this engine was called with.
    pub calls: Vec<(String, Option<String>)>,
}

impl MockTranslator {
    pub fn new(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            supports_context: false,
            failures: std::collections::VecDeque::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_context_support(target_lang: &str) -> Self {
        Self {
            supports_context: true,
            ..Self::new(target_lang)
        }
    }

    pub fn fail_next(&mut self, count: u32) {
        for _ in 0..count {
            self.failures.push_back(crate::error::VoxlateError::Translation {
                message: "service unavailable".to_string(),
            });
        }
    }
}

impl Translator for MockTranslator {
    fn translate(&mut self, text: &str, context: Option<&str>) -> Result<String> {
        self.calls
            .push((text.to_string(), context.map(str::to_string)));
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }
        Ok(format!("[{}] {}", self.target_lang, text))
    }

    fn supports_context(&self) -> bool {
        self.supports_context
    }

    fn name(&self) -> &str {
        "mock"
    }
}
