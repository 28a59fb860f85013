//! Translation stage: recognized sentences in, translated segments out to
//! synthesis, display, and the transcript merger.

use crate::config::TranslationConfig;
use crate::defaults;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{RecognizedSegment, TranscriptSegment, TranslatedSegment};
use crate::translation::cache::TranslationCache;
use crate::translation::context::ContextBuffers;
use crate::translation::engine::Translator;
use crossbeam_channel::{Receiver, Sender};
use std::time::{Duration, Instant};

/// Aggregate translation counters, logged periodically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationMetrics {
    pub total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub with_context: u64,
    pub without_context: u64,
    pub total_latency_ms: u64,
}

impl TranslationMetrics {
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    pub fn mean_latency_ms(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total as f64
        }
    }
}

/// Translates each recognized sentence once and fans the result out.
///
/// The cache short-circuits repeated sentences; misses go through the engine
/// with per-speaker context when the engine can use it. An engine failure
/// falls back to passing the source text through so the conversation keeps
/// flowing, and is still reported as a recoverable stage error.
pub struct TranslationStage {
    input: Receiver<RecognizedSegment>,
    synthesis_out: Sender<TranslatedSegment>,
    display_out: Sender<TranslatedSegment>,
    transcript_out: Option<Sender<TranscriptSegment>>,
    translator: Box<dyn Translator>,
    cache: Option<TranslationCache>,
    context: Option<ContextBuffers>,
    metrics: TranslationMetrics,
}

impl TranslationStage {
    pub fn new(
        config: &TranslationConfig,
        translator: Box<dyn Translator>,
        input: Receiver<RecognizedSegment>,
        synthesis_out: Sender<TranslatedSegment>,
        display_out: Sender<TranslatedSegment>,
        transcript_out: Option<Sender<TranscriptSegment>>,
    ) -> Self {
        let cache = config.cache.enabled.then(|| {
            TranslationCache::new(config.cache, &config.source_lang, &config.target_lang)
        });
        let context = config.context.enabled.then(|| {
            ContextBuffers::new(config.context, &config.source_lang, &config.target_lang)
        });
        Self {
            input,
            synthesis_out,
            display_out,
            transcript_out,
            translator,
            cache,
            context,
            metrics: TranslationMetrics::default(),
        }
    }

    /// Translates one sentence, consulting the cache and context buffers.
    ///
    /// Returns the translation and whether the engine failed (in which case
    /// the source text is passed through unchanged).
    pub fn translate_with_context(
        &mut self,
        text: &str,
        speaker_id: Option<u32>,
    ) -> (String, Option<String>) {
        if let Some(cache) = &mut self.cache
            && let Some(hit) = cache.get(text)
        {
            self.metrics.cache_hits += 1;
            if let Some(context) = &mut self.context {
                context.push(speaker_id, text, &hit);
            }
            return (hit, None);
        }
        if self.cache.is_some() {
            self.metrics.cache_misses += 1;
        }

        let context_str = if self.translator.supports_context() {
            self.context.as_ref().and_then(|c| c.build(speaker_id))
        } else {
            None
        };
        match &context_str {
            Some(_) => self.metrics.with_context += 1,
            None => self.metrics.without_context += 1,
        }

        match self.translator.translate(text, context_str.as_deref()) {
            Ok(translation) => {
                if let Some(cache) = &mut self.cache {
                    cache.insert(text, &translation);
                }
                if let Some(context) = &mut self.context {
                    context.push(speaker_id, text, &translation);
                }
                (translation, None)
            }
            Err(error) => (text.to_string(), Some(error.to_string())),
        }
    }

    fn fan_out(&self, segment: &RecognizedSegment, translation: &str) -> Result<(), StageError> {
        let translated = TranslatedSegment {
            text: translation.to_string(),
            speaker_id: segment.speaker_id,
            timestamp: segment.timestamp,
        };

        let mut dropped = Vec::new();
        for (name, out) in [
            ("synthesis", &self.synthesis_out),
            ("display", &self.display_out),
        ] {
            match out.send_timeout(
                translated.clone(),
                Duration::from_millis(defaults::SEND_BACKOFF_MS),
            ) {
                Ok(()) => {}
                Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => dropped.push(name),
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                    return Err(StageError::Fatal(format!("{} channel closed", name)));
                }
            }
        }

        if let Some(out) = &self.transcript_out {
            let record = TranscriptSegment {
                text: translation.to_string(),
                original: segment.text.clone(),
                speaker_id: segment.speaker_id,
                timestamp: segment.timestamp,
            };
            match out.send_timeout(record, Duration::from_millis(defaults::SEND_BACKOFF_MS)) {
                Ok(()) => {}
                Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => dropped.push("transcript"),
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                    return Err(StageError::Fatal("transcript channel closed".to_string()));
                }
            }
        }

        if dropped.is_empty() {
            Ok(())
        } else {
            Err(StageError::Recoverable(format!(
                "downstream full, dropped on: {}",
                dropped.join(", ")
            )))
        }
    }

    pub fn metrics(&self) -> TranslationMetrics {
        self.metrics
    }

    fn log_metrics(&self) {
        eprintln!(
            "voxlate: translated {} segments, cache hit rate {:.0}%, {} with context, mean latency {:.1}ms",
            self.metrics.total,
            self.metrics.cache_hit_rate() * 100.0,
            self.metrics.with_context,
            self.metrics.mean_latency_ms(),
        );
    }
}

impl Stage for TranslationStage {
    fn name(&self) -> &'static str {
        "translation"
    }

    fn step(&mut self) -> Result<(), StageError> {
        let segment = match self
            .input
            .recv_timeout(Duration::from_millis(defaults::STAGE_POLL_MS))
        {
            Ok(segment) => segment,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return Ok(()),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(StageError::Fatal("input channel closed".to_string()));
            }
        };

        let started = Instant::now();
        let (translation, engine_error) =
            self.translate_with_context(&segment.text, segment.speaker_id);
        self.metrics.total += 1;
        self.metrics.total_latency_ms += started.elapsed().as_millis() as u64;

        if self.metrics.total % defaults::METRICS_LOG_INTERVAL == 0 {
            self.log_metrics();
        }

        self.fan_out(&segment, &translation)?;

        match engine_error {
            Some(message) => Err(StageError::Recoverable(format!(
                "engine failed, passed source through: {}",
                message
            ))),
            None => Ok(()),
        }
    }

    fn cleanup(&mut self) {
        if self.metrics.total > 0 {
            self.log_metrics();
        }
    }
}
