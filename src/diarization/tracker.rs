//! Online speaker clustering over voice embeddings.
//!
//! Speakers are discovered on the fly: each sufficiently long utterance is
//! embedded and matched against known speakers by cosine similarity. A match
//! refines that speaker's embedding with an exponential moving average; a
//! miss enrolls a new speaker while capacity allows. Identifiers are small
//! integers assigned in order of first appearance and never reused within a
//! run.

use crate::clock::{Clock, SystemClock};
use crate::config::DiarizationConfig;
use crate::error::Result;
use crate::diarization::embedding::EmbeddingExtractor;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Inactive speakers are purged every this many identifications.
const PURGE_INTERVAL: u64 = crate::defaults::SPEAKER_PURGE_INTERVAL;

/// One tracked speaker.
struct SpeakerIdentity {
    /// Normalized reference embedding, refined over time.
    embedding: Vec<f32>,
    last_seen: Instant,
    utterance_count: u64,
}

/// A change of attributed speaker between consecutive identifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakerChange {
    pub previous: Option<u32>,
    pub current: u32,
}

/// Aggregate counters exposed for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub active_speakers: usize,
    pub total_identifications: u64,
    pub new_speakers: u64,
    pub speaker_changes: u64,
    /// Matches forced below the similarity threshold because the speaker
    /// table was full. A non-zero value means `max_speakers` is too low for
    /// the conversation.
    pub forced_matches: u64,
    pub purged_speakers: u64,
}

/// Incremental speaker identification over a stream of utterances.
pub struct SpeakerTracker {
    config: DiarizationConfig,
    extractor: Box<dyn EmbeddingExtractor>,
    speakers: BTreeMap<u32, SpeakerIdentity>,
    next_id: u32,
    current: Option<u32>,
    pending_change: Option<SpeakerChange>,
    stats: TrackerStats,
    clock: Box<dyn Clock>,
}

impl SpeakerTracker {
    pub fn new(config: DiarizationConfig, extractor: Box<dyn EmbeddingExtractor>) -> Self {
        Self::with_clock(config, extractor, Box::new(SystemClock))
    }

    pub fn with_clock(
        config: DiarizationConfig,
        extractor: Box<dyn EmbeddingExtractor>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config,
            extractor,
            speakers: BTreeMap::new(),
            next_id: 1,
            current: None,
            pending_change: None,
            stats: TrackerStats::default(),
            clock,
        }
    }

    /// Attributes one utterance to a speaker.
    ///
    /// Returns `Ok(None)` when the utterance is too short for a reliable
    /// embedding; the attribution stays open rather than forcing a guess.
    pub fn identify(&mut self, samples: &[f32], sample_rate: u32) -> Result<Option<u32>> {
        let duration_secs = samples.len() as f32 / sample_rate as f32;
        if duration_secs < self.config.min_speaker_duration {
            return Ok(None);
        }

        let mut embedding = self.extractor.embed(samples, sample_rate)?;
        normalize(&mut embedding);

        let now = self.clock.now();
        let id = self.assign(embedding, now);

        if self.current != Some(id) {
            // The first attribution of a run opens the conversation; only a
            // transition between two speakers counts as a change.
            if self.current.is_some() {
                self.stats.speaker_changes += 1;
            }
            self.pending_change = Some(SpeakerChange {
                previous: self.current,
                current: id,
            });
            self.current = Some(id);
        }

        self.stats.total_identifications += 1;
        if self.stats.total_identifications % PURGE_INTERVAL == 0 {
            self.purge_inactive(now);
            self.log_stats();
        }

        Ok(Some(id))
    }

    fn log_stats(&self) {
        let stats = self.stats();
        eprintln!(
            "voxlate: diarization: {} identifications, {} active speakers, {} changes, {} forced matches",
            stats.total_identifications,
            stats.active_speakers,
            stats.speaker_changes,
            stats.forced_matches,
        );
    }

    /// Matches the embedding against known speakers or enrolls a new one.
    fn assign(&mut self, embedding: Vec<f32>, now: Instant) -> u32 {
        let best = self
            .speakers
            .iter()
            .map(|(&id, speaker)| (id, cosine_similarity(&embedding, &speaker.embedding)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((id, similarity)) = best
            && similarity >= self.config.similarity_threshold
        {
            self.refine(id, &embedding, now);
            return id;
        }

        if self.speakers.len() < self.config.max_speakers {
            return self.enroll(embedding, now);
        }

        // Table full: force the closest match rather than dropping the
        // utterance, and tell the operator about the capacity pressure.
        match best {
            Some((id, similarity)) => {
                self.stats.forced_matches += 1;
                eprintln!(
                    "voxlate: speaker table full, attributing to closest match (speaker {}, similarity {:.2})",
                    id, similarity
                );
                self.refine(id, &embedding, now);
                id
            }
            // Unreachable with max_speakers >= 1, but stay total.
            None => self.enroll(embedding, now),
        }
    }

    fn enroll(&mut self, embedding: Vec<f32>, now: Instant) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.speakers.insert(
            id,
            SpeakerIdentity {
                embedding,
                last_seen: now,
                utterance_count: 1,
            },
        );
        self.stats.new_speakers += 1;
        id
    }

    /// Moves a speaker's reference embedding toward the new observation.
    fn refine(&mut self, id: u32, observation: &[f32], now: Instant) {
        if let Some(speaker) = self.speakers.get_mut(&id) {
            let alpha = self.config.ema_alpha;
            for (reference, &observed) in speaker.embedding.iter_mut().zip(observation) {
                *reference = alpha * observed + (1.0 - alpha) * *reference;
            }
            normalize(&mut speaker.embedding);
            speaker.last_seen = now;
            speaker.utterance_count += 1;
        }
    }

    /// Drops speakers not heard from within the timeout. The current speaker
    /// is never purged.
    fn purge_inactive(&mut self, now: Instant) {
        let timeout = Duration::from_secs(self.config.speaker_timeout_secs);
        let current = self.current;
        let before = self.speakers.len();
        self.speakers.retain(|&id, speaker| {
            Some(id) == current || now.duration_since(speaker.last_seen) <= timeout
        });
        self.stats.purged_speakers += (before - self.speakers.len()) as u64;
    }

    /// The most recently attributed speaker.
    pub fn current_speaker(&self) -> Option<u32> {
        self.current
    }

    /// Number of utterances attributed to a speaker, if tracked.
    pub fn utterance_count(&self, id: u32) -> Option<u64> {
        self.speakers.get(&id).map(|s| s.utterance_count)
    }

    /// Consumes the speaker change recorded since the last call, if any.
    pub fn take_change(&mut self) -> Option<SpeakerChange> {
        self.pending_change.take()
    }

    pub fn active_count(&self) -> usize {
        self.speakers.len()
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            active_speakers: self.speakers.len(),
            ..self.stats
        }
    }

    /// Forgets all speakers. Identifier numbering continues where it left
    /// off so old and new attributions cannot collide.
    pub fn reset(&mut self) {
        self.speakers.clear();
        self.current = None;
        self.pending_change = None;
    }
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
