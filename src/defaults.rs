//! Default configuration constants for voxlate.
//!
//! Shared constants used across configuration types to ensure consistency
//! and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and voice embedding models
/// and provides a good balance between quality and computational cost.
pub const SAMPLE_RATE: u32 = 16000;

/// Default capture frame size in samples (64ms at 16kHz).
pub const FRAME_SAMPLES: usize = 1024;

/// Minimum accumulated audio before one recognition call, in milliseconds.
///
/// 2.5s is long enough for a stable transcription while keeping end-to-end
/// latency acceptable for live translation.
pub const MIN_UTTERANCE_MS: u32 = 2500;

/// Maximum utterance window duration in milliseconds.
///
/// Safety valve that bounds memory and latency: the window is force-flushed
/// at this size even if the flush threshold was never reached.
pub const MAX_UTTERANCE_MS: u32 = 4000;

/// Cosine similarity threshold for matching an utterance to a known speaker.
pub const SIMILARITY_THRESHOLD: f32 = 0.75;

/// Minimum utterance duration in seconds for a reliable voice embedding.
///
/// Shorter utterances are reported as unidentified rather than forcing a
/// spurious match.
pub const MIN_SPEAKER_DURATION_SECS: f32 = 1.0;

/// Maximum number of speakers tracked concurrently.
pub const MAX_SPEAKERS: usize = 10;

/// Seconds of inactivity before a tracked speaker is garbage-collected.
pub const SPEAKER_TIMEOUT_SECS: u64 = 300;

/// Weight of the newest embedding in the exponential moving average update.
pub const EMBEDDING_EMA_ALPHA: f32 = 0.3;

/// Inactive speakers are purged every this many identifications.
pub const SPEAKER_PURGE_INTERVAL: u64 = 50;

/// Per-speaker rolling context capacity (translation pairs).
pub const CONTEXT_BUFFER_SIZE: usize = 5;

/// Maximum length of the assembled context string, in characters.
pub const MAX_CONTEXT_LENGTH: usize = 200;

/// Maximum number of memoized translations.
pub const CACHE_MAX_SIZE: usize = 1000;

/// Seconds before a cached translation is treated as absent on lookup.
pub const CACHE_TTL_SECS: u64 = 3600;

/// Seconds of speaker inactivity before an open transcript line is flushed.
pub const TRANSCRIPT_SPEAKER_TIMEOUT_SECS: f32 = 5.0;

/// Aggregate metrics are logged every this many translations.
pub const METRICS_LOG_INTERVAL: u64 = 50;

/// Recognized text is emitted once the sentence buffer grows past this
/// length even without terminal punctuation.
pub const MAX_SENTENCE_CHARS: usize = 100;

/// Sentence-ending punctuation across supported scripts.
pub const SENTENCE_ENDINGS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Per-iteration receive timeout for stage poll loops, in milliseconds.
///
/// A timeout with no input is not an error; the stage simply retries, which
/// is also how it observes the shared stop signal promptly.
pub const STAGE_POLL_MS: u64 = 100;

/// How long a producer backs off on a full downstream text channel before
/// dropping the item, in milliseconds.
pub const SEND_BACKOFF_MS: u64 = 250;

/// Grace period the supervisor waits for stages to exit on shutdown.
pub const SHUTDOWN_GRACE_SECS: u64 = 5;
