use crate::defaults;
use crate::error::{Result, VoxlateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub buffer: BufferConfig,
    pub diarization: DiarizationConfig,
    pub translation: TranslationConfig,
    pub transcript: TranscriptConfig,
    pub channels: ChannelCapacities,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub frame_samples: usize,
    /// Start with capture paused until a Resume control message arrives.
    pub start_paused: bool,
}

/// Utterance windowing thresholds for the recognition stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    /// Accumulated duration that triggers a window flush (ms).
    pub min_duration_ms: u32,
    /// Forced-flush ceiling bounding memory and latency (ms).
    pub max_duration_ms: u32,
}

/// Online speaker clustering configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiarizationConfig {
    pub enabled: bool,
    /// Cosine similarity required to match a known speaker (0.0 to 1.0).
    pub similarity_threshold: f32,
    /// Minimum utterance duration (seconds) for a reliable embedding.
    pub min_speaker_duration: f32,
    pub max_speakers: usize,
    /// Inactive speakers are removed after this many seconds.
    pub speaker_timeout_secs: u64,
    /// Weight of the newest embedding in the moving-average update.
    pub ema_alpha: f32,
}

/// Translation engine selection.
///
/// Closed set, chosen once at startup; the composition root maps the tag to
/// a concrete [`Translator`](crate::translation::Translator) collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Marian,
    Nllb,
    #[default]
    Google,
}

/// Translation stage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub engine: EngineKind,
    pub source_lang: String,
    pub target_lang: String,
    pub context: ContextConfig,
    pub cache: CacheConfig,
}

/// Rolling per-speaker translation context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    pub enabled: bool,
    /// Translation pairs retained per speaker.
    pub buffer_size: usize,
    /// Character bound on the assembled context string.
    pub max_context_length: usize,
    pub include_source: bool,
    pub include_target: bool,
}

/// Memoized-translation store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size: usize,
    /// Entries older than this are treated as absent on lookup (seconds).
    pub ttl_secs: u64,
}

/// Transcript merging and output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptConfig {
    pub enabled: bool,
    /// Merge consecutive segments from the same speaker into one line.
    pub merge_segments: bool,
    /// Seconds of inactivity before an open line is flushed.
    pub speaker_timeout_secs: f32,
    /// Include the pre-translation original on an indented following line.
    pub include_original: bool,
    pub output_dir: PathBuf,
}

/// Bounded channel capacities, one per pipeline hop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelCapacities {
    pub audio: usize,
    pub recognition: usize,
    pub synthesis: usize,
    pub display: usize,
    pub transcript: usize,
    pub playback: usize,
    pub control: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_samples: defaults::FRAME_SAMPLES,
            start_paused: false,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: defaults::MIN_UTTERANCE_MS,
            max_duration_ms: defaults::MAX_UTTERANCE_MS,
        }
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            min_speaker_duration: defaults::MIN_SPEAKER_DURATION_SECS,
            max_speakers: defaults::MAX_SPEAKERS,
            speaker_timeout_secs: defaults::SPEAKER_TIMEOUT_SECS,
            ema_alpha: defaults::EMBEDDING_EMA_ALPHA,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            source_lang: "en".to_string(),
            target_lang: "vi".to_string(),
            context: ContextConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: defaults::CONTEXT_BUFFER_SIZE,
            max_context_length: defaults::MAX_CONTEXT_LENGTH,
            include_source: true,
            include_target: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: defaults::CACHE_MAX_SIZE,
            ttl_secs: defaults::CACHE_TTL_SECS,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            merge_segments: true,
            speaker_timeout_secs: defaults::TRANSCRIPT_SPEAKER_TIMEOUT_SECS,
            include_original: true,
            output_dir: PathBuf::from("records"),
        }
    }
}

impl Default for ChannelCapacities {
    fn default() -> Self {
        Self {
            audio: 100,
            recognition: 50,
            synthesis: 50,
            display: 50,
            transcript: 100,
            playback: 50,
            control: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file is missing.
    ///
    /// Invalid TOML in an existing file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXLATE_SOURCE_LANG → translation.source_lang
    /// - VOXLATE_TARGET_LANG → translation.target_lang
    /// - VOXLATE_TRANSCRIPT_DIR → transcript.output_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(lang) = std::env::var("VOXLATE_SOURCE_LANG")
            && !lang.is_empty()
        {
            self.translation.source_lang = lang;
        }

        if let Ok(lang) = std::env::var("VOXLATE_TARGET_LANG")
            && !lang.is_empty()
        {
            self.translation.target_lang = lang;
        }

        if let Ok(dir) = std::env::var("VOXLATE_TRANSCRIPT_DIR")
            && !dir.is_empty()
        {
            self.transcript.output_dir = PathBuf::from(dir);
        }

        self
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.buffer.min_duration_ms == 0 {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "buffer.min_duration_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.buffer.max_duration_ms < self.buffer.min_duration_ms {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "buffer.max_duration_ms".to_string(),
                message: "must be >= buffer.min_duration_ms".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.diarization.similarity_threshold) {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "diarization.similarity_threshold".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.diarization.max_speakers == 0 {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "diarization.max_speakers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.diarization.ema_alpha) {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "diarization.ema_alpha".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.translation.context.buffer_size == 0 {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "translation.context.buffer_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.translation.cache.max_size == 0 {
            return Err(VoxlateError::ConfigInvalidValue {
                key: "translation.cache.max_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxlate/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxlate")
            .join("config.toml")
    }
}
