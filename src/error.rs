//! Error types for voxlate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxlateError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Channel registry errors
    #[error("Channel not found: {name}")]
    ChannelNotFound { name: String },

    #[error("Channel {name} exists with a different payload type")]
    ChannelTypeMismatch { name: String },

    // Audio I/O errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio playback failed: {message}")]
    AudioPlayback { message: String },

    // Collaborator errors
    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    #[error("Embedding extraction failed: {message}")]
    Embedding { message: String },

    #[error("Translation failed: {message}")]
    Translation { message: String },

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Display update failed: {message}")]
    Display { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxlateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_channel_not_found_display() {
        let error = VoxlateError::ChannelNotFound {
            name: "audio-in".to_string(),
        };
        assert_eq!(error.to_string(), "Channel not found: audio-in");
    }

    #[test]
    fn test_channel_type_mismatch_display() {
        let error = VoxlateError::ChannelTypeMismatch {
            name: "control".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Channel control exists with a different payload type"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = VoxlateError::ConfigInvalidValue {
            key: "buffer.min_duration_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for buffer.min_duration_ms: must be positive"
        );
    }

    #[test]
    fn test_translation_display() {
        let error = VoxlateError::Translation {
            message: "engine unavailable".to_string(),
        };
        assert_eq!(error.to_string(), "Translation failed: engine unavailable");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VoxlateError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: VoxlateError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoxlateError>();
        assert_sync::<VoxlateError>();
    }
}
