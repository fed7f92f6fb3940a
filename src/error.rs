//! Error types for phonetrack.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhonetrackError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Segment / pipeline errors
    #[error("Invalid segment #{index} ({label:?}, {start}..{end}): {reason}")]
    InvalidSegment {
        index: usize,
        label: String,
        start: f64,
        end: f64,
        reason: String,
    },

    #[error("Stage '{stage}' failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },

    #[error("No phoneme data available for utterance {utterance}")]
    NoPhonemeData { utterance: String },

    // Aligner output errors
    #[error("Failed to read TextGrid {path}: {message}")]
    TextGrid { path: String, message: String },

    // External tool errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Audio conversion failed for {utterance}: {message}")]
    Audio { utterance: String, message: String },

    // Document store errors
    #[error("Document store error: {message}")]
    Store { message: String },

    #[error("No document matches {key}")]
    DocumentNotFound { key: String },

    // Serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PhonetrackError {
    /// Name of the pipeline stage that raised this error, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            PhonetrackError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PhonetrackError>;
