//! Error types for axonsim

use thiserror::Error;

/// Axonsim error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NeuronError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// History index past the recorded length
    #[error("Index {index} out of range for recorded history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Playback requested but nothing has been recorded
    #[error("No recorded history to play back")]
    EmptyHistory,

    /// Scrubbing is only meaningful while in playback mode
    #[error("Operation requires playback mode")]
    NotInPlayback,
}

pub type Result<T> = std::result::Result<T, NeuronError>;
