use std::time::Duration;

use thiserror::Error;

/// Errors returned by audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: decode failed: {0}")]
    Decode(String),

    #[error("audio: no samples decoded")]
    Empty,

    #[error("audio: clip is {got:.1?}, must be between {min:?} and {max:?}")]
    DurationOutOfBounds {
        got: Duration,
        min: Duration,
        max: Duration,
    },

    #[error("audio: resample failed: {0}")]
    Resample(String),

    #[error("audio: encode failed: {0}")]
    Encode(String),

    #[error("audio: invalid config: {0}")]
    InvalidConfig(String),

    #[error("audio: {0}")]
    Io(#[from] std::io::Error),
}
