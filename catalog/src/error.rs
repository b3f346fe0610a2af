use melodeez_audio::AudioError;
use melodeez_embed::EmbedError;
use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog: duplicate track id {0:?}")]
    DuplicateTrack(String),

    #[error("catalog: built with model version {got:?}, loaded model is {expected:?}")]
    VersionMismatch { expected: String, got: String },

    #[error("catalog: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("catalog: invalid format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog: json: {0}")]
    Json(#[from] serde_json::Error),
}
