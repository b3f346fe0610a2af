use melodeez_audio::FeatureShape;
use thiserror::Error;

/// Errors returned by embedding models.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embed: input shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        expected: FeatureShape,
        got: FeatureShape,
    },

    #[error("embed: model load failed: {0}")]
    ModelLoad(String),

    #[error("embed: inference failed: {0}")]
    Inference(String),

    #[error("embed: model is closed")]
    Closed,

    #[error("embed: {0}")]
    Io(#[from] std::io::Error),
}
