//! Embedding models for melody matching.
//!
//! An [`EmbeddingModel`] maps a fixed-shape [`FeatureTensor`] to an
//! L2-normalised [`Embedding`]. Models are loaded once from a versioned
//! [`Checkpoint`] and shared read-only by every query.
//!
//! [`FeatureTensor`]: melodeez_audio::FeatureTensor

mod checkpoint;
mod embedding;
mod error;
mod model;
mod projection;

pub use checkpoint::{CHECKPOINT_FORMAT, Checkpoint};
pub use embedding::{Embedding, l2_normalize};
pub use error::EmbedError;
pub use model::{EmbeddingModel, check_shape};
pub use projection::ProjectionModel;
