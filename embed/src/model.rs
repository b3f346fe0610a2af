use melodeez_audio::{FeatureShape, FeatureTensor};

use crate::embedding::Embedding;
use crate::error::EmbedError;

/// Maps fixed-shape feature tensors to embedding vectors.
///
/// The input shape is fixed per model: a tensor of any other shape is
/// rejected with [`EmbedError::ShapeMismatch`], never reshaped. For the
/// same input, `embed` returns the same vector on every call.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use; one instance is shared
/// by the catalog builder and all queries.
pub trait EmbeddingModel: Send + Sync {
    /// Computes the embedding of one feature tensor.
    fn embed(&self, features: &FeatureTensor) -> Result<Embedding, EmbedError>;

    /// Computes embeddings for several tensors. The result for each item is
    /// identical to calling [`EmbeddingModel::embed`] on it alone.
    fn embed_batch(&self, batch: &[FeatureTensor]) -> Result<Vec<Embedding>, EmbedError> {
        batch.iter().map(|f| self.embed(f)).collect()
    }

    /// Shape every input tensor must have.
    fn input_shape(&self) -> FeatureShape;

    /// Length of the output vectors.
    fn dimension(&self) -> usize;

    /// Checkpoint version string. Catalogs record it and refuse to load
    /// under a different one.
    fn version(&self) -> &str;
}

/// Returns [`EmbedError::ShapeMismatch`] unless `features` has the model's
/// input shape.
pub fn check_shape(model: &dyn EmbeddingModel, features: &FeatureTensor) -> Result<(), EmbedError> {
    let expected = model.input_shape();
    let got = features.shape();
    if expected != got {
        return Err(EmbedError::ShapeMismatch { expected, got });
    }
    Ok(())
}
