//! [`EmbeddingModel`] implementation backed by a [`Checkpoint`].

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use melodeez_audio::{FeatureShape, FeatureTensor};

use crate::checkpoint::Checkpoint;
use crate::embedding::{Embedding, l2_normalize};
use crate::error::EmbedError;
use crate::model::{EmbeddingModel, check_shape};

/// Frame-projection embedding model.
///
/// # Pipeline
///
/// 1. Per-bin normalisation of each valid frame
/// 2. Frame projection: `relu(W1 x + b1)`
/// 3. Statistics pooling over the valid frames only (mean and standard
///    deviation), so padding frames never reach the output
/// 4. Output layer `W2 [mean; std] + b2`, then L2 normalisation
///
/// # Thread Safety
///
/// Inference only reads the weights, so one instance is shared by all
/// callers through `&self`. The weights sit behind a lock solely so that
/// [`ProjectionModel::close`] can release them.
pub struct ProjectionModel {
    version: String,
    input_shape: FeatureShape,
    dim: usize,
    inner: RwLock<Option<Checkpoint>>,
}

impl ProjectionModel {
    /// Creates a model from a validated checkpoint.
    pub fn from_checkpoint(ckpt: Checkpoint) -> Result<Self, EmbedError> {
        ckpt.validate()?;
        Ok(Self {
            version: ckpt.version.clone(),
            input_shape: ckpt.input_shape(),
            dim: ckpt.embedding_dim,
            inner: RwLock::new(Some(ckpt)),
        })
    }

    /// Loads a checkpoint file. Fails with [`EmbedError::ModelLoad`].
    pub fn load(path: &Path) -> Result<Self, EmbedError> {
        let model = Self::from_checkpoint(Checkpoint::load(path)?)?;
        tracing::info!(
            version = %model.version,
            shape = %model.input_shape,
            dim = model.dim,
            "embed: loaded model from {}",
            path.display()
        );
        Ok(model)
    }

    /// Releases the weights. Later calls to `embed` fail with
    /// [`EmbedError::Closed`].
    pub fn close(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = None;
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl EmbeddingModel for ProjectionModel {
    fn embed(&self, features: &FeatureTensor) -> Result<Embedding, EmbedError> {
        check_shape(self, features)?;

        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let ckpt = inner.as_ref().ok_or(EmbedError::Closed)?;

        let valid = features.valid_frames();
        if valid == 0 {
            return Err(EmbedError::Inference("tensor has no valid frames".into()));
        }

        let pooled = pool_frames(ckpt, features, valid);

        let h2 = 2 * ckpt.hidden;
        let mut out: Vec<f32> = (0..ckpt.embedding_dim)
            .map(|k| {
                let row = &ckpt.w2[k * h2..(k + 1) * h2];
                let dot: f64 = row
                    .iter()
                    .zip(&pooled)
                    .map(|(&w, &p)| w as f64 * p)
                    .sum();
                (ckpt.b2[k] as f64 + dot) as f32
            })
            .collect();

        if out.iter().any(|x| !x.is_finite()) {
            return Err(EmbedError::Inference("non-finite embedding value".into()));
        }
        l2_normalize(&mut out);
        Ok(Embedding::new(out))
    }

    fn input_shape(&self) -> FeatureShape {
        self.input_shape
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Projects the first `valid` frames and returns `[mean; std]` of the
/// hidden activations.
fn pool_frames(ckpt: &Checkpoint, features: &FeatureTensor, valid: usize) -> Vec<f64> {
    let mels = ckpt.num_mels;
    let hidden = ckpt.hidden;

    let mut sum = vec![0.0f64; hidden];
    let mut sum_sq = vec![0.0f64; hidden];
    let mut x = vec![0.0f64; mels];

    for t in 0..valid {
        for (m, &v) in features.frame(t).iter().enumerate() {
            x[m] = (v as f64 - ckpt.input_mean[m] as f64) / ckpt.input_std[m] as f64;
        }
        for j in 0..hidden {
            let row = &ckpt.w1[j * mels..(j + 1) * mels];
            let z: f64 = ckpt.b1[j] as f64
                + row.iter().zip(&x).map(|(&w, &xi)| w as f64 * xi).sum::<f64>();
            let h = z.max(0.0);
            sum[j] += h;
            sum_sq[j] += h * h;
        }
    }

    let n = valid as f64;
    let mut pooled = Vec::with_capacity(2 * hidden);
    pooled.extend(sum.iter().map(|s| s / n));
    pooled.extend(
        sum.iter()
            .zip(&sum_sq)
            .map(|(s, sq)| (sq / n - (s / n) * (s / n)).max(0.0).sqrt()),
    );
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> FeatureShape {
        FeatureShape { num_mels: 4, num_frames: 6 }
    }

    fn model() -> ProjectionModel {
        ProjectionModel::from_checkpoint(Checkpoint::random(11, "proj-test", shape(), 8, 5)).unwrap()
    }

    fn tensor(valid: usize, fill: impl Fn(usize, usize) -> f32) -> FeatureTensor {
        let s = shape();
        let mut data = Vec::with_capacity(s.len());
        for t in 0..s.num_frames {
            for m in 0..s.num_mels {
                data.push(if t < valid { fill(t, m) } else { -23.0 });
            }
        }
        FeatureTensor::from_parts(s, valid, data).unwrap()
    }

    #[test]
    fn output_is_unit_length() {
        let e = model().embed(&tensor(6, |t, m| (t + m) as f32 - 8.0)).unwrap();
        assert_eq!(e.dimension(), 5);
        assert!((e.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn embed_is_deterministic() {
        let m = model();
        let f = tensor(4, |t, m| (t * 3 + m) as f32 * 0.5 - 10.0);
        assert_eq!(m.embed(&f).unwrap(), m.embed(&f).unwrap());
    }

    #[test]
    fn batch_matches_single() {
        let m = model();
        let a = tensor(6, |t, m| (t + m) as f32 - 12.0);
        let b = tensor(2, |t, m| (t * m) as f32 - 5.0);
        let batch = m.embed_batch(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(batch, vec![m.embed(&a).unwrap(), m.embed(&b).unwrap()]);
    }

    #[test]
    fn padding_frames_are_ignored() {
        let m = model();
        let f = |t: usize, m: usize| (t + 2 * m) as f32 - 9.0;
        let a = tensor(3, f);
        // Same valid frames, different padding content.
        let (s, valid, mut data) = a.clone().into_parts();
        for v in &mut data[valid * s.num_mels..] {
            *v = 4.0;
        }
        let b = FeatureTensor::from_parts(s, valid, data).unwrap();
        assert_eq!(m.embed(&a).unwrap(), m.embed(&b).unwrap());
    }

    #[test]
    fn shape_mismatch_rejected() {
        let other = FeatureShape { num_mels: 4, num_frames: 5 };
        let f = FeatureTensor::from_parts(other, 5, vec![0.0; 20]).unwrap();
        let err = model().embed(&f).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::ShapeMismatch { expected, got } if expected == shape() && got == other
        ));
    }

    #[test]
    fn no_valid_frames_rejected() {
        let err = model().embed(&tensor(0, |_, _| 0.0)).unwrap_err();
        assert!(matches!(err, EmbedError::Inference(_)));
    }

    #[test]
    fn closed_model_rejects_calls() {
        let m = model();
        assert!(!m.is_closed());
        m.close();
        m.close();
        assert!(m.is_closed());
        assert!(matches!(m.embed(&tensor(6, |_, _| 0.0)), Err(EmbedError::Closed)));
        assert_eq!(m.version(), "proj-test");
    }

    #[test]
    fn model_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProjectionModel>();
    }
}
