//! Versioned model checkpoints.
//!
//! A checkpoint is a JSON document holding the weights of a
//! [`ProjectionModel`](crate::ProjectionModel):
//!
//! ```text
//! {
//!   "format": "melodeez-projection",
//!   "version": "proj-v1",
//!   "num_mels": 80, "num_frames": 630,
//!   "hidden": 256, "embedding_dim": 512,
//!   "input_mean": [num_mels], "input_std": [num_mels],
//!   "w1": [hidden * num_mels], "b1": [hidden],
//!   "w2": [embedding_dim * 2 * hidden], "b2": [embedding_dim]
//! }
//! ```
//!
//! Matrices are row-major. The version string pins the embedding space:
//! catalogs built with one version cannot be searched with another.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use melodeez_audio::FeatureShape;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Format tag written into every checkpoint.
pub const CHECKPOINT_FORMAT: &str = "melodeez-projection";

/// Weights of a frame-projection embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format: String,
    pub version: String,
    pub num_mels: usize,
    pub num_frames: usize,
    pub hidden: usize,
    pub embedding_dim: usize,
    pub input_mean: Vec<f32>,
    pub input_std: Vec<f32>,
    pub w1: Vec<f32>,
    pub b1: Vec<f32>,
    pub w2: Vec<f32>,
    pub b2: Vec<f32>,
}

impl Checkpoint {
    /// Generates an untrained, Xavier-initialised checkpoint.
    ///
    /// The same seed and sizes always produce identical weights. Input
    /// normalisation is set to rough log-mel statistics.
    pub fn random(
        seed: u64,
        version: impl Into<String>,
        input: FeatureShape,
        hidden: usize,
        embedding_dim: usize,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_mels = input.num_mels;

        let mut xavier = |rows: usize, cols: usize| -> Vec<f32> {
            let a = (6.0 / (rows + cols).max(1) as f64).sqrt() as f32;
            (0..rows * cols).map(|_| rng.gen_range(-a..=a)).collect()
        };
        let w1 = xavier(hidden, num_mels);
        let w2 = xavier(embedding_dim, 2 * hidden);

        Self {
            format: CHECKPOINT_FORMAT.to_string(),
            version: version.into(),
            num_mels,
            num_frames: input.num_frames,
            hidden,
            embedding_dim,
            input_mean: vec![-10.0; num_mels],
            input_std: vec![5.0; num_mels],
            w1,
            b1: vec![0.0; hidden],
            w2,
            b2: vec![0.0; embedding_dim],
        }
    }

    pub fn input_shape(&self) -> FeatureShape {
        FeatureShape {
            num_mels: self.num_mels,
            num_frames: self.num_frames,
        }
    }

    /// Loads and validates a checkpoint file.
    ///
    /// Any failure (missing file, malformed JSON, wrong format tag,
    /// inconsistent sizes) is reported as [`EmbedError::ModelLoad`].
    pub fn load(path: &Path) -> Result<Self, EmbedError> {
        let file = File::open(path)
            .map_err(|e| EmbedError::ModelLoad(format!("{}: {e}", path.display())))?;
        let ckpt: Checkpoint = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EmbedError::ModelLoad(format!("{}: {e}", path.display())))?;
        ckpt.validate()?;
        Ok(ckpt)
    }

    /// Writes the checkpoint as JSON.
    pub fn save(&self, path: &Path) -> Result<(), EmbedError> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut w, self)
            .map_err(|e| EmbedError::Io(std::io::Error::other(e)))?;
        w.flush()?;
        Ok(())
    }

    /// Checks the format tag and that every tensor matches the declared sizes.
    pub fn validate(&self) -> Result<(), EmbedError> {
        let fail = |msg: String| Err(EmbedError::ModelLoad(msg));
        if self.format != CHECKPOINT_FORMAT {
            return fail(format!(
                "unsupported checkpoint format {:?}, want {CHECKPOINT_FORMAT:?}",
                self.format
            ));
        }
        if self.version.is_empty() {
            return fail("empty version string".into());
        }
        if self.num_mels == 0 || self.num_frames == 0 || self.hidden == 0 || self.embedding_dim == 0 {
            return fail("all sizes must be positive".into());
        }

        let tensors: [(&str, &[f32], usize); 6] = [
            ("input_mean", &self.input_mean, self.num_mels),
            ("input_std", &self.input_std, self.num_mels),
            ("w1", &self.w1, self.hidden * self.num_mels),
            ("b1", &self.b1, self.hidden),
            ("w2", &self.w2, self.embedding_dim * 2 * self.hidden),
            ("b2", &self.b2, self.embedding_dim),
        ];
        for (name, data, want) in tensors {
            if data.len() != want {
                return fail(format!("{name} has {} values, want {want}", data.len()));
            }
            if data.iter().any(|x| !x.is_finite()) {
                return fail(format!("{name} contains non-finite values"));
            }
        }
        if self.input_std.iter().any(|&s| s <= 0.0) {
            return fail("input_std must be positive".into());
        }
        Ok(())
    }
}
