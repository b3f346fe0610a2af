use std::path::PathBuf;

use clap::Args;
use melodeez_audio::fbank::Config as FbankConfig;
use melodeez_embed::Checkpoint;
use serde::Serialize;

use super::{print_json, print_success};
use crate::Cli;

/// Write an untrained, seeded model checkpoint.
///
/// The checkpoint accepts the default feature shape (80 mel bins x 630
/// frames). Catalogs are tied to the checkpoint's version string.
#[derive(Args)]
pub struct InitModelCommand {
    /// Output checkpoint path
    #[arg(long)]
    out: PathBuf,
    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Hidden units per frame
    #[arg(long, default_value_t = 256)]
    hidden: usize,
    /// Embedding dimension
    #[arg(long, default_value_t = 512)]
    dim: usize,
    /// Version string recorded in catalogs
    #[arg(long, default_value = "proj-v1")]
    version: String,
}

#[derive(Serialize)]
struct ModelSummary<'a> {
    path: String,
    version: &'a str,
    input_shape: String,
    embedding_dim: usize,
}

impl InitModelCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let shape = FbankConfig::default().shape();
        let ckpt = Checkpoint::random(self.seed, &self.version, shape, self.hidden, self.dim);
        ckpt.validate()?;
        ckpt.save(&self.out)?;

        if cli.json {
            print_json(&ModelSummary {
                path: self.out.display().to_string(),
                version: &ckpt.version,
                input_shape: shape.to_string(),
                embedding_dim: ckpt.embedding_dim,
            })?;
        } else {
            print_success(&format!(
                "wrote model {} ({shape} -> {}) to {}",
                ckpt.version,
                ckpt.embedding_dim,
                self.out.display()
            ));
        }
        Ok(())
    }
}
