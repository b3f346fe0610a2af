use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use melodeez_audio::FeatureExtractor;
use melodeez_audio::fbank::Config as FbankConfig;
use melodeez_catalog::CatalogIndex;
use melodeez_embed::{EmbeddingModel, ProjectionModel};
use melodeez_pipeline::{Pipeline, PipelineConfig, ScratchWorkspace};
use melodeez_search::DEFAULT_MAX_RESULTS;
use tracing::debug;

use super::{get_config, print_json, resolve_path};
use crate::Cli;

/// Identify the song in an audio clip.
///
/// Prints one line per match, best first. Confidence is a rescaled
/// distance, not a probability.
#[derive(Args)]
pub struct SearchCommand {
    /// Query audio (wav, mp3, m4a, flac, ogg)
    audio: PathBuf,
    /// Model checkpoint
    #[arg(long)]
    model: Option<PathBuf>,
    /// Catalog built with the same model
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Maximum number of matches (capped at 20)
    #[arg(long)]
    top_k: Option<usize>,
    /// Keep intermediate artifacts in the workspace
    #[arg(long)]
    keep_artifacts: bool,
    /// Scratch workspace directory (default: temporary)
    #[arg(long)]
    workspace: Option<PathBuf>,
}

impl SearchCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let model_path = resolve_path(self.model.as_ref(), cfg.model.as_ref(), "model")?;
        let catalog_path = resolve_path(self.catalog.as_ref(), cfg.catalog.as_ref(), "catalog")?;

        let model = Arc::new(ProjectionModel::load(&model_path)?);
        let index = Arc::new(CatalogIndex::load_from_path(&catalog_path, model.version())?);
        debug!(
            "search: model {} ({}), catalog {} ({} tracks)",
            model.version(),
            model_path.display(),
            catalog_path.display(),
            index.size()
        );

        let pipeline_cfg = PipelineConfig {
            top_k: self.top_k.or(cfg.top_k).unwrap_or(DEFAULT_MAX_RESULTS),
            clip_bounds: Some(cfg.clip_bounds()?),
            keep_artifacts: self.keep_artifacts || cfg.keep_artifacts.unwrap_or(false),
        };
        let pipeline = Pipeline::new(
            FeatureExtractor::new(FbankConfig::default())?,
            model,
            index,
            cfg.search_config(),
            pipeline_cfg,
        )?;

        let results = match self.workspace.as_ref().or(cfg.workspace.as_ref()) {
            Some(root) => {
                let mut ws = ScratchWorkspace::at(root)?;
                pipeline.run_in(&mut ws, &self.audio)?
            }
            None => pipeline.run(&self.audio)?,
        };

        if cli.json {
            return print_json(&results);
        }
        if results.is_empty() {
            println!("No matches found.");
            return Ok(());
        }
        for r in &results {
            println!("{} by {}  Match: {}", r.title, r.artist, r.display_confidence());
        }
        Ok(())
    }
}
