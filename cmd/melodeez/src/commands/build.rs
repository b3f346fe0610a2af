use std::path::PathBuf;

use clap::Args;
use melodeez_audio::FeatureExtractor;
use melodeez_audio::fbank::Config as FbankConfig;
use melodeez_catalog::{CatalogBuilder, sources_from_dir, sources_from_manifest};
use melodeez_embed::{EmbeddingModel, ProjectionModel};
use serde::Serialize;
use tracing::debug;

use super::{get_config, print_json, print_success, resolve_path};
use crate::Cli;

/// Build a catalog from reference tracks.
///
/// Tracks come either from a directory, where each file is named
/// "Artist - Title.ext", or from a JSON manifest. Tracks that fail to
/// decode are skipped and listed.
#[derive(Args)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["tracks", "manifest"])))]
pub struct BuildCommand {
    /// Directory of audio files
    #[arg(long)]
    tracks: Option<PathBuf>,
    /// JSON manifest: [{"file", "title", "artist", "track_id"?}]
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Model checkpoint
    #[arg(long)]
    model: Option<PathBuf>,
    /// Output catalog path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct BuildSummary {
    catalog: String,
    model_version: String,
    tracks: usize,
    skipped: Vec<SkippedSummary>,
}

#[derive(Serialize)]
struct SkippedSummary {
    track_id: String,
    reason: String,
}

impl BuildCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let model_path = resolve_path(self.model.as_ref(), cfg.model.as_ref(), "model")?;
        let out = resolve_path(self.out.as_ref(), cfg.catalog.as_ref(), "catalog")?;

        let sources = match (&self.tracks, &self.manifest) {
            (Some(dir), _) => sources_from_dir(dir)?,
            (None, Some(manifest)) => sources_from_manifest(manifest)?,
            (None, None) => anyhow::bail!("either --tracks or --manifest is required"),
        };

        debug!("build: {} sources, model {}", sources.len(), model_path.display());
        let model = ProjectionModel::load(&model_path)?;
        let extractor = FeatureExtractor::new(FbankConfig::default())?;
        let (index, report) = CatalogBuilder::new(&extractor, &model)?.build(sources)?;
        index.save_to_path(&out)?;

        let summary = BuildSummary {
            catalog: out.display().to_string(),
            model_version: model.version().to_string(),
            tracks: index.size(),
            skipped: report
                .skipped
                .iter()
                .map(|s| SkippedSummary {
                    track_id: s.track_id.clone(),
                    reason: s.reason.to_string(),
                })
                .collect(),
        };

        if cli.json {
            return print_json(&summary);
        }
        for s in &summary.skipped {
            eprintln!("[skip] {}: {}", s.track_id, s.reason);
        }
        print_success(&format!(
            "catalog {} built with {} tracks ({} skipped), model {}",
            summary.catalog,
            summary.tracks,
            summary.skipped.len(),
            summary.model_version
        ));
        Ok(())
    }
}
