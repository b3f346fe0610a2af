use std::path::PathBuf;

use clap::Args;
use melodeez_catalog::CatalogIndex;
use melodeez_embed::{EmbeddingModel, ProjectionModel};
use serde::Serialize;

use super::print_json;
use crate::Cli;

/// Show the contents of a catalog.
///
/// With --model the catalog is checked against the model's version;
/// without it the catalog is listed as-is.
#[derive(Args)]
pub struct InspectCommand {
    /// Catalog path
    catalog: PathBuf,
    /// Verify the catalog against this model checkpoint
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Serialize)]
struct TrackRow<'a> {
    track_id: &'a str,
    title: &'a str,
    artist: &'a str,
}

#[derive(Serialize)]
struct CatalogSummary<'a> {
    model_version: &'a str,
    dimension: usize,
    tracks: Vec<TrackRow<'a>>,
}

impl InspectCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let index = match &self.model {
            Some(model_path) => {
                let model = ProjectionModel::load(model_path)?;
                CatalogIndex::load_from_path(&self.catalog, model.version())?
            }
            None => {
                let mut file = std::fs::File::open(&self.catalog)?;
                CatalogIndex::load_unverified(&mut file)?
            }
        };

        let summary = CatalogSummary {
            model_version: index.model_version(),
            dimension: index.dimension(),
            tracks: index
                .all()
                .iter()
                .map(|e| TrackRow {
                    track_id: &e.track_id,
                    title: &e.title,
                    artist: &e.artist,
                })
                .collect(),
        };

        if cli.json {
            return print_json(&summary);
        }
        println!("Model:     {}", summary.model_version);
        println!("Dimension: {}", summary.dimension);
        println!("Tracks:    {}", summary.tracks.len());
        for t in &summary.tracks {
            println!("  {:<24} {} by {}", t.track_id, t.title, t.artist);
        }
        Ok(())
    }
}
