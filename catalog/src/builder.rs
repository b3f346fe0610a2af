//! Catalog construction with per-entry failure tolerance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use melodeez_audio::FeatureExtractor;
use melodeez_audio::decode::decode_file;
use melodeez_embed::{EmbedError, EmbeddingModel};
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::index::{CatalogEntry, CatalogIndex};
use crate::source::{AudioSource, TrackSource};

/// A track left out of the catalog and why.
#[derive(Debug)]
pub struct SkippedTrack {
    pub track_id: String,
    pub reason: CatalogError,
}

/// Outcome of [`CatalogBuilder::build`] besides the index itself.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub skipped: Vec<SkippedTrack>,
    /// True when the interrupt flag stopped the build early.
    pub interrupted: bool,
}

/// Embeds reference tracks into a [`CatalogIndex`].
///
/// A track that cannot be decoded or embedded, or whose id repeats an
/// earlier one, is skipped with a warning; the rest of the build goes on.
/// Only a closed model aborts the whole build.
pub struct CatalogBuilder<'a> {
    extractor: &'a FeatureExtractor,
    model: &'a dyn EmbeddingModel,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> CatalogBuilder<'a> {
    /// Pairs an extractor with a model. Their shapes must agree.
    pub fn new(
        extractor: &'a FeatureExtractor,
        model: &'a dyn EmbeddingModel,
    ) -> Result<Self, CatalogError> {
        let expected = model.input_shape();
        let got = extractor.shape();
        if expected != got {
            return Err(EmbedError::ShapeMismatch { expected, got }.into());
        }
        Ok(Self {
            extractor,
            model,
            interrupt: None,
        })
    }

    /// Stops the build between entries once `flag` is set.
    pub fn interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn build(
        &self,
        sources: impl IntoIterator<Item = TrackSource>,
    ) -> Result<(CatalogIndex, BuildReport), CatalogError> {
        let mut index = CatalogIndex::new(self.model.version(), self.model.dimension());
        let mut report = BuildReport::default();

        for source in sources {
            if self
                .interrupt
                .as_ref()
                .is_some_and(|f| f.load(Ordering::Relaxed))
            {
                warn!("catalog: build interrupted after {} tracks", index.size());
                report.interrupted = true;
                break;
            }

            let track_id = source.track_id.clone();
            match self.build_entry(&index, source) {
                Ok(entry) => index.insert(entry)?,
                Err(CatalogError::Embed(EmbedError::Closed)) => {
                    return Err(EmbedError::Closed.into());
                }
                Err(reason) => {
                    warn!("catalog: skipping track {track_id:?}: {reason}");
                    report.skipped.push(SkippedTrack { track_id, reason });
                }
            }
        }

        info!(
            model_version = %index.model_version(),
            tracks = index.size(),
            skipped = report.skipped.len(),
            "catalog: build finished"
        );
        Ok((index, report))
    }

    fn build_entry(
        &self,
        index: &CatalogIndex,
        source: TrackSource,
    ) -> Result<CatalogEntry, CatalogError> {
        if index.contains(&source.track_id) {
            return Err(CatalogError::DuplicateTrack(source.track_id));
        }
        let clip = match source.audio {
            AudioSource::Path(path) => decode_file(&path)?,
            AudioSource::Clip(clip) => clip,
        };
        let features = self.extractor.extract(&clip)?;
        let embedding = self.model.embed(&features)?;
        if embedding.dimension() != index.dimension() {
            return Err(CatalogError::DimensionMismatch {
                expected: index.dimension(),
                got: embedding.dimension(),
            });
        }
        Ok(CatalogEntry {
            track_id: source.track_id,
            title: source.title,
            artist: source.artist,
            embedding,
        })
    }
}
