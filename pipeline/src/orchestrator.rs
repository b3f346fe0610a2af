//! Sequences staging, extraction, embedding and matching for one query.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use melodeez_audio::decode::decode_file;
use melodeez_audio::wav::write_clip;
use melodeez_audio::{AudioClip, AudioError, ClipBounds, FeatureExtractor};
use melodeez_catalog::{CatalogError, CatalogIndex};
use melodeez_embed::{EmbedError, EmbeddingModel};
use melodeez_search::{DEFAULT_MAX_RESULTS, MatchEngine, RankedResult, SearchConfig};
use tracing::info;

use crate::artifact;
use crate::error::{PipelineError, Stage, StageError};
use crate::session::{ClientSession, QueryAudio, SessionState};
use crate::state::{PipelineState, StateMachine};
use crate::workspace::{RunGuard, ScratchWorkspace};

/// Per-query behaviour.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of results requested from the match engine.
    pub top_k: usize,
    /// Reject query audio outside these bounds. `None` accepts any length.
    pub clip_bounds: Option<ClipBounds>,
    /// Leave artifacts in the workspace after the run.
    pub keep_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_MAX_RESULTS,
            clip_bounds: Some(ClipBounds::default()),
            keep_artifacts: false,
        }
    }
}

enum QueryInput<'a> {
    File(&'a Path),
    Clip(&'a AudioClip),
}

/// Query pipeline over a loaded model and catalog.
///
/// The pipeline itself is immutable, so concurrent queries can share it
/// as long as each brings its own [`ScratchWorkspace`].
pub struct Pipeline {
    extractor: FeatureExtractor,
    model: Arc<dyn EmbeddingModel>,
    index: Arc<CatalogIndex>,
    engine: MatchEngine,
    cfg: PipelineConfig,
}

impl Pipeline {
    /// Assembles a pipeline, checking that every component agrees.
    ///
    /// Fails at [`Stage::Setup`] when the extractor and model shapes differ,
    /// when the catalog was built by another model version or with another
    /// dimension, or when the search config is invalid.
    pub fn new(
        extractor: FeatureExtractor,
        model: Arc<dyn EmbeddingModel>,
        index: Arc<CatalogIndex>,
        search: SearchConfig,
        cfg: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let setup = |cause: StageError| PipelineError::new(Stage::Setup, cause);

        let expected = model.input_shape();
        let got = extractor.shape();
        if expected != got {
            return Err(setup(EmbedError::ShapeMismatch { expected, got }.into()));
        }
        if index.model_version() != model.version() {
            return Err(setup(
                CatalogError::VersionMismatch {
                    expected: model.version().to_string(),
                    got: index.model_version().to_string(),
                }
                .into(),
            ));
        }
        if index.dimension() != model.dimension() {
            return Err(setup(
                CatalogError::DimensionMismatch {
                    expected: model.dimension(),
                    got: index.dimension(),
                }
                .into(),
            ));
        }
        let engine = MatchEngine::new(search).map_err(|e| setup(e.into()))?;

        Ok(Self {
            extractor,
            model,
            index,
            engine,
            cfg,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Runs a query in a fresh temporary workspace.
    pub fn run(&self, path: &Path) -> Result<Vec<RankedResult>, PipelineError> {
        let mut ws =
            ScratchWorkspace::temporary().map_err(|e| PipelineError::new(Stage::Staging, e))?;
        self.run_in(&mut ws, path)
    }

    /// Runs a query in a caller-owned workspace, which is reset first.
    pub fn run_in(
        &self,
        ws: &mut ScratchWorkspace,
        path: &Path,
    ) -> Result<Vec<RankedResult>, PipelineError> {
        self.execute(ws, QueryInput::File(path))
    }

    /// Runs the query captured by a session in the `Ready` state.
    pub fn run_session(
        &self,
        session: &ClientSession,
        ws: &mut ScratchWorkspace,
    ) -> Result<Vec<RankedResult>, PipelineError> {
        let not_ready = || PipelineError::new(Stage::Staging, StageError::NotReady(session.state()));
        if session.state() != SessionState::Ready {
            return Err(not_ready());
        }
        match session.query().ok_or_else(not_ready)? {
            QueryAudio::Recording(clip) => self.execute(ws, QueryInput::Clip(clip)),
            QueryAudio::Upload(path) => self.execute(ws, QueryInput::File(path)),
        }
    }

    fn execute(
        &self,
        ws: &mut ScratchWorkspace,
        input: QueryInput<'_>,
    ) -> Result<Vec<RankedResult>, PipelineError> {
        ws.reset()
            .map_err(|e| PipelineError::new(Stage::Staging, e))?;
        let ws: &ScratchWorkspace = ws;
        let _guard = RunGuard::new(ws, self.cfg.keep_artifacts);

        let mut sm = StateMachine::new();
        let result = self.run_stages(&mut sm, ws, input);
        match &result {
            Ok(results) => info!(results = results.len(), "pipeline: query matched"),
            Err(e) => {
                sm.fail();
                info!(stage = %e.stage, "pipeline: query failed: {}", e.cause);
            }
        }
        result
    }

    fn run_stages(
        &self,
        sm: &mut StateMachine,
        ws: &ScratchWorkspace,
        input: QueryInput<'_>,
    ) -> Result<Vec<RankedResult>, PipelineError> {
        let at = |stage: Stage| move |cause: StageError| PipelineError::new(stage, cause);

        let staged = stage_input(ws, input).map_err(at(Stage::Staging))?;
        sm.advance(PipelineState::Staged).map_err(at(Stage::Staging))?;

        self.extract(ws, &staged).map_err(at(Stage::Extract))?;
        sm.advance(PipelineState::FeaturesReady)
            .map_err(at(Stage::Extract))?;

        self.embed(ws).map_err(at(Stage::Embed))?;
        sm.advance(PipelineState::EmbeddingReady)
            .map_err(at(Stage::Embed))?;

        let results = self.match_query(ws).map_err(at(Stage::Match))?;
        sm.advance(PipelineState::Matched).map_err(at(Stage::Match))?;
        sm.advance(PipelineState::Done).map_err(at(Stage::Match))?;
        Ok(results)
    }

    fn extract(&self, ws: &ScratchWorkspace, staged: &Path) -> Result<(), StageError> {
        let clip = decode_file(staged)?;
        if let Some(bounds) = &self.cfg.clip_bounds {
            bounds.check(clip.duration())?;
        }
        let features = self.extractor.extract(&clip)?;
        artifact::write_features(&ws.features_path(), &features)
    }

    fn embed(&self, ws: &ScratchWorkspace) -> Result<(), StageError> {
        let features = artifact::read_features(&ws.features_path(), self.extractor.shape())?;
        let embedding = self.model.embed(&features)?;
        artifact::write_embedding(&ws.embedding_path(), &embedding)
    }

    fn match_query(&self, ws: &ScratchWorkspace) -> Result<Vec<RankedResult>, StageError> {
        let query = artifact::read_embedding(&ws.embedding_path(), self.model.dimension())?;
        let results = self.engine.search(&query, &self.index, self.cfg.top_k)?;
        artifact::write_results(&ws.results_path(), &results)?;
        Ok(results)
    }
}

/// Copies (or writes) the query audio into `input/`, keeping the file
/// extension as the format hint.
fn stage_input(ws: &ScratchWorkspace, input: QueryInput<'_>) -> Result<PathBuf, StageError> {
    match input {
        QueryInput::File(path) => {
            let meta = fs::metadata(path).map_err(AudioError::Io)?;
            if !meta.is_file() {
                return Err(AudioError::Decode(format!("{} is not a file", path.display())).into());
            }
            if meta.len() == 0 {
                return Err(AudioError::Empty.into());
            }
            let name = match path.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("query.{ext}"),
                None => "query".to_string(),
            };
            let staged = ws.input_dir().join(name);
            fs::copy(path, &staged)?;
            Ok(staged)
        }
        QueryInput::Clip(clip) => {
            let staged = ws.input_dir().join("query.wav");
            write_clip(&staged, clip)?;
            Ok(staged)
        }
    }
}
