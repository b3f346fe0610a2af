//! Query orchestration.
//!
//! A [`Pipeline`] runs one query through four strictly ordered stages,
//! each leaving an artifact in a [`ScratchWorkspace`] that the next stage
//! reads back:
//!
//! 1. staging: the query audio is copied into `input/`
//! 2. extract: decode, duration check, log-mel features -> `processed/features.bin`
//! 3. embed: features -> embedding -> `embedding/query.emb`
//! 4. match: embedding vs catalog -> `results/search_results.json`
//!
//! Any failure is reported as a [`PipelineError`] naming the stage. The
//! workspace is reset before a run and cleared after it, on every exit path.

pub mod artifact;
mod error;
mod orchestrator;
mod session;
mod state;
mod workspace;

pub use error::{PipelineError, SessionError, Stage, StageError};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use session::{ClientSession, QueryAudio, SessionState};
pub use state::PipelineState;
pub use workspace::{EMBEDDING_FILE, FEATURES_FILE, RESULTS_FILE, ScratchWorkspace};
