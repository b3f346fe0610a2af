use std::fmt;

use melodeez_audio::AudioError;
use melodeez_catalog::CatalogError;
use melodeez_embed::EmbedError;
use melodeez_search::SearchError;
use thiserror::Error;

use crate::session::SessionState;
use crate::state::PipelineState;

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pipeline construction.
    Setup,
    /// Copying and validating the query into the workspace.
    Staging,
    Extract,
    Embed,
    Match,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Setup => "setup",
            Stage::Staging => "staging",
            Stage::Extract => "extract",
            Stage::Embed => "embed",
            Stage::Match => "match",
        })
    }
}

/// Underlying cause of a stage failure.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("illegal state transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("session is {0}, not ready")]
    NotReady(SessionState),
}

/// A stage failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("pipeline: {stage} failed: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// Errors from [`ClientSession`](crate::ClientSession) actions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session: cannot {action} while {state}")]
    InvalidAction {
        action: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    Audio(#[from] AudioError),
}
