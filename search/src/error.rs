use thiserror::Error;

/// Errors returned by the match engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search: dimension mismatch: query has {got}, catalog has {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("search: invalid config: {0}")]
    InvalidConfig(String),
}
