//! Match engine: scores a query embedding against every catalog entry,
//! converts distances to confidence, collapses duplicate tracks and ranks.
//!
//! The default metric is Euclidean distance, with `max_distance = 2.0`
//! (the diameter of the unit sphere the embeddings live on).
//!
//! ```rust
//! use melodeez_catalog::{CatalogEntry, CatalogIndex};
//! use melodeez_embed::Embedding;
//! use melodeez_search::{MatchEngine, SearchConfig};
//!
//! let entry = |id: &str, v: Vec<f32>| CatalogEntry {
//!     track_id: id.into(),
//!     title: format!("Song {id}"),
//!     artist: "Artist".into(),
//!     embedding: Embedding::new(v),
//! };
//! let index = CatalogIndex::from_entries("v1", 2, [entry("A", vec![1.0, 0.0]), entry("B", vec![0.0, 1.0])]).unwrap();
//!
//! let engine = MatchEngine::new(SearchConfig::default()).unwrap();
//! let results = engine.search(&Embedding::new(vec![0.9, 0.1]), &index, 20).unwrap();
//! assert_eq!(results[0].title, "Song A");
//! assert_eq!(results[0].display_confidence(), "92.9%");
//! ```

mod confidence;
mod engine;
mod error;
mod metric;

pub use confidence::{confidence, format_confidence};
pub use engine::{DEFAULT_MAX_RESULTS, MatchCandidate, MatchEngine, RankedResult, SearchConfig};
pub use error::SearchError;
pub use metric::{Metric, cosine_distance, euclidean_distance};
