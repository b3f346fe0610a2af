//! Query-time scoring, deduplication and ranking.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use melodeez_catalog::CatalogIndex;
use melodeez_embed::Embedding;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confidence::{confidence, format_confidence};
use crate::error::SearchError;
use crate::metric::Metric;

/// Default number of results returned to the caller.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Match engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub metric: Metric,
    /// Distance that maps to 0% confidence. Calibrated against the observed
    /// distance range of the deployed embedding space.
    pub max_distance: f64,
    /// Upper bound on the number of results, whatever `top_k` asks for.
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
            max_distance: 2.0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Distance of one catalog entry to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    /// Insertion position in the catalog.
    pub position: usize,
    pub distance: f64,
    pub confidence: f64,
}

/// One ranked match as presented to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub title: String,
    pub artist: String,
    /// Rescaled distance in `[0, 100]`; not a probability.
    pub confidence_percent: f64,
}

impl RankedResult {
    /// Confidence with one decimal, e.g. `"92.9%"`.
    pub fn display_confidence(&self) -> String {
        format_confidence(self.confidence_percent)
    }
}

/// Scores a query embedding against a catalog.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    cfg: SearchConfig,
}

impl MatchEngine {
    pub fn new(cfg: SearchConfig) -> Result<Self, SearchError> {
        if !(cfg.max_distance.is_finite() && cfg.max_distance > 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "max_distance must be positive and finite, got {}",
                cfg.max_distance
            )));
        }
        if cfg.max_results == 0 {
            return Err(SearchError::InvalidConfig("max_results must be positive".into()));
        }
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    /// Scores every catalog entry, in catalog order.
    ///
    /// Distances are computed in parallel; the output order is unaffected.
    pub fn candidates(
        &self,
        query: &Embedding,
        index: &CatalogIndex,
    ) -> Result<Vec<MatchCandidate>, SearchError> {
        if index.is_empty() {
            return Ok(Vec::new());
        }
        if query.dimension() != index.dimension() {
            return Err(SearchError::DimensionMismatch {
                got: query.dimension(),
                want: index.dimension(),
            });
        }

        let q = query.as_slice();
        let metric = self.cfg.metric;
        let max_distance = self.cfg.max_distance;

        Ok(index
            .all()
            .par_iter()
            .enumerate()
            .map(|(position, entry)| {
                let distance = metric.distance(q, entry.embedding.as_slice());
                MatchCandidate {
                    track_id: entry.track_id.clone(),
                    title: entry.title.clone(),
                    artist: entry.artist.clone(),
                    position,
                    distance,
                    confidence: confidence(distance, max_distance),
                }
            })
            .collect())
    }

    /// Returns at most `min(top_k, max_results)` deduplicated matches,
    /// best first.
    ///
    /// Entries sharing the exact `(title, artist)` pair collapse to the one
    /// with the lowest distance (the earlier entry on equal distance).
    /// Results are ordered by descending confidence, then catalog order.
    /// An empty catalog yields an empty list.
    pub fn search(
        &self,
        query: &Embedding,
        index: &CatalogIndex,
        top_k: usize,
    ) -> Result<Vec<RankedResult>, SearchError> {
        let candidates = self.candidates(query, index)?;
        let total = candidates.len();

        let mut ranked = dedup(candidates);
        let unique = ranked.len();
        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.position.cmp(&b.position))
        });
        ranked.truncate(top_k.min(self.cfg.max_results));

        debug!(
            candidates = total,
            unique,
            returned = ranked.len(),
            "search: ranked matches"
        );

        Ok(ranked
            .into_iter()
            .map(|c| RankedResult {
                title: c.title,
                artist: c.artist,
                confidence_percent: c.confidence,
            })
            .collect())
    }
}

/// Keeps the lowest-distance candidate per `(title, artist)`.
fn dedup(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut best: Vec<MatchCandidate> = Vec::with_capacity(candidates.len());
    let mut slots: HashMap<(String, String), usize> = HashMap::new();

    for c in candidates {
        match slots.entry((c.title.clone(), c.artist.clone())) {
            Entry::Vacant(v) => {
                v.insert(best.len());
                best.push(c);
            }
            Entry::Occupied(o) => {
                let kept = &mut best[*o.get()];
                if c.distance.total_cmp(&kept.distance).is_lt() {
                    *kept = c;
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use melodeez_catalog::CatalogEntry;

    use super::*;

    fn entry(id: &str, title: &str, artist: &str, v: &[f32]) -> CatalogEntry {
        CatalogEntry {
            track_id: id.into(),
            title: title.into(),
            artist: artist.into(),
            embedding: Embedding::new(v.to_vec()),
        }
    }

    fn engine() -> MatchEngine {
        MatchEngine::new(SearchConfig::default()).unwrap()
    }

    #[test]
    fn concrete_scenario() {
        let index = CatalogIndex::from_entries(
            "v",
            2,
            [
                entry("a", "Song A", "Artist X", &[1.0, 0.0]),
                entry("b", "Song B", "Artist Y", &[0.0, 1.0]),
            ],
        )
        .unwrap();
        let results = engine()
            .search(&Embedding::new(vec![0.9, 0.1]), &index, 20)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Song A");
        assert_eq!(results[0].artist, "Artist X");
        let want = (1.0 - 0.02f64.sqrt() / 2.0) * 100.0;
        assert!((results[0].confidence_percent - want).abs() < 1e-4);
        assert_eq!(results[0].display_confidence(), "92.9%");
        assert_eq!(results[1].title, "Song B");
        assert!(results[1].confidence_percent < results[0].confidence_percent);
    }

    #[test]
    fn empty_catalog_returns_nothing() {
        let index = CatalogIndex::new("v", 2);
        let results = engine().search(&Embedding::new(vec![1.0, 0.0]), &index, 20).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn dedup_keeps_lowest_distance() {
        let index = CatalogIndex::from_entries(
            "v",
            2,
            [
                entry("a1", "Song A", "X", &[0.0, 1.0]),
                entry("b", "Song B", "Y", &[0.5, 0.5]),
                entry("a2", "Song A", "X", &[1.0, 0.0]),
                entry("a3", "Song A", "Other", &[-1.0, 0.0]),
            ],
        )
        .unwrap();
        let e = engine();
        let query = Embedding::new(vec![1.0, 0.0]);

        let results = e.search(&query, &index, 20).unwrap();
        let names: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.title.as_str(), r.artist.as_str()))
            .collect();
        assert_eq!(names, [("Song A", "X"), ("Song B", "Y"), ("Song A", "Other")]);
        assert_eq!(results[0].confidence_percent, 100.0);
    }

    #[test]
    fn ties_follow_catalog_order() {
        let index = CatalogIndex::from_entries(
            "v",
            2,
            [
                entry("c", "C", "Z", &[0.0, 1.0]),
                entry("a", "A", "Z", &[0.0, -1.0]),
                entry("b", "B", "Z", &[1.0, 0.0]),
            ],
        )
        .unwrap();
        let results = engine()
            .search(&Embedding::new(vec![1.0, 0.0]), &index, 20)
            .unwrap();
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["B", "C", "A"]);
        assert_eq!(results[1].confidence_percent, results[2].confidence_percent);
    }

    #[test]
    fn top_k_and_max_results_cap() {
        let entries: Vec<CatalogEntry> = (0..30)
            .map(|i| entry(&i.to_string(), &format!("T{i}"), "A", &[i as f32 * 0.01, 1.0]))
            .collect();
        let index = CatalogIndex::from_entries("v", 2, entries).unwrap();
        let q = Embedding::new(vec![0.0, 1.0]);
        let e = engine();

        assert_eq!(e.search(&q, &index, 5).unwrap().len(), 5);
        assert_eq!(e.search(&q, &index, 100).unwrap().len(), 20);
        assert!(e.search(&q, &index, 0).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let index = CatalogIndex::from_entries("v", 2, [entry("a", "A", "X", &[1.0, 0.0])]).unwrap();
        let err = engine()
            .search(&Embedding::new(vec![1.0, 0.0, 0.0]), &index, 5)
            .unwrap_err();
        assert!(matches!(err, SearchError::DimensionMismatch { got: 3, want: 2 }));
    }

    #[test]
    fn candidates_keep_catalog_order() {
        let index = CatalogIndex::from_entries(
            "v",
            2,
            [
                entry("x", "X", "A", &[0.0, 1.0]),
                entry("y", "Y", "A", &[1.0, 0.0]),
            ],
        )
        .unwrap();
        let c = engine()
            .candidates(&Embedding::new(vec![1.0, 0.0]), &index)
            .unwrap();
        assert_eq!(c[0].track_id, "x");
        assert_eq!(c[1].position, 1);
        assert_eq!(c[1].distance, 0.0);
    }

    #[test]
    fn invalid_configs_rejected() {
        for max_distance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = SearchConfig { max_distance, ..SearchConfig::default() };
            assert!(MatchEngine::new(cfg).is_err());
        }
        let cfg = SearchConfig { max_results: 0, ..SearchConfig::default() };
        assert!(matches!(MatchEngine::new(cfg), Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn cosine_metric_is_selectable() {
        let index = CatalogIndex::from_entries(
            "v",
            2,
            [entry("a", "A", "X", &[2.0, 0.0]), entry("b", "B", "X", &[0.0, 1.0])],
        )
        .unwrap();
        let e = MatchEngine::new(SearchConfig { metric: Metric::Cosine, ..SearchConfig::default() })
            .unwrap();
        let results = e.search(&Embedding::new(vec![1.0, 0.0]), &index, 2).unwrap();
        assert_eq!(results[0].title, "A");
        assert_eq!(results[0].confidence_percent, 100.0);
        assert_eq!(results[1].confidence_percent, 50.0);
    }

    #[test]
    fn ranked_result_serializes() {
        let r = RankedResult {
            title: "Song A".into(),
            artist: "Artist X".into(),
            confidence_percent: 92.9,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"title":"Song A","artist":"Artist X","confidence_percent":92.9}"#);
        assert_eq!(serde_json::from_str::<RankedResult>(&json).unwrap(), r);
    }
}
