//! Ranking invariants over randomly generated catalogs.

use std::collections::HashSet;

use melodeez_catalog::{CatalogEntry, CatalogIndex};
use melodeez_embed::{Embedding, l2_normalize};
use melodeez_search::{MatchEngine, SearchConfig, euclidean_distance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: usize = 16;

fn unit_vector(rng: &mut StdRng) -> Vec<f32> {
    let mut v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    l2_normalize(&mut v);
    v
}

/// Catalog with deliberately colliding (title, artist) pairs.
fn random_catalog(rng: &mut StdRng, size: usize) -> CatalogIndex {
    let entries: Vec<CatalogEntry> = (0..size)
        .map(|i| CatalogEntry {
            track_id: format!("track-{i}"),
            title: format!("Title {}", rng.gen_range(0..size / 2 + 1)),
            artist: format!("Artist {}", rng.gen_range(0..3)),
            embedding: Embedding::new(unit_vector(rng)),
        })
        .collect();
    CatalogIndex::from_entries("v", DIM, entries).unwrap()
}

#[test]
fn results_are_bounded_sorted_and_unique() {
    let mut rng = StdRng::seed_from_u64(2024);
    let engine = MatchEngine::new(SearchConfig::default()).unwrap();

    for round in 0..50 {
        let size = rng.gen_range(0..60);
        let index = random_catalog(&mut rng, size);
        let query = Embedding::new(unit_vector(&mut rng));
        let k = rng.gen_range(0..30);

        let results = engine.search(&query, &index, k).unwrap();
        assert!(results.len() <= k.min(20), "round {round}");

        let mut seen = HashSet::new();
        for pair in results.windows(2) {
            assert!(pair[0].confidence_percent >= pair[1].confidence_percent);
        }
        for r in &results {
            assert!((0.0..=100.0).contains(&r.confidence_percent));
            assert!(seen.insert((r.title.clone(), r.artist.clone())), "duplicate in round {round}");
        }
    }
}

#[test]
fn kept_duplicate_is_the_closest() {
    let mut rng = StdRng::seed_from_u64(7);
    let engine = MatchEngine::new(SearchConfig::default()).unwrap();

    for _ in 0..20 {
        let index = random_catalog(&mut rng, 40);
        let query = Embedding::new(unit_vector(&mut rng));
        let results = engine.search(&query, &index, 20).unwrap();

        for r in &results {
            let best = index
                .all()
                .iter()
                .filter(|e| e.title == r.title && e.artist == r.artist)
                .map(|e| euclidean_distance(query.as_slice(), e.embedding.as_slice()))
                .fold(f64::INFINITY, f64::min);
            let want = ((1.0 - best / 2.0) * 100.0).clamp(0.0, 100.0);
            assert!((r.confidence_percent - want).abs() < 1e-9);
        }
    }
}
