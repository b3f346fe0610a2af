use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use melodeez_catalog::{CatalogEntry, CatalogIndex};
use melodeez_embed::{Embedding, l2_normalize};
use melodeez_search::{MatchEngine, SearchConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: usize = 512;

fn random_unit(rng: &mut StdRng) -> Vec<f32> {
    let mut v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    l2_normalize(&mut v);
    v
}

fn bench_search(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let engine = MatchEngine::new(SearchConfig::default()).unwrap();
    let query = Embedding::new(random_unit(&mut rng));

    let mut group = c.benchmark_group("search");
    for size in [100usize, 1_000, 10_000] {
        let entries: Vec<CatalogEntry> = (0..size)
            .map(|i| CatalogEntry {
                track_id: format!("t{i}"),
                title: format!("Title {i}"),
                artist: "Artist".into(),
                embedding: Embedding::new(random_unit(&mut rng)),
            })
            .collect();
        let index = CatalogIndex::from_entries("bench", DIM, entries).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| engine.search(black_box(&query), index, 20).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
