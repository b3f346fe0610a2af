use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use melodeez_audio::fbank::{Config, FeatureExtractor};
use melodeez_audio::synth::Melody;
use melodeez_embed::{Checkpoint, EmbeddingModel, ProjectionModel};

fn bench_embed(c: &mut Criterion) {
    let cfg = Config::default();
    let extractor = FeatureExtractor::new(cfg.clone()).unwrap();
    let clip = Melody::by_id("ode_to_joy")
        .unwrap()
        .render(cfg.sample_rate, Duration::from_secs(15));
    let features = extractor.extract(&clip).unwrap();

    let model =
        ProjectionModel::from_checkpoint(Checkpoint::random(1, "bench", cfg.shape(), 256, 512))
            .unwrap();

    c.bench_function("projection_embed_80x630", |b| {
        b.iter(|| model.embed(black_box(&features)).unwrap())
    });
}

criterion_group!(benches, bench_embed);
criterion_main!(benches);
