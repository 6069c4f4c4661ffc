use criterion::{Criterion, black_box, criterion_group, criterion_main};

use coughcheck_audio::Waveform;
use coughcheck_classifier::{FeatureExtractor, PipelineConfig};

fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let cfg = PipelineConfig::default();
    let extractor = FeatureExtractor::new(&cfg);

    let full = Waveform::from_samples(sine(440.0, cfg.sample_rate, 3.0), cfg.sample_rate);
    c.bench_function("extract_3s_clip", |b| {
        b.iter(|| extractor.extract(black_box(&full)).unwrap())
    });

    let short = Waveform::from_samples(sine(440.0, cfg.sample_rate, 0.5), cfg.sample_rate);
    c.bench_function("extract_short_clip_with_padding", |b| {
        b.iter(|| extractor.extract(black_box(&short)).unwrap())
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
