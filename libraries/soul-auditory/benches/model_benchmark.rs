//! Performance benchmarks for per-frame loudness model processing
//!
//! Run with: cargo bench -p soul-auditory --bench model_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use soul_auditory::{
    DoubleRoexBank, DoubleRoexSettings, DynamicLoudnessModel, ModelPreset, SignalBank, Stage,
};

/// Pink-ish power spectrum sampled every 8 Hz up to 16 kHz
fn generate_spectrum(n_ears: usize) -> SignalBank {
    let freqs: Vec<f64> = (1..=2000).map(|i| i as f64 * 8.0).collect();
    let powers: Vec<f64> = freqs.iter().map(|f| 1e6 / f).collect();

    let mut bank = SignalBank::spectrum(n_ears, freqs, 32000.0, 1000.0);
    for ear in 0..n_ears {
        bank.channels_mut(0, ear).copy_from_slice(&powers);
    }
    bank
}

fn bench_filterbank(c: &mut Criterion) {
    let mut group = c.benchmark_group("double_roex");
    let input = generate_spectrum(1);
    group.throughput(Throughput::Elements(1));

    for (label, settings) in [
        ("dense_0.1_cam", DoubleRoexSettings::new()),
        ("faster_0.25_cam_cubic", DoubleRoexSettings::faster()),
    ] {
        group.bench_with_input(BenchmarkId::new("frame", label), &input, |b, input| {
            let mut bank = DoubleRoexBank::new(settings);
            let mut output = bank.initialize(input).unwrap();
            b.iter(|| {
                bank.process(black_box(input), &mut output);
                black_box(output.channels(0, 0)[0])
            });
        });
    }

    group.finish();
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("dynamic_loudness");
    group.throughput(Throughput::Elements(1));

    for preset in [
        ModelPreset::GlasbergMoore2002,
        ModelPreset::MooreGlasbergStone2003,
        ModelPreset::ChenHu2012,
    ] {
        for n_ears in [1, 2] {
            let input = generate_spectrum(n_ears);
            group.bench_with_input(
                BenchmarkId::new(preset.name(), format!("{}_ears", n_ears)),
                &input,
                |b, input| {
                    let mut model = DynamicLoudnessModel::new(preset);
                    model.initialize(input).unwrap();
                    b.iter(|| model.process(black_box(input)).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_filterbank, bench_models);
criterion_main!(benches);
