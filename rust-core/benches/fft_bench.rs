//! Performance benchmarks for the spectrum task

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex32;
use realfft::RealFftPlanner;
use spectrum_link::packet::PacketEncoder;
use spectrum_link::signal::{self, Tone};
use spectrum_link::spectrum::{Compressor, RealFft};

fn test_window(n: usize) -> Vec<f32> {
    signal::synthesize(n, &[Tone::new(n / 8, 1.0, 0.0), Tone::new(n / 4, 0.3, 0.5)])
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_fft");

    for n in [64, 256, 1024, 4096] {
        let samples = test_window(n);
        let window: Vec<Complex32> = samples.iter().map(|&s| Complex32::new(s, 0.0)).collect();

        let mut engine = RealFft::new(n).unwrap();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); engine.num_bins()];
        group.bench_with_input(BenchmarkId::new("engine", n), &window, |b, window| {
            b.iter(|| engine.process(black_box(window), &mut spectrum));
        });

        let r2c = RealFftPlanner::<f32>::new().plan_fft_forward(n);
        let mut input = r2c.make_input_vec();
        let mut output = r2c.make_output_vec();
        group.bench_with_input(BenchmarkId::new("realfft", n), &samples, |b, samples| {
            b.iter(|| {
                input.copy_from_slice(black_box(samples));
                r2c.process(&mut input, &mut output).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_cycle(c: &mut Criterion) {
    let n = 64;
    let samples = test_window(n);
    let window: Vec<Complex32> = samples.iter().map(|&s| Complex32::new(s, 0.0)).collect();

    let mut engine = RealFft::new(n).unwrap();
    let mut spectrum = vec![Complex32::new(0.0, 0.0); engine.num_bins()];
    let mut encoder = PacketEncoder::new(engine.num_bins());
    let compressor = Compressor::new(0.1);

    c.bench_function("transform_and_encode_64", |b| {
        b.iter(|| {
            engine.process(black_box(&window), &mut spectrum);
            black_box(encoder.encode(&spectrum, &compressor).len());
        });
    });
}

criterion_group!(benches, bench_fft, bench_cycle);
criterion_main!(benches);
