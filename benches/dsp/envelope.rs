//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quartertone::dsp::{Adsr, Envelope};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let params = Adsr::new(0.01, 0.1, 0.7, 0.3);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Retriggered every block: attack ramp only
        let mut env = Envelope::adsr(SAMPLE_RATE, params);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(params);
                env.render(black_box(&mut buffer));
            })
        });

        // Parked in sustain: the steady-state cost of a held note
        let mut env = Envelope::adsr(SAMPLE_RATE, params);
        env.note_on(params);
        let mut warmup = vec![0.0f32; SAMPLE_RATE as usize];
        env.render(&mut warmup);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Note-off straight out of attack
        let mut env = Envelope::adsr(SAMPLE_RATE, params);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(params);
                env.note_off();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
