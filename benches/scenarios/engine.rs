//! Benchmarks for complete render blocks.
//!
//! Commands go through the real control ring, so these include the cost of
//! draining it at the top of each block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quartertone::{
    dsp::Waveform,
    synth::{self, EngineParts},
    EngineConfig,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const VOICES: usize = 16;

fn parts(waveform: Waveform) -> EngineParts {
    let config = EngineConfig::default()
        .sample_rate(SAMPLE_RATE)
        .voices(VOICES)
        .channels(2)
        .waveform(waveform);
    match synth::build(&config) {
        Ok(parts) => parts,
        Err(err) => panic!("benchmark config rejected: {err}"),
    }
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === IDLE ===
        // Empty pool: the floor cost of a callback
        let EngineParts { mut engine, .. } = parts(Waveform::Sine);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                let _ = engine.render(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
            })
        });

        // === FULL POOL ===
        // Every voice sounding a different quarter tone
        let EngineParts {
            mut controller,
            mut engine,
            ..
        } = parts(Waveform::Sawtooth);
        for i in 0..VOICES {
            let _ = controller.note_on(60 + i as i32 / 2, i as i32 % 2, &i.to_string());
        }
        group.bench_with_input(BenchmarkId::new("full_pool", size), &size, |b, _| {
            b.iter(|| {
                let _ = engine.render(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
            })
        });

        // === STEALING CHURN ===
        // A new note every block on an exhausted pool
        let EngineParts {
            mut controller,
            mut engine,
            ..
        } = parts(Waveform::Square);
        let mut n = 0usize;
        group.bench_with_input(BenchmarkId::new("steal_churn", size), &size, |b, _| {
            b.iter(|| {
                let key = n.to_string();
                let _ = controller.note_on(48 + (n % 40) as i32, (n % 2) as i32, &key);
                let _ = controller.note_off(&key);
                n += 1;
                let _ = engine.render(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
            })
        });

        // === INTERLEAVED ===
        // Device-style output buffer with a full pool
        let EngineParts {
            mut controller,
            mut engine,
            ..
        } = parts(Waveform::Triangle);
        for i in 0..VOICES {
            let _ = controller.note_on(60 + i as i32, 0, &i.to_string());
        }
        let mut interleaved = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |b, _| {
            b.iter(|| {
                let _ = engine.render_interleaved(black_box(&mut interleaved));
            })
        });
    }

    group.finish();
}
