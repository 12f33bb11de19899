//! Whole-engine scenarios: polyphonic blocks, stealing churn, interleaved output.

mod engine;

pub use engine::bench_engine;
