pub mod config;
pub mod dsp; // Oscillator, envelope and ramp primitives
pub mod error;
pub mod io; // Output backends and keyboard layout
pub mod runtime; // Start/stop lifecycle over an output backend
pub mod synth; // Voice pool, render loop and the control channel
pub mod tuning; // Quarter-tone pitch mapping

pub use config::EngineConfig;
pub use error::SynthError;
pub use runtime::{OutputBackend, OutputSpec, Synth};
pub use synth::{Controller, Engine, EngineStatus, Monitor, NoteId, ParamPolicy};

pub const MAX_BLOCK_SIZE: usize = 2048;
