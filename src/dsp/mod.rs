//! Low-level DSP primitives embedded in each voice.
//!
//! These components are allocation-free and realtime-safe. They stay focused
//! on the signal math; voice management and the control path live in
//! [`crate::synth`].

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Phase-accumulating oscillator and waveform shapes.
pub mod oscillator;
/// Linear ramps for automated parameters.
pub mod smoother;

pub use envelope::{Adsr, Envelope, EnvelopeState};
pub use oscillator::{Oscillator, Waveform};
pub use smoother::LinearSmoother;
