use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/*
Audio Oscillator
================

An oscillator generates a repeating waveform at a given frequency. Every
voice owns one; the envelope then shapes its amplitude.

Phase Accumulation
------------------

We keep a normalized phase p in [0, 1) and advance it once per sample:

    p += frequency / sample_rate
    p  = fract(p)

One full cycle of the waveform is p going from 0 to 1. Wrapping with fract()
is exact, so the phase never drifts outside the unit interval no matter how
long a note is held. The accumulator is f64 to keep rounding error in the
increment from detuning long notes.

Waveform Shapes
---------------

All shapes are pure functions of p and stay within [-1, 1]:

  Sine       sin(2π p)
             Pure tone, fundamental only.

  Square     +1 for p < 0.5, -1 otherwise
             Hollow, odd harmonics falling off as 1/n.

  Sawtooth   2p - 1
             Bright, all harmonics falling off as 1/n.

  Triangle   2|2p - 1| - 1
             Soft, odd harmonics falling off as 1/n².

These are naive (non band-limited) shapes. Square and sawtooth alias at high
pitches, which is accepted here.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    /// Waveform value at normalized phase `phase` (expected in [0, 1)).
    #[inline]
    pub fn sample(self, phase: f64) -> f32 {
        let value = match self {
            Waveform::Sine => (std::f64::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 2.0 * (2.0 * phase - 1.0).abs() - 1.0,
        };
        (value as f32).clamp(-1.0, 1.0)
    }

    /// Next waveform in [`Waveform::ALL`] order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "square" | "sqr" => Ok(Waveform::Square),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            _ => Err(SynthError::UnknownWaveform(s.to_string())),
        }
    }
}

/// Phase accumulator. Allocation-free and safe to embed in a voice.
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    phase: f64,
    increment: f64,
}

impl Oscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        self.increment = frequency as f64 / sample_rate as f64;
    }

    /// Restart the cycle at phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Produce the sample at the current phase, then advance.
    #[inline]
    pub fn next_sample(&mut self, waveform: Waveform) -> f32 {
        let value = waveform.sample(self.phase);
        self.phase = (self.phase + self.increment).fract();
        value
    }

    pub fn render(&mut self, out: &mut [f32], waveform: Waveform) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(waveform);
        }
    }
}
