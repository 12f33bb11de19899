#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
ADSR Envelope Implementation
============================

A linear ADSR envelope generator. One lives inside every voice and produces
the amplitude multiplier applied to the oscillator, one value per sample.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Idle, Attack, Decay, Sustain or Release. A state machine
              governs transitions.

  gate        The note on/off signal. note_on starts Attack from zero,
              note_off starts Release from wherever we are.

  samples     Every stage duration is converted from seconds into a whole
              number of samples at the active sample rate, with a floor of
              one sample. A zero-second attack still takes one sample, so
              there is never a division by zero or an instantaneous jump
              that skips a stage.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Each ramp is an exact linear interpolation between a start level and a
target level over a fixed number of samples:

    level = start + (target - start) * elapsed / total

so the final sample of a stage lands exactly on its target (1.0, sustain,
or 0.0). Interpolating instead of accumulating an increment means no error
builds up over long stages.

Example: attack of 0.01 s at 48 kHz
  - total = round(0.01 * 48000) = 480 samples
  - after sample n the level is n / 480
  - after sample 480 the level is exactly 1.0 and Decay begins


The State Machine
-----------------

    ┌──────┐  note_on   ┌────────┐  level=1   ┌───────┐
    │ Idle │ ─────────→ │ Attack │ ─────────→ │ Decay │
    └──────┘            └────────┘            └───────┘
        ↑                    │                    │ level=S
        │                    │ note_off           ↓
        │               ┌─────────┐  note_off ┌─────────┐
        └────────────── │ Release │ ←──────── │ Sustain │
             level=0    └─────────┘           └─────────┘

note_off moves Attack, Decay or Sustain straight into Release, starting
from the CURRENT level. An interrupted attack therefore never reaches the
peak. note_off while already releasing (or idle) does nothing.

A sustain level of 0 holds silence until note_off.


Retargeting
-----------

Parameters are normally captured at note_on. `set_params` swaps them on a
sounding envelope: the current stage restarts its ramp from the current
level with the new duration, and Sustain moves directly to the new level.
*/

/// Envelope shape: stage durations in seconds and sustain level in [0, 1].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.attack.is_finite()
            && self.decay.is_finite()
            && self.sustain.is_finite()
            && self.release.is_finite()
    }

    /// Negative durations become zero, sustain is clamped into [0, 1].
    pub fn sanitized(self) -> Self {
        Self {
            attack: self.attack.max(0.0),
            decay: self.decay.max(0.0),
            sustain: self.sustain.clamp(0.0, 1.0),
            release: self.release.max(0.0),
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        // 10ms attack, 100ms decay, 70% sustain, 300ms release
        Self::new(0.01, 0.1, 0.7, 0.3)
    }
}

/// Convert a duration in seconds to whole samples, never less than one.
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> u32 {
    let samples = (seconds.max(0.0) as f64 * sample_rate as f64).round();
    // `as` saturates, so absurdly long stages clamp to u32::MAX.
    (samples as u32).max(1)
}

/// The current stage of the envelope state machine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeState {
    #[default]
    Idle, // inactive, level = 0
    Attack,  // ramping 0 → 1
    Decay,   // ramping 1 → sustain
    Sustain, // holding sustain until note_off
    Release, // ramping current → 0
}

#[derive(Debug, Clone)]
pub struct Envelope {
    params: Adsr,
    sample_rate: f32,

    // Stage lengths in samples, derived from params and sample_rate
    attack_samples: u32,
    decay_samples: u32,
    release_samples: u32,

    // Runtime state
    stage: EnvelopeState,
    level: f32,
    stage_start_level: f32,
    stage_elapsed: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::adsr(sample_rate, Adsr::default())
    }

    pub fn adsr(sample_rate: f32, params: Adsr) -> Self {
        let mut env = Self {
            params: params.sanitized(),
            sample_rate,
            attack_samples: 1,
            decay_samples: 1,
            release_samples: 1,
            stage: EnvelopeState::Idle,
            level: 0.0,
            stage_start_level: 0.0,
            stage_elapsed: 0,
        };
        env.recompute_lengths();
        env
    }

    fn recompute_lengths(&mut self) {
        self.attack_samples = seconds_to_samples(self.params.attack, self.sample_rate);
        self.decay_samples = seconds_to_samples(self.params.decay, self.sample_rate);
        self.release_samples = seconds_to_samples(self.params.release, self.sample_rate);
    }

    fn enter(&mut self, stage: EnvelopeState) {
        self.stage = stage;
        self.stage_start_level = self.level;
        self.stage_elapsed = 0;
    }

    /// Gate high: capture `params` and start the attack from zero.
    pub fn note_on(&mut self, params: Adsr) {
        self.params = params.sanitized();
        self.recompute_lengths();
        self.level = 0.0;
        self.enter(EnvelopeState::Attack);
    }

    /// Gate low: start the release from the current level.
    ///
    /// Returns `false` when the envelope was idle or already releasing.
    pub fn note_off(&mut self) -> bool {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return false;
        }
        self.enter(EnvelopeState::Release);
        true
    }

    /// Replace the parameters of a sounding envelope.
    pub fn set_params(&mut self, params: Adsr) {
        self.params = params.sanitized();
        self.recompute_lengths();
        match self.stage {
            EnvelopeState::Idle => {}
            EnvelopeState::Sustain => self.level = self.params.sustain,
            stage => self.enter(stage),
        }
    }

    /// Advance by one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                if self.ramp_towards(1.0, self.attack_samples) {
                    self.enter(EnvelopeState::Decay);
                }
            }

            EnvelopeState::Decay => {
                if self.ramp_towards(self.params.sustain, self.decay_samples) {
                    self.enter(EnvelopeState::Sustain);
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.params.sustain;
            }

            EnvelopeState::Release => {
                if self.ramp_towards(0.0, self.release_samples) {
                    self.enter(EnvelopeState::Idle);
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// One step of linear interpolation. Returns true once `target` is reached.
    #[inline]
    fn ramp_towards(&mut self, target: f32, total: u32) -> bool {
        self.stage_elapsed = self.stage_elapsed.saturating_add(1);
        if self.stage_elapsed >= total {
            self.level = target;
            return true;
        }
        let progress = self.stage_elapsed as f32 / total as f32;
        self.level = (self.stage_start_level + (target - self.stage_start_level) * progress)
            .clamp(0.0, 1.0);
        false
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.enter(EnvelopeState::Idle);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn params(&self) -> Adsr {
        self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Stage lengths in samples: (attack, decay, release).
    pub fn stage_lengths(&self) -> (u32, u32, u32) {
        (self.attack_samples, self.decay_samples, self.release_samples)
    }
}
