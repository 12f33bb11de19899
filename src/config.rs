#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{Adsr, Waveform},
    error::SynthError,
    synth::pool::ParamPolicy,
};

/// Everything the engine needs to know before the render context starts.
///
/// Built with chained setters:
///
/// ```
/// use quartertone::{dsp::Waveform, EngineConfig};
///
/// let config = EngineConfig::default()
///     .sample_rate(44_100.0)
///     .voices(8)
///     .waveform(Waveform::Triangle);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz. Replaced by the device rate when started
    /// through an output backend.
    pub sample_rate: f32,
    /// Output channel count. Replaced by the device channel count when
    /// started through an output backend.
    pub channels: usize,
    /// Size of the fixed voice pool.
    pub max_voices: usize,
    /// Capacity of the control → render command ring.
    pub queue_capacity: usize,
    /// Capacity (samples) of the render → diagnostics scope ring.
    pub scope_capacity: usize,
    /// Fixed gain applied to the voice sum.
    pub headroom: f32,
    /// Initial volume in [0, 1].
    pub volume: f32,
    /// Seconds taken to glide to a new volume.
    pub volume_ramp: f32,
    /// Waveform for new notes.
    pub waveform: Waveform,
    /// Envelope for new notes.
    pub adsr: Adsr,
    pub param_policy: ParamPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            channels: 2,
            max_voices: 16,
            queue_capacity: 256,
            scope_capacity: 4_096,
            headroom: 0.25,
            volume: 0.8,
            volume_ramp: 0.005,
            waveform: Waveform::Sine,
            adsr: Adsr::default(),
            param_policy: ParamPolicy::Snapshot,
        }
    }
}

impl EngineConfig {
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn scope_capacity(mut self, capacity: usize) -> Self {
        self.scope_capacity = capacity;
        self
    }

    pub fn headroom(mut self, headroom: f32) -> Self {
        self.headroom = headroom;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn volume_ramp(mut self, seconds: f32) -> Self {
        self.volume_ramp = seconds;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn adsr(mut self, adsr: Adsr) -> Self {
        self.adsr = adsr;
        self
    }

    pub fn param_policy(mut self, policy: ParamPolicy) -> Self {
        self.param_policy = policy;
        self
    }

    /// Reject configurations that would render wrong audio.
    pub fn validate(&self) -> Result<(), SynthError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SynthError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 {
            return Err(SynthError::InvalidChannelCount(self.channels));
        }
        if self.max_voices == 0 {
            return Err(SynthError::InvalidVoiceCount(self.max_voices));
        }
        if self.queue_capacity == 0 {
            return Err(SynthError::InvalidQueueCapacity(self.queue_capacity));
        }
        if !self.headroom.is_finite() || self.headroom <= 0.0 {
            return Err(SynthError::InvalidHeadroom(self.headroom));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(SynthError::InvalidVolume(self.volume));
        }
        Ok(())
    }
}
