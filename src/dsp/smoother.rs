//! Linear parameter ramp for sample-accurate automation.
//!
//! A new target is reached over a fixed number of samples by interpolating
//! from the value at the moment the target changed, the same way the envelope
//! release interpolates from its snapshot level. Retargeting mid-ramp starts a
//! fresh ramp from wherever the value currently is.

use crate::dsp::envelope::seconds_to_samples;

#[derive(Debug, Clone)]
pub struct LinearSmoother {
    current: f32,
    start: f32,
    target: f32,
    ramp_samples: u32,
    elapsed: u32,
}

impl LinearSmoother {
    /// `ramp_time` is in seconds; it is floored to one sample.
    pub fn new(initial: f32, ramp_time: f32, sample_rate: f32) -> Self {
        let ramp_samples = seconds_to_samples(ramp_time, sample_rate);
        Self {
            current: initial,
            start: initial,
            target: initial,
            ramp_samples,
            elapsed: ramp_samples,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.start = self.current;
        self.target = target;
        self.elapsed = 0;
    }

    /// Jump straight to `value`, cancelling any ramp in progress.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.start = value;
        self.target = value;
        self.elapsed = self.ramp_samples;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.elapsed < self.ramp_samples {
            self.elapsed += 1;
            if self.elapsed == self.ramp_samples {
                self.current = self.target;
            } else {
                let progress = self.elapsed as f32 / self.ramp_samples as f32;
                self.current = self.start + (self.target - self.start) * progress;
            }
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.elapsed < self.ramp_samples
    }
}
