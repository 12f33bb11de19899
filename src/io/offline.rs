//! Backend that renders into memory on demand.
//!
//! Used by tests, benchmarks and offline bounces: the "render context" is
//! whoever calls [`OfflineStream::render`].

use crate::{
    error::SynthError,
    runtime::{OutputBackend, OutputSpec},
    synth::Engine,
    MAX_BLOCK_SIZE,
};

#[derive(Debug, Clone, Copy)]
pub struct OfflineBackend {
    spec: OutputSpec,
}

impl OfflineBackend {
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        Self {
            spec: OutputSpec {
                sample_rate,
                channels,
            },
        }
    }
}

impl OutputBackend for OfflineBackend {
    type Stream = OfflineStream;

    fn output_spec(&mut self) -> Result<OutputSpec, SynthError> {
        Ok(self.spec)
    }

    fn start(&mut self, engine: Engine) -> Result<OfflineStream, SynthError> {
        Ok(OfflineStream { engine })
    }
}

pub struct OfflineStream {
    engine: Engine,
}

impl OfflineStream {
    /// Render `frames` frames as one planar buffer per channel, in callback
    /// sized blocks of at most [`MAX_BLOCK_SIZE`] frames.
    pub fn render(&mut self, frames: usize) -> Result<Vec<Vec<f32>>, SynthError> {
        let channels = self.engine.channels();
        let mut out = vec![vec![0.0; frames]; channels];

        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(MAX_BLOCK_SIZE);
            let mut block: Vec<&mut [f32]> = out
                .iter_mut()
                .map(|channel| &mut channel[offset..offset + n])
                .collect();
            self.engine.render(&mut block)?;
            offset += n;
        }
        Ok(out)
    }

    /// Render `seconds` of audio and return the first channel.
    pub fn render_seconds(&mut self, seconds: f32) -> Result<Vec<f32>, SynthError> {
        let frames = (seconds.max(0.0) * self.engine.sample_rate()).round() as usize;
        let mut channels = self.render(frames)?;
        Ok(channels.swap_remove(0))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EngineConfig, synth};

    #[test]
    fn renders_every_channel_identically() {
        let parts = synth::build(&EngineConfig::default().channels(3)).unwrap();
        let mut controller = parts.controller;
        let mut stream = OfflineBackend::new(48_000.0, 3).start(parts.engine).unwrap();

        controller.note_on(57, 1, "A").unwrap();
        let out = stream.render(MAX_BLOCK_SIZE + 100).unwrap();

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|channel| channel.len() == MAX_BLOCK_SIZE + 100));
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        assert!(out[0].iter().any(|s| s.abs() > 0.0));
    }

    #[test]
    fn zero_frames_is_empty() {
        let parts = synth::build(&EngineConfig::default()).unwrap();
        let mut stream = OfflineBackend::new(48_000.0, 2).start(parts.engine).unwrap();
        assert_eq!(stream.render(0).unwrap(), vec![Vec::<f32>::new(), Vec::new()]);
    }
}
