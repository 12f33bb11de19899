//! Start/stop lifecycle around an output backend.
//!
//! A [`Synth`] owns everything the control side needs. Before [`Synth::start`]
//! there is no render context: note commands fail with
//! [`SynthError::NotStarted`], parameter setters are recorded and become the
//! initial state of the engine. Starting asks the backend for its sample rate
//! and channel count, builds the engine for exactly that format and hands it
//! to the backend's render context.
//!
//! ```
//! use quartertone::{io::OfflineBackend, EngineConfig, Synth};
//!
//! let mut synth = Synth::new(OfflineBackend::new(48_000.0, 2), EngineConfig::default());
//! synth.start().unwrap();
//! synth.note_on(60, 1, "X").unwrap();
//!
//! let block = synth.stream_mut().unwrap().render(256).unwrap();
//! assert_eq!(block.len(), 2);
//! ```

use crate::{
    config::EngineConfig,
    dsp::{Adsr, Waveform},
    error::SynthError,
    synth::{self, Controller, Engine, Monitor, NoteId},
};

/// Format fixed by the output device for the lifetime of a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    pub sample_rate: f32,
    pub channels: usize,
}

/// Something that can drive an [`Engine`] at a fixed cadence.
pub trait OutputBackend {
    /// Keeps the render context alive. Dropping it stops rendering.
    type Stream;

    fn output_spec(&mut self) -> Result<OutputSpec, SynthError>;

    /// Move the engine into the render context and begin rendering.
    fn start(&mut self, engine: Engine) -> Result<Self::Stream, SynthError>;
}

struct Running<S> {
    controller: Controller,
    monitor: Monitor,
    stream: S,
}

pub struct Synth<B: OutputBackend> {
    backend: B,
    config: EngineConfig,
    octave_shift: i32,
    running: Option<Running<B::Stream>>,
}

impl<B: OutputBackend> Synth<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            octave_shift: 0,
            running: None,
        }
    }

    /// Open the render context. Calling it again while running does nothing.
    ///
    /// Fails if the backend cannot provide a stream or the resulting
    /// configuration is invalid; the caller decides whether to retry.
    pub fn start(&mut self) -> Result<(), SynthError> {
        if self.running.is_some() {
            log::debug!("start requested while already running");
            return Ok(());
        }

        let spec = self.backend.output_spec()?;
        self.config.sample_rate = spec.sample_rate;
        self.config.channels = spec.channels;

        let parts = synth::build(&self.config)?;
        let controller = parts.controller.with_octave_shift(self.octave_shift);
        let stream = self.backend.start(parts.engine)?;

        log::info!(
            "render context started: {} Hz, {} channel(s), {} voices",
            spec.sample_rate,
            spec.channels,
            self.config.max_voices
        );
        self.running = Some(Running {
            controller,
            monitor: parts.monitor,
            stream,
        });
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    /// Tear down the render context. Held notes are forgotten; parameters
    /// carry over to the next start. Returns whether anything was running.
    pub fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        let controller = &running.controller;
        self.config.waveform = controller.waveform();
        self.config.adsr = controller.adsr();
        self.config.volume = controller.volume();
        self.octave_shift = controller.octave_shift();
        log::info!("render context stopped");
        true
    }

    fn controller_mut(&mut self) -> Result<&mut Controller, SynthError> {
        self.running
            .as_mut()
            .map(|running| &mut running.controller)
            .ok_or(SynthError::NotStarted)
    }

    pub fn note_on(
        &mut self,
        note: i32,
        quarter_step: i32,
        key: &str,
    ) -> Result<Option<NoteId>, SynthError> {
        self.controller_mut()?.note_on(note, quarter_step, key)
    }

    pub fn note_on_freq(&mut self, frequency: f32, key: &str) -> Result<Option<NoteId>, SynthError> {
        self.controller_mut()?.note_on_freq(frequency, key)
    }

    pub fn note_off(&mut self, key: &str) -> Result<Option<NoteId>, SynthError> {
        self.controller_mut()?.note_off(key)
    }

    /// Release every held key. Before start nothing can be held, so this
    /// returns `Ok(0)`.
    pub fn release_all(&mut self) -> Result<usize, SynthError> {
        match self.running.as_mut() {
            Some(running) => running.controller.release_all(),
            None => Ok(0),
        }
    }

    pub fn panic(&mut self) -> Result<(), SynthError> {
        match self.running.as_mut() {
            Some(running) => running.controller.panic(),
            None => Ok(()),
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), SynthError> {
        match self.running.as_mut() {
            Some(running) => running.controller.set_waveform(waveform),
            None => {
                self.config.waveform = waveform;
                Ok(())
            }
        }
    }

    pub fn set_adsr(&mut self, adsr: Adsr) -> Result<(), SynthError> {
        match self.running.as_mut() {
            Some(running) => running.controller.set_adsr(adsr),
            None => {
                self.config.adsr = adsr.sanitized();
                Ok(())
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), SynthError> {
        match self.running.as_mut() {
            Some(running) => running.controller.set_volume(volume),
            None => {
                self.config.volume = volume.clamp(0.0, 1.0);
                Ok(())
            }
        }
    }

    pub fn set_octave_shift(&mut self, octave_shift: i32) {
        self.octave_shift = octave_shift;
        if let Some(running) = self.running.as_mut() {
            running.controller.set_octave_shift(octave_shift);
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.running
            .as_ref()
            .map_or(self.config.waveform, |r| r.controller.waveform())
    }

    pub fn adsr(&self) -> Adsr {
        self.running
            .as_ref()
            .map_or(self.config.adsr, |r| r.controller.adsr())
    }

    pub fn volume(&self) -> f32 {
        self.running
            .as_ref()
            .map_or(self.config.volume, |r| r.controller.volume())
    }

    pub fn octave_shift(&self) -> i32 {
        self.octave_shift
    }

    /// Configuration used for the current (or next) start.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.running.as_ref().map(|r| &r.controller)
    }

    pub fn monitor_mut(&mut self) -> Option<&mut Monitor> {
        self.running.as_mut().map(|r| &mut r.monitor)
    }

    pub fn stream_mut(&mut self) -> Option<&mut B::Stream> {
        self.running.as_mut().map(|r| &mut r.stream)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
