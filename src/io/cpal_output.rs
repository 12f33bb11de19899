//! Realtime output through the system's default audio device.
//!
//! The engine moves into the cpal data callback and renders straight into
//! the device's interleaved buffer. A render error (only possible on a
//! malformed buffer) leaves the buffer silent; the engine latches the fault
//! and reports it through its status ring.

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, SampleFormat, Stream, SupportedStreamConfig,
};

use crate::{
    error::SynthError,
    runtime::{OutputBackend, OutputSpec},
    synth::Engine,
};

#[derive(Default)]
pub struct CpalBackend {
    device: Option<(Device, SupportedStreamConfig)>,
}

/// Keeps the cpal stream playing. Dropping it closes the device.
pub struct CpalStream {
    _stream: Stream,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self) -> Result<&(Device, SupportedStreamConfig), SynthError> {
        if self.device.is_none() {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SynthError::Device("no default output device available".into()))?;
            let config = device.default_output_config().map_err(|err| {
                SynthError::Device(format!("failed to fetch default output config: {err}"))
            })?;
            if config.sample_format() != SampleFormat::F32 {
                return Err(SynthError::Device(format!(
                    "unsupported sample format {:?}, f32 required",
                    config.sample_format()
                )));
            }
            if let Ok(name) = device.name() {
                log::info!("using output device {name}");
            }
            self.device = Some((device, config));
        }

        self.device
            .as_ref()
            .ok_or_else(|| SynthError::Device("output device not open".into()))
    }
}

impl OutputBackend for CpalBackend {
    type Stream = CpalStream;

    fn output_spec(&mut self) -> Result<OutputSpec, SynthError> {
        let (_, config) = self.open()?;
        Ok(OutputSpec {
            sample_rate: config.sample_rate().0 as f32,
            channels: config.channels() as usize,
        })
    }

    fn start(&mut self, mut engine: Engine) -> Result<CpalStream, SynthError> {
        let (device, config) = self.open()?;

        let stream = device
            .build_output_stream(
                &config.clone().into(),
                move |data: &mut [f32], _| {
                    if engine.render_interleaved(data).is_err() {
                        data.fill(0.0);
                    }
                },
                |err| log::error!("output stream error: {err}"),
                None,
            )
            .map_err(|err| SynthError::Device(format!("failed to build output stream: {err}")))?;

        stream
            .play()
            .map_err(|err| SynthError::Device(format!("failed to start output stream: {err}")))?;

        Ok(CpalStream { _stream: stream })
    }
}
