//! Error type shared by the control side, the render side and the output backends.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    /// Sample rate must be finite and greater than zero.
    InvalidSampleRate(f32),
    /// At least one output channel is required.
    InvalidChannelCount(usize),
    /// The voice pool needs at least one voice.
    InvalidVoiceCount(usize),
    /// The control queue needs room for at least one command.
    InvalidQueueCapacity(usize),
    /// Headroom must be finite and greater than zero.
    InvalidHeadroom(f32),
    /// Volume must lie in [0, 1].
    InvalidVolume(f32),
    /// Note frequency that is not finite and positive.
    InvalidFrequency(f32),
    /// Output channels handed to the render loop have different block lengths.
    ChannelLengthMismatch { expected: usize, found: usize },
    /// Number of output channels differs from the count fixed at start.
    ChannelCountMismatch { expected: usize, found: usize },
    /// Interleaved buffer length is not a multiple of the channel count.
    InterleavedLength { len: usize, channels: usize },
    /// A note command was issued before the render context was started.
    NotStarted,
    /// The control queue is full; the command was not delivered.
    QueueFull,
    /// The audio device could not be opened or started.
    Device(String),
    /// Waveform name not recognised.
    UnknownWaveform(String),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::InvalidSampleRate(rate) => write!(f, "invalid sample rate: {rate}"),
            SynthError::InvalidChannelCount(count) => write!(f, "invalid channel count: {count}"),
            SynthError::InvalidVoiceCount(count) => write!(f, "invalid voice count: {count}"),
            SynthError::InvalidQueueCapacity(cap) => {
                write!(f, "invalid control queue capacity: {cap}")
            }
            SynthError::InvalidHeadroom(value) => write!(f, "invalid headroom: {value}"),
            SynthError::InvalidVolume(value) => write!(f, "invalid volume: {value}"),
            SynthError::InvalidFrequency(value) => write!(f, "invalid note frequency: {value} Hz"),
            SynthError::ChannelLengthMismatch { expected, found } => write!(
                f,
                "output channels have different block lengths (expected {expected}, found {found})"
            ),
            SynthError::ChannelCountMismatch { expected, found } => write!(
                f,
                "expected {expected} output channels, found {found}"
            ),
            SynthError::InterleavedLength { len, channels } => write!(
                f,
                "interleaved buffer of {len} samples is not divisible by {channels} channels"
            ),
            SynthError::NotStarted => write!(f, "synth has not been started"),
            SynthError::QueueFull => write!(f, "control queue is full"),
            SynthError::Device(msg) => write!(f, "audio device error: {msg}"),
            SynthError::UnknownWaveform(name) => write!(f, "unknown waveform: {name}"),
        }
    }
}

impl std::error::Error for SynthError {}
