//! Render loop.
//!
//! The engine is the render-side owner of the voice pool. Each invocation:
//!
//! 1. checks the output buffers (all channels present, equal block length),
//! 2. drains the control ring and applies every pending command in order,
//! 3. renders the block in chunks of at most [`MAX_BLOCK_SIZE`]: the sum of
//!    all voices, times the (ramped) volume, times the fixed headroom,
//! 4. writes the identical mono mix to every channel,
//! 5. publishes a scope copy and a status record for diagnostics.
//!
//! Nothing in here blocks, locks or allocates after construction.

use rtrb::Consumer;

use crate::{
    config::EngineConfig,
    dsp::{Adsr, LinearSmoother, Waveform},
    error::SynthError,
    synth::{
        message::{ControlCommand, MessageReceiver},
        monitor::{EngineStatus, MonitorTap},
        pool::VoicePool,
    },
    MAX_BLOCK_SIZE,
};

pub struct Engine<R: MessageReceiver = Consumer<ControlCommand>> {
    pool: VoicePool,
    rx: R,
    waveform: Waveform,
    adsr: Adsr,
    volume: LinearSmoother,
    headroom: f32,
    sample_rate: f32,
    channels: usize,
    mix_buffer: Vec<f32>,
    tap: Option<MonitorTap>,
    rejected: u64,
    frames_rendered: u64,
    fault: Option<SynthError>,
}

impl<R: MessageReceiver> Engine<R> {
    pub fn new(config: &EngineConfig, rx: R) -> Result<Self, SynthError> {
        config.validate()?;

        Ok(Self {
            pool: VoicePool::new(config.max_voices, config.sample_rate, config.param_policy),
            rx,
            waveform: config.waveform,
            adsr: config.adsr.sanitized(),
            volume: LinearSmoother::new(config.volume, config.volume_ramp, config.sample_rate),
            headroom: config.headroom,
            sample_rate: config.sample_rate,
            channels: config.channels,
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            tap: None,
            rejected: 0,
            frames_rendered: 0,
            fault: None,
        })
    }

    /// Attach the diagnostics rings.
    pub fn with_monitor(mut self, tap: MonitorTap) -> Self {
        self.tap = Some(tap);
        self
    }

    /// Apply every command waiting in the control ring, in order.
    pub fn process_commands(&mut self) {
        while let Some(command) = self.rx.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::NoteOn { frequency, note_id } => {
                if frequency.is_finite() && frequency > 0.0 {
                    self.pool.assign(frequency, note_id, self.adsr, self.waveform);
                } else {
                    self.rejected += 1;
                }
            }
            ControlCommand::NoteOff { note_id } => {
                self.pool.release(note_id);
            }
            ControlCommand::SetWaveform(waveform) => {
                self.waveform = waveform;
                self.pool.apply_waveform(waveform);
            }
            ControlCommand::SetAdsr(adsr) => {
                if adsr.is_finite() {
                    self.adsr = adsr.sanitized();
                    self.pool.apply_adsr(self.adsr);
                } else {
                    self.rejected += 1;
                }
            }
            ControlCommand::SetVolume(volume) => {
                if volume.is_finite() {
                    self.volume.set_target(volume.clamp(0.0, 1.0));
                } else {
                    self.rejected += 1;
                }
            }
            ControlCommand::AllNotesOff => {
                self.pool.release_all();
            }
        }
    }

    /// Render one block into planar output channels.
    ///
    /// Every channel receives the same mono mix. A wrong channel count or
    /// unequal channel lengths is a configuration error: the engine faults,
    /// writes silence and stays silent from then on.
    pub fn render(&mut self, outputs: &mut [&mut [f32]]) -> Result<(), SynthError> {
        if let Err(err) = self.check_planar(outputs) {
            for channel in outputs.iter_mut() {
                channel.fill(0.0);
            }
            return self.fail(err);
        }

        self.process_commands();

        let frames = outputs.first().map_or(0, |channel| channel.len());
        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(MAX_BLOCK_SIZE);
            self.render_mono(n);
            for channel in outputs.iter_mut() {
                channel[offset..offset + n].copy_from_slice(&self.mix_buffer[..n]);
            }
            offset += n;
        }

        self.publish_status();
        Ok(())
    }

    /// Render one block into an interleaved buffer of `channels` channels.
    pub fn render_interleaved(&mut self, data: &mut [f32]) -> Result<(), SynthError> {
        if let Some(err) = self.fault.clone() {
            data.fill(0.0);
            return self.fail(err);
        }
        if data.len() % self.channels != 0 {
            data.fill(0.0);
            return self.fail(SynthError::InterleavedLength {
                len: data.len(),
                channels: self.channels,
            });
        }

        self.process_commands();

        let channels = self.channels;
        let frames = data.len() / channels;
        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(MAX_BLOCK_SIZE);
            self.render_mono(n);
            let out = &mut data[offset * channels..(offset + n) * channels];
            for (frame, &sample) in out.chunks_exact_mut(channels).zip(&self.mix_buffer[..n]) {
                frame.fill(sample);
            }
            offset += n;
        }

        self.publish_status();
        Ok(())
    }

    fn check_planar(&self, outputs: &[&mut [f32]]) -> Result<(), SynthError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        if outputs.len() != self.channels {
            return Err(SynthError::ChannelCountMismatch {
                expected: self.channels,
                found: outputs.len(),
            });
        }
        let expected = outputs[0].len();
        if let Some(bad) = outputs.iter().find(|channel| channel.len() != expected) {
            return Err(SynthError::ChannelLengthMismatch {
                expected,
                found: bad.len(),
            });
        }
        Ok(())
    }

    /// Latch the first fault. Status goes out on every refused call as well,
    /// so a monitor that missed the first report still sees the fault.
    fn fail(&mut self, err: SynthError) -> Result<(), SynthError> {
        if self.fault.is_none() {
            self.fault = Some(err.clone());
        }
        self.publish_status();
        Err(err)
    }

    /// Mix `frames` samples into the front of `mix_buffer`.
    fn render_mono(&mut self, frames: usize) {
        let Self {
            pool,
            volume,
            headroom,
            mix_buffer,
            tap,
            frames_rendered,
            ..
        } = self;

        let block = &mut mix_buffer[..frames];
        for out in block.iter_mut() {
            *out = pool.next_sample() * volume.next_sample() * *headroom;
        }

        if let Some(tap) = tap.as_mut() {
            tap.push_block(block);
        }
        *frames_rendered += frames as u64;
    }

    fn publish_status(&mut self) {
        let status = self.status();
        if let Some(tap) = self.tap.as_mut() {
            tap.push_status(status);
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            active_voices: self.pool.active_count(),
            stolen_voices: self.pool.stolen(),
            rejected_commands: self.rejected,
            frames_rendered: self.frames_rendered,
            faulted: self.fault.is_some(),
        }
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Waveform applied to the next note-on.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Envelope applied to the next note-on.
    pub fn adsr(&self) -> Adsr {
        self.adsr
    }

    /// Volume at the last rendered sample.
    pub fn volume(&self) -> f32 {
        self.volume.current()
    }

    pub fn target_volume(&self) -> f32 {
        self.volume.target()
    }

    pub fn headroom(&self) -> f32 {
        self.headroom
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::EnvelopeState,
        synth::{message::NoteId, monitor, pool::ParamPolicy},
    };
    use rtrb::{Producer, RingBuffer};

    const SAMPLE_RATE: f32 = 1_000.0;

    fn engine(config: EngineConfig) -> (Producer<ControlCommand>, Engine) {
        let (tx, rx) = RingBuffer::new(64);
        let engine = Engine::new(&config.sample_rate(SAMPLE_RATE), rx).unwrap();
        (tx, engine)
    }

    fn render_frames(engine: &mut Engine, frames: usize) -> Vec<f32> {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        engine.render(&mut [left.as_mut_slice(), right.as_mut_slice()]).unwrap();
        assert_eq!(left, right);
        left
    }

    #[test]
    fn renders_silence_without_notes() {
        let (_tx, mut engine) = engine(EngineConfig::default());
        let out = render_frames(&mut engine, 256);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn applies_headroom_and_volume() {
        let config = EngineConfig::default()
            .volume(0.5)
            .waveform(Waveform::Square)
            .adsr(Adsr::new(0.0, 0.0, 1.0, 0.1));
        let (mut tx, mut engine) = engine(config);
        tx.push(ControlCommand::NoteOn {
            frequency: 10.0,
            note_id: NoteId(1),
        })
        .unwrap();

        let out = render_frames(&mut engine, 8);
        // Square at phase < 0.5 is +1; envelope is full after its single attack sample.
        assert!((out[0] - 0.125).abs() < 1e-6, "got {}", out[0]);
        assert!((out[4] - 0.125).abs() < 1e-6, "got {}", out[4]);
    }

    #[test]
    fn commands_apply_in_fifo_order() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        tx.push(ControlCommand::NoteOn {
            frequency: 220.0,
            note_id: NoteId(1),
        })
        .unwrap();
        tx.push(ControlCommand::NoteOff { note_id: NoteId(1) }).unwrap();

        render_frames(&mut engine, 1);
        assert_eq!(engine.pool().voices()[0].state(), EnvelopeState::Release);
    }

    #[test]
    fn rejects_malformed_commands_without_side_effects() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        tx.push(ControlCommand::NoteOn {
            frequency: f32::NAN,
            note_id: NoteId(1),
        })
        .unwrap();
        tx.push(ControlCommand::NoteOn {
            frequency: -10.0,
            note_id: NoteId(2),
        })
        .unwrap();
        tx.push(ControlCommand::SetVolume(f32::INFINITY)).unwrap();
        tx.push(ControlCommand::SetAdsr(Adsr::new(f32::NAN, 0.1, 0.5, 0.1)))
            .unwrap();

        render_frames(&mut engine, 16);
        assert_eq!(engine.pool().active_count(), 0);
        assert_eq!(engine.status().rejected_commands, 4);
        assert_eq!(engine.target_volume(), 0.8);
        assert_eq!(engine.adsr(), Adsr::default());
    }

    #[test]
    fn volume_is_clamped_and_ramped() {
        let config = EngineConfig::default().volume(0.0).volume_ramp(0.004);
        let (mut tx, mut engine) = engine(config);
        tx.push(ControlCommand::SetVolume(3.0)).unwrap();

        render_frames(&mut engine, 2);
        assert!((engine.volume() - 0.5).abs() < 1e-6);
        render_frames(&mut engine, 2);
        assert_eq!(engine.volume(), 1.0);
    }

    #[test]
    fn waveform_change_is_snapshot_by_default() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        tx.push(ControlCommand::NoteOn {
            frequency: 220.0,
            note_id: NoteId(1),
        })
        .unwrap();
        tx.push(ControlCommand::SetWaveform(Waveform::Sawtooth)).unwrap();
        tx.push(ControlCommand::NoteOn {
            frequency: 330.0,
            note_id: NoteId(2),
        })
        .unwrap();

        render_frames(&mut engine, 1);
        assert_eq!(engine.pool().voices()[0].waveform(), Waveform::Sine);
        assert_eq!(engine.pool().voices()[1].waveform(), Waveform::Sawtooth);
    }

    #[test]
    fn waveform_change_reaches_sounding_voices_when_live() {
        let config = EngineConfig::default().param_policy(ParamPolicy::Live);
        let (mut tx, mut engine) = engine(config);
        tx.push(ControlCommand::NoteOn {
            frequency: 220.0,
            note_id: NoteId(1),
        })
        .unwrap();
        tx.push(ControlCommand::SetWaveform(Waveform::Sawtooth)).unwrap();

        render_frames(&mut engine, 1);
        assert_eq!(engine.pool().voices()[0].waveform(), Waveform::Sawtooth);
    }

    #[test]
    fn all_notes_off_releases_everything() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        for id in 0..4 {
            tx.push(ControlCommand::NoteOn {
                frequency: 200.0 + id as f32,
                note_id: NoteId(id),
            })
            .unwrap();
        }
        tx.push(ControlCommand::AllNotesOff).unwrap();
        render_frames(&mut engine, 1);

        assert!(engine
            .pool()
            .voices()
            .iter()
            .take(4)
            .all(|v| v.state() == EnvelopeState::Release));
    }

    #[test]
    fn mismatched_channel_lengths_fault_the_engine() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        tx.push(ControlCommand::NoteOn {
            frequency: 220.0,
            note_id: NoteId(1),
        })
        .unwrap();

        let mut left = vec![1.0; 64];
        let mut right = vec![1.0; 32];
        let err = engine.render(&mut [left.as_mut_slice(), right.as_mut_slice()]).unwrap_err();
        assert_eq!(
            err,
            SynthError::ChannelLengthMismatch {
                expected: 64,
                found: 32
            }
        );
        assert!(left.iter().chain(&right).all(|s| *s == 0.0));
        assert!(engine.is_faulted());
        // Commands stay queued; nothing was rendered.
        assert_eq!(engine.pool().active_count(), 0);

        // Once faulted, correct buffers are still refused.
        let mut left = vec![1.0; 16];
        let mut right = vec![1.0; 16];
        assert!(engine.render(&mut [left.as_mut_slice(), right.as_mut_slice()]).is_err());
        assert!(left.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn wrong_channel_count_is_rejected() {
        let (_tx, mut engine) = engine(EngineConfig::default());
        let mut mono = vec![0.0; 16];
        assert_eq!(
            engine.render(&mut [mono.as_mut_slice()]),
            Err(SynthError::ChannelCountMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn interleaved_writes_identical_frames() {
        let config = EngineConfig::default().channels(3);
        let (mut tx, mut engine) = engine(config);
        tx.push(ControlCommand::NoteOn {
            frequency: 50.0,
            note_id: NoteId(1),
        })
        .unwrap();

        let mut data = vec![0.0; 3 * 100];
        engine.render_interleaved(&mut data).unwrap();
        for frame in data.chunks_exact(3) {
            assert_eq!(frame[0], frame[1]);
            assert_eq!(frame[1], frame[2]);
        }
        assert!(data.iter().any(|s| *s != 0.0));

        let mut ragged = vec![0.0; 10];
        assert_eq!(
            engine.render_interleaved(&mut ragged),
            Err(SynthError::InterleavedLength {
                len: 10,
                channels: 3
            })
        );
    }

    #[test]
    fn blocks_longer_than_max_block_size_are_chunked() {
        let (mut tx, mut engine) = engine(EngineConfig::default());
        tx.push(ControlCommand::NoteOn {
            frequency: 100.0,
            note_id: NoteId(1),
        })
        .unwrap();

        let frames = MAX_BLOCK_SIZE * 2 + 17;
        let out = render_frames(&mut engine, frames);
        assert_eq!(engine.status().frames_rendered, frames as u64);
        assert!(out[frames - 1] != 0.0 || out[frames - 2] != 0.0);
    }

    #[test]
    fn headroom_scales_full_unison() {
        let config = EngineConfig::default()
            .volume(1.0)
            .waveform(Waveform::Square)
            .adsr(Adsr::new(0.0, 0.0, 1.0, 0.1));
        let (mut tx, mut engine) = engine(config);
        for id in 0..16 {
            tx.push(ControlCommand::NoteOn {
                frequency: 10.0,
                note_id: NoteId(id),
            })
            .unwrap();
        }
        let out = render_frames(&mut engine, 32);
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 4.0).abs() < 1e-4, "got {peak}");
    }

    #[test]
    fn fault_reaches_a_lagging_monitor() {
        let (tap, mut monitor) = monitor::monitor(64);
        let (_tx, engine) = engine(EngineConfig::default());
        let mut engine = engine.with_monitor(tap);

        // Far more blocks than the status ring holds, with no poll between.
        for _ in 0..40 {
            render_frames(&mut engine, 64);
        }
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 32];
        assert!(engine.render(&mut [left.as_mut_slice(), right.as_mut_slice()]).is_err());

        monitor.poll();
        assert!(monitor.status().faulted);
        assert_eq!(monitor.status().frames_rendered, 40 * 64);

        // Refused calls keep reporting the fault.
        let mut data = vec![0.0; 128];
        assert!(engine.render_interleaved(&mut data).is_err());
        monitor.poll();
        assert_eq!(monitor.status(), engine.status());
    }

    #[test]
    fn lagging_monitor_catches_up_after_the_next_render() {
        let (tap, mut monitor) = monitor::monitor(64);
        let (_tx, engine) = engine(EngineConfig::default());
        let mut engine = engine.with_monitor(tap);

        for _ in 0..40 {
            render_frames(&mut engine, 64);
        }
        monitor.poll();
        assert!(monitor.status().frames_rendered < engine.status().frames_rendered);

        render_frames(&mut engine, 64);
        monitor.poll();
        assert_eq!(monitor.status().frames_rendered, 41 * 64);
        assert_eq!(monitor.status(), engine.status());
    }
}
