//! Control side of the engine.
//!
//! The [`Controller`] owns the producer end of the command ring and the
//! held-note table mapping external key identifiers to the [`NoteId`] each
//! key is sounding. It may allocate and log; it never touches render state
//! directly.
//!
//! Table rules:
//! - at most one live note per key: a second note-on for a held key is
//!   ignored until that key's note-off,
//! - a note-on that cannot be enqueued leaves no entry behind,
//! - a note-off that cannot be enqueued keeps its entry so it can be retried.

use std::collections::HashMap;

use rtrb::Producer;

use crate::{
    config::EngineConfig,
    dsp::{Adsr, Waveform},
    error::SynthError,
    synth::message::{ControlCommand, NoteId},
    tuning,
};

/// A held key's note and its trigger sequence. Note ids wrap, so ordering
/// uses the sequence instead.
#[derive(Debug, Clone, Copy)]
struct HeldNote {
    id: NoteId,
    seq: u64,
}

pub struct Controller {
    tx: Producer<ControlCommand>,
    held: HashMap<String, HeldNote>,
    next_id: u32,
    next_seq: u64,
    octave_shift: i32,
    waveform: Waveform,
    adsr: Adsr,
    volume: f32,
}

impl Controller {
    pub fn new(tx: Producer<ControlCommand>, config: &EngineConfig) -> Self {
        Self {
            tx,
            held: HashMap::new(),
            next_id: 1,
            next_seq: 0,
            octave_shift: 0,
            waveform: config.waveform,
            adsr: config.adsr.sanitized(),
            volume: config.volume,
        }
    }

    pub fn with_octave_shift(mut self, octave_shift: i32) -> Self {
        self.octave_shift = octave_shift;
        self
    }

    fn send(&mut self, command: ControlCommand) -> Result<(), SynthError> {
        self.tx.push(command).map_err(|_| SynthError::QueueFull)
    }

    fn allocate_id(&mut self) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Start a note from the quarter-tone grid for `key`.
    ///
    /// The current octave shift is applied. Returns `Ok(None)` when `key` is
    /// already held.
    pub fn note_on(
        &mut self,
        note: i32,
        quarter_step: i32,
        key: &str,
    ) -> Result<Option<NoteId>, SynthError> {
        let frequency = tuning::frequency(note, quarter_step, self.octave_shift);
        self.note_on_freq(frequency, key)
    }

    /// Start a note at an explicit frequency for `key`.
    ///
    /// The frequency must be finite and positive.
    pub fn note_on_freq(&mut self, frequency: f32, key: &str) -> Result<Option<NoteId>, SynthError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SynthError::InvalidFrequency(frequency));
        }
        if let Some(held) = self.held.get(key) {
            log::debug!("ignoring note-on for {key:?}: already sounding {}", held.id);
            return Ok(None);
        }

        let note_id = self.allocate_id();
        self.send(ControlCommand::NoteOn { frequency, note_id })?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.held.insert(key.to_string(), HeldNote { id: note_id, seq });
        log::trace!("note-on {note_id} {frequency:.2} Hz for {key:?}");
        Ok(Some(note_id))
    }

    /// End the note held by `key`. Returns `Ok(None)` for a key not held.
    pub fn note_off(&mut self, key: &str) -> Result<Option<NoteId>, SynthError> {
        let Some(note_id) = self.held.get(key).map(|held| held.id) else {
            return Ok(None);
        };

        self.send(ControlCommand::NoteOff { note_id })?;
        self.held.remove(key);
        log::trace!("note-off {note_id} for {key:?}");
        Ok(Some(note_id))
    }

    /// Send a note-off for every held key and clear the table.
    ///
    /// Returns how many notes were released. If the queue fills up part way,
    /// the keys not yet released stay held and `QueueFull` is returned.
    pub fn release_all(&mut self) -> Result<usize, SynthError> {
        let mut held: Vec<(String, HeldNote)> = self.held.drain().collect();
        held.sort_by_key(|(_, note)| note.seq);

        let mut released = 0;
        let mut pending = held.into_iter();
        for (key, note) in pending.by_ref() {
            if self.send(ControlCommand::NoteOff { note_id: note.id }).is_err() {
                self.held.insert(key, note);
                break;
            }
            released += 1;
        }

        let remaining: Vec<_> = pending.collect();
        if remaining.is_empty() && self.held.is_empty() {
            if released > 0 {
                log::debug!("released {released} held note(s)");
            }
            return Ok(released);
        }

        self.held.extend(remaining);
        log::warn!(
            "control queue full while releasing; {} note(s) still held",
            self.held.len()
        );
        Err(SynthError::QueueFull)
    }

    /// Release every sounding voice, held or not, and forget all held keys.
    pub fn panic(&mut self) -> Result<(), SynthError> {
        self.send(ControlCommand::AllNotesOff)?;
        self.held.clear();
        Ok(())
    }

    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), SynthError> {
        self.send(ControlCommand::SetWaveform(waveform))?;
        self.waveform = waveform;
        Ok(())
    }

    pub fn set_adsr(&mut self, adsr: Adsr) -> Result<(), SynthError> {
        let adsr = adsr.sanitized();
        self.send(ControlCommand::SetAdsr(adsr))?;
        self.adsr = adsr;
        Ok(())
    }

    /// Set the volume; values outside [0, 1] are clamped.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), SynthError> {
        let volume = volume.clamp(0.0, 1.0);
        self.send(ControlCommand::SetVolume(volume))?;
        self.volume = volume;
        Ok(())
    }

    /// Applies to subsequent note-ons only.
    pub fn set_octave_shift(&mut self, octave_shift: i32) {
        self.octave_shift = octave_shift;
    }

    pub fn octave_shift(&self) -> i32 {
        self.octave_shift
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn adsr(&self) -> Adsr {
        self.adsr
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains_key(key)
    }

    pub fn held_note(&self, key: &str) -> Option<NoteId> {
        self.held.get(key).map(|held| held.id)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Held keys in trigger order.
    pub fn held_keys(&self) -> Vec<&str> {
        let mut keys: Vec<(&str, u64)> = self
            .held
            .iter()
            .map(|(k, held)| (k.as_str(), held.seq))
            .collect();
        keys.sort_by_key(|(_, seq)| *seq);
        keys.into_iter().map(|(k, _)| k).collect()
    }

    /// Free slots in the command ring.
    pub fn queue_slots(&self) -> usize {
        self.tx.slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::{Consumer, RingBuffer};

    fn controller(capacity: usize) -> (Controller, Consumer<ControlCommand>) {
        let (tx, rx) = RingBuffer::new(capacity);
        (Controller::new(tx, &EngineConfig::default()), rx)
    }

    fn drain(rx: &mut Consumer<ControlCommand>) -> Vec<ControlCommand> {
        let mut out = Vec::new();
        while let Ok(command) = rx.pop() {
            out.push(command);
        }
        out
    }

    #[test]
    fn note_on_maps_pitch_and_records_key() {
        let (mut ctl, mut rx) = controller(16);
        let id = ctl.note_on(60, 0, "Z").unwrap().unwrap();

        assert_eq!(ctl.held_note("Z"), Some(id));
        match drain(&mut rx).as_slice() {
            [ControlCommand::NoteOn { frequency, note_id }] => {
                assert_eq!(*note_id, id);
                assert!((frequency - 261.63).abs() < 0.01);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn duplicate_note_on_for_held_key_is_ignored() {
        let (mut ctl, mut rx) = controller(16);
        let first = ctl.note_on(60, 0, "Z").unwrap();
        assert!(first.is_some());
        assert_eq!(ctl.note_on(62, 1, "Z").unwrap(), None);

        assert_eq!(drain(&mut rx).len(), 1);
        assert_eq!(ctl.held_note("Z"), first);
    }

    #[test]
    fn note_ids_are_unique_per_trigger() {
        let (mut ctl, _rx) = controller(16);
        let a = ctl.note_on(60, 0, "Z").unwrap().unwrap();
        ctl.note_off("Z").unwrap();
        let b = ctl.note_on(60, 0, "Z").unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn note_off_for_unknown_key_sends_nothing() {
        let (mut ctl, mut rx) = controller(16);
        assert_eq!(ctl.note_off("Q").unwrap(), None);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn note_off_sends_matching_id_and_forgets_key() {
        let (mut ctl, mut rx) = controller(16);
        let id = ctl.note_on(60, 1, "X").unwrap().unwrap();
        assert_eq!(ctl.note_off("X").unwrap(), Some(id));
        assert!(!ctl.is_held("X"));

        let commands = drain(&mut rx);
        assert_eq!(commands[1], ControlCommand::NoteOff { note_id: id });
    }

    #[test]
    fn octave_shift_applies_to_later_notes() {
        let (mut ctl, mut rx) = controller(16);
        ctl.set_octave_shift(1);
        ctl.note_on(69, 0, "A").unwrap();
        assert_eq!(
            drain(&mut rx)[0],
            ControlCommand::NoteOn {
                frequency: 880.0,
                note_id: NoteId(1)
            }
        );
    }

    #[test]
    fn full_queue_rejects_note_on_without_holding_key() {
        let (mut ctl, _rx) = controller(1);
        ctl.note_on(60, 0, "Z").unwrap();
        assert_eq!(ctl.note_on(61, 0, "X"), Err(SynthError::QueueFull));
        assert!(!ctl.is_held("X"));
    }

    #[test]
    fn full_queue_keeps_key_for_retry_on_note_off() {
        let (mut ctl, mut rx) = controller(1);
        ctl.note_on(60, 0, "Z").unwrap();
        assert_eq!(ctl.note_off("Z"), Err(SynthError::QueueFull));
        assert!(ctl.is_held("Z"));

        drain(&mut rx);
        assert!(ctl.note_off("Z").unwrap().is_some());
        assert!(!ctl.is_held("Z"));
    }

    #[test]
    fn release_all_drains_table_and_is_idempotent() {
        let (mut ctl, mut rx) = controller(16);
        for key in ["Z", "X", "C"] {
            ctl.note_on(60, 0, key).unwrap();
        }
        drain(&mut rx);

        assert_eq!(ctl.release_all().unwrap(), 3);
        assert_eq!(ctl.held_count(), 0);
        let offs = drain(&mut rx);
        assert_eq!(offs.len(), 3);
        assert!(offs
            .iter()
            .all(|c| matches!(c, ControlCommand::NoteOff { .. })));

        assert_eq!(ctl.release_all().unwrap(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn release_all_keeps_unsent_keys_when_queue_fills() {
        let (mut ctl, mut rx) = controller(3);
        for key in ["Z", "X", "C"] {
            ctl.note_on(60, 0, key).unwrap();
        }
        rx.pop().unwrap(); // one free slot

        assert_eq!(ctl.release_all(), Err(SynthError::QueueFull));
        assert_eq!(ctl.held_count(), 2);
        // Oldest note went out first.
        assert!(!ctl.is_held("Z"));

        drain(&mut rx);
        assert_eq!(ctl.release_all().unwrap(), 2);
    }

    #[test]
    fn panic_clears_table() {
        let (mut ctl, mut rx) = controller(16);
        ctl.note_on(60, 0, "Z").unwrap();
        ctl.panic().unwrap();
        assert_eq!(ctl.held_count(), 0);
        assert_eq!(drain(&mut rx).last(), Some(&ControlCommand::AllNotesOff));
    }

    #[test]
    fn parameter_setters_mirror_sent_values() {
        let (mut ctl, mut rx) = controller(16);
        ctl.set_waveform(Waveform::Triangle).unwrap();
        ctl.set_adsr(Adsr::new(0.2, 0.3, 2.0, 0.4)).unwrap();
        ctl.set_volume(-1.0).unwrap();

        assert_eq!(ctl.waveform(), Waveform::Triangle);
        assert_eq!(ctl.adsr(), Adsr::new(0.2, 0.3, 1.0, 0.4));
        assert_eq!(ctl.volume(), 0.0);
        assert_eq!(
            drain(&mut rx),
            vec![
                ControlCommand::SetWaveform(Waveform::Triangle),
                ControlCommand::SetAdsr(Adsr::new(0.2, 0.3, 1.0, 0.4)),
                ControlCommand::SetVolume(0.0),
            ]
        );
    }

    #[test]
    fn held_keys_follow_trigger_order() {
        let (mut ctl, _rx) = controller(16);
        for key in ["C", "A", "B"] {
            ctl.note_on(60, 0, key).unwrap();
        }
        assert_eq!(ctl.held_keys(), vec!["C", "A", "B"]);
    }

    #[test]
    fn trigger_order_survives_note_id_wrap() {
        let (mut ctl, mut rx) = controller(16);
        ctl.next_id = u32::MAX - 1;
        for key in ["C", "A", "B"] {
            ctl.note_on(60, 0, key).unwrap();
        }
        // Ids went MAX-1, MAX, 1.
        assert_eq!(ctl.held_note("B"), Some(NoteId(1)));
        assert_eq!(ctl.held_keys(), vec!["C", "A", "B"]);
        drain(&mut rx);

        ctl.release_all().unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![
                ControlCommand::NoteOff {
                    note_id: NoteId(u32::MAX - 1)
                },
                ControlCommand::NoteOff {
                    note_id: NoteId(u32::MAX)
                },
                ControlCommand::NoteOff { note_id: NoteId(1) },
            ]
        );
    }

    #[test]
    fn unplayable_frequency_is_refused_up_front() {
        let (mut ctl, mut rx) = controller(16);
        for frequency in [f32::NAN, f32::INFINITY, 0.0, -440.0] {
            assert!(matches!(
                ctl.note_on_freq(frequency, "Z"),
                Err(SynthError::InvalidFrequency(_))
            ));
        }
        assert!(!ctl.is_held("Z"));
        assert!(drain(&mut rx).is_empty());

        // No id was burned on the refused calls.
        assert_eq!(ctl.note_on_freq(440.0, "Z").unwrap(), Some(NoteId(1)));
    }
}
