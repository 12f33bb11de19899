//! Fixed-size voice pool.
//!
//! The voice array is an arena allocated once at construction. Assigning a
//! note is index selection: the first idle voice in pool order, or voice 0
//! when every voice is busy. Stealing overwrites the occupant immediately
//! with no cross-fade, which can click but keeps the render path bounded and
//! allocation-free.
//!
//! Release is by [`NoteId`], never by slot. A stolen voice loses its old id,
//! so a late note-off for the overwritten note finds nothing and is a no-op.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{Adsr, Waveform},
    synth::{message::NoteId, voice::Voice},
};

/// Slot overwritten when no voice is idle.
pub const STEAL_INDEX: usize = 0;

/// How waveform and envelope changes reach voices that are already sounding.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamPolicy {
    /// Parameters are captured at note-on; changes affect later notes only.
    #[default]
    Snapshot,
    /// Changes are also applied to every active voice.
    Live,
}

pub struct VoicePool {
    voices: Vec<Voice>,
    policy: ParamPolicy,
    stolen: u64,
}

impl VoicePool {
    pub fn new(size: usize, sample_rate: f32, policy: ParamPolicy) -> Self {
        let voices = (0..size.max(1)).map(|_| Voice::new(sample_rate)).collect();
        Self {
            voices,
            policy,
            stolen: 0,
        }
    }

    /// Start a note on the first idle voice, or steal [`STEAL_INDEX`].
    /// Returns the index of the voice used.
    pub fn assign(
        &mut self,
        frequency: f32,
        note_id: NoteId,
        adsr: Adsr,
        waveform: Waveform,
    ) -> usize {
        let idx = match self.voices.iter().position(Voice::is_free) {
            Some(idx) => idx,
            None => {
                self.stolen += 1;
                STEAL_INDEX
            }
        };
        self.voices[idx].start(frequency, note_id, adsr, waveform);
        idx
    }

    /// Release every voice holding `note_id`. Returns how many were released.
    pub fn release(&mut self, note_id: NoteId) -> usize {
        let mut released = 0;
        for voice in self.voices.iter_mut().filter(|v| v.holds(note_id)) {
            if voice.release() {
                released += 1;
            }
        }
        released
    }

    /// Release every active voice regardless of identity.
    pub fn release_all(&mut self) -> usize {
        self.voices.iter_mut().map(|v| v.release()).filter(|released| *released).count()
    }

    pub fn apply_waveform(&mut self, waveform: Waveform) {
        if self.policy == ParamPolicy::Live {
            for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                voice.set_waveform(waveform);
            }
        }
    }

    pub fn apply_adsr(&mut self, adsr: Adsr) {
        if self.policy == ParamPolicy::Live {
            for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                voice.set_adsr(adsr);
            }
        }
    }

    /// Sum of all voices for the next sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(Voice::next_sample).sum()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn policy(&self) -> ParamPolicy {
        self.policy
    }

    /// Number of note-ons that had to steal a voice.
    pub fn stolen(&self) -> u64 {
        self.stolen
    }
}
