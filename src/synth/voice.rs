use crate::{
    dsp::{Adsr, Envelope, EnvelopeState, Oscillator, Waveform},
    synth::message::NoteId,
};

/// A single voice: one oscillator shaped by one envelope.
///
/// Active exactly while the envelope is not idle. Voices are created once and
/// reused for every note-on.
#[derive(Debug, Clone)]
pub struct Voice {
    note_id: Option<NoteId>,
    frequency: f32,
    waveform: Waveform,
    sample_rate: f32,
    oscillator: Oscillator,
    envelope: Envelope,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            note_id: None,
            frequency: 0.0,
            waveform: Waveform::default(),
            sample_rate,
            oscillator: Oscillator::new(),
            envelope: Envelope::new(sample_rate),
        }
    }

    /// (Re)start this voice for a new note. Any previous note is overwritten.
    pub fn start(&mut self, frequency: f32, note_id: NoteId, adsr: Adsr, waveform: Waveform) {
        self.note_id = Some(note_id);
        self.frequency = frequency;
        self.waveform = waveform;
        self.oscillator.reset();
        self.oscillator.set_frequency(frequency, self.sample_rate);
        self.envelope.note_on(adsr);
    }

    /// Move into release. Returns `false` if idle or already releasing.
    pub fn release(&mut self) -> bool {
        self.envelope.note_off()
    }

    /// Whether this voice currently sounds `note_id` and has not been released.
    pub fn holds(&self, note_id: NoteId) -> bool {
        self.note_id == Some(note_id)
            && matches!(
                self.envelope.state(),
                EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain
            )
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }

        let value = self.oscillator.next_sample(self.waveform) * self.envelope.next_sample();

        if !self.envelope.is_active() {
            self.note_id = None;
        }
        value
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_adsr(&mut self, adsr: Adsr) {
        self.envelope.set_params(adsr);
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn is_free(&self) -> bool {
        !self.is_active()
    }

    pub fn state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn adsr(&self) -> Adsr {
        self.envelope.params()
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }
}
