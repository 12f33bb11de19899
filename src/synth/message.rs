use std::fmt;

use rtrb::Consumer;

use crate::dsp::{Adsr, Waveform};

/// Identity of one note-on. Unique per trigger, so overlapping note-offs for
/// the same pitch reach the right voice even after voice stealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u32);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands from the control side, consumed once by the render side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlCommand {
    NoteOn { frequency: f32, note_id: NoteId },
    NoteOff { note_id: NoteId },
    SetWaveform(Waveform),
    SetAdsr(Adsr),
    SetVolume(f32),
    AllNotesOff,
}

/// Render-side end of the control channel. Must never block.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlCommand>;
}

impl MessageReceiver for Consumer<ControlCommand> {
    fn pop(&mut self) -> Option<ControlCommand> {
        Consumer::pop(self).ok()
    }
}
