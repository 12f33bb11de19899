//! Quarter-tone pitch mapping.
//!
//! The keyboard plays a 24-step-per-octave grid: every MIDI semitone plus the
//! point halfway to the next one. A note is addressed as
//! `(midi note, quarter step, octave shift)` and mapped through equal
//! temperament anchored at A4 = 440 Hz (MIDI 69):
//!
//! ```text
//! semitone = note + 12 * octave_shift + 0.5 * quarter_step
//! hz       = 440 * 2^((semitone - 69) / 12)
//! ```
//!
//! The whole-octave part of the exponent is applied as an exact power of two,
//! so shifting by an octave doubles or halves the result bit-for-bit and
//! `frequency(69, 0, 0)` is exactly 440.0. No clamping is done here; a result
//! outside the audible range is still a valid mapping.

/// Reference pitch (Hz) for [`A4_MIDI`].
pub const A4_HZ: f64 = 440.0;
/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;
/// MIDI note number of middle C, the origin of the keyboard layout.
pub const C4_MIDI: i32 = 60;
/// Steps per octave on the quarter-tone grid.
pub const STEPS_PER_OCTAVE: i32 = 24;

// Beyond this many octaves from A4 the f64 result is already 0 or infinity.
const MAX_OCTAVES: i64 = 2_048;

/// Map `(note, quarter_step, octave_shift)` to a frequency in Hz.
///
/// Total over all integers: extreme inputs saturate to `0.0` or `inf` rather
/// than overflowing.
pub fn frequency(note: i32, quarter_step: i32, octave_shift: i32) -> f32 {
    // Work in quarter steps relative to A4 so the offset stays integral.
    let semitones = note as i64 + 12 * octave_shift as i64;
    let steps = 2 * (semitones - A4_MIDI as i64) + quarter_step as i64;

    let per_octave = STEPS_PER_OCTAVE as i64;
    let octaves = steps.div_euclid(per_octave).clamp(-MAX_OCTAVES, MAX_OCTAVES);
    let remainder = steps.rem_euclid(per_octave);

    let hz = A4_HZ * 2.0_f64.powi(octaves as i32) * (remainder as f64 / per_octave as f64).exp2();
    hz as f32
}

/// Convert a MIDI note number to frequency in Hz (no quarter step, no shift).
#[inline]
pub fn midi_note_to_freq(note: i32) -> f32 {
    frequency(note, 0, 0)
}
