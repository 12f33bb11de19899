//! Computer-keyboard layout for the quarter-tone grid.
//!
//! Forty keys in four rows of ten, bottom row first. Walking the rows in that
//! order gives a quarter-tone index from middle C: index `i` plays MIDI note
//! `60 + i / 2` with quarter step `i % 2`, so the layout spans twenty
//! semitones.
//!
//! ```text
//!   1 2 3 4 5 6 7 8 9 0     index 30..39
//!   Q W E R T Y U I O P     index 20..29
//!   A S D F G H J K L ;     index 10..19
//!   Z X C V B N M , . /     index  0..9   (Z = C4)
//! ```

use crate::tuning::C4_MIDI;

pub const KEY_ROWS: [&str; 4] = ["ZXCVBNM,./", "ASDFGHJKL;", "QWERTYUIOP", "1234567890"];

pub const KEY_COUNT: usize = 40;

const NOTE_NAMES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

/// How a key is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Natural,
    Sharp,
    /// A quarter tone above the named semitone.
    HalfSharp,
}

/// Upper-case single characters so `z` and `Z` are the same key.
pub fn normalize_key(key: char) -> char {
    key.to_ascii_uppercase()
}

/// Quarter-tone index of `key`, if it is part of the layout.
pub fn index_of(key: char) -> Option<usize> {
    let key = normalize_key(key);
    KEY_ROWS
        .iter()
        .flat_map(|row| row.chars())
        .position(|c| c == key)
}

/// `(midi_note, quarter_step)` for a layout index.
pub fn note_for_index(index: usize) -> (i32, i32) {
    let index = index as i32;
    (C4_MIDI + index / 2, index % 2)
}

/// Display name and kind for a layout index.
pub fn label_for_index(index: usize) -> (String, KeyKind) {
    let name = NOTE_NAMES[(index / 2) % 12];
    if index % 2 == 1 {
        (format!("{name}↑"), KeyKind::HalfSharp)
    } else if name.ends_with('♯') {
        (name.to_string(), KeyKind::Sharp)
    } else {
        (name.to_string(), KeyKind::Natural)
    }
}

/// Layout key at `index`, bottom row first.
pub fn key_at(index: usize) -> Option<char> {
    KEY_ROWS.iter().flat_map(|row| row.chars()).nth(index)
}
