//! Player - turns terminal key events into synth commands

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use quartertone::{
    dsp::Adsr,
    io::{keyboard, CpalBackend},
    EngineStatus, Synth, SynthError,
};

/// Without release events a key counts as held until this long after its
/// last press or repeat.
const AUTO_RELEASE: Duration = Duration::from_millis(600);
const OCTAVE_LIMIT: i32 = 3;
const VOLUME_STEP: f32 = 0.05;
const MAX_STAGE_SECONDS: f32 = 5.0;

pub struct Player {
    synth: Synth<CpalBackend>,
    /// Layout keys currently sounding, with the time they were last seen.
    held: HashMap<char, Instant>,
    release_events: bool,
    last_error: Option<String>,
}

impl Player {
    pub fn new(synth: Synth<CpalBackend>, release_events: bool) -> Self {
        Self {
            synth,
            held: HashMap::new(),
            release_events,
            last_error: None,
        }
    }

    /// Handle one key event. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                self.key_up(keyboard::normalize_key(c));
            }
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('[') if key.kind == KeyEventKind::Press => {
                self.shift_octave(-1);
            }
            KeyCode::Char(']') if key.kind == KeyEventKind::Press => {
                self.shift_octave(1);
            }
            KeyCode::Char(' ') => self.release_all(),
            KeyCode::Char(c) => self.key_down(keyboard::normalize_key(c), now),
            KeyCode::Tab => {
                let waveform = self.synth.waveform().next();
                let result = self.synth.set_waveform(waveform);
                self.report(result);
            }
            KeyCode::Up => self.nudge_volume(VOLUME_STEP),
            KeyCode::Down => self.nudge_volume(-VOLUME_STEP),
            KeyCode::F(n) => self.nudge_adsr(n),
            _ => {}
        }
        false
    }

    fn key_down(&mut self, key: char, now: Instant) {
        if let Some(seen) = self.held.get_mut(&key) {
            // Repeat of a sounding key keeps it alive.
            *seen = now;
            return;
        }
        let Some(index) = keyboard::index_of(key) else {
            return;
        };

        let (note, quarter_step) = keyboard::note_for_index(index);
        let result = self.synth.note_on(note, quarter_step, &key.to_string());
        if let Some(Some(_)) = self.report(result) {
            self.held.insert(key, now);
        }
    }

    fn key_up(&mut self, key: char) {
        if !self.held.contains_key(&key) {
            return;
        }
        let result = self.synth.note_off(&key.to_string());
        if self.report(result).is_some() {
            self.held.remove(&key);
        }
    }

    /// Release keys whose auto-release time has passed. Only used when the
    /// terminal does not report key releases.
    pub fn tick(&mut self, now: Instant) {
        if self.release_events {
            return;
        }
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) >= AUTO_RELEASE)
            .map(|(&key, _)| key)
            .collect();
        for key in expired {
            self.key_up(key);
        }
    }

    /// Release everything, e.g. when the terminal loses focus.
    pub fn release_all(&mut self) {
        let result = self.synth.release_all();
        if self.report(result).is_some() {
            self.held.clear();
        }
    }

    fn shift_octave(&mut self, delta: i32) {
        let octave = (self.synth.octave_shift() + delta).clamp(-OCTAVE_LIMIT, OCTAVE_LIMIT);
        self.synth.set_octave_shift(octave);
    }

    fn nudge_volume(&mut self, delta: f32) {
        let volume = (self.synth.volume() + delta).clamp(0.0, 1.0);
        let result = self.synth.set_volume(volume);
        self.report(result);
    }

    /// F1..F8 step attack, decay, sustain and release down/up.
    fn nudge_adsr(&mut self, key: u8) {
        let Adsr {
            mut attack,
            mut decay,
            mut sustain,
            mut release,
        } = self.synth.adsr();

        match key {
            1 => attack -= 0.01,
            2 => attack += 0.01,
            3 => decay -= 0.05,
            4 => decay += 0.05,
            5 => sustain -= 0.05,
            6 => sustain += 0.05,
            7 => release -= 0.05,
            8 => release += 0.05,
            _ => return,
        }

        let adsr = Adsr::new(
            attack.clamp(0.0, MAX_STAGE_SECONDS),
            decay.clamp(0.0, MAX_STAGE_SECONDS),
            sustain.clamp(0.0, 1.0),
            release.clamp(0.0, MAX_STAGE_SECONDS),
        );
        let result = self.synth.set_adsr(adsr);
        self.report(result);
    }

    fn report<T>(&mut self, result: Result<T, SynthError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{err}");
                self.last_error = Some(err.to_string());
                None
            }
        }
    }

    /// Drain diagnostics into the monitor.
    pub fn poll(&mut self) {
        if let Some(monitor) = self.synth.monitor_mut() {
            monitor.poll();
        }
    }

    pub fn scope(&mut self) -> &[f32] {
        match self.synth.monitor_mut() {
            Some(monitor) => monitor.scope(),
            None => &[],
        }
    }

    pub fn status(&mut self) -> EngineStatus {
        self.synth
            .monitor_mut()
            .map(|monitor| monitor.status())
            .unwrap_or_default()
    }

    pub fn synth(&self) -> &Synth<CpalBackend> {
        &self.synth
    }

    pub fn is_held(&self, key: char) -> bool {
        self.held.contains_key(&key)
    }

    pub fn release_events(&self) -> bool {
        self.release_events
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
