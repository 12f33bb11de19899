//! TUI module for quartertone
//!
//! Draws the player state, the key layout, an oscilloscope and a spectrum,
//! and feeds terminal events to the [`Player`].

mod keys;
mod spectrum;
mod status;
mod waveform;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};

use crate::app::Player;
use keys::render_keys;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_status, AudioStats};
use waveform::render_waveform;

/// Samples shown in the oscilloscope and fed to the FFT
const VIS_BUFFER_SIZE: usize = 1024;

pub struct UiApp {
    player: Player,
    /// Most recent output samples, copied out of the monitor each frame
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(player: Player) -> Self {
        let sample_rate = player.synth().config().sample_rate;
        Self {
            player,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.player.tick(Instant::now());

            terminal.draw(|frame| self.render(frame))?;

            // Drain every pending event before the next frame (~60fps)
            let mut timeout = Duration::from_millis(16);
            while event::poll(timeout)? {
                self.handle_event(event::read()?);
                timeout = Duration::ZERO;
            }
        }

        self.player.release_all();
        Ok(())
    }

    fn poll_audio(&mut self) {
        self.player.poll();
        let scope = self.player.scope();
        let n = scope.len().min(VIS_BUFFER_SIZE);

        // Right-align the newest samples; pad with silence until the scope fills up
        let (pad, recent) = self.audio_buffer.split_at_mut(VIS_BUFFER_SIZE - n);
        pad.fill(0.0);
        recent.copy_from_slice(&scope[scope.len() - n..]);

        self.spectrum.update(&self.audio_buffer);
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if self.player.handle_key(key, Instant::now()) {
                    self.should_quit = true;
                }
            }
            Event::FocusLost => self.player.release_all(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(6), // Key layout
                Constraint::Min(8),    // Scope + spectrum
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let status = self.player.status();
        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(frame, chunks[0], &self.player, &status, &stats);
        render_keys(frame, chunks[1], &self.player);

        let views = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, views[0], &self.audio_buffer);
        render_spectrum(frame, views[1], self.spectrum.data());

        let help = match self.player.last_error() {
            Some(err) => Paragraph::new(format!(" {err}")).style(Style::default().fg(Color::Red)),
            None => Paragraph::new(
                " [Keys] Play  [ [ ] ] Octave  [Tab] Wave  [Up/Down] Vol  [F1-F8] ADSR  [Space] Release  [Esc] Quit",
            )
            .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(help, chunks[3]);
    }
}
