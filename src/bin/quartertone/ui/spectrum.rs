//! Spectrum widget
//!
//! Hann-windowed FFT of the scope buffer, read out at quarter-tone spaced
//! frequencies so partials line up with the playing grid. The x axis is in
//! octaves relative to A4; magnitudes are dB relative to a full-scale sine.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use quartertone::tuning;

/// Lowest displayed pitch, in octaves from A4 (A1 = 55 Hz)
const LOW_OCTAVE: i32 = -3;
/// Highest displayed pitch, in octaves from A4 (A8 = 14 kHz)
const HIGH_OCTAVE: i32 = 5;
const FLOOR_DB: f64 = -90.0;
/// Per-frame fall of the displayed level, in dB
const DECAY_DB: f64 = 3.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each displayed point
    bins: Vec<usize>,
    /// (octaves from A4, level in dB)
    points: Vec<(f64, f64)>,
    /// Converts squared magnitude to power relative to a full-scale sine
    norm: f32,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft_len = fft_len.max(2);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_len);

        let denom = (fft_len - 1) as f32;
        let window: Vec<f32> = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();
        let gain: f32 = window.iter().sum::<f32>() / 2.0;

        let nyquist_bin = fft_len / 2 - 1;
        let steps = tuning::STEPS_PER_OCTAVE;
        let mut bins = Vec::new();
        let mut points = Vec::new();
        for step in LOW_OCTAVE * steps..=HIGH_OCTAVE * steps {
            let hz = tuning::frequency(tuning::A4_MIDI, step, 0);
            if hz >= sample_rate / 2.0 {
                break;
            }
            let bin = (hz * fft_len as f32 / sample_rate).round() as usize;
            bins.push(bin.min(nyquist_bin));
            points.push((step as f64 / steps as f64, FLOOR_DB));
        }

        Self {
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            window,
            bins,
            points,
            norm: 1.0 / (gain * gain),
        }
    }

    /// Analyze `buffer`; ignored unless it matches the FFT length.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for ((_, level), &bin) in self.points.iter_mut().zip(&self.bins) {
            let power = (self.scratch[bin].norm_sqr() * self.norm).max(1e-12);
            let db = (10.0 * (power as f64).log10()).max(FLOOR_DB);
            // Rise immediately, fall slowly
            *level = db.max(*level - DECAY_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.points
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum);

    let labels: Vec<Span> = (LOW_OCTAVE..=HIGH_OCTAVE)
        .step_by(2)
        .map(|octave| Span::raw(format!("A{}", 4 + octave)))
        .collect();

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([LOW_OCTAVE as f64, HIGH_OCTAVE as f64])
                .labels(labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-90", "-45", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
