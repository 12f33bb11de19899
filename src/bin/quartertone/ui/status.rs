//! Status bar widget - synth parameters, voice usage and output level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use quartertone::EngineStatus;

use crate::app::Player;

/// Output level of the visualized block
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    player: &Player,
    status: &EngineStatus,
    stats: &AudioStats,
) {
    let synth = player.synth();
    let config = synth.config();
    let adsr = synth.adsr();

    let block = Block::default().title(" quartertone ").borders(Borders::ALL);

    let voices_color = if status.active_voices >= config.max_voices {
        Color::Yellow
    } else {
        Color::Green
    };

    let mut spans = vec![
        Span::styled(
            format!(" {}  ", synth.waveform()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Oct {:+}  ", synth.octave_shift()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Vol {:.2}  ", synth.volume()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "A {:.2} D {:.2} S {:.2} R {:.2}  ",
                adsr.attack, adsr.decay, adsr.sustain, adsr.release
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("Voices {}/{}  ", status.active_voices, config.max_voices),
            Style::default().fg(voices_color),
        ),
        Span::styled(
            format!("{:.1}kHz  ", config.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if status.faulted {
        spans.push(Span::styled("  FAULT", Style::default().fg(Color::Red)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
