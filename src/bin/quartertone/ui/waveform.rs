//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Smallest vertical range, so a quiet note still fills part of the view
const MIN_RANGE: f64 = 0.25;

/// Render the most recent output samples, oldest on the left. The vertical
/// range follows the block peak and snaps to quarter steps.
pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let peak = audio_buffer
        .iter()
        .fold(0.0f64, |acc, &s| acc.max(s.abs() as f64));
    let range = ((peak / MIN_RANGE).ceil() * MIN_RANGE).max(MIN_RANGE);

    let last = audio_buffer.len().saturating_sub(1).max(1) as f64;
    let trace: Vec<(f64, f64)> = audio_buffer
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / last, s as f64))
        .collect();
    let zero = [(0.0, 0.0), (1.0, 0.0)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&zero),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&trace),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" Scope ±{range:.2} "))
                .borders(Borders::ALL),
        )
        .x_axis(Axis::default().bounds([0.0, 1.0]))
        .y_axis(
            Axis::default()
                .bounds([-range, range])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
