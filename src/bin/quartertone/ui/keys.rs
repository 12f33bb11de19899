//! Key layout widget - one row per keyboard row, top row first

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use quartertone::io::{keyboard, KeyKind};

use crate::app::Player;

pub fn render_keys(frame: &mut Frame, area: Rect, player: &Player) {
    let title = if player.release_events() {
        " Keys "
    } else {
        " Keys (auto-release) "
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let row_len = keyboard::KEY_COUNT / keyboard::KEY_ROWS.len();
    let lines: Vec<Line> = (0..keyboard::KEY_ROWS.len())
        .rev()
        .map(|row| {
            let spans = (row * row_len..(row + 1) * row_len)
                .filter_map(|index| {
                    let key = keyboard::key_at(index)?;
                    let (label, kind) = keyboard::label_for_index(index);
                    Some(Span::styled(format!(" {key}:{label:<4}"), key_style(kind, player.is_held(key))))
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn key_style(kind: KeyKind, held: bool) -> Style {
    let fg = match kind {
        KeyKind::Natural => Color::White,
        KeyKind::Sharp => Color::Gray,
        KeyKind::HalfSharp => Color::LightBlue,
    };
    if held {
        Style::default()
            .fg(Color::Black)
            .bg(fg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(fg)
    }
}
