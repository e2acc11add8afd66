use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::scoreboard::ScoreboardRow;

const NAME_WIDTH: usize = 16;

/// Truncates to `width` terminal columns, marking the cut with `…`.
pub fn fit_name(name: &str, width: usize) -> String {
    if name.width() <= width {
        return name.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in name.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Pure presenter for a single leaderboard row
pub fn present_row(row: &ScoreboardRow) -> Row<'static> {
    let rank_style = match row.rank {
        1 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        2 | 3 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };

    Row::new(vec![
        Cell::from(format!("{}.", row.rank)).style(rank_style),
        Cell::from(fit_name(&row.name, NAME_WIDTH)),
        Cell::from(format!("{}ms", row.time_ms)),
    ])
}

pub fn render_scoreboard(rows: &[ScoreboardRow], area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Scores")
        .style(Style::default().bg(Color::Black).fg(Color::White));

    if rows.is_empty() {
        Paragraph::new("No scores yet")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
        return;
    }

    let table = Table::new(
        rows.iter().map(present_row).collect::<Vec<_>>(),
        &[
            Constraint::Length(4),
            Constraint::Length(NAME_WIDTH as u16 + 1),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["#", "Player", "Time"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(block);

    Widget::render(table, area, buf);
}
