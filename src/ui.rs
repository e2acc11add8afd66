pub mod scoreboard;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

use crate::{
    input::Control,
    round::{Outcome, Phase},
    scoreboard::ScoreboardRow,
    session::{NamePrompt, Session},
    settings::SettingsStore,
};

const START_LABEL: &str = "[ Start ]";
const HELP_TEXT: &str = "click or press z/x to react · (enter) start · (tab) scores · (n)ame · (esc)ape";

pub const IDLE_COLOR: Color = Color::Blue;
pub const ARMED_COLOR: Color = Color::Yellow;
pub const READY_COLOR: Color = Color::Green;
pub const TOO_EARLY_COLOR: Color = Color::Red;

/// Everything the renderer needs, copied out of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub phase: Phase,
    pub last_outcome: Option<Outcome>,
    pub result_text: String,
    pub player_name: Option<String>,
    pub name_prompt: Option<NamePrompt>,
    pub scoreboard: Option<Vec<ScoreboardRow>>,
    pub summary_line: String,
    pub update_text: Option<String>,
}

impl View {
    pub fn of<S: SettingsStore>(session: &Session<S>) -> Self {
        Self {
            phase: session.phase(),
            last_outcome: session.round().last_outcome(),
            result_text: session.result_text().to_string(),
            player_name: session.player_name().map(str::to_string),
            name_prompt: session.name_prompt().cloned(),
            scoreboard: session
                .scoreboard_visible()
                .then(|| session.scoreboard_rows()),
            summary_line: session.summary().line(),
            update_text: session.update_progress().map(|p| p.text()),
        }
    }

    pub fn background(&self) -> Color {
        match (self.phase, self.last_outcome) {
            (Phase::Armed, _) => ARMED_COLOR,
            (Phase::Ready, _) => READY_COLOR,
            (Phase::Idle, Some(Outcome::TooEarly)) => TOO_EARLY_COLOR,
            (Phase::Idle, _) => IDLE_COLOR,
        }
    }
}

/// Screen regions that act as controls rather than reaction surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hitboxes {
    pub start_button: Option<Rect>,
}

impl Hitboxes {
    pub fn hit(&self, column: u16, row: u16) -> Option<Control> {
        let pos = Position::new(column, row);
        self.start_button
            .filter(|rect| rect.contains(pos))
            .map(|_| Control::StartRound)
    }
}

/// Draws the current screen and returns where its controls ended up.
pub fn draw(view: &View, f: &mut Frame) -> Hitboxes {
    let area = f.area();
    let mut hits = Hitboxes::default();
    screen::current_screen(view).render(view, area, f.buffer_mut(), &mut hits);
    hits
}

/// The game surface: cue colour, status glyph, result and help line.
pub(crate) fn render_play(view: &View, area: Rect, buf: &mut Buffer, hits: &mut Hitboxes) {
    let bg = view.background();
    let base = Style::default().bg(bg).fg(Color::Black);
    let bold = base.add_modifier(Modifier::BOLD);

    Block::default().style(base).render(area, buf);

    let (main, side) = match &view.scoreboard {
        Some(_) => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(20), Constraint::Length(34)])
                .split(area);
            (cols[0], Some(cols[1]))
        }
        None => (area, None),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // player
            Constraint::Min(0),
            Constraint::Length(1), // cue
            Constraint::Length(1),
            Constraint::Length(1), // result
            Constraint::Length(1), // summary
            Constraint::Min(0),
            Constraint::Length(1), // help
        ])
        .split(main);

    if let Some(name) = &view.player_name {
        Paragraph::new(Span::styled(format!("player: {name}"), base))
            .alignment(Alignment::Right)
            .render(chunks[0], buf);
    }

    match view.phase {
        Phase::Idle => {
            let width = (START_LABEL.len() as u16).min(chunks[2].width);
            let button = Rect {
                x: chunks[2].x + chunks[2].width.saturating_sub(width) / 2,
                y: chunks[2].y,
                width,
                height: 1,
            };
            Paragraph::new(Span::styled(
                START_LABEL,
                Style::default()
                    .bg(Color::White)
                    .fg(IDLE_COLOR)
                    .add_modifier(Modifier::BOLD),
            ))
            .render(button, buf);
            hits.start_button = Some(button);
        }
        Phase::Armed => {
            Paragraph::new(Span::styled("⌛ Wait…", bold))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }
        Phase::Ready => {
            Paragraph::new(Span::styled("🎯 GO!", bold))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }
    }

    if !view.result_text.is_empty() {
        Paragraph::new(Span::styled(view.result_text.as_str(), bold))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    if !view.summary_line.is_empty() {
        Paragraph::new(Span::styled(
            view.summary_line.as_str(),
            base.add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    }

    Paragraph::new(Span::styled(HELP_TEXT, base.add_modifier(Modifier::DIM)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[7], buf);

    if let (Some(rows), Some(side)) = (&view.scoreboard, side) {
        scoreboard::render_scoreboard(rows, side, buf);
    }
}

/// Modal name entry over the play surface.
pub(crate) fn render_name_prompt(prompt: &NamePrompt, area: Rect, buf: &mut Buffer) {
    let popup = centered(area, 40, 6);
    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Enter your name")
        .style(Style::default().fg(Color::White).bg(Color::Black));
    let inner = block.inner(popup);
    block.render(popup, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    Paragraph::new(Span::styled(
        format!("> {}_", prompt.buffer),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .render(rows[0], buf);

    if let Some(err) = &prompt.error {
        Paragraph::new(Span::styled(err.as_str(), Style::default().fg(TOO_EARLY_COLOR)))
            .render(rows[1], buf);
    }

    Paragraph::new(Span::styled(
        "(enter) start playing",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .render(rows[2], buf);
}

/// Full-screen progress while an update installs. Round input is off.
pub(crate) fn render_update(text: &str, area: Rect, buf: &mut Buffer) {
    Block::default()
        .style(Style::default().bg(Color::Black).fg(Color::White))
        .render(area, buf);
    let line = centered(area, area.width, 1);
    Paragraph::new(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(line, buf);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
