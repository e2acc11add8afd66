use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Structural controls. These never count as a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Control {
    StartRound,
    ToggleScoreboard,
    RequestRename,
    SubmitName,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Char(char),
    Backspace,
}

/// What a raw input means to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Control(Control),
    React,
    Edit(Edit),
    Ignore,
}

/// Reaction keys.
pub const REACTION_KEYS: [char; 2] = ['z', 'x'];

/// Maps a key press. `editing` is true while the name prompt has focus, in
/// which case printable keys edit the buffer instead of reacting.
pub fn classify_key(key: &KeyEvent, editing: bool) -> Signal {
    if key.kind == KeyEventKind::Release {
        return Signal::Ignore;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Signal::Control(Control::Quit),
            _ => Signal::Ignore,
        };
    }

    match key.code {
        KeyCode::Esc => Signal::Control(Control::Quit),
        KeyCode::Enter if editing => Signal::Control(Control::SubmitName),
        KeyCode::Backspace if editing => Signal::Edit(Edit::Backspace),
        KeyCode::Char(c) if editing => Signal::Edit(Edit::Char(c)),
        _ if editing => Signal::Ignore,
        KeyCode::Enter | KeyCode::Char(' ') => Signal::Control(Control::StartRound),
        KeyCode::Tab => Signal::Control(Control::ToggleScoreboard),
        KeyCode::Char('n') => Signal::Control(Control::RequestRename),
        KeyCode::Char(c) if REACTION_KEYS.contains(&c.to_ascii_lowercase()) => Signal::React,
        _ => Signal::Ignore,
    }
}

/// Maps a pointer press. A press on a control activates it; anywhere else
/// is a reaction.
pub fn classify_click(hit: Option<Control>) -> Signal {
    match hit {
        Some(control) => Signal::Control(control),
        None => Signal::React,
    }
}
