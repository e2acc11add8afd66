use ratatui::{buffer::Buffer, layout::Rect};

use super::{render_name_prompt, render_play, render_update, Hitboxes, View};

/// A UI Screen boundary: renders the view and records its controls
pub trait Screen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer, hits: &mut Hitboxes);
}

/// Play screen - cue, result and optional scoreboard panel
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer, hits: &mut Hitboxes) {
        render_play(view, area, buf, hits);
    }
}

/// Name prompt drawn over the play screen; the controls underneath are inert
pub struct NamePromptScreen;

impl Screen for NamePromptScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer, _hits: &mut Hitboxes) {
        render_play(view, area, buf, &mut Hitboxes::default());
        if let Some(prompt) = &view.name_prompt {
            render_name_prompt(prompt, area, buf);
        }
    }
}

/// Update progress - replaces everything else until the update settles
pub struct UpdateScreen;

impl Screen for UpdateScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer, _hits: &mut Hitboxes) {
        render_update(view.update_text.as_deref().unwrap_or_default(), area, buf);
    }
}

/// Helper to construct the appropriate screen for the current view
pub fn current_screen(view: &View) -> Box<dyn Screen> {
    if view.update_text.is_some() {
        Box::new(UpdateScreen)
    } else if view.name_prompt.is_some() {
        Box::new(NamePromptScreen)
    } else {
        Box::new(PlayScreen)
    }
}
