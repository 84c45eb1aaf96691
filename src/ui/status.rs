use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const HINTS: &str = "[j/k]move [h/l]category [t/1-4]range [r]eload [m]ore [o]pen [?]help [q]uit";

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.feed.snapshot().loading() {
        Cow::Borrowed("Loading...")
    } else {
        Cow::Borrowed(HINTS)
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
