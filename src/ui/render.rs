//! Render functions for the TUI.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{articles, header, help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Header: title line, category tabs, range tabs, bottom border.
const HEADER_HEIGHT: u16 = 4;

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // EDGE-001: Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    header::render(f, app, chunks[0]);
    articles::render(f, app, chunks[1]);
    status::render(f, app, chunks[2]);

    if app.show_help {
        help::render(f, app);
    }
}
