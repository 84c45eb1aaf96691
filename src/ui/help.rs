//! Help overlay: key binding table.
//!
//! Shows the effective bindings, including overrides from the `[keys]`
//! config table.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

/// Render the help overlay on top of the feed.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let rows: Vec<Row> = app
        .keymap
        .help_rows()
        .into_iter()
        .map(|(keys, description)| Row::new(vec![format!("  {keys}"), description.to_string()]))
        .collect();

    let widths = [Constraint::Length(22), Constraint::Min(16)];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (Esc to close) "),
        )
        .header(
            Row::new(vec!["  Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        );

    f.render_widget(table, overlay);
}

/// Create a centered rectangle with the given percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
