use crate::app::{App, CategoryStatus};
use crate::feed::TimeRange;
use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Long-form date shown under the title, e.g. "Friday, May 10, 2024".
pub fn format_header_date(now: &DateTime<Local>) -> String {
    now.format("%A, %B %-d, %Y").to_string()
}

/// Render the header: title and date, category tabs, range selector.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = Line::from(vec![
        Span::styled("dailyKnowledge", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format_header_date(&Local::now()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(title), rows[0]);

    render_categories(f, app, rows[1]);
    render_ranges(f, app, rows[2]);
}

fn render_categories(f: &mut Frame, app: &App, area: Rect) {
    match app.category_status {
        CategoryStatus::Loading => {
            let text = Span::styled("Loading categories...", Style::default().fg(Color::DarkGray));
            f.render_widget(Paragraph::new(text), area);
        }
        CategoryStatus::Unavailable => {}
        CategoryStatus::Loaded => {
            let tabs = Tabs::new(app.categories.iter().map(String::as_str))
                .select(app.selected_category)
                .style(Style::default().fg(Color::Gray))
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .divider(" ");
            f.render_widget(tabs, area);
        }
    }
}

fn render_ranges(f: &mut Frame, app: &App, area: Rect) {
    let current = app.feed.state().range();
    let titles = TimeRange::ALL
        .iter()
        .enumerate()
        .map(|(i, range)| format!("{} {}", i + 1, range.label()));
    let selected = TimeRange::ALL
        .iter()
        .position(|r| *r == current)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
        .divider(" ");
    f.render_widget(tabs, area);
}
