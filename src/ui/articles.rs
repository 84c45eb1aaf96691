use crate::api::Article;
use crate::app::{App, CategoryStatus, CONNECT_ERROR};
use crate::feed::{FeedError, FeedPhase, FeedSnapshot};
use crate::keymap::Action;
use crate::util::{one_line, truncate_to_width};
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::borrow::Cow;
use std::fmt;

/// Lines per article row: title, source line, description.
pub const ROW_HEIGHT: usize = 3;

/// Characters of body text shown when an article has no summary.
const SNIPPET_CHARS: usize = 220;

const EMPTY_RESULT: &str = "No articles in this time range yet.";

/// Format a publish time relative to `now`.
///
/// Sources that only know the publish date report local midnight; those show
/// the date alone, since any hour count would be made up.
pub fn format_relative_time<Tz>(published: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = published.with_timezone(tz);
    if local.hour() == 0 && local.minute() == 0 {
        return local.format("%b %d").to_string();
    }

    let diff = (now - published).num_seconds();

    // Future dates (clock skew, timezone-less sources)
    if diff < 60 {
        return "just now".to_string();
    }
    if diff < 3600 {
        return format!("{}m ago", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h ago", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d ago", diff / 86400);
    }
    published.format("%b %d").to_string()
}

/// Badge text and colour for a relevance score.
pub fn score_badge(score: i64) -> (String, Style) {
    let style = Style::default().add_modifier(Modifier::BOLD);
    if score < 0 {
        return ("?".to_string(), style.fg(Color::DarkGray));
    }
    let colour = match score {
        8.. => Color::Green,
        5..=7 => Color::Yellow,
        _ => Color::Red,
    };
    (score.to_string(), style.fg(colour))
}

/// Summary when present, otherwise the start of the article text.
pub fn description(article: &Article) -> Option<Cow<'_, str>> {
    if let Some(summary) = article.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return Some(one_line(summary));
    }
    let text = one_line(&article.text);
    if text.is_empty() {
        return None;
    }
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => Some(Cow::Owned(text[..cut].to_string())),
        None => Some(text),
    }
}

fn article_item(article: &Article, width: usize, now: DateTime<Utc>) -> ListItem<'_> {
    let (badge, badge_style) = score_badge(article.score);
    let title_width = width.saturating_sub(badge.len() + 3);
    let title = one_line(&article.title);

    let title_line = Line::from(vec![
        Span::styled(format!("[{badge}]"), badge_style),
        Span::raw(" "),
        Span::styled(
            truncate_to_width(&title, title_width).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);

    let mut source = one_line(&article.site_name).into_owned();
    source.push_str(" · ");
    source.push_str(&format_relative_time(article.publish_date, now, &Local));
    if let Some(authors) = article.authors.as_deref().filter(|a| !a.trim().is_empty()) {
        source.push_str(" · ");
        source.push_str(&one_line(authors));
    }
    let source_line = Line::from(Span::styled(
        truncate_to_width(&source, width).into_owned(),
        Style::default().fg(Color::DarkGray),
    ));

    let description_line = match description(article) {
        Some(text) => Line::from(Span::styled(
            truncate_to_width(&text, width).into_owned(),
            Style::default().fg(Color::Gray),
        )),
        None => Line::from(""),
    };

    ListItem::new(vec![title_line, source_line, description_line])
}

/// Last row of the list: continuation progress or failure.
fn footer_item(snap: &FeedSnapshot<'_>, retry_key: Option<&str>) -> ListItem<'static> {
    let line = if snap.loading_more {
        Line::from(Span::styled(
            "Loading more...",
            Style::default().fg(Color::DarkGray),
        ))
    } else if let Some(FeedError::LoadMore(_)) = snap.error {
        let message = snap.error.map(ToString::to_string).unwrap_or_default();
        let mut spans = vec![Span::styled(message, Style::default().fg(Color::Red))];
        if let Some(key) = retry_key {
            spans.push(Span::styled(
                format!("  ({key} to retry)"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    } else if snap.has_more {
        Line::from(Span::styled(
            format!("{} of {} loaded", snap.items.len(), snap.total),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            format!("End of list ({} articles)", snap.items.len()),
            Style::default().fg(Color::DarkGray),
        ))
    };
    ListItem::new(line)
}

/// Render the article panel.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(panel_title(app));
    let inner = block.inner(area);
    app.visible_articles = (inner.height as usize) / ROW_HEIGHT;

    if let Some((message, style)) = placeholder(app) {
        let paragraph = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let snap = app.feed.snapshot();
    let width = inner.width as usize;
    let now = Utc::now();

    let mut items: Vec<ListItem> = snap
        .items
        .iter()
        .map(|article| article_item(article, width, now))
        .collect();
    let retry_key = app.keymap.key_label(Action::LoadMore);
    items.push(footer_item(&snap, retry_key.as_deref()));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default().with_selected(Some(app.selected_article));
    f.render_stateful_widget(list, area, &mut state);
}

fn panel_title(app: &App) -> String {
    let snap = app.feed.snapshot();
    match snap.category {
        Some(category) => format!(" {} · {} ", category, snap.range.label()),
        None => " Articles ".to_string(),
    }
}

/// Retry line appended to failure placeholders, naming the bound reload key.
fn reload_hint(app: &App) -> String {
    app.keymap
        .key_label(Action::Reload)
        .map(|key| format!("\n\nPress {key} to retry."))
        .unwrap_or_default()
}

/// Message shown instead of the list, if the list has nothing to show.
fn placeholder(app: &App) -> Option<(String, Style)> {
    let dim = Style::default().fg(Color::DarkGray);
    let alert = Style::default().fg(Color::Red);
    let retry = reload_hint(app);

    match app.category_status {
        CategoryStatus::Loading => return Some(("Loading...".to_string(), dim)),
        CategoryStatus::Unavailable => {
            return Some((format!("{CONNECT_ERROR}{retry}"), alert))
        }
        CategoryStatus::Loaded if app.categories.is_empty() => {
            return Some(("No categories available.".to_string(), dim))
        }
        CategoryStatus::Loaded => {}
    }

    let snap = app.feed.snapshot();
    match snap.phase {
        FeedPhase::Idle => Some((String::new(), dim)),
        FeedPhase::LoadingInitial => Some(("Loading articles...".to_string(), dim)),
        FeedPhase::Failed => {
            let message = snap.error.map(ToString::to_string).unwrap_or_default();
            Some((format!("{message}{retry}"), alert))
        }
        FeedPhase::Ready if snap.is_empty_result() => Some((EMPTY_RESULT.to_string(), dim)),
        FeedPhase::Ready | FeedPhase::LoadingMore => None,
    }
}
