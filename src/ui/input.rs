//! Input handling for the TUI.
//!
//! Maps key presses through the keymap and turns the resulting actions into
//! application state changes and background fetches.

use crate::app::{App, AppEvent, CategoryStatus};
use crate::feed::TimeRange;
use crate::keymap::Action as KbAction;
use crate::util::validate_article_url;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::tasks::{spawn_categories, spawn_if_some};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let action = app.keymap.action_for_key(code, modifiers);

    // Help overlay captures all keys; Esc or any bound key dismisses it
    if app.show_help {
        if action.is_some() || code == KeyCode::Esc {
            app.show_help = false;
        }
        return Ok(Action::Continue);
    }

    let Some(action) = action else {
        return Ok(Action::Continue);
    };

    let request = match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::ShowHelp => {
            app.show_help = true;
            None
        }
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::PageDown => app.page_down(),
        KbAction::PageUp => app.page_up(),
        KbAction::Top => app.top(),
        KbAction::Bottom => app.bottom(),
        KbAction::NextCategory => app.next_category(),
        KbAction::PrevCategory => app.prev_category(),
        KbAction::CycleRange => app.cycle_range(),
        KbAction::RangeToday => app.select_range(TimeRange::Today),
        KbAction::RangeYesterday => app.select_range(TimeRange::Yesterday),
        KbAction::RangeThreeDays => app.select_range(TimeRange::ThreeDays),
        KbAction::RangeWeek => app.select_range(TimeRange::Week),
        KbAction::Reload => {
            if app.category_status == CategoryStatus::Unavailable {
                // Nothing to reload until the category list arrives
                spawn_categories(app, event_tx);
                None
            } else {
                app.reload()
            }
        }
        KbAction::LoadMore => app.request_more(),
        KbAction::OpenInBrowser => {
            open_selected(app);
            None
        }
    };

    spawn_if_some(app, request, event_tx);
    Ok(Action::Continue)
}

fn open_selected(app: &mut App) {
    let Some(article) = app.selected_article() else {
        return;
    };
    // Scraped URLs are validated before open::that() hands them to the OS
    match validate_article_url(&article.url) {
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {e}"));
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}
