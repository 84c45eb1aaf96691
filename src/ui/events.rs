//! Background task event processing.
//!
//! Applies completions from the `AppEvent` channel to the application state,
//! spawning whatever follow-up fetch the feed asks for.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::tasks::spawn_if_some;

/// Handle an event from a background task.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::CategoriesLoaded(result) => {
            let request = app.apply_categories(result);
            spawn_if_some(app, request, event_tx);
        }
        AppEvent::PageLoaded { ticket, result } => {
            let request = app.complete_page(ticket, result);
            spawn_if_some(app, request, event_tx);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {task} task"));
        }
    }
}
