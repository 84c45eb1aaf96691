//! Background tasks that talk to the collection service.
//!
//! Each task owns a clone of the API client and reports back over the
//! `AppEvent` channel; all state changes happen on the event loop.

use crate::api::ApiClient;
use crate::app::{App, AppEvent};
use crate::feed::FetchRequest;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Panics inside spawned tasks would otherwise vanish into the runtime and
/// leave the feed stuck in a loading state.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Deliver an event, tolerating a closed loop.
///
/// After teardown the receiver is gone and late completions are dropped.
async fn deliver(tx: &mpsc::Sender<AppEvent>, event: AppEvent, what: &'static str) {
    if tx.send(event).await.is_err() {
        tracing::debug!(event = what, "Event loop gone, discarding completion");
    }
}

/// Fetch the category list.
pub(super) fn spawn_categories(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    app.begin_category_load();
    let client = app.client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(client.categories()).await {
            Ok(result) => deliver(&tx, AppEvent::CategoriesLoaded(result), "CategoriesLoaded").await,
            Err(error) => {
                tracing::error!(error = %error, "Category task panicked");
                let event = AppEvent::TaskPanicked {
                    task: "categories",
                    error,
                };
                deliver(&tx, event, "TaskPanicked").await;
            }
        }
    });
}

/// Run one page fetch issued by the feed controller.
///
/// Superseded fetches are not aborted; their results still travel back and
/// the controller discards them by generation.
pub(super) fn spawn_page_fetch(
    client: &ApiClient,
    request: FetchRequest,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    let tx = event_tx.clone();
    let FetchRequest { ticket, query } = request;

    tracing::debug!(
        generation = ticket.generation,
        kind = ?ticket.kind,
        category = %query.category,
        offset = query.offset,
        "Spawning page fetch"
    );

    tokio::spawn(async move {
        match catch_task_panic(client.articles(&query)).await {
            Ok(result) => deliver(&tx, AppEvent::PageLoaded { ticket, result }, "PageLoaded").await,
            Err(error) => {
                tracing::error!(error = %error, "Page fetch task panicked");
                let event = AppEvent::PageLoaded {
                    ticket,
                    result: Err(crate::api::ApiError::TaskFailed(error.clone())),
                };
                deliver(&tx, event, "PageLoaded").await;
                deliver(&tx, AppEvent::TaskPanicked { task: "page", error }, "TaskPanicked").await;
            }
        }
    });
}

/// Spawn `request` if there is one.
pub(super) fn spawn_if_some(
    app: &App,
    request: Option<FetchRequest>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(request) = request {
        spawn_page_fetch(&app.client, request, event_tx);
    }
}
