use crate::api::{ApiClient, ApiError, Article, PageResult};
use crate::config::Config;
use crate::feed::{is_near_end, Completion, FeedController, FetchRequest, FetchTicket, TimeRange};
use crate::keymap::Keymap;
use chrono::Local;
use std::borrow::Cow;
use std::time::Duration;
use tokio::time::Instant;

/// Shown in place of the feed when the category list cannot be fetched.
pub const CONNECT_ERROR: &str = "Could not connect to the API. Is the backend running?";

/// How long a status-bar message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Event Types
// ============================================================================

/// Completion of a background task, delivered to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    CategoriesLoaded(Result<Vec<String>, ApiError>),
    /// A page fetch finished. `ticket` identifies the generation it was
    /// issued under; the feed controller decides whether it still applies.
    PageLoaded {
        ticket: FetchTicket,
        result: Result<PageResult, ApiError>,
    },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "categories", "page")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

/// Where the category list stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStatus {
    Loading,
    Loaded,
    /// Fetch failed; the feed stays idle until a reload succeeds.
    Unavailable,
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state.
///
/// Owned by the event loop task. Methods that change the feed filter or move
/// the cursor return the [`FetchRequest`] the caller has to run, if any.
pub struct App {
    pub client: ApiClient,
    pub keymap: Keymap,
    pub feed: FeedController,

    // Categories
    pub categories: Vec<String>,
    pub category_status: CategoryStatus,
    pub selected_category: usize,
    /// Category asked for on the command line, applied once the list arrives.
    preferred_category: Option<String>,

    // Article list
    pub selected_article: usize,
    /// Rows that fit in the list viewport. Written by the renderer.
    pub visible_articles: usize,
    load_more_threshold: usize,

    // P-8: Cow avoids allocation for static literals
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub show_help: bool,
}

impl App {
    pub fn new(client: ApiClient, config: &Config, preferred_category: Option<String>) -> Self {
        let mut keymap = Keymap::new();
        let warnings = keymap.apply_overrides(&config.keys);
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Key override ignored");
        }

        let mut app = Self {
            client,
            keymap,
            feed: FeedController::new(config.default_range),
            categories: Vec::new(),
            category_status: CategoryStatus::Loading,
            selected_category: 0,
            preferred_category,
            selected_article: 0,
            visible_articles: 0,
            load_more_threshold: config.load_more_threshold,
            status_message: None,
            needs_redraw: true,
            show_help: false,
        };
        if let Some(first) = warnings.first() {
            app.set_status(first.clone());
        }
        app
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    /// Mark the category list as being (re)fetched.
    pub fn begin_category_load(&mut self) {
        self.category_status = CategoryStatus::Loading;
    }

    /// Store the category list and select the initial category.
    pub fn apply_categories(
        &mut self,
        result: Result<Vec<String>, ApiError>,
    ) -> Option<FetchRequest> {
        let categories = match result {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load categories");
                self.category_status = CategoryStatus::Unavailable;
                return None;
            }
        };

        tracing::info!(count = categories.len(), "Loaded categories");
        self.categories = categories;
        self.category_status = CategoryStatus::Loaded;

        let index = match self.preferred_category.take() {
            Some(wanted) => match self.categories.iter().position(|c| *c == wanted) {
                Some(i) => i,
                None => {
                    tracing::warn!(category = %wanted, "Requested category not offered by the API");
                    self.set_status(format!("Unknown category '{wanted}'"));
                    0
                }
            },
            None => 0,
        };
        self.select_category_at(index)
    }

    pub fn selected_category_name(&self) -> Option<&str> {
        self.feed.state().category()
    }

    /// Switch to the category at `index` (no-op when out of range).
    pub fn select_category_at(&mut self, index: usize) -> Option<FetchRequest> {
        let name = self.categories.get(index)?.clone();
        self.selected_category = index;
        self.selected_article = 0;
        self.feed.select_category(name, &Local::now())
    }

    pub fn next_category(&mut self) -> Option<FetchRequest> {
        if self.categories.is_empty() {
            return None;
        }
        let next = (self.selected_category + 1) % self.categories.len();
        self.select_category_at(next)
    }

    pub fn prev_category(&mut self) -> Option<FetchRequest> {
        if self.categories.is_empty() {
            return None;
        }
        let len = self.categories.len();
        let prev = (self.selected_category + len - 1) % len;
        self.select_category_at(prev)
    }

    // ------------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------------

    pub fn select_range(&mut self, range: TimeRange) -> Option<FetchRequest> {
        self.selected_article = 0;
        self.feed.select_range(range, &Local::now())
    }

    pub fn cycle_range(&mut self) -> Option<FetchRequest> {
        let next = self.feed.state().range().next();
        self.select_range(next)
    }

    /// Re-issue the current filter as a fresh generation.
    pub fn reload(&mut self) -> Option<FetchRequest> {
        self.selected_article = 0;
        self.feed.reload(&Local::now())
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn selected_article(&self) -> Option<&Article> {
        self.feed.state().items().get(self.selected_article)
    }

    pub fn nav_down(&mut self) -> Option<FetchRequest> {
        self.move_selection(1)
    }

    pub fn nav_up(&mut self) -> Option<FetchRequest> {
        self.move_selection(-1)
    }

    pub fn page_down(&mut self) -> Option<FetchRequest> {
        self.move_selection(self.page_step())
    }

    pub fn page_up(&mut self) -> Option<FetchRequest> {
        self.move_selection(-self.page_step())
    }

    pub fn top(&mut self) -> Option<FetchRequest> {
        self.selected_article = 0;
        self.maybe_load_more()
    }

    pub fn bottom(&mut self) -> Option<FetchRequest> {
        self.selected_article = self.feed.state().items().len().saturating_sub(1);
        self.maybe_load_more()
    }

    fn page_step(&self) -> isize {
        self.visible_articles.max(1) as isize
    }

    fn move_selection(&mut self, delta: isize) -> Option<FetchRequest> {
        let len = self.feed.state().items().len();
        if len > 0 {
            let max_index = len - 1;
            self.selected_article = self
                .selected_article
                .saturating_add_signed(delta)
                .min(max_index);
        }
        self.maybe_load_more()
    }

    fn clamp_selection(&mut self) {
        let max_index = self.feed.state().items().len().saturating_sub(1);
        self.selected_article = self.selected_article.min(max_index);
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    /// Viewport trigger: request the next page once the end of the loaded
    /// list is in sight.
    ///
    /// The end is in sight when the cursor is within the configured threshold
    /// of the last item, or when every loaded item fits on screen.
    pub fn maybe_load_more(&mut self) -> Option<FetchRequest> {
        let loaded = self.feed.state().items().len();
        let end_in_sight = is_near_end(self.selected_article, loaded, self.load_more_threshold)
            || (loaded > 0 && loaded <= self.visible_articles);
        if !end_in_sight {
            return None;
        }
        self.feed.load_more()
    }

    /// Explicit "load more" from the keyboard. Also the retry path after a
    /// failed continuation.
    pub fn request_more(&mut self) -> Option<FetchRequest> {
        let request = self.feed.load_more();
        if request.is_none() && !self.feed.state().is_fetching() {
            let snapshot = self.feed.snapshot();
            if snapshot.category.is_some() && !snapshot.has_more {
                self.set_status("All articles loaded");
            }
        }
        request
    }

    /// Fold a finished page fetch into the feed.
    ///
    /// Returns a follow-up continuation when the applied page still leaves
    /// the end of the list in sight.
    pub fn complete_page(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageResult, ApiError>,
    ) -> Option<FetchRequest> {
        match self.feed.complete(ticket, result) {
            Completion::Applied { .. } => {
                self.clamp_selection();
                self.maybe_load_more()
            }
            Completion::Failed => {
                self.clamp_selection();
                None
            }
            Completion::Discarded => None,
        }
    }

    /// Detach the feed before the event loop exits.
    pub fn teardown(&mut self) {
        self.feed.teardown();
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
