use crate::api::{ApiError, Article, PageQuery, PageResult};
use crate::feed::load_more::{continuation_query, should_fetch_more, PAGE_SIZE};
use crate::feed::merge::merge_page;
use crate::feed::range::{resolve, DateBounds, TimeRange};
use crate::feed::sequencer::{FetchKind, FetchSequencer, FetchTicket};
use chrono::{DateTime, TimeZone};
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// User-visible feed failure.
///
/// Only failures of the active generation become a `FeedError`; results of
/// superseded fetches are dropped without one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The first page of the current filter could not be loaded.
    #[error("Could not load articles: {0}")]
    InitialLoad(String),
    /// A continuation failed. Items loaded so far stay visible.
    #[error("Could not load more articles: {0}")]
    LoadMore(String),
}

/// Lifecycle of the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No category selected yet.
    Idle,
    LoadingInitial,
    /// Initial page loaded (possibly with a failed continuation, see `error`).
    Ready,
    LoadingMore,
    /// Initial page failed.
    Failed,
}

/// A fetch the caller must perform, then hand back to
/// [`FeedController::complete`] together with its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub query: PageQuery,
}

/// What a completion did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Page merged into the current items.
    Applied { added: usize, duplicates: usize },
    /// Failure recorded as the feed error.
    Failed,
    /// Result belonged to a superseded generation or arrived after teardown.
    Discarded,
}

// ============================================================================
// Feed State
// ============================================================================

/// State owned by a [`FeedController`].
///
/// `items` is sorted and free of duplicate ids whenever control is outside
/// the controller, and never longer than `total`.
#[derive(Debug, Default)]
pub struct FeedState {
    category: Option<String>,
    range: TimeRange,
    bounds: Option<DateBounds>,
    items: Vec<Article>,
    total: u64,
    sequencer: FetchSequencer,
    error: Option<FeedError>,
    failed_initial: bool,
}

impl FeedState {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Interval the current generation was resolved to.
    pub fn bounds(&self) -> Option<DateBounds> {
        self.bounds
    }

    pub fn items(&self) -> &[Article] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn generation(&self) -> u64 {
        self.sequencer.generation()
    }

    pub fn error(&self) -> Option<&FeedError> {
        self.error.as_ref()
    }

    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }

    /// Whether a fetch of the current generation is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.sequencer.is_busy()
    }

    pub fn loading_initial(&self) -> bool {
        self.sequencer.in_flight() == Some(FetchKind::Reset)
    }

    pub fn loading_more(&self) -> bool {
        self.sequencer.in_flight() == Some(FetchKind::Continuation)
    }

    pub fn phase(&self) -> FeedPhase {
        match self.sequencer.in_flight() {
            Some(FetchKind::Reset) => FeedPhase::LoadingInitial,
            Some(FetchKind::Continuation) => FeedPhase::LoadingMore,
            None if self.category.is_none() => FeedPhase::Idle,
            None if self.failed_initial => FeedPhase::Failed,
            None => FeedPhase::Ready,
        }
    }

    /// Clear per-generation data. The caller advances the generation.
    fn clear(&mut self) {
        self.items.clear();
        self.total = 0;
        self.error = None;
        self.failed_initial = false;
        self.bounds = None;
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only view handed to the rendering layer.
#[derive(Debug, Clone, Copy)]
pub struct FeedSnapshot<'a> {
    pub category: Option<&'a str>,
    pub range: TimeRange,
    pub items: &'a [Article],
    pub total: u64,
    pub has_more: bool,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub error: Option<&'a FeedError>,
    pub phase: FeedPhase,
    pub generation: u64,
}

impl FeedSnapshot<'_> {
    pub fn loading(&self) -> bool {
        self.loading_initial || self.loading_more
    }

    /// Zero articles for the filter; distinct from an error.
    pub fn is_empty_result(&self) -> bool {
        self.phase == FeedPhase::Ready && self.items.is_empty() && self.error.is_none()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Turns filter changes and load-more triggers into fetch requests, and
/// folds completions back into [`FeedState`].
///
/// The controller performs no I/O. Callers run each returned
/// [`FetchRequest`] however they like and report the outcome through
/// [`complete`](Self::complete) on the same logical thread that owns the
/// controller; ordering between completions is then irrelevant because only
/// results of the current generation are applied.
#[derive(Debug, Default)]
pub struct FeedController {
    state: FeedState,
    torn_down: bool,
}

impl FeedController {
    pub fn new(range: TimeRange) -> Self {
        Self {
            state: FeedState {
                range,
                ..FeedState::default()
            },
            torn_down: false,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn snapshot(&self) -> FeedSnapshot<'_> {
        let state = &self.state;
        FeedSnapshot {
            category: state.category(),
            range: state.range,
            items: &state.items,
            total: state.total,
            has_more: state.has_more(),
            loading_initial: state.loading_initial(),
            loading_more: state.loading_more(),
            error: state.error.as_ref(),
            phase: state.phase(),
            generation: state.generation(),
        }
    }

    /// Switch category and start a new generation.
    pub fn select_category<Tz: TimeZone>(
        &mut self,
        category: impl Into<String>,
        now: &DateTime<Tz>,
    ) -> Option<FetchRequest> {
        if self.torn_down {
            return None;
        }
        self.state.category = Some(category.into());
        self.reset(now)
    }

    /// Switch time range and start a new generation.
    ///
    /// Without a selected category the generation still advances, but no
    /// fetch is issued.
    pub fn select_range<Tz: TimeZone>(
        &mut self,
        range: TimeRange,
        now: &DateTime<Tz>,
    ) -> Option<FetchRequest> {
        if self.torn_down {
            return None;
        }
        self.state.range = range;
        self.reset(now)
    }

    /// Re-issue the current filter under a new generation.
    pub fn reload<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<FetchRequest> {
        if self.torn_down {
            return None;
        }
        self.reset(now)
    }

    fn reset<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<FetchRequest> {
        self.state.clear();

        let Some(category) = self.state.category.clone() else {
            self.state.sequencer.invalidate();
            return None;
        };

        let bounds = resolve(self.state.range, now);
        self.state.bounds = Some(bounds);
        let ticket = self.state.sequencer.begin_reset();

        tracing::debug!(
            category = %category,
            range = %self.state.range,
            generation = ticket.generation,
            "Feed reset"
        );

        Some(FetchRequest {
            ticket,
            query: PageQuery {
                category,
                bounds,
                limit: PAGE_SIZE,
                offset: 0,
            },
        })
    }

    /// Request the next page if the load-more guard allows it.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.torn_down || !should_fetch_more(&self.state) {
            return None;
        }
        let query = continuation_query(&self.state)?;
        let ticket = self.state.sequencer.begin_continuation()?;
        self.state.error = None;

        tracing::debug!(
            category = %query.category,
            offset = query.offset,
            generation = ticket.generation,
            "Feed continuation"
        );

        Some(FetchRequest { ticket, query })
    }

    /// Apply the outcome of a fetch issued by this controller.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageResult, ApiError>,
    ) -> Completion {
        if self.torn_down {
            tracing::debug!(generation = ticket.generation, "Dropping fetch result after teardown");
            return Completion::Discarded;
        }
        if !self.state.sequencer.finish(ticket) {
            return Completion::Discarded;
        }

        match result {
            Ok(page) => self.apply_page(ticket, page),
            Err(e) => {
                tracing::warn!(
                    generation = ticket.generation,
                    kind = ?ticket.kind,
                    error = %e,
                    "Feed fetch failed"
                );
                self.state.error = Some(match ticket.kind {
                    FetchKind::Reset => {
                        self.state.failed_initial = true;
                        FeedError::InitialLoad(e.to_string())
                    }
                    FetchKind::Continuation => FeedError::LoadMore(e.to_string()),
                });
                Completion::Failed
            }
        }
    }

    fn apply_page(&mut self, ticket: FetchTicket, page: PageResult) -> Completion {
        let PageResult { articles, total } = page;
        let had_more = self.state.has_more();
        let stats = merge_page(&mut self.state.items, articles);
        let loaded = self.state.items.len() as u64;

        self.state.total = if total < loaded {
            tracing::debug!(
                reported = total,
                loaded,
                "Server total below loaded count, clamping"
            );
            loaded
        } else if ticket.kind == FetchKind::Continuation && had_more && stats.added == 0 {
            // The next offset window held nothing new; asking again would
            // return the same window forever.
            tracing::debug!(reported = total, loaded, "Continuation yielded no new articles");
            loaded
        } else {
            total
        };

        tracing::info!(
            generation = ticket.generation,
            kind = ?ticket.kind,
            added = stats.added,
            duplicates = stats.duplicates,
            loaded,
            total = self.state.total,
            "Feed page applied"
        );

        Completion::Applied {
            added: stats.added,
            duplicates: stats.duplicates,
        }
    }

    /// Detach the feed. Later completions are discarded.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.state.sequencer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UNSCORED;
    use crate::feed::sort::tests::article;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-10T15:00:00+02:00").unwrap()
    }

    fn page(articles: Vec<Article>, total: u64) -> Result<PageResult, ApiError> {
        Ok(PageResult { articles, total })
    }

    fn ids(c: &FeedController) -> Vec<i64> {
        c.snapshot().items.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_idle_until_category_selected() {
        let mut c = FeedController::new(TimeRange::Today);
        assert_eq!(c.snapshot().phase, FeedPhase::Idle);
        assert!(c.load_more().is_none());

        let before = c.state().generation();
        assert!(c.select_range(TimeRange::Week, &now()).is_none());
        assert!(c.state().generation() > before);
        assert_eq!(c.snapshot().phase, FeedPhase::Idle);
    }

    #[test]
    fn test_reset_request_shape() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        assert_eq!(req.ticket.kind, FetchKind::Reset);
        assert_eq!(req.query.category, "Tech");
        assert_eq!(req.query.offset, 0);
        assert_eq!(req.query.limit, PAGE_SIZE);
        assert_eq!(req.query.bounds, resolve(TimeRange::Today, &now()));
        assert!(c.snapshot().loading_initial);
        assert_eq!(c.snapshot().phase, FeedPhase::LoadingInitial);
    }

    #[test]
    fn test_paginated_merge_and_has_more() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 8), article(2, 3)], 5));

        let snap = c.snapshot();
        assert_eq!(ids(&c), vec![1, 2]);
        assert!(snap.has_more);
        assert!(!snap.loading());

        let more = c.load_more().unwrap();
        assert_eq!(more.ticket.kind, FetchKind::Continuation);
        assert_eq!(more.ticket.generation, req.ticket.generation);
        assert_eq!(more.query.offset, 2);
        assert!(c.snapshot().loading_more);

        let outcome = c.complete(
            more.ticket,
            page(vec![article(3, 8), article(4, UNSCORED), article(5, UNSCORED)], 5),
        );
        assert_eq!(outcome, Completion::Applied { added: 3, duplicates: 0 });
        assert_eq!(ids(&c), vec![1, 3, 2, 4, 5]);
        assert!(!c.snapshot().has_more);
        assert!(c.load_more().is_none());
    }

    #[test]
    fn test_load_more_refused_while_in_flight() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        // Initial fetch still outstanding
        assert!(c.load_more().is_none());

        c.complete(req.ticket, page(vec![article(1, 1)], 10));
        let first = c.load_more().unwrap();
        assert!(c.load_more().is_none());
        c.complete(first.ticket, page(vec![article(2, 1)], 10));
        assert!(c.load_more().is_some());
    }

    #[test]
    fn test_stale_reset_cannot_overwrite_newer_state() {
        let mut c = FeedController::new(TimeRange::Today);
        let tech = c.select_category("Tech", &now()).unwrap();
        let sport = c.select_category("Sport", &now()).unwrap();

        c.complete(sport.ticket, page(vec![article(20, 1)], 1));
        let outcome = c.complete(tech.ticket, page(vec![article(10, 9)], 1));

        assert_eq!(outcome, Completion::Discarded);
        assert_eq!(ids(&c), vec![20]);
        assert_eq!(c.snapshot().category, Some("Sport"));
    }

    #[test]
    fn test_stale_failure_is_not_an_error() {
        let mut c = FeedController::new(TimeRange::Today);
        let old = c.select_category("Tech", &now()).unwrap();
        let _new = c.select_range(TimeRange::Week, &now()).unwrap();

        let outcome = c.complete(old.ticket, Err(ApiError::Timeout));
        assert_eq!(outcome, Completion::Discarded);
        assert!(c.snapshot().error.is_none());
        assert!(c.snapshot().loading_initial);
    }

    #[test]
    fn test_initial_failure() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        let outcome = c.complete(req.ticket, Err(ApiError::HttpStatus(502)));

        let snap = c.snapshot();
        assert_eq!(outcome, Completion::Failed);
        assert_eq!(snap.phase, FeedPhase::Failed);
        assert!(matches!(snap.error, Some(FeedError::InitialLoad(_))));
        assert!(snap.items.is_empty());
        assert!(!snap.loading_initial);
        assert!(!snap.is_empty_result());
    }

    #[test]
    fn test_continuation_failure_keeps_items() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 5), article(2, 4)], 4));

        let more = c.load_more().unwrap();
        c.complete(more.ticket, Err(ApiError::Timeout));

        let snap = c.snapshot();
        assert_eq!(snap.phase, FeedPhase::Ready);
        assert!(matches!(snap.error, Some(FeedError::LoadMore(_))));
        assert_eq!(ids(&c), vec![1, 2]);
        assert!(snap.has_more);

        // A fresh trigger retries and clears the error
        let retry = c.load_more().unwrap();
        assert!(c.snapshot().error.is_none());
        c.complete(retry.ticket, page(vec![article(3, 1), article(4, 0)], 4));
        assert_eq!(ids(&c), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_change_discards_error() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, Err(ApiError::Timeout));
        assert!(c.snapshot().error.is_some());

        c.select_range(TimeRange::ThreeDays, &now()).unwrap();
        let snap = c.snapshot();
        assert!(snap.error.is_none());
        assert_eq!(snap.phase, FeedPhase::LoadingInitial);
        assert_eq!(snap.range, TimeRange::ThreeDays);
    }

    #[test]
    fn test_empty_result() {
        let mut c = FeedController::new(TimeRange::Yesterday);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(Vec::new(), 0));

        let snap = c.snapshot();
        assert!(snap.is_empty_result());
        assert!(snap.error.is_none());
        assert!(!snap.has_more);
    }

    #[test]
    fn test_total_clamped_to_loaded() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 1), article(2, 1), article(3, 1)], 2));
        assert_eq!(c.snapshot().total, 3);
        assert!(!c.snapshot().has_more);
    }

    #[test]
    fn test_total_follows_latest_fetch() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 1)], 3));

        let more = c.load_more().unwrap();
        c.complete(more.ticket, page(vec![article(2, 1)], 6));
        assert_eq!(c.snapshot().total, 6);
        assert!(c.snapshot().has_more);
    }

    #[test]
    fn test_continuation_of_only_duplicates_exhausts_feed() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 1), article(2, 1)], 4));

        let more = c.load_more().unwrap();
        let outcome = c.complete(more.ticket, page(vec![article(2, 1)], 4));
        assert_eq!(outcome, Completion::Applied { added: 0, duplicates: 1 });
        assert!(!c.snapshot().has_more);
        assert!(c.load_more().is_none());
    }

    #[test]
    fn test_teardown_discards_completions() {
        let mut c = FeedController::new(TimeRange::Today);
        let req = c.select_category("Tech", &now()).unwrap();
        c.teardown();

        assert_eq!(c.complete(req.ticket, page(vec![article(1, 1)], 1)), Completion::Discarded);
        assert!(c.snapshot().items.is_empty());
        assert!(c.select_category("Sport", &now()).is_none());
        assert!(c.load_more().is_none());
        assert!(c.torn_down);
    }

    #[test]
    fn test_yesterday_bounds_carried_into_continuation() {
        let mut c = FeedController::new(TimeRange::Yesterday);
        let req = c.select_category("Tech", &now()).unwrap();
        c.complete(req.ticket, page(vec![article(1, 1)], 2));

        let more = c.load_more().unwrap();
        assert_eq!(more.query.bounds, req.query.bounds);
        assert!(more.query.bounds.until.is_some());
    }
}
