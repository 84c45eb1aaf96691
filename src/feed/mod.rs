//! Feed synchronization engine.
//!
//! Turns user actions (category switch, time-range change, "load more") into
//! paginated fetches, applies only the freshest generation's results, and
//! keeps a single deterministic sort order across pages fetched at different
//! times.
//!
//! # Architecture
//!
//! - [`range`] - Time range selector to half-open date interval
//! - [`sort`] - Score-then-hash total order over articles
//! - [`sequencer`] - Generation counter that invalidates stale fetches
//! - [`merge`] - Dedup-and-resort of a new page into loaded items
//! - [`load_more`] - Guard and viewport trigger for continuation fetches
//! - [`controller`] - Owns the feed state and wires the above together
//!
//! # Example
//!
//! ```ignore
//! use dailyknowledge::feed::{FeedController, TimeRange};
//!
//! let mut feed = FeedController::new(TimeRange::Today);
//! if let Some(req) = feed.select_category("Tech", &chrono::Local::now()) {
//!     let result = client.articles(&req.query).await;
//!     feed.complete(req.ticket, result);
//! }
//! ```

pub mod controller;
pub mod load_more;
pub mod merge;
pub mod range;
pub mod sequencer;
pub mod sort;

pub use controller::{
    Completion, FeedController, FeedError, FeedPhase, FeedSnapshot, FeedState, FetchRequest,
};
pub use load_more::{is_near_end, should_fetch_more, PAGE_SIZE};
pub use merge::{merge_page, MergeStats};
pub use range::{resolve, DateBounds, TimeRange};
pub use sequencer::{FetchKind, FetchSequencer, FetchTicket};
pub use sort::{compare, sort_articles, tiebreak_hash};
