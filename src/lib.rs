//! Terminal client for the dailyKnowledge article feed.
//!
//! The core is the [`feed`] synchronization engine: it turns category and
//! time-range changes into paginated fetches against the collection service
//! ([`api`]), drops results of superseded fetches, and keeps a single
//! deterministic score order across pages. [`app`] and [`ui`] wrap it in a
//! terminal interface.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod keymap;
pub mod ui;
pub mod util;
