//! Client for the article collection service.
//!
//! - `client` - HTTP access with timeouts and response size limits
//! - `types` - Wire types (`Article`, `PageResult`)
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET categories` - ordered category names
//! - `GET categories/{category}/articles?since&until&limit&offset` - one page
//!   of articles plus the server-side total for the filter

mod client;
mod types;

pub use client::{ApiClient, ApiError, PageQuery};
pub use types::{Article, PageResult, UNSCORED};
