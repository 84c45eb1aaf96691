//! Display and link helpers for backend-supplied article data.
//!
//! - **Text**: flattening scraped text to one safe line, width-aware truncation
//! - **Links**: checking article URLs before opening them in a browser

mod link;
mod text;

pub use link::{validate_article_url, LinkError};
pub use text::{display_width, one_line, truncate_to_width};
