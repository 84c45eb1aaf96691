//! Deterministic render order for articles.
//!
//! Articles are ordered by score (highest first, unscored last) and then by
//! an avalanche hash of their id. The hash carries no meaning; it only makes
//! the order among equal scores reproducible across reloads and across pages
//! fetched at different times.

use crate::api::{Article, UNSCORED};
use std::cmp::Ordering;

/// Stable tiebreaker for articles with the same score.
///
/// XOR-shift, multiply, XOR-shift over the low 32 bits of the id. Each step
/// is a bijection on `u32`, so distinct 32-bit ids never collide. The result
/// is compared as a signed 32-bit value.
pub fn tiebreak_hash(id: i64) -> i32 {
    let mut h = id as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x045d_9f3b);
    h ^= h >> 16;
    h as i32
}

/// Score rank where the unscored sentinel sits below every real score.
fn score_rank(score: i64) -> Option<i64> {
    (score != UNSCORED).then_some(score)
}

/// Total order: score descending, then tiebreak hash ascending, then id.
///
/// The final id comparison only matters for ids beyond 32 bits whose low
/// halves collide.
pub fn compare(a: &Article, b: &Article) -> Ordering {
    score_rank(b.score)
        .cmp(&score_rank(a.score))
        .then_with(|| tiebreak_hash(a.id).cmp(&tiebreak_hash(b.id)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort the full set in place.
pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(compare);
}
