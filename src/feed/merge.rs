use crate::api::Article;
use crate::feed::sort::sort_articles;
use std::collections::HashSet;

/// Outcome of folding one page into the loaded items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Articles from the page that were new.
    pub added: usize,
    /// Articles from the page dropped because their id was already loaded.
    pub duplicates: usize,
}

/// Append `page` to `items`, dropping ids already present, then re-sort the
/// whole set.
///
/// The full re-sort is deliberate: scores can change on the server between
/// page fetches, so the relative order of old and new pages cannot be assumed.
pub fn merge_page(items: &mut Vec<Article>, page: Vec<Article>) -> MergeStats {
    let mut seen: HashSet<i64> = items.iter().map(|a| a.id).collect();
    let incoming = page.len();
    let before = items.len();

    items.reserve(incoming);
    items.extend(page.into_iter().filter(|a| seen.insert(a.id)));

    let added = items.len() - before;
    let duplicates = incoming - added;

    sort_articles(items);
    MergeStats { added, duplicates }
}
