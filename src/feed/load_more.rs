use crate::api::PageQuery;
use crate::feed::controller::FeedState;

/// Articles requested per fetch.
pub const PAGE_SIZE: u32 = 20;

/// Whether a continuation fetch may be issued for `state`.
///
/// All of these must hold: a category is selected, no fetch of the current
/// generation is in flight, and fewer items are loaded than the server
/// reported. Failing any of them is a silent no-op for the caller.
pub fn should_fetch_more(state: &FeedState) -> bool {
    state.category().is_some() && !state.is_fetching() && state.has_more()
}

/// Query for the next offset window of the current filter.
///
/// Returns `None` when no filter has been resolved yet.
pub fn continuation_query(state: &FeedState) -> Option<PageQuery> {
    let category = state.category()?;
    let bounds = state.bounds()?;
    Some(PageQuery {
        category: category.to_string(),
        bounds,
        limit: PAGE_SIZE,
        offset: state.items().len() as u64,
    })
}

/// Viewport trigger: true once the cursor is within `threshold` rows of the
/// last loaded item.
pub fn is_near_end(position: usize, loaded: usize, threshold: usize) -> bool {
    loaded > 0 && position.saturating_add(threshold) >= loaded.saturating_sub(1)
}
