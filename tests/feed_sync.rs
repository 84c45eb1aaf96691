//! End-to-end tests of the feed engine against a mocked collection service.
//!
//! Each test starts its own wiremock server, runs the fetches the
//! controller asks for through the real HTTP client, and feeds the results
//! back in whatever order the scenario needs.

use chrono::{DateTime, FixedOffset};
use dailyknowledge::api::{ApiClient, ApiError, Article, PageQuery, PageResult, UNSCORED};
use dailyknowledge::feed::{
    sort_articles, Completion, FeedController, FeedError, FeedPhase, FetchKind, TimeRange,
    PAGE_SIZE,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-10T15:00:00+02:00").unwrap()
}

fn article_json(id: i64, score: i64) -> serde_json::Value {
    json!({
        "id": id,
        "site_name": "Example",
        "url": format!("https://example.com/{id}"),
        "title": format!("Article {id}"),
        "text": "",
        "authors": null,
        "publish_date": "2024-05-10T08:00:00",
        "score": score,
        "summary": null,
        "created_at": "2024-05-10T08:05:00"
    })
}

fn page_body(articles: &[(i64, i64)], total: u64) -> serde_json::Value {
    json!({
        "articles": articles.iter().map(|&(id, score)| article_json(id, score)).collect::<Vec<_>>(),
        "total": total,
    })
}

async fn mount_page(
    server: &MockServer,
    category: &str,
    offset: u64,
    articles: &[(i64, i64)],
    total: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/api/categories/{category}/articles")))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(articles, total)))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

async fn fetch(client: &ApiClient, query: &PageQuery) -> Result<PageResult, ApiError> {
    client.articles(query).await
}

fn ids(feed: &FeedController) -> Vec<i64> {
    feed.snapshot().items.iter().map(|a| a.id).collect()
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_paginated_load_matches_single_sort_of_union() {
    let server = MockServer::start().await;
    let first: Vec<(i64, i64)> = (1..=20).map(|id| (id, id % 4)).collect();
    // Page two overlaps page one at id 20 and carries unscored articles
    let second: Vec<(i64, i64)> = (20..=30)
        .map(|id| (id, if id % 3 == 0 { UNSCORED } else { id % 4 }))
        .collect();
    mount_page(&server, "Tech", 0, &first, 30).await;
    mount_page(&server, "Tech", 20, &second, 30).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Week);
    let req = feed.select_category("Tech", &now()).unwrap();
    assert_eq!(req.query.limit, PAGE_SIZE);
    let result = fetch(&client, &req.query).await;
    feed.complete(req.ticket, result);
    assert!(feed.snapshot().has_more);

    let more = feed.load_more().unwrap();
    assert_eq!(more.query.offset, 20);
    let result = fetch(&client, &more.query).await;
    let outcome = feed.complete(more.ticket, result);
    assert_eq!(outcome, Completion::Applied { added: 10, duplicates: 1 });

    // Same list as sorting the union of both pages in one go
    let mut union: Vec<Article> = feed.snapshot().items.to_vec();
    union.reverse();
    sort_articles(&mut union);
    assert_eq!(ids(&feed), union.iter().map(|a| a.id).collect::<Vec<_>>());

    let snap = feed.snapshot();
    assert_eq!(snap.items.len(), 30);
    assert!(!snap.has_more);
    assert!(snap.items.iter().rev().take(3).all(|a| a.score == UNSCORED));
    assert!(feed.load_more().is_none());
}

#[tokio::test]
async fn test_backend_short_page_with_inflated_total_terminates() {
    let server = MockServer::start().await;
    mount_page(&server, "Tech", 0, &[(1, 5), (2, 4)], 40).await;
    mount_page(&server, "Tech", 2, &[(2, 4)], 40).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let req = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &req.query).await;
    feed.complete(req.ticket, result);

    let more = feed.load_more().unwrap();
    let result = fetch(&client, &more.query).await;
    feed.complete(more.ticket, result);

    assert_eq!(ids(&feed), vec![1, 2]);
    assert!(!feed.snapshot().has_more);
    assert!(feed.load_more().is_none());
}

// ============================================================================
// Staleness
// ============================================================================

#[tokio::test]
async fn test_range_switch_mid_flight_discards_old_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/Tech/articles"))
        .and(query_param("since", "2024-05-10T00:00:00+02:00"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(&[(1, 9)], 1))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories/Tech/articles"))
        .and(query_param("since", "2024-05-04T00:00:00+02:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[(7, 3), (8, 2)], 2)))
        .mount(&server)
        .await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let today = feed.select_category("Tech", &now()).unwrap();
    let week = feed.select_range(TimeRange::Week, &now()).unwrap();
    assert!(week.ticket.generation > today.ticket.generation);

    let (today_result, week_result) =
        tokio::join!(fetch(&client, &today.query), fetch(&client, &week.query));

    // Week arrives first, then the slow Today response
    assert!(matches!(
        feed.complete(week.ticket, week_result),
        Completion::Applied { .. }
    ));
    assert_eq!(feed.complete(today.ticket, today_result), Completion::Discarded);

    let snap = feed.snapshot();
    assert_eq!(snap.range, TimeRange::Week);
    assert_eq!(ids(&feed), vec![7, 8]);
    assert!(!snap.loading());
}

#[tokio::test]
async fn test_range_switch_during_continuation_never_appends_to_new_range() {
    let server = MockServer::start().await;
    let today = "2024-05-10T00:00:00+02:00";
    let week = "2024-05-04T00:00:00+02:00";
    Mock::given(method("GET"))
        .and(query_param("since", today))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[(1, 8), (2, 3)], 5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("since", today))
        .and(query_param("offset", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(&[(3, 8), (4, UNSCORED), (5, UNSCORED)], 5))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("since", week))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[(9, 1)], 1)))
        .mount(&server)
        .await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let req = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &req.query).await;
    feed.complete(req.ticket, result);

    let more = feed.load_more().unwrap();
    let reset = feed.select_range(TimeRange::Week, &now()).unwrap();
    assert!(feed.snapshot().items.is_empty());
    assert!(feed.snapshot().loading_initial);

    let (more_result, reset_result) =
        tokio::join!(fetch(&client, &more.query), fetch(&client, &reset.query));
    feed.complete(reset.ticket, reset_result);
    assert_eq!(feed.complete(more.ticket, more_result), Completion::Discarded);

    assert_eq!(ids(&feed), vec![9]);
    assert!(!feed.snapshot().has_more);
}

#[tokio::test]
async fn test_category_switch_discards_pending_continuation() {
    let server = MockServer::start().await;
    mount_page(&server, "Tech", 0, &[(1, 5), (2, 5)], 4).await;
    mount_page(&server, "Tech", 2, &[(3, 5), (4, 5)], 4).await;
    mount_page(&server, "Sport", 0, &[(50, 1)], 1).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let tech = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &tech.query).await;
    feed.complete(tech.ticket, result);

    let more = feed.load_more().unwrap();
    let sport = feed.select_category("Sport", &now()).unwrap();
    let sport_result = fetch(&client, &sport.query).await;
    feed.complete(sport.ticket, sport_result);

    let more_result = fetch(&client, &more.query).await;
    assert_eq!(feed.complete(more.ticket, more_result), Completion::Discarded);
    assert_eq!(ids(&feed), vec![50]);
    assert_eq!(feed.snapshot().category, Some("Sport"));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_continuation_failure_keeps_items_and_retry_recovers() {
    let server = MockServer::start().await;
    mount_page(&server, "Tech", 0, &[(1, 8), (2, 7)], 3).await;
    Mock::given(method("GET"))
        .and(path("/api/categories/Tech/articles"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "Tech", 2, &[(3, 6)], 3).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let req = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &req.query).await;
    feed.complete(req.ticket, result);

    let more = feed.load_more().unwrap();
    let result = fetch(&client, &more.query).await;
    assert_eq!(feed.complete(more.ticket, result), Completion::Failed);

    let snap = feed.snapshot();
    assert!(matches!(snap.error, Some(FeedError::LoadMore(_))));
    assert_eq!(snap.phase, FeedPhase::Ready);
    assert_eq!(ids(&feed), vec![1, 2]);

    let retry = feed.load_more().unwrap();
    assert_eq!(retry.ticket.kind, FetchKind::Continuation);
    let result = fetch(&client, &retry.query).await;
    feed.complete(retry.ticket, result);
    assert_eq!(ids(&feed), vec![1, 2, 3]);
    assert!(feed.snapshot().error.is_none());
}

#[tokio::test]
async fn test_initial_failure_then_reload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/Tech/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "Tech", 0, &[(1, 1)], 1).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Today);
    let req = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &req.query).await;
    assert!(matches!(result, Err(ApiError::Decode(_))));
    feed.complete(req.ticket, result);
    assert_eq!(feed.snapshot().phase, FeedPhase::Failed);
    assert!(matches!(feed.snapshot().error, Some(FeedError::InitialLoad(_))));

    let again = feed.reload(&now()).unwrap();
    assert!(feed.snapshot().error.is_none());
    let result = fetch(&client, &again.query).await;
    feed.complete(again.ticket, result);
    assert_eq!(ids(&feed), vec![1]);
}

#[tokio::test]
async fn test_empty_range_is_not_an_error() {
    let server = MockServer::start().await;
    mount_page(&server, "Tech", 0, &[], 0).await;
    let client = client(&server);

    let mut feed = FeedController::new(TimeRange::Yesterday);
    let req = feed.select_category("Tech", &now()).unwrap();
    let result = fetch(&client, &req.query).await;
    feed.complete(req.ticket, result);

    let snap = feed.snapshot();
    assert!(snap.is_empty_result());
    assert!(snap.error.is_none());
    assert!(!snap.has_more);
}
