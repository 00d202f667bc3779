use super::*;
use crate::{
    controller::{SearchController, SearchOptions},
    render::ResultsView,
};
use axum::{extract::Query, extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type SeenQueries = Arc<Mutex<Vec<Vec<(String, String)>>>>;

async fn spawn_catalog(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/terms/")
}

/// Serves the single-result `cell` page for every term request and records
/// each request's query pairs.
async fn spawn_cell_catalog() -> (String, SeenQueries) {
    let seen: SeenQueries = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/terms/",
            get(
                |State(seen): State<SeenQueries>, Query(pairs): Query<Vec<(String, String)>>| async move {
                    seen.lock().expect("lock").push(pairs);
                    Json(serde_json::json!({
                        "results": [{"id": 7, "term": "cell", "definition": "...", "tags": ["biology"]}],
                        "count": 1,
                        "next": null,
                        "previous": null,
                        "current_page": 1,
                        "total_pages": 1
                    }))
                },
            ),
        )
        .route(
            "/terms/tags/",
            get(|| async {
                Json(serde_json::json!({
                    "tags": [{"name": "biology", "count": 1}],
                    "hasMore": false
                }))
            }),
        )
        .with_state(Arc::clone(&seen));
    (spawn_catalog(app).await, seen)
}

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fetchers(base: &str) -> (HttpTermFetcher, HttpTagFetcher) {
    let base_url = normalize_base_url(base).expect("base url");
    let http = build_http_client(Duration::from_secs(5)).expect("client");
    let tags = HttpTagFetcher::new(http.clone(), &base_url).expect("tags url");
    (HttpTermFetcher::new(http, base_url), tags)
}

#[test]
fn base_url_gains_trailing_slash_and_tags_resolve_below_it() {
    let base = normalize_base_url("http://example.test/terms?x=1").expect("url");
    assert_eq!(base.as_str(), "http://example.test/terms/");
    let (terms, tags) = fetchers("http://example.test/terms");
    assert_eq!(
        tags.request_url(3).as_str(),
        "http://example.test/terms/tags/?page=3"
    );
    let criteria = FilterCriteria::new("cell").toggle_tag("biology");
    assert_eq!(
        terms.request_url(&criteria, 1).query(),
        Some("page=1&q=cell&tags%5B%5D=biology")
    );
}

#[tokio::test]
async fn term_page_maps_pagination_fields() {
    let (base, seen) = spawn_cell_catalog().await;
    let (terms, _) = fetchers(&base);

    let page = terms
        .fetch_page(&FilterCriteria::new("cell").toggle_tag("biology"), 1)
        .await
        .expect("page");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id.0, 7);
    assert_eq!(page.total_pages, Some(1));
    assert_eq!(page.total_count, Some(1));
    assert!(!page.has_more && !page.has_previous);
    assert_eq!(
        seen.lock().expect("lock")[0],
        pairs(&[("page", "1"), ("q", "cell"), ("tags[]", "biology")])
    );
}

#[tokio::test]
async fn non_success_status_is_a_server_error_with_the_api_message() {
    let app = Router::new().route(
        "/terms/",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"code": "not_found", "message": "Invalid page."})),
            )
        }),
    );
    let (terms, _) = fetchers(&spawn_catalog(app).await);

    let err = terms
        .fetch_page(&FilterCriteria::default(), 9)
        .await
        .expect_err("404");
    assert_eq!(err.kind, crate::error::FetchErrorKind::Server);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "Invalid page.");
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let app = Router::new().route(
        "/terms/tags/",
        get(|| async { Json(serde_json::json!({"tags": "not-a-list"})) }),
    );
    let (_, tags) = fetchers(&spawn_catalog(app).await);

    let err = tags
        .fetch_page(&FilterCriteria::default(), 1)
        .await
        .expect_err("decode");
    assert_eq!(err.kind, crate::error::FetchErrorKind::Decode);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let (terms, _) = fetchers(&format!("http://{addr}/terms/"));

    let err = terms
        .fetch_page(&FilterCriteria::default(), 1)
        .await
        .expect_err("refused");
    assert_eq!(err.kind, crate::error::FetchErrorKind::Network);
}

#[tokio::test]
async fn cell_query_with_biology_tag_renders_one_row_without_pagination() {
    let (base, seen) = spawn_cell_catalog().await;
    let (terms, tags) = fetchers(&base);
    let controller = SearchController::new(
        Arc::new(terms),
        Arc::new(tags),
        SearchOptions {
            debounce: Duration::from_millis(20),
            scroll_threshold_px: 100.0,
        },
    );

    controller.open(Some("cell")).await;
    controller.toggle_tag("biology").await;

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if controller.view().await.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("controller settles");

    let requests = seen.lock().expect("lock").clone();
    assert_eq!(requests.len(), 2);
    assert!(requests.contains(&pairs(&[("page", "1"), ("q", "cell")])));
    assert!(requests.contains(&pairs(&[("page", "1"), ("q", "cell"), ("tags[]", "biology")])));

    let view = controller.view().await;
    match &view.results {
        ResultsView::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id.0, 7);
        }
        other => panic!("expected one row, got {other:?}"),
    }
    assert!(view.pagination.is_none());
    assert_eq!(view.chips, vec!["biology".to_string()]);
    controller.teardown().await;
}
