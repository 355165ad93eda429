//! BackendClient tests against a throwaway in-process backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use edge_cache::CacheStatus;
use edge_core::GatewayConfig;
use edge_gateway::{
    BackendClient, GatewayError, PrerenderBackend, SitemapRequest, EMPTY_URLSET,
};

#[derive(Clone, Default)]
struct StubState {
    hits: Arc<Mutex<Vec<String>>>,
}

async fn prerender(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v != "Bearer test-token")
        .unwrap_or(true)
    {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }

    match params.get("path").map(String::as_str) {
        Some("/about") => {
            (StatusCode::OK, "<html><head></head><body>about</body></html>").into_response()
        }
        Some("/stale") => (
            StatusCode::OK,
            [("x-expires-at", "2001-01-01T00:00:00Z")],
            "<html><body>old</body></html>",
        )
            .into_response(),
        Some("/fresh") => (
            StatusCode::OK,
            [("x-expires-at", "2999-01-01T00:00:00Z")],
            "<html><body>new</body></html>",
        )
            .into_response(),
        Some("/slow") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, "<html></html>").into_response()
        }
        Some("/empty") => (StatusCode::OK, "").into_response(),
        path => (
            StatusCode::NOT_FOUND,
            format!(r#"{{"error":"not_cached","path":"{}"}}"#, path.unwrap_or("")),
        )
            .into_response(),
    }
}

async fn prerender_hit(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    if let Some(path) = params.get("path") {
        state.hits.lock().unwrap().push(path.clone());
    }
    StatusCode::NO_CONTENT
}

async fn generate_sitemap(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("type").map(String::as_str) {
        Some("news") => (
            StatusCode::OK,
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset><url><loc>https://example.com/news/1</loc></url></urlset>"#,
        )
            .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn serve_sitemap(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("file").map(String::as_str) {
        Some("sitemap-products-1.xml") => (
            StatusCode::OK,
            [
                ("x-sitemap-generated", "2026-08-01T00:00:00Z"),
                ("x-sitemap-url-count", "1200"),
            ],
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset><url><loc>https://example.com/p/1</loc></url></urlset>"#,
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, EMPTY_URLSET).into_response(),
    }
}

async fn script_service() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"head":["<script src=\"/analytics.js\"></script>"],"body":["<script>boot()</script>"]}"#,
    )
}

async fn start_stub_backend() -> (String, StubState) {
    let state = StubState::default();
    let app = Router::new()
        .route("/prerender", get(prerender))
        .route("/prerender-hit", post(prerender_hit))
        .route("/generate-sitemap", get(generate_sitemap))
        .route("/serve-sitemap", get(serve_sitemap))
        .route("/script-service", get(script_service))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn client_for(base_url: &str) -> BackendClient {
    let config = GatewayConfig::default()
        .with_backend_url(base_url)
        .with_backend_token("test-token");
    BackendClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn page_lookup_without_expiry_is_a_hit() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    let lookup = client.lookup_page("/about").await.unwrap();
    assert_eq!(lookup.status, CacheStatus::Hit);
    assert!(lookup.html.contains("about"));
}

#[tokio::test]
async fn future_expiry_is_a_hit_and_past_expiry_is_stale() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    let fresh = client.lookup_page("/fresh").await.unwrap();
    assert_eq!(fresh.status, CacheStatus::Hit);

    let stale = client.lookup_page("/stale").await.unwrap();
    assert_eq!(stale.status, CacheStatus::Stale);
    assert!(stale.html.contains("old"));
}

#[tokio::test]
async fn missing_entry_is_not_found() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    assert!(matches!(
        client.lookup_page("/missing").await,
        Err(GatewayError::NotFound)
    ));
}

#[tokio::test]
async fn empty_body_is_malformed() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    assert!(matches!(
        client.lookup_page("/empty").await,
        Err(GatewayError::Malformed(_))
    ));
}

#[tokio::test]
async fn hung_backend_times_out_as_unavailable() {
    let (base, _state) = start_stub_backend().await;
    let mut config = GatewayConfig::default()
        .with_backend_url(&base)
        .with_backend_token("test-token");
    config.backend_timeout = Duration::from_millis(200);
    let client = BackendClient::from_config(&config).unwrap();

    assert!(matches!(
        client.lookup_page("/slow").await,
        Err(GatewayError::Unavailable(_))
    ));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    // Port 9 (discard) is not listening.
    let mut config = GatewayConfig::default().with_backend_url("http://127.0.0.1:9");
    config.backend_timeout = Duration::from_millis(300);
    let client = BackendClient::from_config(&config).unwrap();

    assert!(matches!(
        client.lookup_page("/about").await,
        Err(GatewayError::Unavailable(_))
    ));
}

#[tokio::test]
async fn successful_lookup_bumps_hit_counter() {
    let (base, state) = start_stub_backend().await;
    let client = client_for(&base);

    client.lookup_page("/about").await.unwrap();

    // The increment is detached; poll briefly for it to land.
    for _ in 0..50 {
        if !state.hits.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.hits.lock().unwrap().as_slice(), ["/about"]);
}

#[tokio::test]
async fn failed_lookup_does_not_bump_hit_counter() {
    let (base, state) = start_stub_backend().await;
    let client = client_for(&base);

    let _ = client.lookup_page("/missing").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.hits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dynamic_sitemap_returns_generated_xml() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    let sitemap = client
        .lookup_sitemap(&SitemapRequest::Dynamic {
            category: "news".to_string(),
        })
        .await;
    assert!(sitemap.xml.contains("/news/1"));
}

#[tokio::test]
async fn static_sitemap_carries_generator_metadata() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    let sitemap = client
        .lookup_sitemap(&SitemapRequest::Static {
            filename: "sitemap-products-1.xml".to_string(),
        })
        .await;
    assert_eq!(sitemap.generated_at.as_deref(), Some("2026-08-01T00:00:00Z"));
    assert_eq!(sitemap.url_count, Some(1200));
}

#[tokio::test]
async fn sitemap_failures_degrade_to_empty_urlset() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    // Backend 404.
    let missing = client
        .lookup_sitemap(&SitemapRequest::Static {
            filename: "sitemap-unknown.xml".to_string(),
        })
        .await;
    assert_eq!(missing.xml, EMPTY_URLSET);

    // Backend 500.
    let broken = client
        .lookup_sitemap(&SitemapRequest::Dynamic {
            category: "broken".to_string(),
        })
        .await;
    assert_eq!(broken.xml, EMPTY_URLSET);

    // Backend unreachable.
    let mut config = GatewayConfig::default().with_backend_url("http://127.0.0.1:9");
    config.backend_timeout = Duration::from_millis(300);
    let offline = BackendClient::from_config(&config).unwrap();
    let unreachable = offline
        .lookup_sitemap(&SitemapRequest::Dynamic {
            category: "news".to_string(),
        })
        .await;
    assert_eq!(unreachable.xml, EMPTY_URLSET);
}

#[tokio::test]
async fn script_registry_fetch_parses_document() {
    let (base, _state) = start_stub_backend().await;
    let client = client_for(&base);

    let bundle = client.fetch_scripts().await.unwrap();
    assert_eq!(bundle.head.len(), 1);
    assert_eq!(bundle.body.len(), 1);
    assert!(bundle.head[0].contains("analytics.js"));
}

#[tokio::test]
async fn bad_token_is_unavailable_not_a_panic() {
    let (base, _state) = start_stub_backend().await;
    let config = GatewayConfig::default().with_backend_url(&base);
    let client = BackendClient::from_config(&config).unwrap();

    // Stub rejects missing bearer token with 401.
    assert!(matches!(
        client.lookup_page("/about").await,
        Err(GatewayError::Unavailable(_))
    ));
}
