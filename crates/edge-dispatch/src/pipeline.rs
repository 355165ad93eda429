//! The per-request decision pipeline.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use edge_cache::{CacheStatus, ScriptBundle};
use edge_classify::{classify_route, normalize_page_path, RouteClass};
use edge_core::RequestId;
use edge_gateway::{GatewayError, PageLookup, SitemapContent, SitemapRequest};
use edge_inject::inject_fragments;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, StatusCode};

use crate::header_names::{X_CACHE, X_PRERENDERED, X_REQUEST_ID, X_SCRIPTS_INJECTED};
use crate::state::AppState;
use crate::{debug, proxy};

/// Cache-Control for sitemap responses: crawlers may hold them for a day.
const SITEMAP_CACHE_CONTROL: &str = "public, max-age=86400";

/// Build the gateway router. Every path and method funnels into the one
/// dispatch pipeline.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::from_string)
        .unwrap_or_else(RequestId::generate);

    let route = classify_route(req.uri().path());
    tracing::debug!(
        request_id = %request_id,
        path = %req.uri().path(),
        route = route.label(),
        "dispatching request"
    );

    let mut response = match route {
        RouteClass::StaticAsset => proxy::forward(&state, req, None).await,
        RouteClass::Debug => debug::handle(&state, req).await,
        route => {
            // Script fragments are fetched up front for every remaining
            // branch; the TTL cache makes this a memory read in the
            // common case.
            let scripts = if state.config.script_injection_enabled {
                state.scripts.get().await
            } else {
                ScriptBundle::default()
            };

            match route {
                RouteClass::SitemapDynamic { category } => {
                    sitemap_response(&state, SitemapRequest::Dynamic { category }).await
                }
                RouteClass::SitemapStatic { filename } => {
                    sitemap_response(&state, SitemapRequest::Static { filename }).await
                }
                _ => page(&state, req, scripts).await,
            }
        }
    };

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// Requester classification, prerender lookup, and the SPA fallback.
async fn page(state: &AppState, req: Request, scripts: ScriptBundle) -> Response {
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let mut fallback_status = None;
    if state.bots.is_bot(user_agent) {
        let path = normalize_page_path(req.uri().path());
        match state.backend.lookup_page(&path).await {
            Ok(lookup) => return prerendered_response(lookup, &scripts),
            Err(GatewayError::NotFound) => {
                tracing::debug!(path = %path, "no prerender entry, serving SPA to bot");
                fallback_status = Some(CacheStatus::Miss);
            }
            Err(GatewayError::Disabled) => {
                tracing::debug!(path = %path, "backend disabled, serving SPA to bot");
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "prerender lookup failed, serving SPA to bot");
                fallback_status = Some(CacheStatus::Miss);
            }
        }
    }

    // Human visitor, or a bot the cache could not serve: same experience.
    let mut response = proxy::forward(state, req, Some(&scripts)).await;
    if let Some(status) = fallback_status {
        if let Ok(value) = HeaderValue::from_str(&status.to_string()) {
            response.headers_mut().insert(X_CACHE, value);
        }
    }
    response
}

/// A prerendered document served to a bot, with fragments injected.
fn prerendered_response(lookup: PageLookup, scripts: &ScriptBundle) -> Response {
    let result = inject_fragments(&lookup.html, &scripts.head, &scripts.body);

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(X_PRERENDERED, "true")
        .header(X_CACHE, lookup.status.to_string());
    if result.changed {
        response = response.header(X_SCRIPTS_INJECTED, "true");
    }

    response
        .body(Body::from(result.html))
        .unwrap_or_else(|_| internal_fallback())
}

/// Sitemap XML with long-lived cache headers. No script injection: XML is
/// not HTML.
async fn sitemap_response(state: &AppState, request: SitemapRequest) -> Response {
    let SitemapContent {
        xml,
        generated_at,
        url_count,
    } = state.backend.lookup_sitemap(&request).await;

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/xml")
        .header(CACHE_CONTROL, SITEMAP_CACHE_CONTROL);
    if let Some(generated_at) = generated_at {
        response = response.header(edge_gateway::SITEMAP_GENERATED_HEADER, generated_at);
    }
    if let Some(url_count) = url_count {
        response = response.header(edge_gateway::SITEMAP_URL_COUNT_HEADER, url_count);
    }

    response
        .body(Body::from(xml))
        .unwrap_or_else(|_| internal_fallback())
}

/// Reserved for truly unexpected internal faults; not part of any
/// documented happy or degraded path.
fn internal_fallback() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Body::empty())
        .expect("static 500 response")
}
