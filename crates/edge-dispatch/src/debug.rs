//! Diagnostic endpoint.

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use edge_classify::classify_route;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::StatusCode;
use serde_json::json;

use crate::state::AppState;

/// Synthesize the diagnostic document for `/__debug`.
///
/// Reports classifier inputs/outputs for the probing request (plus an
/// optional `?path=` probe) and script cache freshness. Never includes
/// the backend token or any other secret.
pub async fn handle(state: &AppState, req: Request) -> Response {
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let probe_path = query_param(req.uri().query(), "path").unwrap_or_else(|| "/".to_string());

    let cached_bundle = state.scripts.peek().await;
    let payload = json!({
        "degraded": state.config.is_degraded(),
        "config": {
            "backend_configured": !state.config.is_degraded(),
            "origin_url": state.config.origin_url,
            "backend_timeout_ms": state.config.backend_timeout.as_millis() as u64,
            "script_injection_enabled": state.config.script_injection_enabled,
        },
        "bot_classifier": {
            "needle_count": state.bots.needle_count(),
            "user_agent": user_agent,
            "is_bot": state.bots.is_bot(user_agent),
            "matched_needle": state.bots.matched_needle(user_agent),
        },
        "route_classifier": {
            "path": probe_path,
            "class": classify_route(&probe_path).label(),
        },
        "script_cache": {
            "ttl_secs": state.scripts.ttl().as_secs(),
            "age_secs": state.scripts.age().await.map(|age| age.as_secs()),
            "cached": cached_bundle.is_some(),
            "head_fragments": cached_bundle.as_ref().map(|b| b.head.len()),
            "body_fragments": cached_bundle.as_ref().map(|b| b.body.len()),
        },
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("static debug response")
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
