//! Origin pass-through.

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use edge_cache::ScriptBundle;
use edge_inject::inject_fragments;
use http::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::header_names::X_SCRIPTS_INJECTED;
use crate::state::AppState;

/// Connection-scoped headers that must not be forwarded in either
/// direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forward a request to the origin SPA, preserving its status and headers.
///
/// When `scripts` is given and the origin answers with HTML, the fragment
/// bundle is injected into the body and `X-Scripts-Injected: true` added.
/// Origin failures are the one error this layer surfaces: a 502 with a
/// plain-text body, since no fallback remains at that point.
pub async fn forward(state: &AppState, req: Request, scripts: Option<&ScriptBundle>) -> Response {
    let (parts, body) = req.into_parts();

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "failed to read inbound request body");
            return bad_gateway("upstream request could not be read");
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.config.origin_url, path_and_query);

    let mut builder = state.origin.request(parts.method.clone(), &url);
    for (name, value) in parts.headers.iter() {
        if HOP_BY_HOP.contains(&name.as_str()) || name == &HOST {
            continue;
        }
        // Injection needs an uncompressed body; ask the origin for
        // identity encoding on candidate responses.
        if scripts.is_some() && name == &ACCEPT_ENCODING {
            continue;
        }
        builder = builder.header(name, value);
    }
    if !body_bytes.is_empty() {
        builder = builder.body(body_bytes);
    }

    let upstream = match builder.send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, url = %url, "origin unreachable");
            return bad_gateway("origin unreachable");
        }
    };

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, url = %url, "origin body read failed");
            return bad_gateway("origin response could not be read");
        }
    };

    let mut injected_marker = false;
    let body = match scripts {
        Some(bundle) if !bundle.is_empty() && is_html(&headers) => {
            match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    let result = inject_fragments(text, &bundle.head, &bundle.body);
                    injected_marker = result.changed;
                    Body::from(result.html)
                }
                // Not valid UTF-8 (e.g. compressed): pass through as-is.
                Err(_) => Body::from(bytes),
            }
        }
        _ => Body::from(bytes),
    };

    let mut response = Response::builder().status(status);
    if let Some(response_headers) = response.headers_mut() {
        for (name, value) in headers.iter() {
            if HOP_BY_HOP.contains(&name.as_str()) || name == &CONTENT_LENGTH {
                continue;
            }
            response_headers.insert(name.clone(), value.clone());
        }
        if injected_marker {
            response_headers.insert(X_SCRIPTS_INJECTED, HeaderValue::from_static("true"));
        }
    }

    response.body(body).unwrap_or_else(|_| {
        // Only reachable with invalid header values, which came from the
        // origin itself; degrade rather than panic.
        bad_gateway("origin response could not be represented")
    })
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false)
}

fn bad_gateway(message: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::BAD_GATEWAY)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message))
        .expect("static 502 response")
}
