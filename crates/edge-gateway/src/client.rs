//! HTTP client for the prerender backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edge_cache::{CacheStatus, ScriptBundle};
use edge_core::GatewayConfig;
use reqwest::StatusCode;

use crate::backend::{
    GatewayError, NullBackend, PageLookup, PrerenderBackend, SitemapContent, SitemapRequest,
};

/// Backend header carrying the entry's expiry as RFC 3339.
pub const EXPIRES_AT_HEADER: &str = "x-expires-at";
/// Backend header with the sitemap generation timestamp.
pub const SITEMAP_GENERATED_HEADER: &str = "x-sitemap-generated";
/// Backend header with the sitemap URL count.
pub const SITEMAP_URL_COUNT_HEADER: &str = "x-sitemap-url-count";

/// Bearer-authenticated client for the backend endpoints.
///
/// Every call shares the configured request timeout; a hung backend must
/// not hang the edge response. There are no retries on this path — a
/// failed call falls through to the caller's fallback immediately.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    /// Build a client from configuration. Returns `None` when no backend
    /// URL is configured or the underlying client cannot be constructed.
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        let base_url = config.backend_url.clone()?;
        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .connect_timeout(config.backend_timeout)
            .build()
            .map_err(|err| {
                tracing::error!(error = %err, "failed to build backend HTTP client");
                err
            })
            .ok()?;

        Some(Self {
            http,
            base_url,
            token: config.backend_token.clone(),
        })
    }

    fn get(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(format!("{}{}", self.base_url, endpoint));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Detached best-effort hit-count bump. Runs on its own task; failure
    /// is swallowed here and never reaches the serving path.
    fn spawn_hit_increment(&self, path: &str) {
        let request = {
            let builder = self
                .http
                .post(format!("{}/prerender-hit", self.base_url))
                .query(&[("path", path)]);
            match &self.token {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            }
        };

        tokio::spawn(async move {
            if let Err(err) = request.send().await {
                tracing::trace!(error = %err, "hit-count increment dropped");
            }
        });
    }
}

#[async_trait]
impl PrerenderBackend for BackendClient {
    async fn lookup_page(&self, path: &str) -> Result<PageLookup, GatewayError> {
        let response = self
            .get("/prerender")
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            status if status.is_success() => {
                let status = match expires_at(&response) {
                    Some(expires) if expires <= Utc::now() => CacheStatus::Stale,
                    _ => CacheStatus::Hit,
                };

                let html = response.text().await.map_err(transport_error)?;
                if html.is_empty() {
                    return Err(GatewayError::Malformed("empty page body".to_string()));
                }

                self.spawn_hit_increment(path);
                Ok(PageLookup { html, status })
            }
            status => Err(GatewayError::Unavailable(format!(
                "unexpected status {}",
                status
            ))),
        }
    }

    async fn lookup_sitemap(&self, request: &SitemapRequest) -> SitemapContent {
        let builder = match request {
            SitemapRequest::Dynamic { category } => self
                .get("/generate-sitemap")
                .query(&[("type", category.as_str())]),
            SitemapRequest::Static { filename } => self
                .get("/serve-sitemap")
                .query(&[("file", filename.as_str())]),
        };

        let response = match builder.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), ?request, "sitemap lookup degraded to empty urlset");
                return SitemapContent::empty();
            }
            Err(err) => {
                tracing::warn!(error = %err, ?request, "sitemap lookup degraded to empty urlset");
                return SitemapContent::empty();
            }
        };

        let generated_at = header_string(&response, SITEMAP_GENERATED_HEADER);
        let url_count =
            header_string(&response, SITEMAP_URL_COUNT_HEADER).and_then(|v| v.parse().ok());

        match response.text().await {
            Ok(xml) if !xml.is_empty() => SitemapContent {
                xml,
                generated_at,
                url_count,
            },
            Ok(_) => SitemapContent::empty(),
            Err(err) => {
                tracing::warn!(error = %err, ?request, "sitemap body read failed");
                SitemapContent::empty()
            }
        }
    }

    async fn fetch_scripts(&self) -> Result<ScriptBundle, GatewayError> {
        let response = self
            .get("/script-service")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        response
            .json::<ScriptBundle>()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))
    }
}

/// Build the backend for the given configuration, degrading to the null
/// backend when none is configured.
pub fn backend_from_config(config: &GatewayConfig) -> Arc<dyn PrerenderBackend> {
    match BackendClient::from_config(config) {
        Some(client) => Arc::new(client),
        None => {
            tracing::warn!("no backend configured, running in always-fallback mode");
            Arc::new(NullBackend)
        }
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Unavailable("timeout".to_string())
    } else {
        GatewayError::Unavailable(err.to_string())
    }
}

fn expires_at(response: &reqwest::Response) -> Option<DateTime<Utc>> {
    let raw = response.headers().get(EXPIRES_AT_HEADER)?.to_str().ok()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)?
        .to_str()
        .ok()
        .map(str::to_string)
}
