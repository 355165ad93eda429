//! Backend trait, result types, and the degraded-mode stand-in.

use std::sync::Arc;

use async_trait::async_trait;
use edge_cache::{CacheStatus, ScriptBundle, ScriptFetchError, ScriptSource};

/// Minimal valid empty sitemap, served whenever the backend cannot supply
/// real content. Crawlers must never receive malformed XML or an error
/// body on sitemap routes.
pub const EMPTY_URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;

/// Result of a prerendered-page lookup.
#[derive(Debug, Clone)]
pub struct PageLookup {
    /// The stored HTML document.
    pub html: String,
    /// `Hit` when no expiry is set or it lies in the future, `Stale` when
    /// the entry is past its expiry but still servable.
    pub status: CacheStatus,
}

/// A sitemap lookup request: dynamic assembly by category, or a verbatim
/// pre-generated file by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapRequest {
    Dynamic { category: String },
    Static { filename: String },
}

/// Sitemap XML plus generator metadata forwarded as diagnostic headers.
#[derive(Debug, Clone)]
pub struct SitemapContent {
    pub xml: String,
    pub generated_at: Option<String>,
    pub url_count: Option<u64>,
}

impl SitemapContent {
    /// The empty-urlset fallback.
    pub fn empty() -> Self {
        Self {
            xml: EMPTY_URLSET.to_string(),
            generated_at: None,
            url_count: None,
        }
    }
}

/// Gateway operation errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No backend configured; the gateway runs in always-fallback mode.
    #[error("backend not configured")]
    Disabled,

    /// Backend reachable but has no entry for the key.
    #[error("entry not cached")]
    NotFound,

    /// Transport failure, timeout, or unexpected status.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Backend responded with an unparseable payload.
    #[error("malformed backend payload: {0}")]
    Malformed(String),
}

/// The outbound seam of the dispatch pipeline.
#[async_trait]
pub trait PrerenderBackend: Send + Sync {
    /// Look up the prerendered HTML for a normalized page path.
    ///
    /// A successful lookup also triggers the detached hit-count bump.
    async fn lookup_page(&self, path: &str) -> Result<PageLookup, GatewayError>;

    /// Look up sitemap XML. Infallible: any failure degrades to the empty
    /// urlset.
    async fn lookup_sitemap(&self, request: &SitemapRequest) -> SitemapContent;

    /// Fetch the script registry document.
    async fn fetch_scripts(&self) -> Result<ScriptBundle, GatewayError>;
}

/// Adapter so the script cache can refresh through any backend.
pub struct BackendScriptSource(pub Arc<dyn PrerenderBackend>);

#[async_trait]
impl ScriptSource for BackendScriptSource {
    async fn fetch_scripts(&self) -> Result<ScriptBundle, ScriptFetchError> {
        self.0
            .fetch_scripts()
            .await
            .map_err(|err| ScriptFetchError(err.to_string()))
    }
}

/// Stand-in backend for degraded mode (no backend URL configured).
///
/// Page lookups and script fetches report `Disabled`; sitemap lookups
/// return the empty urlset.
#[derive(Debug, Default)]
pub struct NullBackend;

#[async_trait]
impl PrerenderBackend for NullBackend {
    async fn lookup_page(&self, _path: &str) -> Result<PageLookup, GatewayError> {
        Err(GatewayError::Disabled)
    }

    async fn lookup_sitemap(&self, _request: &SitemapRequest) -> SitemapContent {
        SitemapContent::empty()
    }

    async fn fetch_scripts(&self) -> Result<ScriptBundle, GatewayError> {
        Err(GatewayError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_backend_always_degrades() {
        let backend = NullBackend;
        assert!(matches!(
            backend.lookup_page("/about").await,
            Err(GatewayError::Disabled)
        ));
        assert!(matches!(
            backend.fetch_scripts().await,
            Err(GatewayError::Disabled)
        ));

        let sitemap = backend
            .lookup_sitemap(&SitemapRequest::Static {
                filename: "sitemap-index.xml".to_string(),
            })
            .await;
        assert_eq!(sitemap.xml, EMPTY_URLSET);
    }

    #[tokio::test]
    async fn script_source_adapter_maps_errors() {
        let source = BackendScriptSource(Arc::new(NullBackend));
        let err = source.fetch_scripts().await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
