//! Shared per-process dispatcher state.

use std::sync::Arc;

use edge_cache::ScriptCache;
use edge_classify::BotClassifier;
use edge_core::GatewayConfig;
use edge_gateway::{backend_from_config, BackendScriptSource, PrerenderBackend};

/// State shared by all in-flight requests.
///
/// The only mutable piece is the script cache's stored bundle; everything
/// else is immutable after construction.
pub struct AppState {
    pub config: GatewayConfig,
    pub bots: BotClassifier,
    pub backend: Arc<dyn PrerenderBackend>,
    pub scripts: ScriptCache,
    /// Client for origin pass-through. Deliberately without a total
    /// timeout: the origin's own latency and failures are surfaced
    /// unaltered.
    pub origin: reqwest::Client,
}

impl AppState {
    /// Build state from configuration, constructing the real backend (or
    /// the null backend in degraded mode) and the bot classifier.
    pub fn new(config: GatewayConfig) -> Arc<Self> {
        let backend = backend_from_config(&config);
        let bots = match &config.bot_agents_file {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(contents) => BotClassifier::from_needle_file(&contents),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err,
                        "bot agents file unreadable, using built-in list");
                    BotClassifier::default()
                }
            },
            None => BotClassifier::default(),
        };
        Self::with_backend(config, backend, bots)
    }

    /// Build state around an explicit backend. Used by tests to inject
    /// stubs.
    pub fn with_backend(
        config: GatewayConfig,
        backend: Arc<dyn PrerenderBackend>,
        bots: BotClassifier,
    ) -> Arc<Self> {
        let scripts = ScriptCache::new(
            Arc::new(BackendScriptSource(backend.clone())),
            config.script_ttl,
        );

        Arc::new(Self {
            config,
            bots,
            backend,
            scripts,
            origin: reqwest::Client::new(),
        })
    }
}
