//! Gateway runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Default timeout for outbound backend calls.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Default TTL for the in-process script registry cache (5 minutes).
pub const DEFAULT_SCRIPT_TTL: Duration = Duration::from_secs(300);

/// Default origin SPA address when none is configured.
pub const DEFAULT_ORIGIN_URL: &str = "http://127.0.0.1:3000";

/// Runtime configuration for the gateway.
///
/// Loaded from environment variables. A missing backend URL or token does
/// not abort startup: the gateway then runs in degraded mode, where every
/// backend-dependent branch takes its documented fallback (pass-through,
/// empty sitemap, empty scripts).
#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    /// Base URL of the prerender backend (e.g. `https://cache.example.com`).
    pub backend_url: Option<String>,
    /// Bearer token for backend calls. Never serialized into diagnostics.
    #[serde(skip_serializing)]
    pub backend_token: Option<String>,
    /// Address of the origin SPA that human traffic is proxied to.
    pub origin_url: String,
    /// Timeout applied to every outbound backend call.
    pub backend_timeout: Duration,
    /// TTL of the script registry cache.
    pub script_ttl: Duration,
    /// Whether script fragments are injected into outgoing HTML.
    pub script_injection_enabled: bool,
    /// Optional override file for the bot agent needle list
    /// (one lowercase substring per line).
    pub bot_agents_file: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_token: None,
            origin_url: DEFAULT_ORIGIN_URL.to_string(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            script_ttl: DEFAULT_SCRIPT_TTL,
            script_injection_enabled: true,
            bot_agents_file: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `PRERENDER_*` environment variables.
    ///
    /// Unset or unparseable values fall back to defaults rather than
    /// failing: the serving path must come up even with no configuration
    /// at all.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend_url: env_nonempty("PRERENDER_BACKEND_URL")
                .map(|u| u.trim_end_matches('/').to_string()),
            backend_token: env_nonempty("PRERENDER_BACKEND_TOKEN"),
            origin_url: env_nonempty("PRERENDER_ORIGIN_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.origin_url),
            backend_timeout: env_nonempty("PRERENDER_BACKEND_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.backend_timeout),
            script_ttl: env_nonempty("PRERENDER_SCRIPT_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.script_ttl),
            script_injection_enabled: env_nonempty("PRERENDER_SCRIPT_INJECTION")
                .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
                .unwrap_or(defaults.script_injection_enabled),
            bot_agents_file: env_nonempty("PRERENDER_BOT_AGENTS_FILE").map(PathBuf::from),
        }
    }

    /// Set the backend base URL.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Set the backend bearer token.
    pub fn with_backend_token(mut self, token: impl Into<String>) -> Self {
        self.backend_token = Some(token.into());
        self
    }

    /// Set the origin SPA address.
    pub fn with_origin_url(mut self, url: impl Into<String>) -> Self {
        self.origin_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether the backend is unconfigured and the gateway is running in
    /// always-fallback mode.
    pub fn is_degraded(&self) -> bool {
        self.backend_url.is_none()
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
