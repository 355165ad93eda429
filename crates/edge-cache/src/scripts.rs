//! Script registry cache with lazy stale-on-error refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The script registry document: ordered script-tag fragments for head and
/// body insertion. Fragments are opaque HTML text owned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBundle {
    /// Fragments inserted before `</head>`.
    #[serde(default)]
    pub head: Vec<String>,
    /// Fragments inserted before `</body>`.
    #[serde(default)]
    pub body: Vec<String>,
}

impl ScriptBundle {
    /// Whether both fragment sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.body.is_empty()
    }
}

/// Failure to fetch the script registry. The cache only needs to know that
/// the fetch failed; the cause is carried for logging.
#[derive(Debug, thiserror::Error)]
#[error("script registry fetch failed: {0}")]
pub struct ScriptFetchError(pub String);

/// Source the cache refreshes from. Implemented by the backend client and
/// by test stubs.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn fetch_scripts(&self) -> Result<ScriptBundle, ScriptFetchError>;
}

/// Injectable time source so tests can drive TTL expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedBundle {
    bundle: ScriptBundle,
    fetched_at: Instant,
}

/// Time-bounded cache of the script registry document.
///
/// `get()` refreshes lazily: within the TTL the stored bundle is returned
/// as-is; past it a refetch is attempted, and on failure the previous
/// bundle (or an empty one) is served. There is no background refresh
/// task. Concurrent `get()` calls during an expired window may each
/// trigger a refetch; the slot is replaced as a single consistent value,
/// so the occasional duplicate fetch is harmless.
pub struct ScriptCache {
    source: Arc<dyn ScriptSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: RwLock<Option<CachedBundle>>,
}

impl ScriptCache {
    /// Create a cache over the given source with the given TTL.
    pub fn new(source: Arc<dyn ScriptSource>, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock (used by tests).
    pub fn with_clock(source: Arc<dyn ScriptSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Get the current script bundle.
    ///
    /// Never fails: a failed refresh degrades to the previous bundle, or
    /// to an empty bundle when nothing was ever fetched.
    pub async fn get(&self) -> ScriptBundle {
        let now = self.clock.now();

        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref() {
                if now.duration_since(cached.fetched_at) < self.ttl {
                    return cached.bundle.clone();
                }
            }
        }

        // TTL expired or nothing cached. The lock is not held across the
        // fetch so in-flight requests keep reading the old value.
        match self.source.fetch_scripts().await {
            Ok(bundle) => {
                let mut slot = self.slot.write().await;
                *slot = Some(CachedBundle {
                    bundle: bundle.clone(),
                    fetched_at: self.clock.now(),
                });
                bundle
            }
            Err(err) => {
                tracing::warn!(error = %err, "script registry refresh failed, serving cached value");
                let slot = self.slot.read().await;
                slot.as_ref()
                    .map(|cached| cached.bundle.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Drop the stored bundle so the next `get()` refetches.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }

    /// The stored bundle, if any, without triggering a refresh. Exposed
    /// for diagnostics.
    pub async fn peek(&self) -> Option<ScriptBundle> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|cached| cached.bundle.clone())
    }

    /// Age of the stored bundle, if any. Exposed for diagnostics.
    pub async fn age(&self) -> Option<Duration> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .map(|cached| self.clock.now().duration_since(cached.fetched_at))
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
