//! Request identifiers for tracing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique request identifier for log correlation.
///
/// Also echoed back to clients in the `X-Request-Id` response header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string (e.g. propagated by a client).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
