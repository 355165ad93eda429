//! Cache lookup status.

use serde::{Deserialize, Serialize};

/// Status of a prerendered-page lookup.
///
/// `Stale` entries are past their declared expiry but still servable; the
/// status is surfaced to clients in the `X-Cache` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit.
    Hit,
    /// Entry past its expiry, served with a staleness signal.
    Stale,
    /// No entry for the key.
    Miss,
}

impl CacheStatus {
    /// Whether a body can be served for this status.
    pub fn is_servable(&self) -> bool {
        matches!(self, Self::Hit | Self::Stale)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "hit"),
            Self::Stale => write!(f, "stale"),
            Self::Miss => write!(f, "miss"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_header_values() {
        assert_eq!(CacheStatus::Hit.to_string(), "hit");
        assert_eq!(CacheStatus::Stale.to_string(), "stale");
        assert_eq!(CacheStatus::Miss.to_string(), "miss");
    }

    #[test]
    fn servable_statuses() {
        assert!(CacheStatus::Hit.is_servable());
        assert!(CacheStatus::Stale.is_servable());
        assert!(!CacheStatus::Miss.is_servable());
    }
}
