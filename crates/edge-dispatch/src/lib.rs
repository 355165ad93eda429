//! Edge dispatcher for the prerender gateway.
//!
//! Every incoming request runs one linear decision pipeline: classify the
//! route, short-circuit static assets and the debug endpoint, serve
//! sitemaps from the backend, classify the requester, serve bots from the
//! prerender cache when possible, and pass everything else through to the
//! origin SPA with script fragments injected into HTML responses.
//!
//! Failure semantics: every backend call degrades to the next most
//! permissive behavior. The only end-user-visible failure this layer
//! produces is when the origin itself is unreachable.

mod debug;
mod pipeline;
mod proxy;
mod state;

pub use pipeline::router;
pub use state::AppState;

/// Response header names produced by the dispatcher.
pub mod header_names {
    /// Present (value `true`) when a prerendered document was served.
    pub const X_PRERENDERED: &str = "x-prerendered";
    /// Cache lookup outcome: `hit`, `stale`, or `miss`.
    pub const X_CACHE: &str = "x-cache";
    /// Present (value `true`) when script fragments were injected.
    pub const X_SCRIPTS_INJECTED: &str = "x-scripts-injected";
    /// Request ID for log correlation.
    pub const X_REQUEST_ID: &str = "x-request-id";
}
