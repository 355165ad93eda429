//! Cache Gateway: bounded outbound calls to the prerender backend.
//!
//! Three operations — page lookup, sitemap lookup, script registry fetch —
//! plus a detached best-effort hit-count increment. Every call carries a
//! request timeout; transport failure, timeout and non-2xx statuses all
//! collapse into a uniform `Unavailable` signal, while a reachable backend
//! with no entry is reported distinctly as `NotFound`. Sitemap lookups
//! never fail: the fallback is a minimal valid empty urlset, so crawlers
//! never see malformed XML.

mod backend;
mod client;

pub use backend::*;
pub use client::*;
