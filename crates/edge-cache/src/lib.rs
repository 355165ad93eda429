//! Caching primitives for the prerender edge gateway.
//!
//! This crate provides:
//! - `CacheStatus` - Hit/stale/miss vocabulary shared across the pipeline
//! - `ScriptBundle` - The script registry document (head + body fragments)
//! - `ScriptCache` - TTL-bounded, stale-on-error cache of the bundle
//! - `ScriptSource` - Seam the cache fetches through, implemented by the
//!   backend client and by test stubs

mod scripts;
mod status;

pub use scripts::*;
pub use status::*;
