//! Request classification for the prerender edge gateway.
//!
//! Two pure classifiers, no state and no I/O:
//! - `BotClassifier` - User-Agent string -> bot or human
//! - `classify_route` - URL path -> route category
//!
//! Both run on every request before any network call, so they stay
//! allocation-light and short-circuit on the first match.

mod bot;
mod route;

pub use bot::*;
pub use route::*;
