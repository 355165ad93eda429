//! Bot detection by User-Agent substring matching.

/// The curated needle list shipped with the gateway.
///
/// Kept as a data file so the list can be versioned and replaced without
/// touching dispatch code; see `BotClassifier::from_needle_file`.
const DEFAULT_AGENTS: &str = include_str!("agents.txt");

/// Classifies a request as bot or human from its User-Agent header.
///
/// Matching is case-insensitive substring search over a fixed needle
/// list, short-circuiting on the first hit. An empty or missing
/// User-Agent is treated as human: no evidence of automation.
#[derive(Debug, Clone)]
pub struct BotClassifier {
    needles: Vec<String>,
}

impl BotClassifier {
    /// Build a classifier from an explicit needle list.
    ///
    /// Needles are lowercased and blank entries dropped.
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let needles = needles
            .into_iter()
            .map(|n| n.into().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { needles }
    }

    /// Build a classifier from needle-file contents: one needle per line,
    /// `#` lines are comments.
    pub fn from_needle_file(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    /// Whether the given User-Agent belongs to a known automated agent.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        self.matched_needle(user_agent).is_some()
    }

    /// The first needle contained in the User-Agent, if any.
    ///
    /// Exposed for the diagnostic endpoint.
    pub fn matched_needle(&self, user_agent: Option<&str>) -> Option<&str> {
        let ua = user_agent?.trim();
        if ua.is_empty() {
            return None;
        }
        let ua = ua.to_lowercase();
        self.needles
            .iter()
            .find(|needle| ua.contains(needle.as_str()))
            .map(String::as_str)
    }

    /// Number of needles in the list.
    pub fn needle_count(&self) -> usize {
        self.needles.len()
    }
}

impl Default for BotClassifier {
    fn default() -> Self {
        Self::from_needle_file(DEFAULT_AGENTS)
    }
}
