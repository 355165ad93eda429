//! Path classification for the dispatch pipeline.

/// Reserved diagnostic path.
pub const DEBUG_PATH: &str = "/__debug";

/// File extensions that always pass through to the origin untouched,
/// regardless of requester. `.xml` is deliberately absent: sitemap paths
/// end in `.xml` and must reach the sitemap branch.
const STATIC_EXTENSIONS: &[&str] = &[
    // scripts and styles
    "js", "mjs", "cjs", "css", "map",
    // images
    "png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico", "bmp",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // media
    "mp4", "webm", "mp3", "wav", "ogg", "ogv", "avi", "mov",
    // plain data
    "txt", "json", "csv", "webmanifest",
];

/// Route category for an incoming request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteClass {
    /// Fixed-extension asset: forward to origin unmodified.
    StaticAsset,
    /// The reserved diagnostic path.
    Debug,
    /// Sitemap assembled on demand from a logical category.
    SitemapDynamic { category: String },
    /// Pre-generated sitemap shard or the index, served verbatim.
    SitemapStatic { filename: String },
    /// Everything else: candidate for bot-classified prerender lookup.
    Page,
}

impl RouteClass {
    /// Short label for logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StaticAsset => "static-asset",
            Self::Debug => "debug",
            Self::SitemapDynamic { .. } => "sitemap-dynamic",
            Self::SitemapStatic { .. } => "sitemap-static",
            Self::Page => "page",
        }
    }
}

/// Classify a URL path into exactly one route category.
///
/// Precedence: static-asset first (cheapest, most frequent), then the
/// debug path, then sitemap patterns, then page. Any query string is
/// ignored.
pub fn classify_route(path: &str) -> RouteClass {
    let path = path.split(['?', '#']).next().unwrap_or(path);

    if has_static_extension(path) {
        return RouteClass::StaticAsset;
    }

    if path == DEBUG_PATH {
        return RouteClass::Debug;
    }

    if let Some(route) = classify_sitemap(path) {
        return route;
    }

    RouteClass::Page
}

/// Canonicalize a page path for cache lookup: strip query/fragment and any
/// trailing slash except on the root itself.
pub fn normalize_page_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn has_static_extension(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            STATIC_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Match `/sitemap-index.xml`, `/sitemap-<category>-<n>.xml` (static) and
/// `/sitemap-<category>.xml` (dynamic).
fn classify_sitemap(path: &str) -> Option<RouteClass> {
    let stem = path.strip_prefix("/sitemap-")?.strip_suffix(".xml")?;
    if stem.is_empty() {
        return None;
    }

    if stem == "index" {
        return Some(RouteClass::SitemapStatic {
            filename: "sitemap-index.xml".to_string(),
        });
    }

    // Numbered shard: sitemap-<category>-<n>.xml
    if let Some((category, shard)) = stem.rsplit_once('-') {
        if !category.is_empty() && !shard.is_empty() && shard.bytes().all(|b| b.is_ascii_digit()) {
            return Some(RouteClass::SitemapStatic {
                filename: format!("sitemap-{}-{}.xml", category, shard),
            });
        }
    }

    Some(RouteClass::SitemapDynamic {
        category: stem.to_string(),
    })
}
