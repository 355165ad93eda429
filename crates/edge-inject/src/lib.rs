//! Script-fragment injection by textual insertion.
//!
//! Head fragments go immediately before the first `</head>`, body
//! fragments immediately before the first `</body>`. This is line-level
//! text surgery, not HTML parsing: cheap, allocation-bounded, and correct
//! for the trusted, self-produced documents this gateway serves.
//!
//! Known limitation: a payload containing a literal closing marker inside
//! an escaped string (e.g. `"</head>"` in inline script text) would be
//! spliced at that first occurrence. Cached documents are produced by our
//! own generator, so this is tolerated rather than guarded; untrusted
//! content would require a parse/serialize injector instead.

const HEAD_MARKER: &str = "</head>";
const BODY_MARKER: &str = "</body>";

/// Result of an injection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injected {
    /// The (possibly modified) document.
    pub html: String,
    /// Whether any fragment was inserted.
    pub changed: bool,
}

/// Insert head and body fragments into a document.
///
/// Each marker is matched at its first occurrence only — never a global
/// replace. An empty fragment sequence or an absent marker leaves the
/// corresponding section untouched; neither is an error.
pub fn inject_fragments(html: &str, head: &[String], body: &[String]) -> Injected {
    let mut changed = false;
    let mut document = match insert_before(html, HEAD_MARKER, head) {
        Some(updated) => {
            changed = true;
            updated
        }
        None => html.to_string(),
    };

    if let Some(updated) = insert_before(&document, BODY_MARKER, body) {
        changed = true;
        document = updated;
    }

    Injected {
        html: document,
        changed,
    }
}

fn insert_before(html: &str, marker: &str, fragments: &[String]) -> Option<String> {
    if fragments.is_empty() {
        return None;
    }
    let position = html.find(marker)?;

    let insertion: String = fragments.concat();
    let mut updated = String::with_capacity(html.len() + insertion.len());
    updated.push_str(&html[..position]);
    updated.push_str(&insertion);
    updated.push_str(&html[position..]);
    Some(updated)
}
