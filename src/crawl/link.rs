// src/crawl/link.rs
// =============================================================================
// Turns the raw hrefs found on the root page into absolute URLs to probe.
//
// Rules:
// - Empty (or whitespace-only) hrefs are dropped, they never become probes
// - An href starting with http:// or https:// is used as-is
// - Anything else is treated as relative and glued onto the root's origin
//
// Note that this is deliberately simpler than browser resolution: "../x",
// "?q=1" or "mailto:" all just get the origin prefixed. Whatever comes out
// is probed and classified like any other link.
// =============================================================================

use serde::Serialize;
use url::Url;

/// A link discovered on the root page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// The href exactly as written in the page.
    pub href: String,
    /// The absolute URL that gets probed.
    pub url: String,
}

// Builds LinkRecords for every non-empty href, keeping page order
pub fn discover_links(root: &Url, hrefs: &[String]) -> Vec<LinkRecord> {
    let origin = root.origin().ascii_serialization();

    hrefs
        .iter()
        .map(|href| href.trim())
        .filter(|href| !href.is_empty())
        .map(|href| LinkRecord {
            href: href.to_string(),
            url: resolve_href(&origin, href),
        })
        .collect()
}

// Resolves one href against the root page's origin (scheme://host[:port])
fn resolve_href(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}
