// src/checker/html.rs
// =============================================================================
// This module pulls raw href values out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Unlike a browser we do NOT resolve or filter the links here. The crawler
// decides what to do with each href (skip empty ones, prefix relative ones
// with the page origin), so this function hands back exactly what the page
// contains, in document order.
// =============================================================================

use scraper::{Html, Selector};

// Extracts the href attribute of every <a> tag that has one
//
// Parameters:
//   html: the HTML content to parse (borrowed as &str)
//
// Returns: Vec<String> of raw href values, duplicates and empties included
//
// Example:
//   html = "<a href='/docs'>Docs</a><a>no href</a><a href=''>x</a>"
//   result = ["/docs", ""]
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // "a[href]" is a constant, valid selector, so this can only fail on a
    // programming mistake
    let selector = Selector::parse("a[href]").expect("static selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
