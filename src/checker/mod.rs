// src/checker/mod.rs
// =============================================================================
// This module contains the two leaf pieces of an audit.
//
// Submodules:
// - http: Probes a single URL and classifies what came back
// - html: Extracts raw href values from the root page
//
// This file (mod.rs) is the module root - it re-exports the public API so
// the rest of the crate can write `checker::Fetcher` instead of
// `checker::http::Fetcher`.
// =============================================================================

mod html;
mod http;

pub use html::extract_hrefs;
pub use http::{Fetcher, Outcome, ProbeError};
