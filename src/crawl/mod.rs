// src/crawl/mod.rs
// =============================================================================
// This module audits a single page.
//
// Features:
// - Fetches the root page and resolves every href on it
// - Probes all links concurrently, bounded by a worker cap
// - Stops everything at a global deadline and reports what finished
//
// Submodules:
// - config: CrawlConfig defaults and setup errors
// - link: href -> absolute URL resolution
// - aggregate: thread-safe result buckets
// - run: per-run state and the final CrawlReport
// - orchestrator: the Crawler that ties it all together
// =============================================================================

mod aggregate;
mod config;
mod link;
mod orchestrator;
mod run;

pub use aggregate::{Bucket, Classification};
pub use config::{CrawlConfig, CrawlError, DEFAULT_DEADLINE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKERS};
pub use orchestrator::Crawler;
pub use run::CrawlReport;
