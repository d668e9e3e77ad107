// src/crawl/run.rs
// =============================================================================
// The state of one audit run and the report it turns into.
//
// A CrawlRun is created when run() starts, collects the discovered links,
// and is consumed exactly once by finish(), which freezes the end time and
// takes a snapshot of the aggregator.
// =============================================================================

use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;

use super::aggregate::{Aggregator, Classification};
use super::link::LinkRecord;
use crate::checker::ProbeError;

#[derive(Debug)]
pub struct CrawlRun {
    root_url: String,
    started: Instant,
    links: Vec<LinkRecord>,
    root_error: Option<ProbeError>,
}

impl CrawlRun {
    pub fn start(root_url: &str) -> Self {
        Self {
            root_url: root_url.to_string(),
            started: Instant::now(),
            links: Vec::new(),
            root_error: None,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn set_links(&mut self, links: Vec<LinkRecord>) {
        self.links = links;
    }

    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    pub fn set_root_error(&mut self, error: ProbeError) {
        self.root_error = Some(error);
    }

    /// Freezes the run and builds its report.
    pub fn finish(self, aggregator: &Aggregator, deadline_exceeded: bool) -> CrawlReport {
        CrawlReport {
            elapsed: self.started.elapsed(),
            discovered: self.links.len(),
            dispatched: aggregator.dispatched(),
            classification: aggregator.snapshot(),
            peak_in_flight: aggregator.peak_in_flight(),
            root_url: self.root_url,
            links: self.links,
            root_error: self.root_error.map(|e| e.to_string()),
            deadline_exceeded,
        }
    }
}

/// Everything the report printer needs about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub root_url: String,
    /// Number of non-empty hrefs found on the root page.
    pub discovered: usize,
    /// Number of probes that were actually started.
    pub dispatched: usize,
    pub links: Vec<LinkRecord>,
    pub classification: Classification,
    /// True when the global deadline stopped the run early.
    pub deadline_exceeded: bool,
    /// Why the root page could not be fetched, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_error: Option<String>,
    pub peak_in_flight: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn success_count(&self) -> usize {
        self.classification.success.len()
    }

    pub fn failed_count(&self) -> usize {
        self.classification.failed.len()
    }

    /// Links that never got a verdict because the deadline hit first.
    pub fn unfinished(&self) -> usize {
        self.discovered.saturating_sub(self.classification.finished())
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
