// src/crawl/config.rs
// =============================================================================
// Tunables for one audit run, plus the errors that stop a run from starting.
// =============================================================================

use std::time::Duration;

use thiserror::Error;

/// Maximum number of probes in flight at once.
pub const DEFAULT_WORKERS: usize = 20;

/// Per-request timeout, applied to the root page and every link.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wall-clock budget for the whole run, measured from its start.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

/// User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub workers: usize,
    pub request_timeout: Duration,
    pub deadline: Duration,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            deadline: DEFAULT_DEADLINE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.workers == 0 {
            return Err(CrawlError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(CrawlError::InvalidConfig("request timeout must be non-zero".into()));
        }
        if self.deadline.is_zero() {
            return Err(CrawlError::InvalidConfig("deadline must be non-zero".into()));
        }
        Ok(())
    }
}

/// Errors that prevent a run from starting at all.
///
/// Problems with individual links never show up here; they are classified
/// into buckets instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
