// src/crawl/orchestrator.rs
// =============================================================================
// This module runs one audit: fetch the root page, then probe every link on
// it concurrently.
//
// How it works:
// 1. Fetch the root page (same timeout as any other probe)
// 2. Extract hrefs, drop empty ones, resolve relative ones
// 3. Spawn one task per link, never more than `workers` at a time
//    (a Semaphore hands out permits, each task keeps its permit until done)
// 4. Wait for all tasks on a JoinSet, but never past the global deadline
// 5. At the deadline: cancel the token, abort whatever is still running,
//    and report what finished
//
// Links that were still running or never started when the deadline hit get
// no verdict at all. They are counted as "unfinished" in the report.
//
// Rust concepts:
// - Arc: Share the Fetcher and Aggregator with every spawned task
// - Semaphore: Bound the number of concurrent probes
// - JoinSet: Own a group of tasks, await them, abort them together
// - CancellationToken: Tell running probes to stop
// =============================================================================

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout_at;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::aggregate::Aggregator;
use super::config::{CrawlConfig, CrawlError};
use super::link::{discover_links, LinkRecord};
use super::run::{CrawlReport, CrawlRun};
use crate::checker::{extract_hrefs, Fetcher, ProbeError};

// Audits the links of a single page
#[derive(Debug)]
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<Fetcher>,
}

impl Crawler {
    // Creates a crawler, rejecting configs that could never make progress
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        // Zero workers or a zero timeout would hang or fail every probe
        config.validate()?;

        // One HTTP client for the whole run (connection pooling)
        let fetcher = Fetcher::new(config.request_timeout, &config.user_agent)?;

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
        })
    }

    // Runs a complete audit of `root_url`
    //
    // This never fails: a root page that cannot be fetched simply yields a
    // report with zero links and the reason in `root_error`.
    pub async fn run(&self, root_url: &str) -> CrawlReport {
        // The clock starts now: the deadline covers the root fetch too
        let mut run = CrawlRun::start(root_url);
        let deadline = run.started() + self.config.deadline;

        // Shared by every probe task, read once at the end for the report
        let aggregator = Arc::new(Aggregator::new());

        info!(
            root = root_url,
            workers = self.config.workers,
            timeout = ?self.fetcher.timeout(),
            deadline = ?self.config.deadline,
            "starting audit"
        );

        // Step 1: fetch the root page
        // Nothing to audit if this fails, so we return an empty report
        let html = match timeout_at(deadline, self.fetcher.fetch_page(root_url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                warn!(root = root_url, error = %e, "could not fetch root page");
                run.set_root_error(e);
                return run.finish(&aggregator, false);
            }
            Err(_) => {
                warn!(root = root_url, "deadline reached while fetching root page");
                run.set_root_error(ProbeError::Timeout);
                return run.finish(&aggregator, true);
            }
        };

        // Step 2: extract and resolve the links
        // fetch_page only succeeds for a parseable http(s) URL
        if let Ok(root) = Url::parse(root_url) {
            run.set_links(discover_links(&root, &extract_hrefs(&html)));
        }
        info!(links = run.links().len(), "links discovered");

        // Step 3: probe every link, but stop at the deadline
        // timeout_at returns Err(Elapsed) if the deadline passes first
        let token = CancellationToken::new();
        let mut tasks = JoinSet::new();

        let probing = self.probe_all(run.links(), &aggregator, &token, &mut tasks);
        let completed = timeout_at(deadline, probing).await.is_ok();

        // Step 4: out of time - tell running probes to stop, then abort
        // any task that has not noticed yet
        if !completed {
            warn!(
                running = tasks.len(),
                "deadline reached, cancelling remaining probes"
            );
            token.cancel();
            tasks.abort_all();
        }

        // Step 5: freeze the run and snapshot whatever finished
        let report = run.finish(&aggregator, !completed);
        info!(
            success = report.success_count(),
            failed = report.failed_count(),
            unfinished = report.unfinished(),
            "audit finished"
        );
        report
    }

    // Dispatches one probe per link and waits for all of them
    //
    // The caller wraps this in the global deadline; if that fires, this
    // future is dropped mid-way and the caller aborts what is left in `tasks`.
    async fn probe_all(
        &self,
        links: &[LinkRecord],
        aggregator: &Arc<Aggregator>,
        token: &CancellationToken,
        tasks: &mut JoinSet<()>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));

        for link in links {
            // Wait here until one of the running probes frees its slot
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            aggregator.record_dispatched();

            // Each task gets its own handles to the shared state
            let fetcher = Arc::clone(&self.fetcher);
            let aggregator = Arc::clone(aggregator);
            let token = token.clone();
            let url = link.url.clone();

            tasks.spawn(async move {
                // Both guards are released when the task ends, however it ends
                let _permit = permit;
                let _in_flight = aggregator.enter();

                // None means the deadline cancelled us: no verdict for this link
                let Some(outcome) = fetcher.probe_cancellable(&url, &token).await else {
                    return;
                };

                // Transport errors go to the diagnostic log, not the report
                match &outcome {
                    Err(ProbeError::Transport { message }) => {
                        warn!(url = %url, error = %message, "exception when visiting link");
                    }
                    Err(ProbeError::Redirected { status, location }) => {
                        debug!(url = %url, status, ?location, "link redirects");
                    }
                    other => debug!(url = %url, outcome = ?other, "link probed"),
                }
                aggregator.classify(&url, &outcome);
            });
        }

        // Every link is dispatched; now wait for the last ones to finish
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log_join_error(&e);
            }
        }
    }
}

// A probe task that panicked loses its verdict but must not stop the run
fn log_join_error(error: &JoinError) {
    if error.is_panic() {
        warn!(error = %error, "probe task panicked");
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Semaphore instead of buffer_unordered?
//    - A Semaphore holds N permits; acquire_owned() waits until one is free
//    - The permit moves into the task and is released when the task ends
//    - Unlike a stream, the spawned tasks live in a JoinSet we can abort
//
// 2. What is a JoinSet?
//    - A collection of spawned tasks that we own
//    - join_next() waits for whichever task finishes next
//    - abort_all() stops every task still in the set
//
// 3. Why both a CancellationToken AND abort_all()?
//    - The token lets a probe notice it should stop and exit cleanly
//    - abort_all() is the hard stop for anything that didn't
//    - Either way, an aborted probe never reaches classify()
//
// 4. What does timeout_at do?
//    - Runs a future until a fixed point in time
//    - If time runs out, the future is dropped (it simply stops running)
//    - That is why probe_all gets `tasks` by &mut: the JoinSet outlives it
//
// 5. What is let-else?
//    - `let Some(x) = expr else { return; };`
//    - Binds x if the pattern matches, otherwise runs the else block
//    - The else block must leave the current scope (return, break, ...)
// -----------------------------------------------------------------------------
