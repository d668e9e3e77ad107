// src/crawl/aggregate.rs
// =============================================================================
// Collects probe results from many concurrent tasks.
//
// Every probe task holds an Arc<Aggregator> and calls classify() once when it
// finishes. The bucket lists live behind a single Mutex, so one append is
// never interleaved with another; the counters next to them are plain
// atomics because they are only ever incremented.
//
// Rust concepts:
// - Arc: Shared ownership across tasks
// - Mutex: Exclusive access to the bucket vectors
// - Atomics: Lock-free counters
// - RAII guards: InFlight decrements its counter when dropped
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::checker::{Outcome, ProbeError};

/// The specific category a finished probe falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Success,
    Forbidden,
    Redirected,
    Invalid,
    TimedOut,
    Errored,
}

impl Bucket {
    /// Maps an outcome to its bucket.
    ///
    /// Generic HTTP failures (a 404, a 500, ...) have no specific bucket and
    /// only show up in the overall failed list.
    pub fn for_outcome(outcome: &Outcome) -> Option<Bucket> {
        match outcome {
            Ok(_) => Some(Bucket::Success),
            Err(ProbeError::Forbidden) => Some(Bucket::Forbidden),
            Err(ProbeError::Redirected { .. }) => Some(Bucket::Redirected),
            Err(ProbeError::InvalidUrl { .. }) => Some(Bucket::Invalid),
            Err(ProbeError::Timeout) => Some(Bucket::TimedOut),
            Err(ProbeError::Transport { .. }) => Some(Bucket::Errored),
            Err(ProbeError::HttpStatus { .. }) => None,
        }
    }
}

/// The URLs in each bucket, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub success: Vec<String>,
    pub forbidden: Vec<String>,
    pub redirected: Vec<String>,
    pub invalid: Vec<String>,
    pub timed_out: Vec<String>,
    pub errored: Vec<String>,
    /// Every non-success link, including those in a specific bucket above.
    pub failed: Vec<String>,
}

impl Classification {
    pub fn bucket(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Success => &self.success,
            Bucket::Forbidden => &self.forbidden,
            Bucket::Redirected => &self.redirected,
            Bucket::Invalid => &self.invalid,
            Bucket::TimedOut => &self.timed_out,
            Bucket::Errored => &self.errored,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<String> {
        match bucket {
            Bucket::Success => &mut self.success,
            Bucket::Forbidden => &mut self.forbidden,
            Bucket::Redirected => &mut self.redirected,
            Bucket::Invalid => &mut self.invalid,
            Bucket::TimedOut => &mut self.timed_out,
            Bucket::Errored => &mut self.errored,
        }
    }

    /// Number of links that got a verdict (success or failure).
    pub fn finished(&self) -> usize {
        self.success.len() + self.failed.len()
    }
}

/// Thread-safe result collector shared by all probe tasks of one run.
#[derive(Debug, Default)]
pub struct Aggregator {
    classification: Mutex<Classification>,
    dispatched: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the verdict for one link. Called once per completed probe.
    pub fn classify(&self, url: &str, outcome: &Outcome) {
        // Hold the lock for both pushes so a snapshot never sees one
        // without the other
        let mut classification = self.lock();

        // At most one specific bucket (generic failures have none)
        if let Some(bucket) = Bucket::for_outcome(outcome) {
            classification.bucket_mut(bucket).push(url.to_string());
        }

        // Every non-success also goes into the overall failed list
        if outcome.is_err() {
            classification.failed.push(url.to_string());
        }
    }

    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Marks a probe as running until the returned guard is dropped.
    pub fn enter(self: &Arc<Self>) -> InFlight {
        // fetch_add returns the old value, so +1 is the count including us
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

        // Keep the highest value ever seen
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight {
            aggregator: Arc::clone(self),
        }
    }

    /// Highest number of probes that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Copies the current buckets. Other tasks may still be appending.
    pub fn snapshot(&self) -> Classification {
        // Clone under the lock, then release it right away
        self.lock().clone()
    }

    // A panic while holding the lock can only happen between two pushes,
    // so the data is still usable
    fn lock(&self) -> MutexGuard<'_, Classification> {
        self.classification
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Guard returned by [`Aggregator::enter`].
#[derive(Debug)]
pub struct InFlight {
    aggregator: Arc<Aggregator>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.aggregator.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_outcome_lands_in_one_bucket() {
        let aggregator = Aggregator::new();
        aggregator.classify("https://a.test/ok", &Ok(200));
        aggregator.classify("https://a.test/403", &Err(ProbeError::Forbidden));
        aggregator.classify(
            "https://a.test/moved",
            &Err(ProbeError::Redirected {
                status: 301,
                location: None,
            }),
        );
        aggregator.classify(
            "http://",
            &Err(ProbeError::InvalidUrl {
                reason: "empty host".into(),
            }),
        );
        aggregator.classify("https://a.test/slow", &Err(ProbeError::Timeout));
        aggregator.classify(
            "https://down.test/",
            &Err(ProbeError::Transport {
                message: "connection refused".into(),
            }),
        );

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.success, vec!["https://a.test/ok"]);
        assert_eq!(snapshot.forbidden, vec!["https://a.test/403"]);
        assert_eq!(snapshot.redirected, vec!["https://a.test/moved"]);
        assert_eq!(snapshot.invalid, vec!["http://"]);
        assert_eq!(snapshot.timed_out, vec!["https://a.test/slow"]);
        assert_eq!(snapshot.errored, vec!["https://down.test/"]);
        assert_eq!(snapshot.failed.len(), 5);
        assert_eq!(snapshot.finished(), 6);
    }

    #[test]
    fn test_generic_failure_only_counts_as_failed() {
        let aggregator = Aggregator::new();
        aggregator.classify("https://a.test/gone", &Err(ProbeError::HttpStatus { status: 404 }));

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.failed, vec!["https://a.test/gone"]);
        for bucket in [
            Bucket::Success,
            Bucket::Forbidden,
            Bucket::Redirected,
            Bucket::Invalid,
            Bucket::TimedOut,
            Bucket::Errored,
        ] {
            assert!(snapshot.bucket(bucket).is_empty(), "{bucket:?} should be empty");
        }
    }

    #[test]
    fn test_in_flight_guard_tracks_peak() {
        let aggregator = Arc::new(Aggregator::new());
        {
            let _a = aggregator.enter();
            let _b = aggregator.enter();
            let _c = aggregator.enter();
        }
        let _d = aggregator.enter();
        assert_eq!(aggregator.peak_in_flight(), 3);
        assert_eq!(aggregator.in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let aggregator = Arc::new(Aggregator::new());
        let mut tasks = tokio::task::JoinSet::new();

        for i in 0..200 {
            let aggregator = Arc::clone(&aggregator);
            tasks.spawn(async move {
                let url = format!("https://a.test/{i}");
                let outcome = if i % 2 == 0 { Ok(200) } else { Err(ProbeError::Timeout) };
                aggregator.classify(&url, &outcome);
            });
        }
        while tasks.join_next().await.is_some() {}

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.success.len(), 100);
        assert_eq!(snapshot.timed_out.len(), 100);
        assert_eq!(snapshot.failed.len(), 100);
    }
}
