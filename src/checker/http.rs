// src/checker/http.rs
// =============================================================================
// This module probes URLs by making a single HTTP GET request each.
//
// Key functionality:
// - Makes exactly one GET per link (no retries, redirects are NOT followed)
// - Wraps every request in a hard timeout
// - Turns the raw result into an Outcome (status code or ProbeError)
// - Can race a probe against a CancellationToken so the crawler can stop it
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Result<T, E>: An Outcome is just a Result with our own error enum
// - thiserror: Derives Display/Error for ProbeError
// - tokio::select!: Wait on whichever of two futures finishes first
// =============================================================================

use std::error::Error as _;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::crawl::CrawlError;

/// Why a probe did not succeed.
///
/// Every variant is a classification, not a crash: the crawler converts these
/// into buckets and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The link is not a valid absolute http(s) URL. No request was sent.
    #[error("invalid URL: {reason}")]
    InvalidUrl { reason: String },

    /// No response arrived within the per-request timeout.
    #[error("request timed out")]
    Timeout,

    /// HTTP 403.
    #[error("access denied (HTTP 403)")]
    Forbidden,

    /// HTTP 301 or 302. The redirect is reported, never followed.
    #[error("redirected (HTTP {status})")]
    Redirected {
        status: u16,
        location: Option<String>,
    },

    /// Any other non-2xx status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// DNS, connection, TLS or any other transport fault.
    #[error("transport error: {message}")]
    Transport { message: String },
}

// The result of one probe: the 2xx status code, or why it failed
pub type Outcome = Result<u16, ProbeError>;

// Performs single GET requests with a fixed per-request timeout
//
// The reqwest Client inside is cheap to clone (it is reference counted),
// so one Fetcher is shared by every probe task through an Arc.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    // Creates a Fetcher whose requests give up after `timeout`
    //
    // Redirect following is turned off: a 301/302 is an audit finding
    // in its own right.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none()) // Never follow redirects
            .connect_timeout(timeout) // The overall timeout is applied per request below
            .user_agent(user_agent)
            .build()
            .map_err(CrawlError::Client)?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Probes a single link
    //
    // Parameters:
    //   url: the absolute URL to check
    //
    // Returns: Ok(status) for 2xx, otherwise the ProbeError describing why
    pub async fn probe(&self, url: &str) -> Outcome {
        // Bad URLs are rejected before touching the network
        let target = parse_probe_url(url)?;

        // Send the GET, giving up after self.timeout
        // The outer Result is the timeout, the inner one is reqwest's
        let response = match timeout(self.timeout, self.client.get(target).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(categorize_error(&e)),
            Err(_) => return Err(ProbeError::Timeout),
        };

        // Only the status matters; the body is never downloaded
        let outcome = analyze_response(&response);
        trace!(url, ?outcome, "probe finished");
        outcome
    }

    // Same as probe(), but gives up as soon as `token` is cancelled
    //
    // Returns None when cancelled. The request future is simply dropped,
    // which closes the connection if one was open.
    pub async fn probe_cancellable(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Option<Outcome> {
        // Already cancelled: don't even start the request
        if token.is_cancelled() {
            return None;
        }

        // `biased` checks the token first on every poll
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(url, "probe cancelled");
                None
            }
            outcome = self.probe(url) => Some(outcome),
        }
    }

    // Fetches the root page and returns its HTML body
    //
    // Uses the same classification as probe(); anything but a 2xx is an error.
    // The timeout covers both the response headers and the body download.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ProbeError> {
        let target = parse_probe_url(url)?;

        let download = async {
            let response = self
                .client
                .get(target)
                .send()
                .await
                .map_err(|e| categorize_error(&e))?;
            analyze_response(&response)?;
            response.text().await.map_err(|e| categorize_error(&e))
        };

        match timeout(self.timeout, download).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

// Parses and validates a link before any network call is made
fn parse_probe_url(url: &str) -> Result<Url, ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
        reason: format!("{url}: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ProbeError::InvalidUrl {
            reason: format!("{url}: unsupported scheme '{other}'"),
        }),
    }
}

// Maps an HTTP status code to an Outcome
//
// HTTP status codes:
// - 200-299: Success
// - 403: Forbidden
// - 301, 302: Redirected (reported, not followed)
// - everything else: generic failure
fn analyze_response(response: &Response) -> Outcome {
    let status = response.status();

    if status.is_success() {
        return Ok(status.as_u16());
    }

    match status {
        StatusCode::FORBIDDEN => Err(ProbeError::Forbidden),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Err(ProbeError::Redirected {
                status: status.as_u16(),
                location,
            })
        }
        _ => Err(ProbeError::HttpStatus {
            status: status.as_u16(),
        }),
    }
}

// Categorizes reqwest errors
//
// Timeouts can still come from reqwest itself (the connect timeout), so
// they are checked first. Everything else is a transport fault; the
// full source chain goes into the message for the diagnostic log.
fn categorize_error(error: &reqwest::Error) -> ProbeError {
    if error.is_timeout() {
        return ProbeError::Timeout;
    }

    // Walk the source chain (e.g. "error sending request" -> "connection
    // refused"), skipping parts already contained in the message
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    ProbeError::Transport { message }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is Outcome a type alias for Result?
//    - A probe either succeeds (with a status code) or fails for a reason
//    - That is exactly what Result<u16, ProbeError> says
//    - It also means `?` works inside probe() for the URL check
//
// 2. What does thiserror do?
//    - #[derive(Error)] implements std::error::Error for our enum
//    - #[error("...")] generates the Display text for each variant
//    - Fields can be used in the message, like {status}
//
// 3. What is tokio::select!?
//    - Runs several futures and continues with whichever finishes first
//    - The others are dropped, which cancels them
//    - Here: the probe races against token.cancelled()
//
// 4. Why turn off redirects?
//    - reqwest follows up to 10 redirects by default
//    - For an audit, "this link redirects" is a result we want to see
//    - Policy::none() hands the 301/302 response straight back to us
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> Fetcher {
        Fetcher::new(timeout, "link-audit-test").unwrap()
    }

    async fn server_with(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_success_status() {
        let server = server_with("/ok", ResponseTemplate::new(204)).await;
        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("{}/ok", server.uri()))
            .await;
        assert_eq!(outcome, Ok(204));
    }

    #[tokio::test]
    async fn test_forbidden() {
        let server = server_with("/secret", ResponseTemplate::new(403)).await;
        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("{}/secret", server.uri()))
            .await;
        assert_eq!(outcome, Err(ProbeError::Forbidden));
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = server_with(
            "/old",
            ResponseTemplate::new(301).insert_header("Location", "/new"),
        )
        .await;
        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("{}/old", server.uri()))
            .await;
        assert_eq!(
            outcome,
            Err(ProbeError::Redirected {
                status: 301,
                location: Some("/new".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_found_is_redirect_too() {
        let server = server_with("/moved", ResponseTemplate::new(302)).await;
        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("{}/moved", server.uri()))
            .await;
        assert!(matches!(outcome, Err(ProbeError::Redirected { status: 302, .. })));
    }

    #[tokio::test]
    async fn test_other_status_is_generic_failure() {
        let server = MockServer::start().await;
        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("{}/missing", server.uri()))
            .await;
        assert_eq!(outcome, Err(ProbeError::HttpStatus { status: 404 }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = server_with(
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
        )
        .await;
        let outcome = fetcher(Duration::from_millis(200))
            .probe(&format!("{}/slow", server.uri()))
            .await;
        assert_eq!(outcome, Err(ProbeError::Timeout));
    }

    #[tokio::test]
    async fn test_invalid_url_skips_network() {
        let f = fetcher(Duration::from_secs(5));
        assert!(matches!(f.probe("http://").await, Err(ProbeError::InvalidUrl { .. })));
        assert!(matches!(f.probe("not a url").await, Err(ProbeError::InvalidUrl { .. })));
        assert!(matches!(
            f.probe("mailto:someone@example.com").await,
            Err(ProbeError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Grab a free port, then close it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = fetcher(Duration::from_secs(5))
            .probe(&format!("http://127.0.0.1:{port}/"))
            .await;
        assert!(matches!(outcome, Err(ProbeError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_probe_returns_none() {
        let server = server_with(
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
        )
        .await;
        let f = fetcher(Duration::from_secs(10));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let outcome = f
            .probe_cancellable(&format!("{}/slow", server.uri()), &token)
            .await;
        assert!(outcome.is_none());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_fetch_page_returns_body() {
        let server = server_with(
            "/",
            ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"),
        )
        .await;
        let body = fetcher(Duration::from_secs(5))
            .fetch_page(&format!("{}/", server.uri()))
            .await
            .unwrap();
        assert!(body.contains("href"));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_error_status() {
        let server = server_with("/", ResponseTemplate::new(500)).await;
        let result = fetcher(Duration::from_secs(5))
            .fetch_page(&format!("{}/", server.uri()))
            .await;
        assert_eq!(result, Err(ProbeError::HttpStatus { status: 500 }));
    }
}
