// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The URL is optional as far as clap is concerned: when it is missing we
// print our own usage line and exit with code 1 (clap would use code 2).
// =============================================================================

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::crawl::{CrawlConfig, DEFAULT_DEADLINE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKERS};

#[derive(Parser, Debug)]
#[command(
    name = "link-audit",
    version,
    about = "Fetch one web page and check every link on it",
    long_about = "link-audit downloads a single page, extracts all of its <a href> links and \
                  probes each one concurrently, then prints how many succeeded, were forbidden, \
                  redirected, invalid, timed out or errored. It never follows links deeper than one level."
)]
pub struct Cli {
    /// Page to audit (e.g., https://www.stuff.co.nz/)
    pub url: Option<String>,

    /// Maximum number of links probed at the same time
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Per-request timeout in seconds (root page and every link)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Total time budget for the whole run, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_DEADLINE.as_secs())]
    pub deadline: u64,

    /// Output the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// More diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            workers: self.workers,
            request_timeout: Duration::from_secs(self.timeout),
            deadline: Duration::from_secs(self.deadline),
            ..CrawlConfig::default()
        }
    }

    // RUST_LOG still wins over this; see main.rs
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["link-audit", "https://example.test/"]);
        assert_eq!(cli.url.as_deref(), Some("https://example.test/"));
        assert_eq!(cli.crawl_config(), CrawlConfig::default());
        assert_eq!(cli.log_level(), "warn");
        assert!(!cli.json);
    }

    #[test]
    fn test_url_is_optional_for_clap() {
        let cli = Cli::parse_from(["link-audit"]);
        assert!(cli.url.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "link-audit",
            "https://example.test/",
            "--workers",
            "5",
            "--timeout",
            "3",
            "--deadline",
            "30",
            "--json",
            "-vv",
        ]);
        let config = cli.crawl_config();
        assert_eq!(config.workers, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.deadline, Duration::from_secs(30));
        assert!(cli.json);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_quiet() {
        let cli = Cli::parse_from(["link-audit", "-q", "https://example.test/"]);
        assert_eq!(cli.log_level(), "error");
    }
}
