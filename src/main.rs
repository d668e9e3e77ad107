// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up diagnostic logging (tracing, on stderr)
// 3. Run one audit of the given page on a tokio runtime
// 4. Print the report on stdout
// 5. Shut the runtime down without waiting, then exit
//
// Exit codes:
// - 1 when no URL was given (after printing a usage line)
// - 0 otherwise, even when something went wrong during the run: the error
//   is printed and the process ends normally
//
// Why not #[tokio::main]?
// - reqwest resolves hostnames on tokio's blocking thread pool
// - Dropping a runtime waits for those threads to finish
// - A DNS lookup stuck at the deadline would keep the process alive after
//   the report is printed, so we build the runtime ourselves and use
//   shutdown_background() instead
// =============================================================================

mod checker; // src/checker/ - single-URL probing and href extraction
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - the concurrent audit itself
mod report; // src/report.rs - text / JSON output

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use crawl::Crawler;

const USAGE: &str = "please give a website url. E.g. link-audit https://www.stuff.co.nz/";

fn main() {
    // Parse command-line arguments into our Cli struct
    // This will automatically handle --help, --version, etc.
    let cli = Cli::parse();

    // No URL: print the usage line and stop with exit code 1
    let Some(url) = cli.url.clone() else {
        println!("{USAGE}");
        std::process::exit(1);
    };

    init_tracing(&cli);
    debug!(?cli, "CLI arguments parsed");

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("{e:?}");
            std::process::exit(0);
        }
    };

    // {:?} on anyhow::Error prints the whole cause chain
    // (and a backtrace when RUST_BACKTRACE is set)
    if let Err(e) = runtime.block_on(run(&cli, &url)) {
        println!("{e:?}");
    }

    // Abandon anything still running (e.g. a hung DNS lookup) instead of
    // waiting for it, and make sure the report is out before we exit
    runtime.shutdown_background();
    let _ = std::io::stdout().flush();
    std::process::exit(0);
}

// Same runtime #[tokio::main] would give us: multi-threaded, all drivers on
fn build_runtime() -> Result<Runtime> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")
}

// Priority: RUST_LOG env var > -q > -v flags > default (warn)
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Runs one audit and prints its report
async fn run(cli: &Cli, url: &str) -> Result<()> {
    let crawler = Crawler::new(cli.crawl_config()).context("could not start the audit")?;
    let report = crawler.run(url).await;
    report::print_report(&report, cli.json)
}
