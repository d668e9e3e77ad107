// src/report.rs
// =============================================================================
// Renders a CrawlReport for the terminal, either as plain text or JSON.
//
// The text layout is a short summary: totals first, then only the failure
// categories that actually occurred, then how long the run took.
// =============================================================================

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Result;

use crate::crawl::{Bucket, Classification, CrawlReport};

// Prints the report either as text or JSON
pub fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

// Builds the human-readable summary
pub fn render_text(report: &CrawlReport) -> String {
    let mut out = String::new();
    let c: &Classification = &report.classification;

    // Writing into a String cannot fail, so the results are ignored
    let _ = writeln!(out, "Analysis on {}:", report.root_url);
    if let Some(error) = &report.root_error {
        let _ = writeln!(out, "Could not fetch page: {error}");
    }
    let _ = writeln!(out, "Found {} links in total", report.discovered);
    let _ = writeln!(out, "Success: {}", report.success_count());
    let _ = writeln!(out, "Failed: {}", report.failed_count());

    // A 301/302 counts as an invalid link here, same as an unparseable URL.
    // The JSON output keeps the two buckets apart.
    let optional = [
        ("Access denied", c.bucket(Bucket::Forbidden).len()),
        ("Time out", c.bucket(Bucket::TimedOut).len()),
        (
            "Invalid link",
            c.bucket(Bucket::Invalid).len() + c.bucket(Bucket::Redirected).len(),
        ),
        ("Exception when visited", c.bucket(Bucket::Errored).len()),
    ];

    // Only print the categories that actually happened
    for (label, count) in optional {
        if count > 0 {
            let _ = writeln!(out, "{label}: {count}");
        }
    }

    if report.deadline_exceeded && report.unfinished() > 0 {
        let _ = writeln!(
            out,
            "Deadline reached: {} links not checked",
            report.unfinished()
        );
    }

    let _ = writeln!(out, "Time used: {}", format_elapsed(report.elapsed));
    out
}

// Formats a duration as "M m S s MS ms"
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{} m {} s {} ms",
        total_secs / 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}
