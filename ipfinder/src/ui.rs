//! Console display logic for the ipfinder CLI.
//!
//! This module handles everything the operator sees: the banner, colored
//! `[ERROR]` / `[WARNING]` / `[INFO]` lines, live progress while a scan runs,
//! and the final summary. Uses only the `console` crate.
//!
//! Logging (tracing) goes to stderr separately and is not formatted here.

use console::{style, StyledObject};
use ipfinder_lib::{ScanEvent, ScanStatus, ScanSummary, SOURCE_NAMES};
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

const BANNER: &str = r"
   _      ____         __
  (_)__  / _(_)__  ___/ /__ ____
 / / _ \/ _/ / _ \/ _  / -_) __/
/_/ .__/_//_/_//_/\_,_/\__/_/
  /_/";

/// Enable or disable ANSI colors for both stdout and stderr.
pub fn configure_colors(enabled: bool) {
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

// ── Status lines ─────────────────────────────────────────────────────────────

fn tag<'a>(label: &'a str) -> StyledObject<&'a str> {
    match label {
        "[ERROR]" => style(label).red().bright().bold(),
        "[WARNING]" => style(label).yellow().bright(),
        "[+]" => style(label).green().bright(),
        _ => style(label).cyan(),
    }
}

pub fn error(message: &str) {
    eprintln!("{} {}", tag("[ERROR]"), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", tag("[WARNING]"), message);
}

pub fn info(message: &str) {
    println!("{} {}", tag("[INFO]"), message);
}

// ── Header ───────────────────────────────────────────────────────────────────

pub fn print_banner() {
    println!("{}", style(BANNER).cyan());
    println!();
    println!(
        "{}",
        style(format!(
            "IP Finder v{} - Reverse IP Domain Discovery",
            env!("CARGO_PKG_VERSION")
        ))
        .green()
        .bright()
    );
    println!();
}

/// Print what is about to be scanned.
pub fn print_scan_header(ip_count: usize, sources: &[&str], concurrency: usize, output: &Path) {
    let workers = concurrency.min(ip_count);
    let meta = [
        format!("{} IP{}", ip_count, plural(ip_count)),
        format!("{} source{}", sources.len(), plural(sources.len())),
        format!("{} worker{}", workers, plural(workers)),
        format!("Output: {}", output.display()),
    ];
    println!("{}", style(meta.join(" | ")).dim());
    println!("{}", style(format!("Sources: {}", sources.join(", "))).dim());
    println!();
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Consume scan events until the scanner drops its sender.
///
/// This is the only task that prints progress, so lines from concurrent
/// workers never interleave mid-line.
pub async fn report_progress(
    mut events: UnboundedReceiver<ScanEvent>,
    verbose: bool,
    total: usize,
) {
    let mut finished = 0usize;

    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::DomainFound { ip, source, domain } => {
                println!("{}", found_line(&ip, source, &domain, verbose));
            }
            ScanEvent::SourceFailed { ip, source, error } if verbose => {
                warning(&format!("{} failed for {}: {}", source, ip, error));
            }
            ScanEvent::SourceFinished {
                ip,
                source,
                found,
                accepted,
            } if verbose => {
                println!(
                    "    {} {} {}: {} found, {} new",
                    style("└─").dim(),
                    style(ip).dim(),
                    source,
                    found,
                    accepted
                );
            }
            ScanEvent::IpFinished { ip } => {
                finished += 1;
                if verbose {
                    println!(
                        "{} {} done",
                        style(format!("[{}/{}]", finished, total)).dim(),
                        ip
                    );
                }
            }
            _ => {}
        }
    }
}

fn found_line(ip: &str, source: &str, domain: &str, verbose: bool) -> String {
    if verbose {
        format!(
            "{} {} {}",
            tag("[+]"),
            domain,
            style(format!("({} via {})", ip, source)).dim()
        )
    } else {
        format!("{} {}", tag("[+]"), domain)
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary. Silent mode prints only the domain count.
pub fn print_summary(summary: &ScanSummary, output: &Path, silent: bool) {
    if silent {
        println!("{}", summary.domains_found);
        return;
    }

    println!();
    println!(
        "{}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!("{}", summary_line(summary));

    match summary.status {
        ScanStatus::Completed => info(&format!(
            "{} unique domain{} saved to {}",
            summary.domains_found,
            plural(summary.domains_found),
            output.display()
        )),
        ScanStatus::Cancelled => warning(&format!(
            "Scan cancelled after {} of {} IPs; {} domain{} saved to {}",
            summary.ips_scanned,
            summary.ips_total,
            summary.domains_found,
            plural(summary.domains_found),
            output.display()
        )),
    }
}

fn summary_line(summary: &ScanSummary) -> String {
    let status = match summary.status {
        ScanStatus::Completed => style(summary.status.to_string()).green().bold(),
        ScanStatus::Cancelled => style(summary.status.to_string()).yellow().bold(),
    };

    format!(
        "{} in {:.1}s  {}  {}/{} IPs  {}  {}  {}  {}",
        status,
        summary.duration.as_secs_f64(),
        style("|").dim(),
        summary.ips_scanned,
        summary.ips_total,
        style("|").dim(),
        style(format!("{} domains", summary.domains_found)).green(),
        style("|").dim(),
        style(format!("{} failed lookups", summary.source_failures)).yellow(),
    )
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// Print the built-in sources for `--list-sources`.
pub fn print_sources() {
    println!("{}", style("Available sources:").bold());
    for name in SOURCE_NAMES {
        println!("  {} {}", style("•").dim(), style(name).green());
    }
    println!();
    println!(
        "{}",
        style("Select with --sources a,b or skip with --exclude-sources a,b").dim()
    );
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
