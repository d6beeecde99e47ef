//! Core data types for reverse-IP scanning.
//!
//! This module defines the scan configuration, the progress events emitted
//! while a scan runs, and the summary returned once it finishes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent workers (one IP per worker at a time).
pub const DEFAULT_CONCURRENCY: usize = 30;

/// Upper bound for the worker pool size.
pub const MAX_CONCURRENCY: usize = 500;

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default budget for one complete source lookup (all pages included).
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default output artifact location.
pub const DEFAULT_OUTPUT_PATH: &str = "results/domains.txt";

/// Configuration options for a scan.
///
/// Presentation concerns (colors, silence) are not part of this struct:
/// they never change how a scan is scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of IPs processed at the same time
    /// Default: 30, Range: 1-500
    pub concurrency: usize,

    /// Where discovered domains are written, one per line
    pub output: PathBuf,

    /// Timeout for each individual HTTP request
    /// Default: 15 seconds
    #[serde(skip)]
    pub request_timeout: Duration,

    /// Timeout for one full source lookup, pagination included
    /// Default: 60 seconds
    #[serde(skip)]
    pub source_timeout: Duration,

    /// Optional random delay (milliseconds, inclusive) before each source request
    pub jitter_ms: Option<(u64, u64)>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            jitter_ms: None,
        }
    }
}

impl ScanConfig {
    /// Set the worker count, clamped into `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the output artifact path.
    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the budget for one complete source lookup.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Enable random jitter before each source request. Bounds are swapped if reversed.
    pub fn with_jitter(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.jitter_ms = Some((min_ms.min(max_ms), min_ms.max(max_ms)));
        self
    }
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanStatus {
    /// Every IP was processed
    #[serde(rename = "completed")]
    Completed,

    /// The cancellation signal fired before all IPs were processed
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// Aggregate result of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub status: ScanStatus,

    /// Number of IPs handed to the scanner
    pub ips_total: usize,

    /// Number of IPs whose source loop ran to the end
    pub ips_scanned: usize,

    /// Distinct domains written to the output artifact
    pub domains_found: usize,

    /// Failed (IP, source) lookups, cancellations excluded
    pub source_failures: usize,

    /// Wall-clock duration of the scan
    pub duration: Duration,
}

impl ScanSummary {
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }
}

/// Progress events emitted while a scan runs.
///
/// Events are informational; dropping them has no effect on the scan.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScanEvent {
    /// A worker claimed an IP
    IpStarted { ip: String },

    /// A source reported a domain that the sink had not seen before
    DomainFound {
        ip: String,
        source: &'static str,
        domain: String,
    },

    /// A source lookup succeeded
    SourceFinished {
        ip: String,
        source: &'static str,
        /// Domains the source returned
        found: usize,
        /// Domains that were new to the sink
        accepted: usize,
    },

    /// A source lookup failed; the scan continues
    SourceFailed {
        ip: String,
        source: &'static str,
        error: String,
    },

    /// All sources were tried for an IP
    IpFinished { ip: String },
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Completed => write!(f, "Completed"),
            ScanStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_clamped() {
        assert_eq!(ScanConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(ScanConfig::default().with_concurrency(64).concurrency, 64);
        assert_eq!(
            ScanConfig::default().with_concurrency(100_000).concurrency,
            MAX_CONCURRENCY
        );
    }

    #[test]
    fn test_jitter_bounds_ordered() {
        let config = ScanConfig::default().with_jitter(500, 100);
        assert_eq!(config.jitter_ms, Some((100, 500)));
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.output, PathBuf::from("results/domains.txt"));
        assert!(config.jitter_ms.is_none());
    }
}
