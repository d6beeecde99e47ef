//! Scan orchestration.
//!
//! This module provides the [`Scanner`], which drives a fixed pool of workers
//! over the target IPs. Each worker claims one IP at a time and asks every
//! registered source about it, in registration order, feeding whatever comes
//! back into the shared [`ResultSink`].
//!
//! Failures are absorbed at the narrowest scope: a failing source only loses
//! its own (IP, source) result, and a failing sink write only loses one line.

use crate::error::IpFinderError;
use crate::sink::{AcceptOutcome, ResultSink};
use crate::sources::{default_sources, Source, SourceList};
use crate::types::{ScanConfig, ScanEvent, ScanStatus, ScanSummary};
use crate::utils::{jitter_delay, normalize_domain};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reverse-IP scan orchestrator.
///
/// # Example
///
/// ```rust,no_run
/// use ipfinder_lib::{ScanConfig, Scanner};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScanConfig::default()
///         .with_concurrency(10)
///         .with_output("results/domains.txt");
///
///     let scanner = Scanner::new(vec!["8.8.8.8".to_string()], config);
///     let summary = scanner.run().await?;
///     println!("{} domains found", summary.domains_found);
///     Ok(())
/// }
/// ```
pub struct Scanner {
    ips: Arc<[String]>,
    sources: SourceList,
    config: ScanConfig,
    cancel: CancellationToken,
    events: Option<UnboundedSender<ScanEvent>>,
    client: Option<reqwest::Client>,
}

impl Scanner {
    /// Create a scanner over `ips` using all built-in sources.
    ///
    /// The concurrency setting is clamped into the supported range here, so a
    /// zero from a hand-built config still yields one worker.
    pub fn new(ips: Vec<String>, config: ScanConfig) -> Self {
        let concurrency = config.concurrency;

        Self {
            ips: ips.into(),
            sources: default_sources().into(),
            config: config.with_concurrency(concurrency),
            cancel: CancellationToken::new(),
            events: None,
            client: None,
        }
    }

    /// Replace the registered source list. Order is the query order per IP.
    pub fn with_sources(mut self, sources: Vec<Arc<dyn Source>>) -> Self {
        self.sources = sources.into();
        self
    }

    /// Observe an external cancellation signal instead of a private one.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Send progress events to `tx`. Events are best-effort.
    pub fn with_events(mut self, tx: UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Use a pre-built HTTP client instead of building one from the config.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Token that cancels this scan when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The effective configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Names of the registered sources, in query order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run the scan to completion or cancellation.
    ///
    /// Returns only after every worker has exited and the output file has been
    /// flushed and closed.
    ///
    /// # Errors
    ///
    /// Fatal conditions only: no IPs, no sources, an HTTP client or output
    /// file that cannot be created, a worker panic, or a failed final flush.
    /// Source failures are counted in the summary, not returned.
    pub async fn run(&self) -> Result<ScanSummary, IpFinderError> {
        if self.ips.is_empty() {
            return Err(IpFinderError::config("No target IPs to scan"));
        }
        if self.sources.is_empty() {
            return Err(IpFinderError::config("No lookup sources registered"));
        }
        if self.config.request_timeout.is_zero() || self.config.source_timeout.is_zero() {
            return Err(IpFinderError::config("Timeouts must be greater than zero"));
        }

        let client = match &self.client {
            Some(client) => client.clone(),
            None => build_http_client(self.config.request_timeout)?,
        };
        let sink = Arc::new(ResultSink::create(&self.config.output)?);

        let state = Arc::new(WorkerState {
            ips: Arc::clone(&self.ips),
            sources: Arc::clone(&self.sources),
            sink: Arc::clone(&sink),
            client,
            cancel: self.cancel.clone(),
            events: self.events.clone(),
            source_timeout: self.config.source_timeout,
            jitter_ms: self.config.jitter_ms,
            next_ip: AtomicUsize::new(0),
            ips_scanned: AtomicUsize::new(0),
            source_failures: AtomicUsize::new(0),
        });

        let workers = self.config.concurrency.min(self.ips.len());
        info!(
            ips = self.ips.len(),
            sources = self.sources.len(),
            workers,
            output = %self.config.output.display(),
            "starting scan"
        );

        let start = Instant::now();
        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(Arc::clone(&state).work(worker_id));
        }

        let mut panicked = 0usize;
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scan worker terminated abnormally");
                panicked += 1;
            }
        }

        // All workers are gone, nothing can race the close.
        sink.close()?;

        if panicked > 0 {
            return Err(IpFinderError::internal(format!(
                "{} scan worker(s) panicked",
                panicked
            )));
        }

        let ips_scanned = state.ips_scanned.load(Ordering::SeqCst);
        let status = if self.cancel.is_cancelled() && ips_scanned < self.ips.len() {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };

        let summary = ScanSummary {
            status,
            ips_total: self.ips.len(),
            ips_scanned,
            domains_found: sink.final_count(),
            source_failures: state.source_failures.load(Ordering::SeqCst),
            duration: start.elapsed(),
        };

        info!(
            status = %summary.status,
            ips_scanned = summary.ips_scanned,
            domains = summary.domains_found,
            failures = summary.source_failures,
            "scan finished"
        );

        Ok(summary)
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("ips", &self.ips.len())
            .field("sources", &self.source_names())
            .field("config", &self.config)
            .finish()
    }
}

/// Build the shared HTTP client used by every source.
pub fn build_http_client(request_timeout: Duration) -> Result<reqwest::Client, IpFinderError> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .connect_timeout(request_timeout.min(Duration::from_secs(10)))
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| IpFinderError::config(format!("Failed to create HTTP client: {}", e)))
}

/// State shared read-only (plus atomics) by all workers of one scan.
struct WorkerState {
    ips: Arc<[String]>,
    sources: SourceList,
    sink: Arc<ResultSink>,
    client: reqwest::Client,
    cancel: CancellationToken,
    events: Option<UnboundedSender<ScanEvent>>,
    source_timeout: Duration,
    jitter_ms: Option<(u64, u64)>,
    next_ip: AtomicUsize,
    ips_scanned: AtomicUsize,
    source_failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpOutcome {
    Done,
    Interrupted,
}

impl WorkerState {
    async fn work(self: Arc<Self>, worker_id: usize) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // Each index is handed out exactly once across the pool.
            let index = self.next_ip.fetch_add(1, Ordering::SeqCst);
            let Some(ip) = self.ips.get(index) else {
                break;
            };

            debug!(worker_id, ip = %ip, "claimed ip");
            match self.scan_ip(ip).await {
                IpOutcome::Done => {
                    self.ips_scanned.fetch_add(1, Ordering::SeqCst);
                }
                IpOutcome::Interrupted => break,
            }
        }
        debug!(worker_id, "worker exiting");
    }

    async fn scan_ip(&self, ip: &str) -> IpOutcome {
        self.emit(ScanEvent::IpStarted { ip: ip.to_string() });

        for source in self.sources.iter() {
            if self.cancel.is_cancelled() {
                return IpOutcome::Interrupted;
            }

            if let Some((min_ms, max_ms)) = self.jitter_ms {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return IpOutcome::Interrupted,
                    _ = tokio::time::sleep(jitter_delay(min_ms, max_ms)) => {}
                }
            }

            let lookup = tokio::time::timeout(self.source_timeout, source.query(ip, &self.client));
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(ip, source = source.name(), "lookup abandoned on cancellation");
                    return IpOutcome::Interrupted;
                }
                result = lookup => result,
            };

            match result {
                Ok(Ok(domains)) => self.record(ip, source.name(), domains),
                Ok(Err(e)) => self.fail(ip, source.name(), e),
                Err(_) => self.fail(
                    ip,
                    source.name(),
                    IpFinderError::timeout(source.name(), self.source_timeout),
                ),
            }
        }

        self.emit(ScanEvent::IpFinished { ip: ip.to_string() });
        IpOutcome::Done
    }

    fn record(&self, ip: &str, source: &'static str, domains: Vec<String>) {
        let found = domains.len();
        let mut accepted = 0usize;

        for raw in domains {
            let Some(domain) = normalize_domain(&raw) else {
                debug!(ip, source, raw = %raw, "dropping unnormalizable domain");
                continue;
            };

            match self.sink.accept(&domain) {
                Ok(AcceptOutcome::Accepted) => {
                    accepted += 1;
                    self.emit(ScanEvent::DomainFound {
                        ip: ip.to_string(),
                        source,
                        domain,
                    });
                }
                Ok(AcceptOutcome::Duplicate) => {}
                Err(e) => {
                    warn!(ip, source, domain = %domain, error = %e, "failed to record domain")
                }
            }
        }

        debug!(ip, source, found, accepted, "source lookup finished");
        self.emit(ScanEvent::SourceFinished {
            ip: ip.to_string(),
            source,
            found,
            accepted,
        });
    }

    fn fail(&self, ip: &str, source: &'static str, error: IpFinderError) {
        self.source_failures.fetch_add(1, Ordering::SeqCst);
        debug!(ip, source, kind = error.kind(), error = %error, "source lookup failed");
        self.emit(ScanEvent::SourceFailed {
            ip: ip.to_string(),
            source,
            error: error.to_string(),
        });
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.events {
            // receiver gone means nobody is watching; the scan goes on
            let _ = tx.send(event);
        }
    }
}
