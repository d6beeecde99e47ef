//! # IP Finder Library
//!
//! Reverse-IP domain discovery: given IP addresses, ask a set of public lookup
//! services which hostnames they have seen on each address, and collect the
//! deduplicated union into one output file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ipfinder_lib::{ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::default().with_output("results/domains.txt");
//!     let scanner = Scanner::new(vec!["8.8.8.8".to_string()], config);
//!
//!     let summary = scanner.run().await?;
//!     println!("{}: {} domains", summary.status, summary.domains_found);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded Concurrency**: Fixed worker pool, each IP processed exactly once
//! - **Six Sources**: RapidDNS, WebScan, TNTcode, NetworksDB, Chaxunle, THC.org
//! - **Failure Isolation**: One failing source never stops the others
//! - **Cooperative Cancellation**: In-flight lookups are abandoned promptly
//! - **Deduplicated Output**: Every domain written exactly once

// Re-export main public API types and functions
pub use config::{
    env_config_from, load_env_config, split_list, ConfigManager, DefaultsConfig, EnvConfig,
    FileConfig, SourcesConfig,
};
pub use error::IpFinderError;
pub use input::{load_ip_file, parse_ip_list, validate_ip, InvalidLine, ParsedIps};
pub use scanner::{build_http_client, Scanner};
pub use sink::{AcceptOutcome, ResultSink};
pub use sources::{default_sources, select_sources, Source, SourceList, SOURCE_NAMES};
pub use types::{
    ScanConfig, ScanEvent, ScanStatus, ScanSummary, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_PATH,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SOURCE_TIMEOUT, MAX_CONCURRENCY,
};
pub use utils::{normalize_domain, parse_duration_str, parse_jitter_range};

// Public modules
pub mod sources;

// Internal modules - these are not part of the public API
mod config;
mod error;
mod input;
mod scanner;
mod sink;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, IpFinderError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        sources: SOURCE_NAMES.to_vec(),
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub sources: Vec<&'static str>,
}
