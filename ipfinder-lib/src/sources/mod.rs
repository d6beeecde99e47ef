//! Lookup sources for reverse-IP discovery.
//!
//! Each source wraps one public service that lists hostnames seen on an IP.
//! They all implement [`Source`], and the scanner treats them uniformly.
//!
//! Adding a provider means implementing [`Source`] and appending it to
//! [`default_sources`].

use crate::error::IpFinderError;
use crate::utils::random_user_agent;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;
use std::sync::Arc;

/// Chaxunle IP pages
pub mod chaxunle;

/// NetworksDB domains-on-ip pages
pub mod networksdb;

/// RapidDNS same-IP listing
pub mod rapiddns;

/// THC.org plain-text API (paginated)
pub mod thc;

/// TNTcode domain listing
pub mod tntcode;

/// WebScan JSON API
pub mod webscan;

pub use chaxunle::Chaxunle;
pub use networksdb::NetworksDb;
pub use rapiddns::RapidDns;
pub use thc::ThcOrg;
pub use tntcode::TntCode;
pub use webscan::WebScan;

/// A reverse-IP lookup provider.
///
/// Implementations perform one logical lookup per call and must not retry.
/// Malformed records inside a response are skipped; only transport problems
/// or an unusable response fail the whole call.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable lowercase identifier, used for selection and reporting.
    fn name(&self) -> &'static str;

    /// Return the normalized, deduplicated hostnames the service lists for `ip`.
    async fn query(&self, ip: &str, client: &reqwest::Client)
        -> Result<Vec<String>, IpFinderError>;
}

/// Shared, read-only list of registered sources.
pub type SourceList = Arc<[Arc<dyn Source>]>;

/// Accept header used by the HTML scraping sources.
pub(crate) const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Names of all built-in sources, in registration order.
pub const SOURCE_NAMES: &[&str] = &[
    "rapiddns",
    "webscan",
    "tntcode",
    "networksdb",
    "chaxunle",
    "thc-org",
];

/// All built-in sources in registration order.
pub fn default_sources() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(RapidDns),
        Arc::new(WebScan),
        Arc::new(TntCode),
        Arc::new(NetworksDb),
        Arc::new(Chaxunle),
        Arc::new(ThcOrg::default()),
    ]
}

/// Filter the built-in sources by name.
///
/// An empty `include` list means "all sources". Registration order is kept
/// regardless of the order names were given in.
///
/// # Errors
///
/// Returns `ConfigError` for an unknown name or when nothing is left.
pub fn select_sources(
    include: &[String],
    exclude: &[String],
) -> Result<Vec<Arc<dyn Source>>, IpFinderError> {
    for name in include.iter().chain(exclude) {
        if !SOURCE_NAMES.contains(&name.trim().to_lowercase().as_str()) {
            return Err(IpFinderError::config(format!(
                "Unknown source '{}'. Available: {}",
                name,
                SOURCE_NAMES.join(", ")
            )));
        }
    }

    let wanted = |name: &str| {
        let listed = |list: &[String]| list.iter().any(|n| n.trim().eq_ignore_ascii_case(name));
        (include.is_empty() || listed(include)) && !listed(exclude)
    };

    let selected: Vec<_> = default_sources()
        .into_iter()
        .filter(|s| wanted(s.name()))
        .collect();

    if selected.is_empty() {
        return Err(IpFinderError::config("No sources left after filtering"));
    }

    Ok(selected)
}

/// Optional request headers a source wants on top of the user agent.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RequestHeaders {
    pub accept: Option<&'static str>,
    pub accept_language: Option<&'static str>,
    pub referer: Option<&'static str>,
}

/// GET `url` with a random user agent and return the body of a 200 response.
pub(crate) async fn fetch_text(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    headers: RequestHeaders,
) -> Result<String, IpFinderError> {
    let mut request = client.get(url).header(USER_AGENT, random_user_agent());
    if let Some(accept) = headers.accept {
        request = request.header(ACCEPT, accept);
    }
    if let Some(lang) = headers.accept_language {
        request = request.header(ACCEPT_LANGUAGE, lang);
    }
    if let Some(referer) = headers.referer {
        request = request.header(REFERER, referer);
    }

    let response = request.send().await.map_err(|e| {
        tracing::debug!(source = service, url, error = %e, "request failed");
        IpFinderError::from(e)
    })?;

    match response.status() {
        StatusCode::OK => Ok(response.text().await?),
        code => Err(IpFinderError::http(service, code.as_u16())),
    }
}

/// Normalize each candidate, drop those containing any `excluded` marker, dedupe.
pub(crate) fn collect_domains<'a, I>(candidates: I, excluded: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized = candidates
        .into_iter()
        .filter_map(crate::utils::normalize_domain)
        .filter(|d| !excluded.iter().any(|marker| d.contains(marker)));
    crate::utils::unique_domains(normalized)
}
