//! RapidDNS "same IP" listing.
//!
//! The page renders one hostname per `<td>` cell of the result table.

use super::{collect_domains, fetch_text, RequestHeaders, Source, HTML_ACCEPT};
use crate::error::IpFinderError;
use async_trait::async_trait;
use regex::Regex;

lazy_static::lazy_static! {
    static ref CELL_RE: Regex =
        Regex::new(r"<td[^>]*>\s*([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\s*</td>").unwrap();
}

/// Scrapes `rapiddns.io/sameip/{ip}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RapidDns;

#[async_trait]
impl Source for RapidDns {
    fn name(&self) -> &'static str {
        "rapiddns"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let url = format!("https://rapiddns.io/sameip/{}?full=1#result", ip);
        let headers = RequestHeaders {
            accept: Some(HTML_ACCEPT),
            accept_language: Some("en-US,en;q=0.9"),
            referer: Some("https://rapiddns.io/"),
        };

        let html = fetch_text(client, self.name(), &url, headers).await?;
        Ok(parse_rapiddns(&html))
    }
}

/// Extract hostnames from a RapidDNS result page.
pub fn parse_rapiddns(html: &str) -> Vec<String> {
    let cells = CELL_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());
    collect_domains(cells, &["rapiddns"])
}
