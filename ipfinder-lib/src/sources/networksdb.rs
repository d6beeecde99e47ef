//! NetworksDB "domains on IP" pages.

use super::{collect_domains, fetch_text, RequestHeaders, Source, HTML_ACCEPT};
use crate::error::IpFinderError;
use async_trait::async_trait;
use regex::Regex;

lazy_static::lazy_static! {
    static ref THREECOLS_RE: Regex =
        Regex::new(r#"<pre[^>]*class="[^"]*threecols[^"]*"[^>]*>([\s\S]*?)</pre>"#).unwrap();
}

/// Scrapes `networksdb.io/domains-on-ip/{ip}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworksDb;

#[async_trait]
impl Source for NetworksDb {
    fn name(&self) -> &'static str {
        "networksdb"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let url = format!("https://networksdb.io/domains-on-ip/{}", ip);
        let headers = RequestHeaders {
            accept: Some(HTML_ACCEPT),
            ..Default::default()
        };

        let html = fetch_text(client, self.name(), &url, headers).await?;
        Ok(parse_networksdb(&html))
    }
}

/// Extract hostnames from the `threecols` listing of a NetworksDB page.
pub fn parse_networksdb(html: &str) -> Vec<String> {
    let lines = THREECOLS_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .flat_map(|m| m.as_str().lines());
    collect_domains(lines, &["networksdb"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_networksdb_threecols() {
        let html = r#"
            <pre>ignored.example</pre>
            <pre class="list threecols wide">alpha.example
beta.example
networksdb.io
alpha.example</pre>
        "#;
        assert_eq!(parse_networksdb(html), vec!["alpha.example", "beta.example"]);
    }
}
