//! TNTcode domain listing.
//!
//! Hostnames are printed one per line inside `<textarea>` blocks.

use super::{collect_domains, fetch_text, RequestHeaders, Source, HTML_ACCEPT};
use crate::error::IpFinderError;
use async_trait::async_trait;
use regex::Regex;

lazy_static::lazy_static! {
    static ref TEXTAREA_RE: Regex = Regex::new(r"<textarea[^>]*>([\s\S]*?)</textarea>").unwrap();
}

/// Scrapes `domains.tntcode.com/ip/{ip}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TntCode;

#[async_trait]
impl Source for TntCode {
    fn name(&self) -> &'static str {
        "tntcode"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let url = format!("https://domains.tntcode.com/ip/{}", ip);
        let headers = RequestHeaders {
            accept: Some(HTML_ACCEPT),
            ..Default::default()
        };

        let html = fetch_text(client, self.name(), &url, headers).await?;
        Ok(parse_tntcode(&html))
    }
}

/// Extract hostnames from the textarea blocks of a TNTcode page.
pub fn parse_tntcode(html: &str) -> Vec<String> {
    let lines = TEXTAREA_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .flat_map(|m| m.as_str().lines());
    collect_domains(lines, &["tntcode"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tntcode_textarea_lines() {
        let html = "<h1>Domains</h1>\n<textarea rows=\"20\">one.example\n  two.example  \n\ntntcode.com\none.example\n</textarea>";
        assert_eq!(parse_tntcode(html), vec!["one.example", "two.example"]);
    }

    #[test]
    fn test_parse_tntcode_multiple_blocks() {
        let html = "<textarea>a.example</textarea><p>x</p><textarea>b.example</textarea>";
        assert_eq!(parse_tntcode(html), vec!["a.example", "b.example"]);
    }
}
