//! Chaxunle IP pages.
//!
//! The page has no stable markup around the results, so every
//! hostname-shaped token is taken and the site's own and ad domains are
//! filtered out.

use super::{collect_domains, fetch_text, RequestHeaders, Source, HTML_ACCEPT};
use crate::error::IpFinderError;
use async_trait::async_trait;
use regex::Regex;

lazy_static::lazy_static! {
    static ref HOST_TOKEN_RE: Regex =
        Regex::new(r"([a-zA-Z0-9][a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap();
}

const EXCLUDED: &[&str] = &["chaxunle", "baidu", "qq.com"];

/// Scrapes `www.chaxunle.cn/ip/{ip}.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chaxunle;

#[async_trait]
impl Source for Chaxunle {
    fn name(&self) -> &'static str {
        "chaxunle"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let url = format!("https://www.chaxunle.cn/ip/{}.html", ip);
        let headers = RequestHeaders {
            accept: Some(HTML_ACCEPT),
            accept_language: Some("en-US,en;q=0.9"),
            ..Default::default()
        };

        let html = fetch_text(client, self.name(), &url, headers).await?;
        Ok(parse_chaxunle(&html))
    }
}

/// Extract hostname-shaped tokens from a Chaxunle page.
pub fn parse_chaxunle(html: &str) -> Vec<String> {
    let tokens = HOST_TOKEN_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());
    collect_domains(tokens, EXCLUDED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chaxunle_filters_site_domains() {
        let html = r#"
            <link rel="dns-prefetch" href="https://hm.baidu.com/">
            <a href="https://www.chaxunle.cn/">home</a>
            <li>shop.example.cn</li>
            <li>blog.example.org</li>
            <span>im.qq.com</span>
            <li>shop.example.cn</li>
        "#;
        assert_eq!(
            parse_chaxunle(html),
            vec!["shop.example.cn", "blog.example.org"]
        );
    }
}
