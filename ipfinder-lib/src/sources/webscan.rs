//! WebScan JSON API.
//!
//! Responds with a JSON array of objects, each carrying a `domain` field.
//! Entries without a usable `domain` string are skipped.

use super::{fetch_text, RequestHeaders, Source};
use crate::error::IpFinderError;
use crate::utils::{normalize_domain, unique_domains};
use async_trait::async_trait;

/// Queries `api.webscan.cc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebScan;

#[async_trait]
impl Source for WebScan {
    fn name(&self) -> &'static str {
        "webscan"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let url = format!("https://api.webscan.cc/?action=query&ip={}", ip);
        let headers = RequestHeaders {
            accept: Some("application/json"),
            ..Default::default()
        };

        let body = fetch_text(client, self.name(), &url, headers).await?;
        parse_webscan(&body)
    }
}

/// Extract hostnames from a WebScan JSON body.
///
/// # Errors
///
/// Returns `ParseError` if the body is not a JSON array.
pub fn parse_webscan(body: &str) -> Result<Vec<String>, IpFinderError> {
    let value: serde_json::Value = serde_json::from_str(body.trim())?;

    let items = value
        .as_array()
        .ok_or_else(|| IpFinderError::parse("webscan: expected a JSON array"))?;

    let domains = items
        .iter()
        .filter_map(|item| item.get("domain").and_then(|d| d.as_str()))
        .filter_map(normalize_domain);

    Ok(unique_domains(domains))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_webscan_array() {
        let body = r#"[
            {"domain": "http://www.dns.google", "title": "Google"},
            {"domain": "a.b.c"},
            {"domain": 42},
            {"title": "no domain"},
            {"domain": "dns.google"}
        ]"#;

        assert_eq!(parse_webscan(body).unwrap(), vec!["dns.google", "a.b.c"]);
    }

    #[test]
    fn test_parse_webscan_rejects_non_array() {
        assert!(matches!(
            parse_webscan(r#"{"error": "limit"}"#),
            Err(IpFinderError::ParseError { .. })
        ));
        assert!(parse_webscan("<html>").is_err());
    }
}
