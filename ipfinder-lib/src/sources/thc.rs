//! THC.org reverse-IP API.
//!
//! The service answers in plain text (sometimes ANSI colored), one hostname
//! per line, with `;` comment lines and a `Next Page: <url>` line when more
//! results exist. This is the only source that issues more than one request
//! per lookup: it follows the pagination chain in order, up to a page cap.

use super::{fetch_text, RequestHeaders, Source};
use crate::error::IpFinderError;
use crate::utils::{normalize_domain, unique_domains};
use async_trait::async_trait;
use regex::Regex;
use std::future::Future;
use std::time::Duration;

lazy_static::lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap();
}

const NEXT_PAGE_MARKER: &str = "Next Page:";

/// Default number of pages followed per IP.
pub const DEFAULT_MAX_PAGES: usize = 20;

/// Default pause between two page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(100);

/// Queries `ip.thc.org/{ip}` and follows its pagination links.
#[derive(Debug, Clone)]
pub struct ThcOrg {
    base_url: String,
    max_pages: usize,
    page_delay: Duration,
}

impl Default for ThcOrg {
    fn default() -> Self {
        Self {
            base_url: "https://ip.thc.org".to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

impl ThcOrg {
    /// Override the page cap (minimum one page).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Override the pause between page requests.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
}

#[async_trait]
impl Source for ThcOrg {
    fn name(&self) -> &'static str {
        "thc-org"
    }

    async fn query(
        &self,
        ip: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<String>, IpFinderError> {
        let start = format!("{}/{}", self.base_url.trim_end_matches('/'), ip);
        let headers = RequestHeaders {
            accept: Some("text/plain"),
            ..Default::default()
        };
        let name = self.name();

        follow_pages(start, self.max_pages, self.page_delay, move |url| async move {
            fetch_text(client, name, &url, headers).await
        })
        .await
    }
}

/// One parsed page of THC.org output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThcPage {
    pub domains: Vec<String>,
    pub next_page: Option<String>,
}

/// Parse one THC.org response body.
pub fn parse_thc_response(body: &str) -> ThcPage {
    let cleaned = ANSI_RE.replace_all(body, "");
    let mut page = ThcPage::default();

    for line in cleaned.lines().map(str::trim) {
        if let Some((_, next)) = line.split_once(NEXT_PAGE_MARKER) {
            let next = next.trim();
            if !next.is_empty() {
                page.next_page = Some(next.to_string());
            }
            continue;
        }

        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if line.contains('.') && !line.contains(' ') {
            if let Some(domain) = normalize_domain(line) {
                page.domains.push(domain);
            }
        }
    }

    page
}

/// Walk the pagination chain starting at `start`.
///
/// Pages are requested strictly in the order the service links them, with
/// `delay` between requests, stopping at `max_pages`, at the end of the chain,
/// or when a link points back to the page just fetched. A failure on the first
/// page fails the lookup; a failure further down the chain keeps what was
/// already collected.
pub(crate) async fn follow_pages<F, Fut>(
    start: String,
    max_pages: usize,
    delay: Duration,
    mut fetch: F,
) -> Result<Vec<String>, IpFinderError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, IpFinderError>>,
{
    let mut domains = Vec::new();
    let mut next = Some(start);
    let mut fetched = 0usize;

    while let Some(url) = next.take() {
        if fetched >= max_pages {
            break;
        }
        if fetched > 0 {
            tokio::time::sleep(delay).await;
        }

        let body = match fetch(url.clone()).await {
            Ok(body) => body,
            Err(e) if fetched == 0 => return Err(e),
            Err(e) => {
                tracing::debug!(
                    page = fetched + 1,
                    url = %url,
                    error = %e,
                    "thc-org pagination stopped"
                );
                break;
            }
        };
        fetched += 1;

        let page = parse_thc_response(&body);
        domains.extend(page.domains);
        next = page
            .next_page
            .map(|link| resolve_link(&url, &link))
            .filter(|link| link != &url);
    }

    Ok(unique_domains(domains))
}

fn resolve_link(current: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    reqwest::Url::parse(current)
        .and_then(|base| base.join(link))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_thc_response_strips_ansi_and_comments() {
        let body = "\x1b[1;32m;; ip.thc.org results for 8.8.8.8\x1b[0m\n\
                    ; Entries: 3\n\
                    \n\
                    dns.google\n\
                    \x1b[33mwww.Dns8.Google\x1b[0m\n\
                    not a domain line\n\
                    ;; Next Page: https://ip.thc.org/8.8.8.8?page=2\n";

        let page = parse_thc_response(body);
        assert_eq!(page.domains, vec!["dns.google", "dns8.google"]);
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://ip.thc.org/8.8.8.8?page=2")
        );
    }

    #[test]
    fn test_parse_thc_response_without_next_page() {
        let page = parse_thc_response("a.example\nb.example\n");
        assert_eq!(page.domains, vec!["a.example", "b.example"]);
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("https://ip.thc.org/1.1.1.1", "/1.1.1.1?page=2"),
            "https://ip.thc.org/1.1.1.1?page=2"
        );
        assert_eq!(
            resolve_link("https://ip.thc.org/1.1.1.1", "https://other.example/p"),
            "https://other.example/p"
        );
    }

    fn canned(pages: &[(&str, &str)]) -> Arc<HashMap<String, String>> {
        Arc::new(
            pages
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_follow_pages_in_link_order() {
        let pages = canned(&[
            ("https://t/1", "a.example\nNext Page: https://t/2\n"),
            ("https://t/2", "b.example\nNext Page: https://t/3\n"),
            ("https://t/3", "c.example\na.example\n"),
        ]);
        let visited = Arc::new(Mutex::new(Vec::new()));

        let result = follow_pages("https://t/1".to_string(), 20, Duration::ZERO, |url| {
            let pages = Arc::clone(&pages);
            let visited = Arc::clone(&visited);
            async move {
                visited.lock().unwrap().push(url.clone());
                pages
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| IpFinderError::http("thc-org", 404))
            }
        })
        .await
        .unwrap();

        assert_eq!(result, vec!["a.example", "b.example", "c.example"]);
        assert_eq!(
            *visited.lock().unwrap(),
            vec!["https://t/1", "https://t/2", "https://t/3"]
        );
    }

    #[tokio::test]
    async fn test_follow_pages_respects_page_cap() {
        let calls = Arc::new(Mutex::new(0usize));

        let result = follow_pages("https://t/0".to_string(), 3, Duration::ZERO, |url| {
            let calls = Arc::clone(&calls);
            async move {
                let mut n = calls.lock().unwrap();
                *n += 1;
                Ok(format!("host{}.example\nNext Page: {}x\n", *n, url))
            }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn test_follow_pages_first_failure_is_error_later_failure_keeps_results() {
        let first = follow_pages("https://t/1".to_string(), 5, Duration::ZERO, |_| async {
            Err::<String, _>(IpFinderError::http("thc-org", 503))
        })
        .await;
        assert!(matches!(first, Err(IpFinderError::Http { status: 503, .. })));

        let pages = canned(&[("https://t/1", "a.example\nNext Page: https://t/2\n")]);
        let partial = follow_pages("https://t/1".to_string(), 5, Duration::ZERO, |url| {
            let pages = Arc::clone(&pages);
            async move {
                pages
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| IpFinderError::network("reset"))
            }
        })
        .await
        .unwrap();
        assert_eq!(partial, vec!["a.example"]);
    }

    #[tokio::test]
    async fn test_follow_pages_stops_on_self_link() {
        let calls = Arc::new(Mutex::new(0usize));
        let result = follow_pages("https://t/1".to_string(), 20, Duration::ZERO, |_| {
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().unwrap() += 1;
                Ok("loop.example\nNext Page: https://t/1\n".to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(result, vec!["loop.example"]);
    }
}
