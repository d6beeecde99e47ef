//! Utility functions for hostname normalization and request shaping.
//!
//! This module contains the helpers every lookup source shares: turning a
//! scraped string into a canonical hostname, validating IP input, and the
//! per-request user-agent and jitter choices.

use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

lazy_static::lazy_static! {
    static ref SCHEME_RE: Regex = Regex::new(r"^(?i)https?://").unwrap();
    static ref BAD_CHARS_RE: Regex = Regex::new(r"[^a-z0-9.-]").unwrap();
}

/// Convert a raw scraped string into a canonical hostname.
///
/// The scheme, path, port and a leading `www.` are dropped, the result is
/// lowercased and stripped of characters that cannot appear in a hostname.
///
/// # Returns
///
/// `Some(hostname)` for something that looks like a dotted hostname,
/// `None` if nothing usable remains.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let without_scheme = SCHEME_RE.replace(raw, "");
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    let host = host.trim().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if !host.contains('.') {
        return None;
    }

    let cleaned = BAD_CHARS_RE.replace_all(host, "");
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() || !cleaned.contains('.') {
        return None;
    }

    Some(cleaned.to_string())
}

/// Deduplicate hostnames, keeping the first occurrence order.
pub fn unique_domains<I>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    domains
        .into_iter()
        .filter(|d| seen.insert(d.clone()))
        .collect()
}

/// Check whether a string is a syntactically valid IPv4 or IPv6 address.
pub fn is_valid_ip(ip: &str) -> bool {
    !ip.is_empty() && ip.parse::<IpAddr>().is_ok()
}

const BROWSERS: &[&str] = &["Chrome", "Firefox", "Safari", "Edge", "Opera"];

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0",
    "Windows NT 6.3",
    "Windows NT 6.2",
    "Windows NT 6.1",
    "Macintosh; Intel Mac OS X 10_15",
    "Macintosh; Intel Mac OS X 10_14",
    "Macintosh; Intel Mac OS X 10_13",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

const CHROME_VERSIONS: &[&str] = &[
    "120.0.0.0", "119.0.0.0", "118.0.0.0", "117.0.0.0", "116.0.0.0", "115.0.0.0", "114.0.0.0",
    "113.0.0.0", "112.0.0.0", "111.0.0.0", "110.0.0.0", "109.0.0.0", "108.0.0.0", "107.0.0.0",
    "106.0.0.0", "105.0.0.0", "104.0.0.0", "103.0.0.0", "102.0.0.0", "101.0.0.0",
];

const FIREFOX_VERSIONS: &[&str] = &[
    "120.0", "119.0", "118.0", "117.0", "116.0", "115.0", "114.0", "113.0", "112.0", "111.0",
    "110.0", "109.0", "108.0", "107.0", "106.0", "105.0", "104.0", "103.0", "102.0", "101.0",
];

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Build a plausible desktop browser user agent.
///
/// Each call draws from a fresh thread-local generator, so no state is shared
/// between workers.
pub fn random_user_agent() -> String {
    let mut rng = rand::rng();
    let browser = pick(&mut rng, BROWSERS);
    let platform = pick(&mut rng, PLATFORMS);
    let windows = platform.contains("Windows");

    match browser {
        "Firefox" => {
            let version = pick(&mut rng, FIREFOX_VERSIONS);
            if windows {
                format!(
                    "Mozilla/5.0 ({}; Win64; x64; rv:{}) Gecko/20100101 Firefox/{}",
                    platform, version, version
                )
            } else {
                format!(
                    "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
                    platform, version, version
                )
            }
        }
        "Chrome" if !windows => {
            let version = pick(&mut rng, CHROME_VERSIONS);
            format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                platform, version
            )
        }
        _ => {
            let version = pick(&mut rng, CHROME_VERSIONS);
            format!(
                "Mozilla/5.0 ({}; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                platform, version
            )
        }
    }
}

/// Pick a random delay in `[min_ms, max_ms]`.
pub fn jitter_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

/// Parse a timeout string like "5s", "30s", "2m" or plain seconds.
///
/// Zero durations are rejected.
pub fn parse_duration_str(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();

    let duration = if let Some(ms) = input.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = input.strip_suffix('s') {
        s.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = input.strip_suffix('m') {
        m.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        input.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    (!duration.is_zero()).then_some(duration)
}

/// Parse a jitter range like "100-500" (milliseconds) or a single value.
pub fn parse_jitter_range(input: &str) -> Option<(u64, u64)> {
    let input = input.trim();
    match input.split_once('-') {
        Some((min, max)) => {
            let min = min.trim().parse::<u64>().ok()?;
            let max = max.trim().parse::<u64>().ok()?;
            if min > max {
                None
            } else {
                Some((min, max))
            }
        }
        None => input.parse::<u64>().ok().map(|v| (v, v)),
    }
}
