//! Target IP input loading.
//!
//! IPs come either from a single command-line value or from a newline
//! separated list file. Blank lines and `#` / `//` comment lines are skipped;
//! lines that are not valid addresses are reported back so the caller can warn
//! about them without aborting.

use crate::error::IpFinderError;
use crate::utils::is_valid_ip;
use std::fs;
use std::path::Path;

/// A list line that could not be parsed as an IP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// Trimmed content of the offending line
    pub content: String,
}

/// Result of parsing an IP list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIps {
    /// Valid IPs in input order; duplicates are kept
    pub ips: Vec<String>,
    pub invalid: Vec<InvalidLine>,
}

/// Validate a single IP value (surrounding whitespace is ignored).
///
/// # Errors
///
/// Returns `InvalidIp` if the value is not an IPv4 or IPv6 address.
pub fn validate_ip(input: &str) -> Result<String, IpFinderError> {
    let ip = input.trim();
    if is_valid_ip(ip) {
        Ok(ip.to_string())
    } else {
        Err(IpFinderError::invalid_ip(ip))
    }
}

/// Parse newline separated IPs.
pub fn parse_ip_list(text: &str) -> ParsedIps {
    let mut parsed = ParsedIps::default();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        match validate_ip(line) {
            Ok(ip) => parsed.ips.push(ip),
            Err(_) => parsed.invalid.push(InvalidLine {
                line_number: index + 1,
                content: line.to_string(),
            }),
        }
    }

    parsed
}

/// Read and parse an IP list file.
///
/// # Errors
///
/// Returns `FileError` if the file cannot be read or contains no valid IP.
pub fn load_ip_file<P: AsRef<Path>>(path: P) -> Result<ParsedIps, IpFinderError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        IpFinderError::file_error(
            path.to_string_lossy(),
            format!("Failed to read IP list: {}", e),
        )
    })?;

    let parsed = parse_ip_list(&content);
    if parsed.ips.is_empty() {
        return Err(IpFinderError::file_error(
            path.to_string_lossy(),
            "No valid IPs found in file",
        ));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_ip() {
        assert_eq!(validate_ip(" 8.8.8.8 ").unwrap(), "8.8.8.8");
        assert_eq!(validate_ip("::1").unwrap(), "::1");
        assert!(matches!(
            validate_ip("8.8.8"),
            Err(IpFinderError::InvalidIp { .. })
        ));
    }

    #[test]
    fn test_parse_ip_list_skips_comments_and_reports_invalid() {
        let parsed = parse_ip_list("# comment\n\nnot-an-ip\n1.1.1.1\n");

        assert_eq!(parsed.ips, vec!["1.1.1.1"]);
        assert_eq!(
            parsed.invalid,
            vec![InvalidLine {
                line_number: 3,
                content: "not-an-ip".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_ip_list_keeps_duplicates_and_order() {
        let parsed = parse_ip_list("// header\n9.9.9.9\r\n1.1.1.1\n  9.9.9.9  \n");
        assert_eq!(parsed.ips, vec!["9.9.9.9", "1.1.1.1", "9.9.9.9"]);
        assert!(parsed.invalid.is_empty());
    }

    #[test]
    fn test_load_ip_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "8.8.8.8\n2606:4700:4700::1111\nbogus").unwrap();
        file.flush().unwrap();

        let parsed = load_ip_file(file.path()).unwrap();
        assert_eq!(parsed.ips.len(), 2);
        assert_eq!(parsed.invalid.len(), 1);
    }

    #[test]
    fn test_load_ip_file_without_valid_ips_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# only comments\nnope").unwrap();
        file.flush().unwrap();

        let err = load_ip_file(file.path()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("No valid IPs"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_ip_file("/definitely/not/here/ips.txt").unwrap_err();
        assert!(matches!(err, IpFinderError::FileError { .. }));
    }
}
