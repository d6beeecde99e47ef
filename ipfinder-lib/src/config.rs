//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `IPF_*`
//! environment variables, and merging configurations with proper precedence
//! rules. Command-line flags are applied on top by the binary.

use crate::error::IpFinderError;
use crate::sources::SOURCE_NAMES;
use crate::types::MAX_CONCURRENCY;
use crate::utils::{parse_duration_str, parse_jitter_range};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// concurrency = 50
/// output = "results/domains.txt"
/// timeout = "20s"
/// source_timeout = "2m"
/// jitter = "100-400"
///
/// [sources]
/// enabled = ["rapiddns", "thc-org"]
/// disabled = ["chaxunle"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Source selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourcesConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Output file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Per-request timeout (as string, e.g., "15s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Whole-lookup timeout per source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_timeout: Option<String>,

    /// Millisecond jitter range, e.g. "100-500"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<String>,
}

/// Which built-in sources to query.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourcesConfig {
    /// Only these sources (empty or missing means all)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    /// Never these sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` when the file is missing or unreadable, `ConfigError` when
    /// it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, IpFinderError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IpFinderError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            IpFinderError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            IpFinderError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest layer, then `~/.ipfinder.toml`, then a file in
    /// the current directory. A broken file is skipped with a warning rather
    /// than aborting discovery.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged = self.merge_configs(merged, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        if self.verbose && !loaded_files.is_empty() {
            for path in &loaded_files {
                info!(path = %path.display(), "loaded config file");
            }
        }

        merged
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./ipfinder.toml", "./.ipfinder.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".ipfinder.toml");
        path.exists().then_some(path)
    }

    /// Follows the XDG Base Directory layout.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("ipfinder").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations, values from `higher` winning.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    concurrency: higher.concurrency.or(lower.concurrency),
                    output: higher.output.or(lower.output),
                    timeout: higher.timeout.or(lower.timeout),
                    source_timeout: higher.source_timeout.or(lower.source_timeout),
                    jitter: higher.jitter.or(lower.jitter),
                }),
                (lower, higher) => higher.or(lower),
            },
            sources: match (lower.sources, higher.sources) {
                (Some(lower), Some(higher)) => Some(SourcesConfig {
                    enabled: higher.enabled.or(lower.enabled),
                    disabled: higher.disabled.or(lower.disabled),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), IpFinderError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(IpFinderError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            for (key, value) in [
                ("timeout", &defaults.timeout),
                ("source_timeout", &defaults.source_timeout),
            ] {
                if let Some(value) = value {
                    if parse_duration_str(value).is_none() {
                        return Err(IpFinderError::config(format!(
                            "Invalid {} '{}'. Use a non-zero duration like '15s', '2m'",
                            key, value
                        )));
                    }
                }
            }

            if let Some(jitter) = &defaults.jitter {
                if parse_jitter_range(jitter).is_none() {
                    return Err(IpFinderError::config(format!(
                        "Invalid jitter '{}'. Use MIN-MAX milliseconds with MIN <= MAX",
                        jitter
                    )));
                }
            }

            if let Some(output) = &defaults.output {
                if output.trim().is_empty() {
                    return Err(IpFinderError::config("Output path cannot be empty"));
                }
            }
        }

        if let Some(sources) = &config.sources {
            let names = sources.enabled.iter().chain(sources.disabled.iter()).flatten();
            for name in names {
                if !SOURCE_NAMES.contains(&name.trim().to_lowercase().as_str()) {
                    return Err(IpFinderError::config(format!(
                        "Unknown source '{}' in config. Available: {}",
                        name,
                        SOURCE_NAMES.join(", ")
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `IPF_*` variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub output: Option<String>,
    pub timeout: Option<String>,
    pub sources: Option<Vec<String>>,
    pub exclude_sources: Option<Vec<String>>,
    pub jitter: Option<(u64, u64)>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from any key lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("IPF_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => {
                debug!(value = n, "using IPF_CONCURRENCY");
                env_config.concurrency = Some(n);
            }
            _ => warn!(
                value = %val,
                "invalid IPF_CONCURRENCY, must be 1-{}",
                MAX_CONCURRENCY
            ),
        }
    }

    if let Some(output) = non_empty(lookup("IPF_OUTPUT")) {
        debug!(value = %output, "using IPF_OUTPUT");
        env_config.output = Some(output);
    }

    if let Some(timeout) = non_empty(lookup("IPF_TIMEOUT")) {
        if parse_duration_str(&timeout).is_some() {
            debug!(value = %timeout, "using IPF_TIMEOUT");
            env_config.timeout = Some(timeout);
        } else {
            warn!(
                value = %timeout,
                "invalid IPF_TIMEOUT, use a non-zero duration like '15s', '2m'"
            );
        }
    }

    env_config.sources = lookup("IPF_SOURCES").and_then(|v| split_list(&v));
    env_config.exclude_sources = lookup("IPF_EXCLUDE_SOURCES").and_then(|v| split_list(&v));

    if let Some(jitter) = non_empty(lookup("IPF_JITTER")) {
        match parse_jitter_range(&jitter) {
            Some(range) => {
                debug!(value = %jitter, "using IPF_JITTER");
                env_config.jitter = Some(range);
            }
            None => warn!(value = %jitter, "invalid IPF_JITTER, use MIN-MAX milliseconds"),
        }
    }

    if let Some(config) = non_empty(lookup("IPF_CONFIG")) {
        debug!(value = %config, "using IPF_CONFIG");
        env_config.config = Some(config);
    }

    env_config
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated list, dropping empty items.
pub fn split_list(input: &str) -> Option<Vec<String>> {
    let items: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"
[defaults]
concurrency = 50
output = "out/domains.txt"
timeout = "20s"
jitter = "100-400"

[sources]
disabled = ["chaxunle"]
"#,
        );

        let config = ConfigManager::new(false).load_file(file.path()).unwrap();
        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(50));
        assert_eq!(defaults.output.as_deref(), Some("out/domains.txt"));
        assert_eq!(defaults.timeout.as_deref(), Some("20s"));
        assert_eq!(defaults.jitter.as_deref(), Some("100-400"));

        let sources = config.sources.unwrap();
        assert!(sources.enabled.is_none());
        assert_eq!(sources.disabled, Some(vec!["chaxunle".to_string()]));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let manager = ConfigManager::new(false);

        for content in [
            "[defaults]\nconcurrency = 0\n",
            "[defaults]\nconcurrency = 10000\n",
            "[defaults]\ntimeout = \"soon\"\n",
            "[defaults]\ntimeout = \"0s\"\n",
            "[defaults]\nsource_timeout = \"0\"\n",
            "[defaults]\njitter = \"900-100\"\n",
            "[sources]\nenabled = [\"shodan\"]\n",
            "not toml at all [",
        ] {
            let file = write_config(content);
            let err = manager.load_file(file.path()).unwrap_err();
            assert!(
                matches!(err, IpFinderError::ConfigError { .. }),
                "expected config error for {:?}",
                content
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigManager::new(false)
            .load_file("/no/such/ipfinder.toml")
            .unwrap_err();
        assert!(matches!(err, IpFinderError::FileError { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                output: Some("lower.txt".to_string()),
                ..Default::default()
            }),
            sources: Some(SourcesConfig {
                enabled: Some(vec!["rapiddns".to_string()]),
                disabled: None,
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(80),
                ..Default::default()
            }),
            sources: None,
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(80)); // Higher wins
        assert_eq!(defaults.output.as_deref(), Some("lower.txt")); // Lower preserved
        assert_eq!(
            merged.sources.unwrap().enabled,
            Some(vec!["rapiddns".to_string()])
        );
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("IPF_CONCURRENCY", "64"),
            ("IPF_OUTPUT", "env.txt"),
            ("IPF_TIMEOUT", "30s"),
            ("IPF_SOURCES", "RapidDNS, thc-org,"),
            ("IPF_JITTER", "50-150"),
            ("IPF_CONFIG", "  "),
        ]
        .into_iter()
        .collect();

        let env_config = env_config_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(env_config.concurrency, Some(64));
        assert_eq!(env_config.output.as_deref(), Some("env.txt"));
        assert_eq!(env_config.timeout.as_deref(), Some("30s"));
        assert_eq!(
            env_config.sources,
            Some(vec!["rapiddns".to_string(), "thc-org".to_string()])
        );
        assert_eq!(env_config.jitter, Some((50, 150)));
        assert!(env_config.config.is_none());
        assert!(env_config.exclude_sources.is_none());
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("IPF_CONCURRENCY", "0"),
            ("IPF_TIMEOUT", "forever"),
            ("IPF_JITTER", "9-1"),
        ]
        .into_iter()
        .collect();

        let env_config = env_config_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(env_config, EnvConfig::default());
    }

    #[test]
    fn test_env_config_ignores_zero_timeout() {
        let env_config = env_config_from(|k| (k == "IPF_TIMEOUT").then(|| "0".to_string()));
        assert!(env_config.timeout.is_none());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("a, B ,,c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(split_list(" , "), None);
    }
}
