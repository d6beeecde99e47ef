//! IP Finder CLI Application
//!
//! A command-line interface for reverse-IP domain discovery.
//! This CLI application provides a user-friendly interface to the ipfinder-lib library:
//! it resolves configuration, loads target IPs, wires Ctrl-C to cancellation and
//! renders progress while the scan runs.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{CommandFactory, Parser};
use ipfinder_lib::{load_env_config, ConfigManager, EnvConfig, FileConfig};
use ipfinder_lib::{
    load_ip_file, parse_duration_str, parse_jitter_range, select_sources, validate_ip, ScanConfig,
    Scanner,
};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for ipfinder
#[derive(Parser, Debug, Default)]
#[command(name = "ipfinder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "VampXDH")]
#[command(about = "Find domains hosted on an IP address using multiple reverse-IP sources")]
#[command(
    long_about = "Find domains hosted on an IP address using multiple reverse-IP sources.\n\nQueries RapidDNS, WebScan, TNTcode, NetworksDB, Chaxunle and THC.org concurrently across IPs and writes the deduplicated results to one file.",
    after_help = "Examples:\n  ipfinder -d 8.8.8.8\n  ipfinder -l ips.txt -t 100 -o results.txt\n  ipfinder -d 1.1.1.1 -v\n  ipfinder -l ips.txt --silent"
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Single IP address to scan
    #[arg(short = 'd', long = "ip", value_name = "IP", help_heading = "Input")]
    pub ip: Option<String>,

    /// File containing IPs (one per line, # comments allowed)
    #[arg(short = 'l', long = "list", value_name = "FILE", help_heading = "Input")]
    pub list: Option<String>,

    /// Output file [default: results/domains.txt]
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<String>,

    /// Verbose output (per-source results and failures)
    #[arg(short = 'v', long = "verbose", help_heading = "Output")]
    pub verbose: bool,

    /// Silent mode (only prints the domain count)
    #[arg(long = "silent", help_heading = "Output")]
    pub silent: bool,

    /// Disable color output
    #[arg(long = "no-color", help_heading = "Output")]
    pub no_color: bool,

    /// Number of concurrent workers [default: 30, max: 500]
    #[arg(
        short = 't',
        long = "threads",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Performance"
    )]
    pub threads: Option<i64>,

    /// Per-request timeout, e.g. 15s, 2m [default: 15s]
    #[arg(long = "timeout", value_name = "DUR", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Random delay before each request, in milliseconds (e.g. 100-500)
    #[arg(long = "jitter", value_name = "MIN-MAX", help_heading = "Performance")]
    pub jitter: Option<String>,

    /// Only query these sources (comma-separated)
    #[arg(
        long = "sources",
        value_name = "NAMES",
        value_delimiter = ',',
        help_heading = "Sources"
    )]
    pub sources: Option<Vec<String>>,

    /// Skip these sources (comma-separated)
    #[arg(
        long = "exclude-sources",
        value_name = "NAMES",
        value_delimiter = ',',
        help_heading = "Sources"
    )]
    pub exclude_sources: Option<Vec<String>>,

    /// List available sources and exit
    #[arg(long = "list-sources", help_heading = "Sources")]
    pub list_sources: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,
}

/// Fully resolved settings after config file, environment and CLI merging.
#[derive(Debug, Default)]
struct Settings {
    scan: ScanConfig,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[tokio::main]
async fn main() {
    // No arguments at all: show help and exit cleanly
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().print_help();
        println!();
        return;
    }

    let args = Args::parse();

    ui::configure_colors(!args.no_color);
    init_logging(&args);

    if let Err(e) = run(args).await {
        ui::error(&e.to_string());
        process::exit(1);
    }
}

/// Install the tracing subscriber on stderr. `RUST_LOG` overrides the default.
fn init_logging(args: &Args) {
    let default_directive = if args.silent {
        "error"
    } else if args.verbose {
        "ipfinder=info,ipfinder_lib=info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!args.no_color)
        .try_init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.ip.is_none() && args.list.is_none() {
        return Err("Either -d (single IP) or -l (IP list file) must be specified".to_string());
    }

    if args.verbose && args.silent {
        return Err("--verbose and --silent cannot be used together".to_string());
    }

    if let Some(timeout) = &args.timeout {
        if parse_duration_str(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use a non-zero duration like '15s', '2m'",
                timeout
            ));
        }
    }

    if let Some(jitter) = &args.jitter {
        if parse_jitter_range(jitter).is_none() {
            return Err(format!(
                "Invalid jitter '{}'. Use MIN-MAX milliseconds with MIN <= MAX",
                jitter
            ));
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.list_sources {
        ui::print_sources();
        return Ok(());
    }

    validate_args(&args)?;

    let settings = build_settings(&args)?;
    let sources = select_sources(&settings.include, &settings.exclude)?;
    let ips = load_targets(&args)?;

    tracing::debug!(?settings, ips = ips.len(), "resolved settings");

    if !args.silent {
        ui::print_banner();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        ui::print_scan_header(
            ips.len(),
            &names,
            settings.scan.concurrency,
            &settings.scan.output,
        );
    }

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone(), args.silent);

    let total = ips.len();
    let output = settings.scan.output.clone();
    let mut scanner = Scanner::new(ips, settings.scan)
        .with_sources(sources)
        .with_cancellation(cancel);

    let progress = if args.silent {
        None
    } else {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        scanner = scanner.with_events(tx);
        Some(tokio::spawn(ui::report_progress(rx, args.verbose, total)))
    };

    let result = scanner.run().await;
    // Dropping the scanner closes the event channel so the printer can finish
    drop(scanner);
    if let Some(progress) = progress {
        let _ = progress.await;
    }

    let summary = result?;
    ui::print_summary(&summary, &output, args.silent);

    Ok(())
}

/// Load target IPs from `-d` or `-l`. A single `-d` value takes priority.
fn load_targets(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(ip) = &args.ip {
        if args.list.is_some() {
            tracing::warn!("both -d and -l given, scanning only the -d address");
        }
        return Ok(vec![validate_ip(ip)?]);
    }

    let Some(path) = &args.list else {
        return Err("Either -d (single IP) or -l (IP list file) must be specified".into());
    };

    let parsed = load_ip_file(path)?;
    for line in &parsed.invalid {
        ui::warning(&format!(
            "Invalid IP address on line {}: {}",
            line.line_number, line.content
        ));
    }

    Ok(parsed.ips)
}

/// Build settings with precedence: CLI > environment > config file > defaults.
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    // Step 1: explicit config file (CLI, then IPF_CONFIG) or discovery
    let file_config = if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        tracing::info!(path = %path, "using explicit config file");
        config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
    } else {
        config_manager.discover_and_load()
    };

    let mut settings = Settings::default();
    apply_file_config(&mut settings, file_config);

    // Step 2: environment variables (IPF_*)
    apply_env_config(&mut settings, &env_config);

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args(&mut settings, args);

    Ok(settings)
}

/// Apply a validated FileConfig.
fn apply_file_config(settings: &mut Settings, file_config: FileConfig) {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            settings.scan = settings.scan.clone().with_concurrency(concurrency);
        }
        if let Some(output) = defaults.output {
            settings.scan.output = output.into();
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_str) {
            settings.scan.request_timeout = timeout;
        }
        if let Some(timeout) = defaults.source_timeout.as_deref().and_then(parse_duration_str) {
            settings.scan.source_timeout = timeout;
        }
        if let Some((min, max)) = defaults.jitter.as_deref().and_then(parse_jitter_range) {
            settings.scan.jitter_ms = Some((min, max));
        }
    }

    if let Some(sources) = file_config.sources {
        if let Some(enabled) = sources.enabled {
            settings.include = enabled;
        }
        if let Some(disabled) = sources.disabled {
            settings.exclude = disabled;
        }
    }
}

fn apply_env_config(settings: &mut Settings, env_config: &EnvConfig) {
    if let Some(concurrency) = env_config.concurrency {
        settings.scan.concurrency = concurrency;
    }
    if let Some(output) = &env_config.output {
        settings.scan.output = output.into();
    }
    if let Some(timeout) = env_config.timeout.as_deref().and_then(parse_duration_str) {
        settings.scan.request_timeout = timeout;
    }
    if let Some(jitter) = env_config.jitter {
        settings.scan.jitter_ms = Some(jitter);
    }
    if let Some(sources) = &env_config.sources {
        settings.include = sources.clone();
    }
    if let Some(exclude) = &env_config.exclude_sources {
        settings.exclude = exclude.clone();
    }
}

fn apply_cli_args(settings: &mut Settings, args: &Args) {
    if let Some(threads) = args.threads {
        if threads < 1 {
            tracing::warn!(threads, "thread count below 1 raised to 1");
        }
        let threads = usize::try_from(threads.max(1)).unwrap_or(usize::MAX);
        settings.scan = settings.scan.clone().with_concurrency(threads);
    }
    if let Some(output) = &args.output {
        settings.scan.output = output.into();
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_str) {
        settings.scan.request_timeout = timeout;
    }
    if let Some((min, max)) = args.jitter.as_deref().and_then(parse_jitter_range) {
        settings.scan = settings.scan.clone().with_jitter(min, max);
    }
    if let Some(sources) = &args.sources {
        settings.include = sources.clone();
    }
    if let Some(exclude) = &args.exclude_sources {
        settings.exclude = exclude.clone();
    }
}

/// Cancel the scan on Ctrl-C or SIGTERM.
fn spawn_signal_handler(cancel: CancellationToken, silent: bool) {
    tokio::spawn(async move {
        shutdown_signal().await;
        if !silent {
            ui::warning("Interrupt received, finishing in-flight work...");
        }
        cancel.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        // a handler that cannot be installed must never look like a signal
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => ctrl_c.await,
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipfinder_lib::{DefaultsConfig, SourcesConfig, DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
    use std::path::PathBuf;
    use std::time::Duration;

    fn args_with_ip() -> Args {
        Args {
            ip: Some("8.8.8.8".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args_requires_input() {
        let err = validate_args(&Args::default()).unwrap_err();
        assert!(err.contains("-d"));
        assert!(validate_args(&args_with_ip()).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_values() {
        let args = Args {
            timeout: Some("soon".to_string()),
            ..args_with_ip()
        };
        assert!(validate_args(&args).is_err());

        let args = Args {
            timeout: Some("0s".to_string()),
            ..args_with_ip()
        };
        assert!(validate_args(&args).unwrap_err().contains("non-zero"));

        let args = Args {
            jitter: Some("500-100".to_string()),
            ..args_with_ip()
        };
        assert!(validate_args(&args).is_err());

        let args = Args {
            verbose: true,
            silent: true,
            ..args_with_ip()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut settings = Settings::default();

        apply_file_config(
            &mut settings,
            FileConfig {
                defaults: Some(DefaultsConfig {
                    concurrency: Some(10),
                    output: Some("file.txt".to_string()),
                    timeout: Some("20s".to_string()),
                    source_timeout: Some("2m".to_string()),
                    jitter: Some("10-20".to_string()),
                }),
                sources: Some(SourcesConfig {
                    enabled: None,
                    disabled: Some(vec!["chaxunle".to_string()]),
                }),
            },
        );
        assert_eq!(settings.scan.concurrency, 10);
        assert_eq!(settings.scan.source_timeout, Duration::from_secs(120));

        apply_env_config(
            &mut settings,
            &EnvConfig {
                concurrency: Some(40),
                output: Some("env.txt".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(settings.scan.concurrency, 40);
        assert_eq!(settings.scan.output, PathBuf::from("env.txt"));

        let args = Args {
            threads: Some(99),
            sources: Some(vec!["rapiddns".to_string()]),
            ..args_with_ip()
        };
        apply_cli_args(&mut settings, &args);

        assert_eq!(settings.scan.concurrency, 99);
        assert_eq!(settings.scan.output, PathBuf::from("env.txt"));
        assert_eq!(settings.scan.request_timeout, Duration::from_secs(20));
        assert_eq!(settings.scan.jitter_ms, Some((10, 20)));
        assert_eq!(settings.include, vec!["rapiddns"]);
        assert_eq!(settings.exclude, vec!["chaxunle"]);
    }

    #[test]
    fn test_non_positive_threads_clamped() {
        for threads in [0, -5, i64::MIN] {
            let mut settings = Settings::default();
            assert_eq!(settings.scan.concurrency, DEFAULT_CONCURRENCY);

            let args = Args {
                threads: Some(threads),
                ..args_with_ip()
            };
            apply_cli_args(&mut settings, &args);
            assert_eq!(settings.scan.concurrency, 1, "threads = {}", threads);
        }

        let mut settings = Settings::default();
        let args = Args {
            threads: Some(i64::MAX),
            ..args_with_ip()
        };
        apply_cli_args(&mut settings, &args);
        assert_eq!(settings.scan.concurrency, MAX_CONCURRENCY);
    }

    #[test]
    fn test_threads_flag_accepts_negative_numbers() {
        let args = Args::try_parse_from(["ipfinder", "-d", "8.8.8.8", "-t", "-5"]).unwrap();
        assert_eq!(args.threads, Some(-5));
        assert_eq!(args.ip.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn test_load_targets_single_ip() {
        assert_eq!(load_targets(&args_with_ip()).unwrap(), vec!["8.8.8.8"]);

        let args = Args {
            ip: Some("300.1.1.1".to_string()),
            ..Default::default()
        };
        assert!(load_targets(&args)
            .unwrap_err()
            .to_string()
            .contains("Invalid IP address"));
    }
}
