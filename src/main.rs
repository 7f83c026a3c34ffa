// ErrWarden - main.rs
//
// Process entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading, CLI overrides, validation
// 3. Logging initialisation
// 4. Single-instance lock, host name, record store
// 5. Running the cycle driver until a fatal error (or once, with --once)

use clap::Parser;
use errwarden::app::driver::{self, CycleDriver};
use errwarden::app::grammar_mgr;
use errwarden::app::ignore_list::FileIgnoreList;
use errwarden::app::sink::JsonLinesSink;
use errwarden::platform::config::{self, AppConfig, PlatformPaths};
use errwarden::platform::fs::{DrainMode, SourceDrain};
use errwarden::platform::host;
use errwarden::platform::lock::InstanceLock;
use errwarden::util;
use errwarden::util::error::Result;
use std::path::PathBuf;
use std::process::ExitCode;

/// ErrWarden - forwards new Apache error-log records to a durable store.
///
/// Drains the error log on a fixed interval, reassembles multi-line errors,
/// drops errors whose fingerprint is on the ignore list, and records the rest.
#[derive(Parser, Debug)]
#[command(name = "errwarden", version, about)]
struct Cli {
    /// Error log to drain.
    #[arg(short = 'e', long = "error-log")]
    error_log: Option<PathBuf>,

    /// How to consume the error log: "truncate" or "offset".
    #[arg(long = "drain-mode")]
    drain_mode: Option<DrainMode>,

    /// Pause between cycles in milliseconds.
    #[arg(short = 'i', long = "interval-ms")]
    interval_ms: Option<u64>,

    /// JSON-lines record store.
    #[arg(short = 's', long = "store")]
    store: Option<PathBuf>,

    /// File of acknowledged fingerprints, one per line.
    #[arg(long = "ignore-list")]
    ignore_list: Option<PathBuf>,

    /// TOML grammar definition replacing the built-in Apache grammar.
    #[arg(long = "grammar")]
    grammar: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Single-instance lock file.
    #[arg(long = "lock-file")]
    lock_file: Option<PathBuf>,

    /// Run a single cycle and exit.
    #[arg(long = "once")]
    once: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    /// Command-line flags take priority over config.toml.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(ref path) = self.error_log {
            config.source_path = path.clone();
        }
        if let Some(mode) = self.drain_mode {
            config.drain_mode = mode;
        }
        if let Some(ms) = self.interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ref store) = self.store {
            config.store_path = store.clone();
        }
        if let Some(ref ignore) = self.ignore_list {
            config.ignore_list_path = ignore.clone();
        }
        if let Some(ref grammar) = self.grammar {
            config.grammar_file = Some(grammar.clone());
        }
        if let Some(ref lock) = self.lock_file {
            config.lock_path = lock.clone();
        }
    }
}

fn build_config(cli: &Cli) -> Result<(AppConfig, Vec<String>)> {
    let paths = PlatformPaths::resolve();
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let defaults = AppConfig::defaults_for(&paths);
    let (mut config, warnings) = config::load_config(&config_path, defaults)?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok((config, warnings))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, warnings) = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            util::logging::init(cli.debug, None);
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            return ExitCode::from(util::constants::EXIT_FATAL);
        }
    };

    util::logging::init(cli.debug, config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        source = %config.source_path.display(),
        store = %config.store_path.display(),
        ignore_list = %config.ignore_list_path.display(),
        "ErrWarden starting"
    );

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error, exiting");
            eprintln!("Error: {e}");
            ExitCode::from(util::constants::EXIT_FATAL)
        }
    }
}

/// Everything that needs the instance lock. Errors raised once the store is
/// open are also written into it before returning.
fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let _lock = InstanceLock::acquire(&config.lock_path)?;
    let mut sink = JsonLinesSink::open(&config.store_path)?;

    // Without a host name the self-report carries an empty one.
    let hostname = driver::reported(host::resolve_hostname(), &mut sink, "")?;
    let grammar = driver::reported(
        grammar_mgr::load_grammar(config.grammar_file.as_deref()),
        &mut sink,
        &hostname,
    )?;

    let mut driver = CycleDriver::new(
        SourceDrain::new(config.source_path.clone(), config.drain_mode),
        grammar,
        FileIgnoreList::new(config.ignore_list_path.clone()),
        sink,
        hostname,
        config.poll_interval(),
    );

    let result = if cli.once {
        driver.run_cycle().map(|report| {
            tracing::info!(
                dispatched = report.dispatched,
                suppressed = report.suppressed,
                bytes = report.bytes_read,
                "Single cycle complete"
            );
        })
    } else {
        driver.run().map(|never| match never {})
    };

    if let Err(ref e) = result {
        driver.report_fatal(e);
    }
    result
}
