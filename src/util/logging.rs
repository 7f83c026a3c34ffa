// ErrWarden - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output: stderr only. Forwarded entries are logged under their own target
// and stay visible at info even when the configured level is quieter, so an
// operator watching the process sees every record the store receives.
// RUST_LOG is taken verbatim and can silence them.

use super::constants;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = if debug_flag {
            "debug"
        } else {
            config_level.unwrap_or(constants::DEFAULT_LOG_LEVEL)
        };
        EnvFilter::new(filter_directives(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = constants::APP_NAME,
        version = constants::APP_VERSION,
        "Logging initialised"
    );
}

/// Base level plus an info floor for forwarded entries.
fn filter_directives(level: &str) -> String {
    format!("{level},{}=info", constants::FORWARDED_LOG_TARGET)
}
