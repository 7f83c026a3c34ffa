// ErrWarden - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ErrWarden";

/// Application identifier used for config/data directories and the lock file.
pub const APP_ID: &str = "errwarden";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Source log
// =============================================================================

/// Default path of the Apache error log consumed by the driver.
pub const DEFAULT_SOURCE_PATH: &str = "/var/log/apache2/error.log";

// =============================================================================
// Polling
// =============================================================================

/// Pause between two cycles in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

/// Smallest accepted poll interval (0 would spin the CPU).
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Largest accepted poll interval (one hour).
pub const MAX_POLL_INTERVAL_MS: u64 = 60 * 60 * 1000;

// =============================================================================
// Grammar
// =============================================================================

/// Identifier of the built-in Apache 2.4 error-log grammar.
pub const BUILTIN_GRAMMAR_ID: &str = "apache-error";

/// Version of the built-in grammar definition.
pub const BUILTIN_GRAMMAR_VERSION: u32 = 1;

/// Maximum length of a grammar line pattern loaded from disk.
pub const MAX_GRAMMAR_PATTERN_LENGTH: usize = 4096;

/// Maximum size of a grammar definition file in bytes.
pub const MAX_GRAMMAR_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Normalised timestamp layout written into every `LogEntry`.
pub const OCCURRED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Fragment prefix that marks the start of a PHP-style stack trace block.
pub const STACK_TRACE_MARKER: &str = "Stack trace:";

// =============================================================================
// Store / sink
// =============================================================================

/// File name of the JSON-lines store inside the data directory.
pub const DEFAULT_STORE_FILE_NAME: &str = "records.jsonl";

/// File name of the ignore list inside the config directory.
pub const DEFAULT_IGNORE_LIST_FILE_NAME: &str = "ignored.txt";

/// Severity level stamped on every stored record.
pub const RECORD_LEVEL: u8 = 3;

/// Meta tag used when the process reports its own fatal error.
pub const SELF_REPORT_META: &str = "errwarden";

// =============================================================================
// Lock
// =============================================================================

/// File name of the single-instance lock inside the data directory.
pub const LOCK_FILE_NAME: &str = "errwarden.lock";

// =============================================================================
// Configuration
// =============================================================================

/// Name of the TOML configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Tracing target of the per-entry "Forwarding error" events.
pub const FORWARDED_LOG_TARGET: &str = "errwarden::forwarded";

// =============================================================================
// Exit codes
// =============================================================================

/// Process exit code for any fatal error.
pub const EXIT_FATAL: u8 = 1;
