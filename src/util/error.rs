// ErrWarden - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. Every error reaching the cycle driver is
// fatal; the chain is kept intact so the fatal report names the root cause.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ErrWarden operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ErrWardenError {
    /// Grammar definition loading or validation failed.
    Grammar(GrammarError),

    /// Log content could not be turned into entries.
    Parse(ParseError),

    /// The source log could not be read or drained.
    Source(SourceError),

    /// The ignore list could not be loaded.
    IgnoreList(IgnoreListError),

    /// The record store rejected a write.
    Sink(SinkError),

    /// The single-instance lock could not be taken.
    Lock(LockError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for ErrWardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grammar(e) => write!(f, "Grammar error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Source(e) => write!(f, "Source error: {e}"),
            Self::IgnoreList(e) => write!(f, "Ignore list error: {e}"),
            Self::Sink(e) => write!(f, "Store error: {e}"),
            Self::Lock(e) => write!(f, "Lock error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for ErrWardenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grammar(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::IgnoreList(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Lock(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar errors
// ---------------------------------------------------------------------------

/// Errors related to loading and compiling a log grammar.
#[derive(Debug)]
pub enum GrammarError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Grammar file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField {
        grammar_id: String,
        field: &'static str,
    },

    /// The line pattern is not a valid regex.
    InvalidRegex {
        grammar_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// The line pattern exceeds the maximum allowed length.
    PatternTooLong {
        grammar_id: String,
        length: usize,
        max_length: usize,
    },

    /// The line pattern does not expose the six capture groups the parser reads.
    CaptureCount {
        grammar_id: String,
        expected: usize,
        found: usize,
    },

    /// I/O error reading a grammar file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Grammar '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { grammar_id, field } => {
                write!(f, "Grammar '{grammar_id}': missing required field '{field}'")
            }
            Self::InvalidRegex {
                grammar_id,
                pattern,
                source,
            } => write!(
                f,
                "Grammar '{grammar_id}': invalid line pattern ('{pattern}'): {source}"
            ),
            Self::PatternTooLong {
                grammar_id,
                length,
                max_length,
            } => write!(
                f,
                "Grammar '{grammar_id}': line pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::CaptureCount {
                grammar_id,
                expected,
                found,
            } => write!(
                f,
                "Grammar '{grammar_id}': line pattern has {found} capture groups, \
                 expected {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "I/O error reading grammar '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<GrammarError> for ErrWardenError {
    fn from(e: GrammarError) -> Self {
        Self::Grammar(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors raised while turning matched lines into entries.
#[derive(Debug)]
pub enum ParseError {
    /// A timestamp did not fit the grammar's timestamp format.
    TimestampParse {
        raw_timestamp: String,
        format: String,
        source: chrono::ParseError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampParse {
                raw_timestamp,
                format,
                source,
            } => write!(
                f,
                "cannot parse timestamp '{raw_timestamp}' with format '{format}': {source}"
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TimestampParse { source, .. } => Some(source),
        }
    }
}

impl From<ParseError> for ErrWardenError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Source errors
// ---------------------------------------------------------------------------

/// Errors reading or draining the source log file.
#[derive(Debug)]
pub enum SourceError {
    /// The file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The file could not be truncated after reading.
    Truncate { path: PathBuf, source: io::Error },

    /// The file size could not be determined (offset drain mode).
    Metadata { path: PathBuf, source: io::Error },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::Truncate { path, source } => {
                write!(f, "cannot truncate '{}': {source}", path.display())
            }
            Self::Metadata { path, source } => {
                write!(f, "cannot stat '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Truncate { source, .. } => Some(source),
            Self::Metadata { source, .. } => Some(source),
        }
    }
}

impl From<SourceError> for ErrWardenError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Ignore list errors
// ---------------------------------------------------------------------------

/// Errors loading the set of suppressed fingerprints.
#[derive(Debug)]
pub enum IgnoreListError {
    /// The ignore list exists but could not be read.
    Io { path: PathBuf, source: io::Error },

    /// A line is not a 56-character hex SHA3-224 fingerprint.
    InvalidFingerprint {
        path: PathBuf,
        line_number: usize,
        value: String,
        source: hex::FromHexError,
    },
}

impl fmt::Display for IgnoreListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read ignore list '{}': {source}", path.display())
            }
            Self::InvalidFingerprint {
                path,
                line_number,
                value,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: '{value}' is not a fingerprint: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for IgnoreListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidFingerprint { source, .. } => Some(source),
        }
    }
}

impl From<IgnoreListError> for ErrWardenError {
    fn from(e: IgnoreListError) -> Self {
        Self::IgnoreList(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Errors writing records or notifications to the store.
#[derive(Debug)]
pub enum SinkError {
    /// I/O error opening or appending to the store.
    Io { path: PathBuf, source: io::Error },

    /// A record could not be serialised.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "store I/O error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "store serialisation error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<SinkError> for ErrWardenError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Lock errors
// ---------------------------------------------------------------------------

/// Errors acquiring the single-instance lock.
#[derive(Debug)]
pub enum LockError {
    /// Another live instance holds the lock.
    AlreadyRunning { path: PathBuf, pid: Option<u32> },

    /// The lock file could not be created or inspected.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning { path, pid: Some(pid) } => write!(
                f,
                "another instance (pid {pid}) is already running, lock '{}'",
                path.display()
            ),
            Self::AlreadyRunning { path, pid: None } => write!(
                f,
                "another instance is already running, lock '{}'",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "failed to acquire lock '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LockError> for ErrWardenError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },

    /// The host name could not be determined.
    Hostname { source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
            Self::Hostname { source } => write!(f, "cannot determine host name: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Hostname { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ErrWardenError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ErrWarden results.
pub type Result<T> = std::result::Result<T, ErrWardenError>;
