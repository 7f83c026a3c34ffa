// ErrWarden - platform/config.rs
//
// Platform-specific directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::platform::fs::DrainMode;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for ErrWarden configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/errwarden/)
    pub config_dir: PathBuf,

    /// Data directory for the record store and lock file.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[source]` section.
    pub source: SourceSection,
    /// `[polling]` section.
    pub polling: PollingSection,
    /// `[store]` section.
    pub store: StoreSection,
    /// `[suppression]` section.
    pub suppression: SuppressionSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[source]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Error log to drain.
    pub path: Option<String>,
    /// "truncate" or "offset".
    pub drain_mode: Option<String>,
    /// Optional TOML grammar definition replacing the built-in one.
    pub grammar_file: Option<String>,
}

/// `[polling]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PollingSection {
    /// Pause between cycles in milliseconds.
    pub interval_ms: Option<u64>,
}

/// `[store]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// JSON-lines record store.
    pub path: Option<String>,
}

/// `[suppression]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SuppressionSection {
    /// File of acknowledged fingerprints.
    pub ignore_list: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Source --
    pub source_path: PathBuf,
    pub drain_mode: DrainMode,
    pub grammar_file: Option<PathBuf>,

    // -- Polling --
    pub poll_interval_ms: u64,

    // -- Collaborators --
    pub store_path: PathBuf,
    pub ignore_list_path: PathBuf,
    pub lock_path: PathBuf,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Defaults rooted in the resolved platform directories.
    pub fn defaults_for(paths: &PlatformPaths) -> Self {
        Self {
            source_path: PathBuf::from(constants::DEFAULT_SOURCE_PATH),
            drain_mode: DrainMode::default(),
            grammar_file: None,
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            store_path: paths.data_dir.join(constants::DEFAULT_STORE_FILE_NAME),
            ignore_list_path: paths.config_dir.join(constants::DEFAULT_IGNORE_LIST_FILE_NAME),
            lock_path: paths.data_dir.join(constants::LOCK_FILE_NAME),
            log_level: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Final check after CLI overrides have been applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS)
            .contains(&self.poll_interval_ms)
        {
            return Err(ConfigError::ValueOutOfRange {
                field: "polling.interval_ms".to_string(),
                value: self.poll_interval_ms.to_string(),
                expected: format!(
                    "{}-{}",
                    constants::MIN_POLL_INTERVAL_MS,
                    constants::MAX_POLL_INTERVAL_MS
                ),
            });
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(ConfigError::ValueOutOfRange {
                field: "source.path".to_string(),
                value: String::new(),
                expected: "a non-empty path".to_string(),
            });
        }
        Ok(())
    }
}

/// Load and validate config.toml at `config_path` on top of `defaults`.
///
/// Returns the config and a list of non-fatal warnings. A missing file yields
/// the defaults with no warnings (first run). An unreadable or unparseable
/// file is an error: the driver must not start on a config the operator did
/// not intend. Out-of-range values produce warnings and keep their default.
pub fn load_config(
    config_path: &Path,
    defaults: AppConfig,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return Ok((defaults, warnings));
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let mut config = defaults;

    // -- Source --
    if let Some(path) = raw.source.path {
        if path.is_empty() {
            warnings.push("[source] path is empty. Using default.".to_string());
        } else {
            config.source_path = PathBuf::from(path);
        }
    }
    if let Some(ref mode) = raw.source.drain_mode {
        match mode.parse::<DrainMode>() {
            Ok(m) => config.drain_mode = m,
            Err(e) => warnings.push(format!(
                "[source] drain_mode: {e}. Using default ({}).",
                DrainMode::default()
            )),
        }
    }
    if let Some(grammar) = raw.source.grammar_file {
        if !grammar.is_empty() {
            config.grammar_file = Some(PathBuf::from(grammar));
        }
    }

    // -- Polling: interval_ms --
    if let Some(ms) = raw.polling.interval_ms {
        if (constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS).contains(&ms) {
            config.poll_interval_ms = ms;
        } else {
            warnings.push(format!(
                "[polling] interval_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_POLL_INTERVAL_MS,
                constants::MAX_POLL_INTERVAL_MS,
                constants::DEFAULT_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Store / suppression --
    if let Some(store) = raw.store.path {
        if !store.is_empty() {
            config.store_path = PathBuf::from(store);
        }
    }
    if let Some(ignore) = raw.suppression.ignore_list {
        if !ignore.is_empty() {
            config.ignore_list_path = PathBuf::from(ignore);
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    Ok((config, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths(root: &Path) -> PlatformPaths {
        PlatformPaths {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(dir.path());

        let (config, warnings) =
            load_config(&paths.config_file(), AppConfig::defaults_for(&paths)).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(config.source_path, PathBuf::from("/var/log/apache2/error.log"));
        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.drain_mode, DrainMode::Truncate);
        assert_eq!(config.store_path, dir.path().join("data").join("records.jsonl"));
    }

    #[test]
    fn test_valid_values_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(dir.path());
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            r#"
[source]
path = "/srv/www/logs/error.log"
drain_mode = "offset"

[polling]
interval_ms = 500

[store]
path = "/tmp/records.jsonl"

[suppression]
ignore_list = "/etc/errwarden/ignored.txt"

[logging]
level = "DEBUG"
"#,
        )
        .unwrap();

        let (config, warnings) = load_config(&file, AppConfig::defaults_for(&paths)).unwrap();

        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.source_path, PathBuf::from("/srv/www/logs/error.log"));
        assert_eq!(config.drain_mode, DrainMode::Offset);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.store_path, PathBuf::from("/tmp/records.jsonl"));
        assert_eq!(
            config.ignore_list_path,
            PathBuf::from("/etc/errwarden/ignored.txt")
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(dir.path());
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            "[source]\ndrain_mode = \"follow\"\n\
             [polling]\ninterval_ms = 0\n\
             [logging]\nlevel = \"loud\"\n",
        )
        .unwrap();

        let (config, warnings) = load_config(&file, AppConfig::defaults_for(&paths)).unwrap();

        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert_eq!(config.drain_mode, DrainMode::Truncate);
        assert_eq!(config.poll_interval_ms, 20);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(dir.path());
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "[polling\ninterval_ms = ").unwrap();

        let result = load_config(&file, AppConfig::defaults_for(&paths));

        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::defaults_for(&test_paths(dir.path()));
        config.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));
    }
}
