// ErrWarden - platform/host.rs
//
// Host identification for record metadata.

use crate::util::error::ConfigError;

/// Name of the machine this process runs on.
///
/// Resolved once at startup; a failure is fatal because every stored record
/// carries it.
pub fn resolve_hostname() -> Result<String, ConfigError> {
    let name = hostname::get().map_err(|e| ConfigError::Hostname { source: e })?;
    let name = name.to_string_lossy().into_owned();
    tracing::debug!(hostname = %name, "Host name resolved");
    Ok(name)
}
