// ErrWarden - app/sink.rs
//
// Record store collaborator. Every forwarded entry becomes one stored record
// plus one notification for the subscribers of error reports. The store
// shape mirrors the web application's error log table: the message is HTML
// escaped and wrapped in <pre>, the meta column carries the host name and
// where the record came from, and the level is fixed.
//
// `JsonLinesSink` is the shipped implementation: an append-only file of
// serde-tagged JSON lines, flushed per line so a crash loses at most the
// line being written.

use crate::core::fingerprint::fingerprint;
use crate::core::model::{Fingerprint, LogEntry};
use crate::util::constants;
use crate::util::error::SinkError;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One row for the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkRecord {
    /// `<pre>` + HTML-escaped message + `</pre>`.
    pub escaped_message: String,
    /// Host name, newline, origin (source log path or the process tag).
    pub meta: String,
    /// `YYYY-MM-DD HH:MM:SS.ffffff`.
    pub occurred_at: String,
    /// Client host; absent for self-reported errors.
    pub client_address: Option<String>,
    pub level: u8,
    /// Fingerprint of the unescaped message, for adding to the ignore list.
    pub fingerprint: Fingerprint,
}

impl SinkRecord {
    /// Record for an entry read from `source_path`.
    pub fn from_entry(entry: &LogEntry, hostname: &str, source_path: &Path) -> Self {
        Self {
            escaped_message: escape_message(&entry.message),
            meta: format!("{hostname}\n{}", source_path.display()),
            occurred_at: entry.occurred_at.clone(),
            client_address: Some(entry.client_address.clone()),
            level: constants::RECORD_LEVEL,
            fingerprint: fingerprint(entry),
        }
    }

    /// Record describing this process's own fatal error.
    pub fn self_report(description: &str, hostname: &str, occurred_at: String) -> Self {
        Self {
            escaped_message: escape_message(description),
            meta: format!("{hostname}\n{}", constants::SELF_REPORT_META),
            occurred_at,
            client_address: None,
            level: constants::RECORD_LEVEL,
            fingerprint: Fingerprint::of_message(description),
        }
    }
}

/// Wrap `message` for display in the web application's log page.
pub fn escape_message(message: &str) -> String {
    format!("<pre>{}</pre>", html_escape::encode_quoted_attribute(message))
}

/// Durable destination for forwarded entries.
pub trait EntrySink {
    /// Store one record.
    fn record(&mut self, record: &SinkRecord) -> Result<(), SinkError>;

    /// Fan the raw (unescaped) message out to subscribed users.
    fn notify(&mut self, description: &str) -> Result<(), SinkError>;
}

/// Shape of one line in the JSON-lines store.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum StoreLine<'a> {
    Record(&'a SinkRecord),
    Notification { description: &'a str },
}

/// Append-only JSON-lines store.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
}

impl JsonLinesSink {
    /// Open (or create) the store, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SinkError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::debug!(store = %path.display(), "Record store opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, line: &StoreLine<'_>) -> Result<(), SinkError> {
        let mut buf = serde_json::to_vec(line).map_err(|e| SinkError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        buf.push(b'\n');
        self.file
            .write_all(&buf)
            .and_then(|()| self.file.flush())
            .map_err(|e| SinkError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl EntrySink for JsonLinesSink {
    fn record(&mut self, record: &SinkRecord) -> Result<(), SinkError> {
        self.append(&StoreLine::Record(record))
    }

    fn notify(&mut self, description: &str) -> Result<(), SinkError> {
        self.append(&StoreLine::Notification { description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogEntry {
        LogEntry {
            message: "PHP Warning: <b>\"x\"</b> & 'y'".to_string(),
            occurred_at: "2024-01-02 03:04:05.000000".to_string(),
            client_address: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_escape_message_wraps_and_escapes() {
        let escaped = escape_message("a < b && \"c\"");
        assert!(escaped.starts_with("<pre>"));
        assert!(escaped.ends_with("</pre>"));
        assert!(escaped.contains("&lt;"));
        assert!(escaped.contains("&amp;&amp;"));
        assert!(!escaped.contains('"'));
    }

    #[test]
    fn test_record_from_entry() {
        let source = Path::new("/var/log/apache2/error.log");
        let record = SinkRecord::from_entry(&entry(), "web01", source);

        assert_eq!(record.meta, "web01\n/var/log/apache2/error.log");
        assert_eq!(record.client_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.level, 3);
        assert_eq!(record.fingerprint, fingerprint(&entry()));
        assert!(!record.escaped_message.contains("<b>"));
    }

    #[test]
    fn test_self_report_has_no_client() {
        let at = "2024-01-02 03:04:05.000000".to_string();
        let record = SinkRecord::self_report("disk full", "web01", at);
        assert_eq!(record.meta, "web01\nerrwarden");
        assert!(record.client_address.is_none());
        assert_eq!(record.escaped_message, "<pre>disk full</pre>");
    }

    #[test]
    fn test_json_lines_sink_appends_tagged_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("records.jsonl");
        let record = SinkRecord::from_entry(&entry(), "web01", Path::new("/var/log/error.log"));

        {
            let mut sink = JsonLinesSink::open(&path).unwrap();
            sink.record(&record).unwrap();
            sink.notify(&entry().message).unwrap();
        }
        // Reopening appends rather than truncating.
        JsonLinesSink::open(&path).unwrap().notify("again").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "record");
        assert_eq!(lines[0]["client_address"], "10.0.0.1");
        assert_eq!(lines[0]["fingerprint"], record.fingerprint.to_hex());
        assert_eq!(lines[1]["kind"], "notification");
        assert_eq!(lines[1]["description"], entry().message);
        assert_eq!(lines[2]["description"], "again");
    }
}
