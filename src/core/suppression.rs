// ErrWarden - core/suppression.rs
//
// Suppression filter: drops entries whose fingerprint an operator has
// acknowledged. The set is a per-cycle snapshot supplied by an `IgnoreList`
// collaborator; nothing here caches it.
// Core layer: pure logic, the only I/O lives behind the `IgnoreList` trait.

use crate::core::fingerprint::fingerprint;
use crate::core::model::{Fingerprint, LogEntry, SuppressionSet};
use crate::util::error::IgnoreListError;
use std::path::Path;

/// Source of the currently acknowledged fingerprints.
///
/// Implementations are queried once per cycle and must return a fresh
/// snapshot every time: the list can change externally at any moment.
pub trait IgnoreList {
    fn load(&self) -> Result<SuppressionSet, IgnoreListError>;
}

/// An ignore list that never suppresses anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIgnoreList;

impl IgnoreList for NoIgnoreList {
    fn load(&self) -> Result<SuppressionSet, IgnoreListError> {
        Ok(SuppressionSet::new())
    }
}

/// Result of running the filter over one cycle's entries.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Entries to forward, in their original order.
    pub forwarded: Vec<LogEntry>,
    /// Number of entries dropped because their fingerprint was suppressed.
    pub suppressed: usize,
}

/// Keep the entries whose fingerprint is not in `set`, preserving order.
///
/// An empty set is an identity pass-through and skips hashing altogether.
pub fn filter_entries(set: &SuppressionSet, entries: Vec<LogEntry>) -> FilterOutcome {
    if set.is_empty() {
        return FilterOutcome {
            forwarded: entries,
            suppressed: 0,
        };
    }

    let total = entries.len();
    let forwarded: Vec<LogEntry> = entries
        .into_iter()
        .filter(|entry| {
            let fp = fingerprint(entry);
            let keep = !set.contains(&fp);
            if !keep {
                tracing::debug!(fingerprint = %fp, "Suppressed acknowledged error");
            }
            keep
        })
        .collect();

    FilterOutcome {
        suppressed: total - forwarded.len(),
        forwarded,
    }
}

/// Parse ignore-list text: one hex fingerprint per line.
///
/// Blank lines and lines starting with `#` are skipped; anything after the
/// first whitespace on a line is treated as a free-form note. `source_path`
/// is used for error messages only.
pub fn parse_ignore_list(
    content: &str,
    source_path: &Path,
) -> Result<SuppressionSet, IgnoreListError> {
    let mut set = SuppressionSet::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let token = trimmed.split_whitespace().next().unwrap_or(trimmed);
        let fp: Fingerprint = token
            .parse()
            .map_err(|e| IgnoreListError::InvalidFingerprint {
                path: source_path.to_path_buf(),
                line_number: idx + 1,
                value: token.to_string(),
                source: e,
            })?;
        set.insert(fp);
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(message: &str, at: &str, ip: &str) -> LogEntry {
        LogEntry {
            message: message.to_string(),
            occurred_at: at.to_string(),
            client_address: ip.to_string(),
        }
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            entry("AH001 a", "2024-01-02 03:04:05.000000", "10.0.0.1"),
            entry("AH002 b", "2024-01-02 03:04:06.000000", "10.0.0.2"),
            entry("AH001 a", "2024-01-03 09:00:00.000000", "10.0.0.3"),
            entry("AH003 c", "2024-01-03 09:00:01.000000", "10.0.0.4"),
        ]
    }

    #[test]
    fn test_empty_set_is_identity() {
        let input = sample();
        let outcome = filter_entries(&SuppressionSet::new(), input.clone());
        assert_eq!(outcome.forwarded, input);
        assert_eq!(outcome.suppressed, 0);
    }

    #[test]
    fn test_drops_every_entry_with_matching_message() {
        let set: SuppressionSet = [Fingerprint::of_message("AH001 a")].into_iter().collect();

        let outcome = filter_entries(&set, sample());

        let messages: Vec<_> = outcome.forwarded.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["AH002 b", "AH003 c"]);
        assert_eq!(outcome.suppressed, 2);
    }

    #[test]
    fn test_unrelated_fingerprints_drop_nothing() {
        let set: SuppressionSet = [Fingerprint::of_message("never logged")].into_iter().collect();
        let outcome = filter_entries(&set, sample());
        assert_eq!(outcome.forwarded, sample());
    }

    #[test]
    fn test_parse_ignore_list_skips_comments_and_notes() {
        let a = Fingerprint::of_message("AH001 a");
        let b = Fingerprint::of_message("AH002 b");
        let content = format!("# acknowledged errors\n\n{a}  known flaky upstream\n  {b}\n{a}\n");

        let set = parse_ignore_list(&content, &PathBuf::from("ignored.txt")).unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
        assert!(set.contains(&b));
    }

    #[test]
    fn test_parse_ignore_list_reports_bad_line() {
        let content = "# header\nnot-a-fingerprint\n";

        let err = parse_ignore_list(content, &PathBuf::from("ignored.txt")).unwrap_err();

        match err {
            IgnoreListError::InvalidFingerprint {
                line_number, value, ..
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(value, "not-a-fingerprint");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_ignore_list_is_empty() {
        assert!(NoIgnoreList.load().unwrap().is_empty());
    }
}
