// ErrWarden - core/fingerprint.rs
//
// Content fingerprints for suppression lookups. A fingerprint depends on the
// message text only: the same error raised at another time, for another
// client, on another host, hashes identically.

use crate::core::model::{Fingerprint, LogEntry};

/// SHA3-224 fingerprint of `entry.message`.
pub fn fingerprint(entry: &LogEntry) -> Fingerprint {
    Fingerprint::of_message(&entry.message)
}
