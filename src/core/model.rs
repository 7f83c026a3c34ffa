// ErrWarden - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. Everything here is cycle-scoped: created when a cycle starts
// and dropped when it ends.

use serde::{Serialize, Serializer};
use sha3::{Digest, Sha3_224};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Raw match (one header-carrying line)
// =============================================================================

/// One line matched by the grammar, split into its captured fields.
///
/// Produced by the record parser and consumed by the entry assembler within
/// the same pass; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    /// Timestamp exactly as written in the source, e.g.
    /// `Tue Jan 2 03:04:05.000000 2024`.
    pub timestamp: String,

    /// Severity token from the second bracket, e.g. `error`, `php7:error`.
    pub severity_level: String,

    /// Module token from the third bracket, e.g. `core`.
    pub module: String,

    /// Client host with the port stripped.
    pub client_address: String,

    /// First whitespace-delimited token after the client bracket, e.g. `AH01071:`.
    pub error_code: String,

    /// Remainder of the line after the error code and one separating space.
    /// Continuation lines keep their leading indentation here.
    pub message_fragment: String,
}

// =============================================================================
// Log entry (one logical error)
// =============================================================================

/// One logical error occurrence, possibly assembled from several lines.
///
/// `message` is never empty: matches with an empty payload are discarded
/// before an entry is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Error code and message, continuation lines joined with `\n`.
    pub message: String,

    /// Normalised timestamp in `YYYY-MM-DD HH:MM:SS.ffffff` form.
    pub occurred_at: String,

    /// Client host the error was raised for.
    pub client_address: String,
}

// =============================================================================
// Fingerprint
// =============================================================================

/// Width of a SHA3-224 digest in bytes.
pub const FINGERPRINT_LEN: usize = 28;

/// SHA3-224 digest of an entry's message bytes.
///
/// Unsalted and independent of timestamp and client address, so a fingerprint
/// recorded on one machine identifies the same error text on any other machine
/// and across restarts. Textual form is 56 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Digest the exact bytes of `message`.
    pub fn of_message(message: &str) -> Self {
        let digest = Sha3_224::digest(message.as_bytes());
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s.trim(), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// =============================================================================
// Suppression set
// =============================================================================

/// Snapshot of fingerprints to drop, reloaded at the start of every cycle.
///
/// An empty set suppresses nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionSet {
    fingerprints: HashSet<Fingerprint>,
}

impl SuppressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fingerprint. Returns `false` if it was already present.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.fingerprints.insert(fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }
}

impl FromIterator<Fingerprint> for SuppressionSet {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            fingerprints: iter.into_iter().collect(),
        }
    }
}
