// ErrWarden - core/assembler.rs
//
// Entry assembler: folds consecutive matched fragments into logical errors.
//
// Apache writes one header-carrying line per fragment, so a PHP fatal error
// with its stack trace arrives as a header line followed by lines whose
// payload is indented or starts with "Stack trace:". Those continuation
// fragments are appended to the entry currently being built.
// Core layer: pure logic over already-matched lines.

use crate::core::grammar::LogGrammar;
use crate::core::model::{LogEntry, RawMatch};
use crate::util::constants::STACK_TRACE_MARKER;
use crate::util::error::ParseError;

/// Returns true if `fragment` extends the previous entry rather than
/// starting a new one.
pub fn is_continuation(fragment: &str) -> bool {
    fragment.starts_with(' ') || fragment.starts_with(STACK_TRACE_MARKER)
}

/// Group matches into entries, preserving source order.
///
/// Every match's timestamp is normalised, continuation lines included, so a
/// malformed timestamp anywhere in the blob aborts the whole pass.
pub fn assemble(matches: &[RawMatch], grammar: &LogGrammar) -> Result<Vec<LogEntry>, ParseError> {
    let mut entries: Vec<LogEntry> = Vec::new();
    let mut current: Option<usize> = None;

    for m in matches {
        if m.message_fragment.is_empty() {
            continue;
        }

        let occurred_at = grammar.normalize_timestamp(&m.timestamp)?;

        match current {
            Some(idx) if is_continuation(&m.message_fragment) => {
                let entry = &mut entries[idx];
                entry.message.push('\n');
                entry.message.push_str(&m.message_fragment);
            }
            // A continuation with nothing to extend is promoted to a new entry.
            _ => {
                entries.push(LogEntry {
                    message: format!("{} {}", m.error_code, m.message_fragment),
                    occurred_at,
                    client_address: m.client_address.clone(),
                });
                current = Some(entries.len() - 1);
            }
        }
    }

    Ok(entries)
}
