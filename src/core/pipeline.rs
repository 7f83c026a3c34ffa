// ErrWarden - core/pipeline.rs
//
// One pass of the reconstruction pipeline over a captured blob:
// text -> matches -> entries -> filtered entries. No I/O; the cycle driver
// supplies the blob and the suppression snapshot.

use crate::core::assembler;
use crate::core::grammar::LogGrammar;
use crate::core::model::{LogEntry, SuppressionSet};
use crate::core::parser;
use crate::core::suppression;
use crate::util::error::ParseError;

/// What one pass produced.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Header-carrying lines found in the blob.
    pub matched_lines: usize,
    /// Logical entries assembled before suppression.
    pub assembled: usize,
    /// Entries dropped by the suppression set.
    pub suppressed: usize,
    /// Entries to dispatch, in source order.
    pub entries: Vec<LogEntry>,
}

/// Run parsing, assembly and suppression over `content`.
pub fn process_blob(
    content: &str,
    grammar: &LogGrammar,
    suppression: &SuppressionSet,
) -> Result<PipelineOutput, ParseError> {
    let matches = parser::parse_matches(content, grammar);
    let entries = assembler::assemble(&matches, grammar)?;
    let assembled = entries.len();
    let outcome = suppression::filter_entries(suppression, entries);

    Ok(PipelineOutput {
        matched_lines: matches.len(),
        assembled,
        suppressed: outcome.suppressed,
        entries: outcome.forwarded,
    })
}
