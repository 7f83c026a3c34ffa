// ErrWarden - core/grammar.rs
//
// Versioned log-line grammar: the line pattern and timestamp layout the
// record parser applies. The grammar is data, not control flow, so another
// log format can be supplied as a TOML definition without touching the
// entry assembler.
//
// Core layer: accepts TOML strings, never touches the filesystem.

use crate::util::constants;
use crate::util::error::{GrammarError, ParseError};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Line pattern of the built-in Apache 2.4 error-log grammar.
///
/// Groups: timestamp, severity, module, client host, error code, rest of line.
/// Multiline mode anchors `^`/`$` at every line; the lazy groups split the tail
/// of each line at its first space.
pub const APACHE_ERROR_LINE_PATTERN: &str =
    r"(?m)^\[(.+?)\] \[(.+?)\] \[(.+?)\] \[client (.+?):[0-9]+\] (.+?) (.+?)$";

/// chrono layout of the built-in grammar's timestamps,
/// e.g. `Tue Jan 2 03:04:05.000000 2024`.
pub const APACHE_ERROR_TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S%.f %Y";

/// Capture groups a line pattern must define (excluding the implicit group 0).
pub const REQUIRED_CAPTURE_GROUPS: usize = 6;

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML grammar definition as deserialized from a .toml file.
/// Validated and compiled into a `LogGrammar` for runtime use.
#[derive(Debug, Deserialize)]
pub struct GrammarDefinition {
    pub grammar: GrammarMeta,
    pub parsing: ParsingDef,
}

#[derive(Debug, Deserialize)]
pub struct GrammarMeta {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub description: String,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ParsingDef {
    pub line_pattern: String,
    pub timestamp_format: String,
}

// =============================================================================
// Compiled grammar
// =============================================================================

/// A compiled, validated grammar ready for matching.
#[derive(Debug, Clone)]
pub struct LogGrammar {
    pub id: String,
    pub version: u32,
    pub description: String,
    pub line_pattern: Regex,
    pub timestamp_format: String,
}

impl LogGrammar {
    /// The Apache 2.4 `ErrorLog` grammar.
    pub fn apache_error() -> Self {
        let def = GrammarDefinition {
            grammar: GrammarMeta {
                id: constants::BUILTIN_GRAMMAR_ID.to_string(),
                version: constants::BUILTIN_GRAMMAR_VERSION,
                description: "Apache httpd 2.4 error log with client address".to_string(),
            },
            parsing: ParsingDef {
                line_pattern: APACHE_ERROR_LINE_PATTERN.to_string(),
                timestamp_format: APACHE_ERROR_TIMESTAMP_FORMAT.to_string(),
            },
        };
        compile(def).expect("apache_error: built-in grammar must compile")
    }

    /// Reformat a source timestamp as `YYYY-MM-DD HH:MM:SS.ffffff`.
    ///
    /// A `%a` weekday must be spelled correctly but is not checked against
    /// the date: `Mon Jan 2 ... 2024` normalises to 2024-01-02.
    pub fn normalize_timestamp(&self, raw: &str) -> Result<String, ParseError> {
        let trimmed = raw.trim();
        let parsed = match without_weekday(trimmed, &self.timestamp_format) {
            Some((input, format)) => NaiveDateTime::parse_from_str(&input, &format),
            None => NaiveDateTime::parse_from_str(trimmed, &self.timestamp_format),
        }
        .map_err(|e| ParseError::TimestampParse {
            raw_timestamp: raw.to_string(),
            format: self.timestamp_format.clone(),
            source: e,
        })?;
        Ok(parsed.format(constants::OCCURRED_AT_FORMAT).to_string())
    }
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn is_weekday_name(token: &str) -> bool {
    WEEKDAY_NAMES
        .iter()
        .any(|day| token.eq_ignore_ascii_case(day) || token.eq_ignore_ascii_case(&day[..3]))
}

/// Drop the `%a` field from `format` and the matching token from `raw`.
///
/// Returns `None` when the format has no standalone `%a`, the token counts
/// differ, or the token is not a weekday name; the caller then parses the
/// untouched input so chrono reports the error.
fn without_weekday(raw: &str, format: &str) -> Option<(String, String)> {
    let format_tokens: Vec<&str> = format.split_whitespace().collect();
    let position = format_tokens.iter().position(|t| *t == "%a")?;
    let raw_tokens: Vec<&str> = raw.split_whitespace().collect();
    if raw_tokens.len() != format_tokens.len() || !is_weekday_name(raw_tokens[position]) {
        return None;
    }
    Some((
        join_without(&raw_tokens, position),
        join_without(&format_tokens, position),
    ))
}

fn join_without(tokens: &[&str], skip: usize) -> String {
    tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, t)| *t)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a TOML string into a `GrammarDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_grammar_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<GrammarDefinition, GrammarError> {
    toml::from_str(toml_content).map_err(|e| GrammarError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `GrammarDefinition` and compile it into a `LogGrammar`.
///
/// Validates:
/// - id, line pattern and timestamp format are non-empty
/// - the line pattern is a valid regex within the length limit
/// - the line pattern defines exactly the six capture groups the parser reads
pub fn compile(def: GrammarDefinition) -> Result<LogGrammar, GrammarError> {
    let id = def.grammar.id;

    if id.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: "(empty)".to_string(),
            field: "grammar.id",
        });
    }
    if def.parsing.line_pattern.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: id,
            field: "parsing.line_pattern",
        });
    }
    if def.parsing.timestamp_format.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: id,
            field: "parsing.timestamp_format",
        });
    }

    let length = def.parsing.line_pattern.len();
    if length > constants::MAX_GRAMMAR_PATTERN_LENGTH {
        return Err(GrammarError::PatternTooLong {
            grammar_id: id,
            length,
            max_length: constants::MAX_GRAMMAR_PATTERN_LENGTH,
        });
    }

    let line_pattern =
        Regex::new(&def.parsing.line_pattern).map_err(|e| GrammarError::InvalidRegex {
            grammar_id: id.clone(),
            pattern: def.parsing.line_pattern.clone(),
            source: e,
        })?;

    let found = line_pattern.captures_len() - 1;
    if found != REQUIRED_CAPTURE_GROUPS {
        return Err(GrammarError::CaptureCount {
            grammar_id: id,
            expected: REQUIRED_CAPTURE_GROUPS,
            found,
        });
    }

    tracing::debug!(grammar = %id, version = def.grammar.version, "Grammar compiled");

    Ok(LogGrammar {
        id,
        version: def.grammar.version,
        description: def.grammar.description,
        line_pattern,
        timestamp_format: def.parsing.timestamp_format,
    })
}
