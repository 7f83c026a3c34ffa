// ErrWarden - app/grammar_mgr.rs
//
// Chooses the grammar for this run: the built-in Apache error grammar, or a
// TOML definition from disk when one is configured. A configured grammar
// that fails to load is fatal; silently falling back would parse the wrong
// format.

use crate::core::grammar::{self, LogGrammar};
use crate::util::constants;
use crate::util::error::GrammarError;
use std::path::Path;

/// Load the grammar from `grammar_file`, or the built-in one when `None`.
pub fn load_grammar(grammar_file: Option<&Path>) -> Result<LogGrammar, GrammarError> {
    let Some(path) = grammar_file else {
        let builtin = LogGrammar::apache_error();
        tracing::info!(grammar = %builtin.id, version = builtin.version, "Using built-in grammar");
        return Ok(builtin);
    };

    let metadata = std::fs::metadata(path).map_err(|e| GrammarError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.len() > constants::MAX_GRAMMAR_FILE_SIZE {
        return Err(GrammarError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_GRAMMAR_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| GrammarError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let def = grammar::parse_grammar_toml(&content, path)?;
    let compiled = grammar::compile(def)?;

    tracing::info!(
        grammar = %compiled.id,
        version = compiled.version,
        file = %path.display(),
        "Loaded grammar definition"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_uses_builtin() {
        let grammar = load_grammar(None).unwrap();
        assert_eq!(grammar.id, constants::BUILTIN_GRAMMAR_ID);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_grammar(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(GrammarError::Io { .. })));
    }

    #[test]
    fn test_loads_definition_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iso.toml");
        std::fs::write(
            &path,
            r#"
[grammar]
id = "apache-error-iso"
version = 3
description = "error log with ISO timestamps"

[parsing]
line_pattern = '(?m)^\[(.+?)\] \[(.+?)\] \[(.+?)\] \[client (.+?):[0-9]+\] (.+?) (.+?)$'
timestamp_format = "%Y-%m-%dT%H:%M:%S%.f"
"#,
        )
        .unwrap();

        let grammar = load_grammar(Some(&path)).unwrap();

        assert_eq!(grammar.id, "apache-error-iso");
        assert_eq!(grammar.version, 3);
    }
}
