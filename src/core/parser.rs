// ErrWarden - core/parser.rs
//
// Record parser: finds every grammar-matching line in a blob of log text and
// splits it into its captured fields. Lines without the bracketed header
// (bare text, blank lines) produce nothing.
// Core layer: accepts strings, never touches the filesystem.

use crate::core::grammar::LogGrammar;
use crate::core::model::RawMatch;

/// Find all non-overlapping grammar matches in `content`, in source order.
///
/// A match whose rest-of-line capture is empty is dropped here so the
/// assembler never sees a blank payload.
pub fn parse_matches(content: &str, grammar: &LogGrammar) -> Vec<RawMatch> {
    let mut matches = Vec::new();
    let mut dropped_empty = 0usize;

    for caps in grammar.line_pattern.captures_iter(content) {
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let message_fragment = field(6);
        if message_fragment.is_empty() {
            dropped_empty += 1;
            continue;
        }

        matches.push(RawMatch {
            timestamp: field(1).to_string(),
            severity_level: field(2).to_string(),
            module: field(3).to_string(),
            client_address: field(4).to_string(),
            error_code: field(5).to_string(),
            message_fragment: message_fragment.to_string(),
        });
    }

    tracing::trace!(
        grammar = %grammar.id,
        matches = matches.len(),
        dropped_empty,
        bytes = content.len(),
        "Parsed content"
    );

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "[Tue Jan 2 03:04:05.000000 2024] [error] [core] [client 10.0.0.1:443]";

    #[test]
    fn test_parse_single_line_fields() {
        let grammar = LogGrammar::apache_error();
        let content = format!("{HEADER} AH001 Something broke\n");

        let matches = parse_matches(&content, &grammar);

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.timestamp, "Tue Jan 2 03:04:05.000000 2024");
        assert_eq!(m.severity_level, "error");
        assert_eq!(m.module, "core");
        assert_eq!(m.client_address, "10.0.0.1");
        assert_eq!(m.error_code, "AH001");
        assert_eq!(m.message_fragment, "Something broke");
    }

    #[test]
    fn test_parse_keeps_indentation_of_continuation() {
        let grammar = LogGrammar::apache_error();
        let content = format!("{HEADER} AH001  Stack trace: at foo\n");

        let matches = parse_matches(&content, &grammar);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].error_code, "AH001");
        assert_eq!(matches[0].message_fragment, " Stack trace: at foo");
    }

    #[test]
    fn test_parse_skips_lines_without_header() {
        let grammar = LogGrammar::apache_error();
        let content = format!(
            "{HEADER} AH001 first\n\
             #0 /var/www/index.php(12): foo()\n\
             \n\
             [Tue Jan 2 03:04:05.000000 2024] [notice] [mpm_prefork] AH00163: no client bracket\n\
             {HEADER} AH002 second\n"
        );

        let matches = parse_matches(&content, &grammar);

        let codes: Vec<_> = matches.iter().map(|m| m.error_code.as_str()).collect();
        assert_eq!(codes, vec!["AH001", "AH002"]);
    }

    #[test]
    fn test_parse_line_without_payload_is_not_matched() {
        let grammar = LogGrammar::apache_error();
        // Only an error code after the client bracket: no rest-of-line group.
        let content = format!("{HEADER} AH001\n");
        assert!(parse_matches(&content, &grammar).is_empty());
    }

    #[test]
    fn test_parse_ipv6_client_strips_port() {
        let grammar = LogGrammar::apache_error();
        let content = "[Tue Jan 2 03:04:05.000000 2024] [php7:error] [pid 12] \
                       [client ::1:51234] PHP Fatal error\n";

        let matches = parse_matches(content, &grammar);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].client_address, "::1");
        assert_eq!(matches[0].severity_level, "php7:error");
        assert_eq!(matches[0].error_code, "PHP");
        assert_eq!(matches[0].message_fragment, "Fatal error");
    }

    #[test]
    fn test_parse_empty_content() {
        let grammar = LogGrammar::apache_error();
        assert!(parse_matches("", &grammar).is_empty());
    }
}
