#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use walkjs as js;

    use js::scanner::*;
    use js::token::*;
    use js::ScriptError;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})[]?:;",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_compound_operators() {
        assert_token_sequence(
            "++ -- += -= *= /= %= == != <= >= && || & |",
            &[
                (TokenType::PLUS_PLUS, "++"),
                (TokenType::MINUS_MINUS, "--"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::PERCENT_EQUAL, "%="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::AND, "&&"),
                (TokenType::OR, "||"),
                (TokenType::AND, "&"),
                (TokenType::OR, "|"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var function class this null nullable _x1 while",
            &[
                (TokenType::VAR, "var"),
                (TokenType::FUNCTION, "function"),
                (TokenType::CLASS, "class"),
                (TokenType::THIS, "this"),
                (TokenType::NULL, "null"),
                (TokenType::IDENTIFIER, "nullable"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals() {
        let tokens: Vec<_> = Scanner::new("12 3.5 \"hi\" 7.")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.0));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 3.5));
        assert!(matches!(&tokens[2].token_type, TokenType::STRING(s) if s == "hi"));
        assert_eq!(tokens[2].lexeme, "\"hi\"");

        // a trailing dot is not part of the number
        assert!(matches!(tokens[3].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let tokens: Vec<_> = Scanner::new("a // ignored ( {\nb\n\"x\ny\" c")
            .filter_map(Result::ok)
            .collect();

        let lines: Vec<(&str, usize)> = tokens.iter().map(|t| (t.lexeme, t.line)).collect();

        assert_eq!(
            lines,
            vec![("a", 1), ("b", 2), ("\"x\ny\"", 4), ("c", 4), ("", 4)]
        );
    }

    #[test]
    fn test_scanner_06_display() {
        let rendered: Vec<String> = Scanner::new("var x = 3; print \"s\" 2.5;")
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            rendered,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "PRINT print null",
                "STRING \"s\" s",
                "NUMBER 2.5 2.5",
                "SEMICOLON ; null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        // Helper function
        fn assert_token_matches(
            result: &Result<Token, ScriptError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = scan_all("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: é");

        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme).collect();
        assert_eq!(lexemes, vec!["a", "b", ""]);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = scan_all("print \"open\n");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_scan_all_always_ends_with_eof() {
        let (tokens, errors) = scan_all("");

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    proptest! {
        #[test]
        fn prop_integer_literals_scan_to_their_value(n in 0u32..1_000_000) {
            let source = n.to_string();
            let (tokens, errors) = scan_all(&source);

            prop_assert!(errors.is_empty());
            prop_assert_eq!(tokens.len(), 2);
            prop_assert!(matches!(tokens[0].token_type, TokenType::NUMBER(v) if v == n as f64));
        }

        #[test]
        fn prop_fractional_literals_scan_to_their_value(literal in "[0-9]{1,6}\\.[0-9]{1,6}") {
            let (tokens, errors) = scan_all(&literal);
            let expected: f64 = literal.parse().unwrap();

            prop_assert!(errors.is_empty());
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(tokens[0].lexeme, literal.as_str());
            prop_assert!(matches!(tokens[0].token_type, TokenType::NUMBER(v) if v == expected));
        }

        #[test]
        fn prop_identifiers_never_error(name in "[a-z_][a-zA-Z0-9_]{0,12}") {
            let (tokens, errors) = scan_all(&name);

            prop_assert!(errors.is_empty());
            prop_assert_eq!(tokens[0].lexeme, name.as_str());
        }
    }
}
