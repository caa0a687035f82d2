#[cfg(test)]
mod scanner_tests {
    use roxide::error::LoxError;
    use roxide::scanner::*;
    use roxide::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes().to_vec());
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
            "({*.,+*})",
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
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_one_and_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_comments_and_slash() {
        assert_token_sequence(
            "1 / 2 // the rest is ignored\n3",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(2.0), "2"),
                (TokenType::NUMBER(3.0), "3"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_and_identifiers() {
        assert_token_sequence(
            "class classic _under score99 var",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classic"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "score99"),
                (TokenType::VAR, "var"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_numbers() {
        let scanner = Scanner::new(b"12 3.5 7.".to_vec());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        // "7." scans as the number 7 followed by a lone dot.
        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenType::NUMBER(12.0),
                &TokenType::NUMBER(3.5),
                &TokenType::NUMBER(7.0),
                &TokenType::DOT,
                &TokenType::EOF,
            ]
        );

        match &tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 3.5),
            other => panic!("expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_06_string_literal_strips_quotes() {
        let scanner = Scanner::new(b"\"hi there\"".to_vec());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].lexeme, "\"hi there\"");
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi there"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_07_multiline_string_counts_lines() {
        let scanner = Scanner::new(b"\"a\nb\"\nx".to_vec());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        // A token's line is where its lexeme starts, even when the string
        // spans onto line 2.
        assert_eq!(tokens[0].line, 1);

        // The identifier after the string sits on line 3, and EOF keeps it.
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_scanner_08_unterminated_string_is_an_error() {
        let results: Vec<_> = Scanner::new(b"\"open".to_vec()).collect();

        let errors: Vec<&LoxError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes().to_vec());

        let results: Vec<_> = scanner.collect();

        // Expected sequence:
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

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
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
}
