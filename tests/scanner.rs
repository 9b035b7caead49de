#[cfg(test)]
mod scanner_tests {
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len(), "token count for {:?}", source);

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
    fn test_scanner_02_brackets_and_percent() {
        assert_token_sequence(
            "[1, 2] % ;",
            &[
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::INT(0), "1"),
                (TokenType::COMMA, ","),
                (TokenType::INT(0), "2"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::PERCENT, "%"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_one_or_two_char_operators() {
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
    fn test_scanner_04_compound_assignment_and_arrow() {
        assert_token_sequence(
            "+= -= *= /= %= ->",
            &[
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::PERCENT_EQUAL, "%="),
                (TokenType::ARROW, "->"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_keywords() {
        assert_token_sequence(
            "and break class get set static super this while",
            &[
                (TokenType::AND, "and"),
                (TokenType::BREAK, "break"),
                (TokenType::CLASS, "class"),
                (TokenType::GET, "get"),
                (TokenType::SET, "set"),
                (TokenType::STATIC, "static"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_identifiers_vs_keywords() {
        assert_token_sequence(
            "varx var x _y y2",
            &[
                (TokenType::IDENTIFIER, "varx"),
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::IDENTIFIER, "_y"),
                (TokenType::IDENTIFIER, "y2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_number_literals_keep_int_float_distinction() {
        let scanner = Scanner::new("42 3.14 7".as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        match &tokens[0].token_type {
            TokenType::INT(n) => assert_eq!(*n, 42),
            other => panic!("expected INT, got {:?}", other),
        }

        match &tokens[1].token_type {
            TokenType::FLOAT(n) => assert!((n - 3.14).abs() < 1e-9),
            other => panic!("expected FLOAT, got {:?}", other),
        }

        match &tokens[2].token_type {
            TokenType::INT(n) => assert_eq!(*n, 7),
            other => panic!("expected INT, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_08_string_literal() {
        let scanner = Scanner::new("\"hello world\"".as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }

        assert_eq!(tokens[0].lexeme, "\"hello world\"");
    }

    #[test]
    fn test_scanner_09_multiline_string_advances_line() {
        let scanner = Scanner::new("\"a\nb\" x".as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        // The identifier after the string sits on line 2.
        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_10_comments_and_whitespace_are_silent() {
        assert_token_sequence(
            "// a comment\n  \t 1 // trailing\n",
            &[(TokenType::INT(0), "1"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn test_scanner_11_unterminated_string_is_an_error() {
        let scanner = Scanner::new("\"oops".as_bytes().to_vec());
        let results: Vec<_> = scanner.collect();

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));
    }

    #[test]
    fn test_scanner_12_number_followed_by_letter_is_an_error() {
        let scanner = Scanner::new("var 1err = 123;".as_bytes().to_vec());
        let results: Vec<_> = scanner.collect();

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1);

        // Scanning resumes after the error: the rest of the line still lexes.
        let kinds: Vec<_> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|t| t.token_type.clone())
            .collect();

        assert!(kinds.contains(&TokenType::IDENTIFIER));
        assert!(kinds.contains(&TokenType::SEMICOLON));
        assert!(kinds.contains(&TokenType::EOF));
    }

    #[test]
    fn test_scanner_13_unexpected_chars_recorded_and_resumed() {
        let scanner = Scanner::new(",.$(#".as_bytes().to_vec());
        let results: Vec<_> = scanner.collect();

        // 2 valid leading tokens, 2 errors, 1 valid token, EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "unexpected message: {}",
                err
            );
        }
    }

    #[test]
    fn test_scanner_14_token_display() {
        let scanner = Scanner::new("var x = 1.5".as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].to_string(), "VAR var null");
        assert_eq!(tokens[1].to_string(), "IDENTIFIER x null");
        assert_eq!(tokens[3].to_string(), "FLOAT 1.5 1.5");
    }

    #[test]
    fn test_scanner_15_line_numbers() {
        let scanner = Scanner::new("1\n2\n\n3".as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 4);
    }

    // Every lexeme reappears in the source, in scan order: nothing outside
    // comments and whitespace is dropped or reordered.
    #[test]
    fn test_scanner_16_lexemes_reproduce_source_in_order() {
        let source = "fun add(a, b) { return a + b; } // sum\nvar total = add(1, 2.5);";

        let scanner = Scanner::new(source.as_bytes().to_vec());
        let mut position = 0;

        for token in scanner.filter_map(Result::ok) {
            if token.lexeme.is_empty() {
                continue; // EOF
            }

            let found = source[position..]
                .find(&token.lexeme)
                .expect("lexeme comes from the source");

            position += found + token.lexeme.len();
        }
    }
}
