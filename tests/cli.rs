//! End-to-end tests of the `lox` binary: exit codes, file mode, REPL mode.

#[cfg(test)]
mod cli_tests {
    use std::io::Write;

    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::NamedTempFile;

    fn lox() -> Command {
        Command::cargo_bin("lox").expect("binary builds")
    }

    fn script(source: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(source.as_bytes()).expect("write script");
        file
    }

    #[test]
    fn test_file_mode_success_exits_zero() {
        let file = script("print 1 + 2 * 3;");

        lox()
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("7"));
    }

    #[test]
    fn test_lex_error_exits_65() {
        let file = script("var s = \"unterminated");

        lox()
            .arg(file.path())
            .assert()
            .code(65)
            .stderr(predicate::str::contains("Unterminated string."));
    }

    #[test]
    fn test_parse_error_exits_65() {
        let file = script("print (1 + 2;");

        lox().arg(file.path()).assert().code(65);
    }

    #[test]
    fn test_resolve_error_exits_65() {
        let file = script("break;");

        lox()
            .arg(file.path())
            .assert()
            .code(65)
            .stderr(predicate::str::contains("illegal break statement."));
    }

    #[test]
    fn test_runtime_error_exits_79() {
        let file = script("print \"a\" + 1;");

        lox()
            .arg(file.path())
            .assert()
            .code(79)
            .stderr(predicate::str::contains("Runtime Error"));
    }

    #[test]
    fn test_runtime_error_stops_after_first() {
        let file = script("print 1; 1 / 0; print 2;");

        let assert = lox().arg(file.path()).assert().code(79);

        let output = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8");
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn test_unresolvable_path_exits_255() {
        lox()
            .arg("definitely/not/a/real/path.lox")
            .assert()
            .code(255);
    }

    #[test]
    fn test_extra_arguments_print_usage() {
        lox()
            .args(["a.lox", "b.lox"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: lox [script]"));
    }

    #[test]
    fn test_repl_evaluates_and_exits_cleanly_on_eof() {
        lox()
            .write_stdin("print \"hello\";\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("hello"));
    }

    #[test]
    fn test_repl_echoes_expression_values() {
        lox()
            .write_stdin("1 + 2\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("3"));
    }

    #[test]
    fn test_repl_state_persists_across_lines() {
        lox()
            .write_stdin("var a = 40;\na + 2\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("42"));
    }

    #[test]
    fn test_repl_recovers_after_an_error_line() {
        lox()
            .write_stdin("print (1;\nprint 2;\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("2"));
    }
}
