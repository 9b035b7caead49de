#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::Token;
    use lox::value::Value;

    /// A clonable sink so tests can keep a handle on the interpreter's
    /// output buffer.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("output is valid utf-8")
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn scan_and_parse(source: &str) -> Vec<Stmt> {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let tokens: Vec<Token> = scanner
            .collect::<Result<Vec<_>, _>>()
            .expect("unexpected scan error");

        let mut parser = Parser::new(tokens);
        let (statements, had_error) = parser.parse();
        assert!(!had_error, "syntax error in {:?}", source);

        statements
    }

    /// Full pipeline in the given mode; returns captured output and the
    /// runtime error flag.
    fn run_mode(source: &str, repl: bool) -> (String, bool) {
        let statements = scan_and_parse(source);

        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(repl, Box::new(buffer.clone()));

        let mut resolver = Resolver::new(&mut interpreter);
        assert!(
            !resolver.resolve(&statements),
            "resolve error in {:?}",
            source
        );

        let had_runtime_error = interpreter.interpret(&statements);

        (buffer.contents(), had_runtime_error)
    }

    fn run_source(source: &str) -> (String, bool) {
        run_mode(source, false)
    }

    fn assert_output(source: &str, expected: &[&str]) {
        let (output, had_error) = run_source(source);

        assert!(!had_error, "unexpected runtime error in {:?}", source);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, expected, "output mismatch for {:?}", source);
    }

    fn assert_runtime_error(source: &str) {
        let (_, had_error) = run_source(source);

        assert!(had_error, "expected a runtime error in {:?}", source);
    }

    /// Evaluate a single expression with a fresh interpreter.
    fn eval_expr(source: &str) -> Value {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let tokens: Vec<Token> = scanner
            .collect::<Result<Vec<_>, _>>()
            .expect("unexpected scan error");

        let mut parser = Parser::new(tokens);
        let expr = parser.expression().expect("syntax error");

        let mut interpreter = Interpreter::new(false);
        interpreter.evaluate(&expr).expect("runtime error")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression values
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_literal_expressions() {
        assert_eq!(eval_expr("5"), Value::Int(5));
        assert_eq!(eval_expr("1.5"), Value::Float(1.5));
        assert_eq!(eval_expr("\"a test string.\""), Value::String("a test string.".into()));
        assert_eq!(eval_expr("true"), Value::Bool(true));
        assert_eq!(eval_expr("nil"), Value::Nil);
    }

    #[test]
    fn test_unary_expressions() {
        assert_eq!(eval_expr("!true"), Value::Bool(false));
        assert_eq!(eval_expr("!1"), Value::Bool(false));
        assert_eq!(eval_expr("!nil"), Value::Bool(true));
        assert_eq!(eval_expr("-5"), Value::Int(-5));
        assert_eq!(eval_expr("-1.1"), Value::Float(-1.1));
    }

    #[test]
    fn test_binary_arithmetic_preserves_intness() {
        assert_eq!(eval_expr("2 * 3 + 2"), Value::Int(8));
        assert_eq!(eval_expr("1 + 2 / 2"), Value::Int(2));
        assert_eq!(eval_expr("1 - 2"), Value::Int(-1));
        assert_eq!(eval_expr("5 % 2"), Value::Int(1));
        assert_eq!(eval_expr("1.0 + 2.0"), Value::Float(3.0));
        assert_eq!(eval_expr("2.0 * 3.0"), Value::Float(6.0));

        // Mixed operands widen to float.
        assert_eq!(eval_expr("1 + 0.5"), Value::Float(1.5));
        assert_eq!(eval_expr("2.0 * 3"), Value::Float(6.0));
    }

    #[test]
    fn test_integer_division_truncates_toward_zero() {
        assert_eq!(eval_expr("7 / 2"), Value::Int(3));
        assert_eq!(eval_expr("-7 / 2"), Value::Int(-3));
        assert_eq!(eval_expr("10 / 4"), Value::Int(2));
        assert_eq!(eval_expr("10.0 / 4"), Value::Float(2.5));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_expr("1 < 2"), Value::Bool(true));
        assert_eq!(eval_expr("1 <= 1"), Value::Bool(true));
        assert_eq!(eval_expr("3 > 3"), Value::Bool(false));
        assert_eq!(eval_expr("3 >= 3"), Value::Bool(true));

        // Comparisons compare as floats, so mixing is fine.
        assert_eq!(eval_expr("1 < 1.5"), Value::Bool(true));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval_expr("1 == 2"), Value::Bool(false));
        assert_eq!(eval_expr("1.1 == 1.1"), Value::Bool(true));
        assert_eq!(eval_expr("1 != 2"), Value::Bool(true));
        assert_eq!(eval_expr("nil == nil"), Value::Bool(true));
        assert_eq!(eval_expr("nil == false"), Value::Bool(false));
        assert_eq!(eval_expr("\"a\" == \"a\""), Value::Bool(true));

        // Int and float are distinct variants and never compare equal.
        assert_eq!(eval_expr("1 == 1.0"), Value::Bool(false));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval_expr("\"adorable\" + \" lady\""),
            Value::String("adorable lady".into())
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(eval_expr("true and false"), Value::Bool(false));
        assert_eq!(eval_expr("false and true"), Value::Bool(false));
        assert_eq!(eval_expr("nil or 1"), Value::Int(1));
        assert_eq!(eval_expr("2 or 1"), Value::Int(2));
        assert_eq!(eval_expr("nil and 1"), Value::Nil);
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        assert_output(
            "var a = 0;\
             fun side() { a = 1; return true; }\
             false and side();\
             true or side();\
             print a;",
            &["0"],
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // End-to-end programs
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_print_arithmetic() {
        assert_output("print 1 + 2 * 3;", &["7"]);
    }

    #[test]
    fn test_block_shadowing() {
        assert_output("var a = 1; { var a = 2; print a; } print a;", &["2", "1"]);
    }

    #[test]
    fn test_recursion() {
        assert_output(
            "fun count(n) { if (n <= 0) return; print n; count(n - 1); } count(3);",
            &["3", "2", "1"],
        );
    }

    #[test]
    fn test_closure_counter() {
        assert_output(
            "fun makeCounter(){ var i = 0; fun c(){ i = i + 1; return i; } return c; }\
             var c = makeCounter();\
             print c();\
             print c();",
            &["1", "2"],
        );
    }

    #[test]
    fn test_closure_sees_later_mutation() {
        assert_output(
            "var x = 1; fun get() { return x; } x = 2; print get();",
            &["2"],
        );
    }

    #[test]
    fn test_super_call() {
        assert_output(
            "class A { greet() { print \"hi\"; } }\
             class B < A { greet() { super.greet(); print \"there\"; } }\
             B().greet();",
            &["hi", "there"],
        );
    }

    #[test]
    fn test_array_end_to_end() {
        assert_output(
            "var xs = Array(1, 2, 3); xs.append(4); print xs.length; print xs;",
            &["4", "[1, 2, 3, 4]"],
        );
    }

    #[test]
    fn test_while_with_break_and_compound_assign() {
        assert_output(
            "var a = 0; while (true) { a += 1; if (a == 3) break; } print a;",
            &["3"],
        );
    }

    #[test]
    fn test_string_plus_string_but_not_string_plus_number() {
        assert_output("print \"a\" + \"b\";", &["ab"]);
        assert_runtime_error("print \"a\" + 1;");
    }

    #[test]
    fn test_for_loop() {
        assert_output(
            "for (var i = 0; i < 3; i = i + 1) { print i; }",
            &["0", "1", "2"],
        );
    }

    #[test]
    fn test_break_exits_innermost_loop_only() {
        assert_output(
            "var i = 0;\
             while (true) {\
               while (true) { break; }\
               i = 1;\
               break;\
             }\
             print i;",
            &["1"],
        );
    }

    #[test]
    fn test_return_exits_innermost_function_only() {
        assert_output(
            "fun outer() {\
               fun inner() { return 1; }\
               inner();\
               return 2;\
             }\
             print outer();",
            &["2"],
        );
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_output("fun f() {} print f();", &["nil"]);
    }

    #[test]
    fn test_compound_assignment() {
        assert_output("var a = 1; a += 2; print a;", &["3"]);
        assert_output("var b = 1; b -= 1; print b;", &["0"]);
        assert_output("var c = 3; c *= 2; print c;", &["6"]);
        assert_output("var d = 7; d /= 2; print d;", &["3"]);
        assert_output("var e = 7; e %= 4; print e;", &["3"]);
        assert_output(
            "var a = \"head\"; a += \" tail\"; print a;",
            &["head tail"],
        );
    }

    #[test]
    fn test_var_list_declarations() {
        assert_output("var a = 1, b = a + 1; print a; print b;", &["1", "2"]);
    }

    #[test]
    fn test_lambdas() {
        assert_output("var f = (x) -> x * 2; print f(3);", &["6"]);
        assert_output("var f = () -> { return 5; }; print f();", &["5"]);
        assert_output(
            "fun apply(f, v) { return f(v); } print apply((x) -> x + 1, 1);",
            &["2"],
        );
        assert_output("var f = (x) -> x; print f;", &["<fn lambda>"]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Classes
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        assert_output(
            "class Counter {\
               init(start) { this.n = start; }\
               bump() { this.n = this.n + 1; return this.n; }\
             }\
             var c = Counter(10);\
             print c.bump();\
             print c.bump();\
             print c.n;",
            &["11", "12", "12"],
        );
    }

    #[test]
    fn test_method_binding_carries_receiver() {
        assert_output(
            "class Person {\
               init(name) { this.name = name; }\
               greet() { return this.name; }\
             }\
             var p = Person(\"ada\");\
             var m = p.greet;\
             print m();",
            &["ada"],
        );
    }

    #[test]
    fn test_getters_compute_on_access() {
        assert_output(
            "class Circle {\
               init(r) { this.r = r; }\
               get area { return this.r * this.r * 3; }\
             }\
             var c = Circle(2);\
             print c.area;",
            &["12"],
        );
    }

    #[test]
    fn test_setters_intercept_writes() {
        assert_output(
            "class Named {\
               set name(v) { this.stored = v + \"!\"; }\
             }\
             var n = Named();\
             n.name = \"x\";\
             print n.stored;",
            &["x!"],
        );
    }

    #[test]
    fn test_statics_on_the_class() {
        assert_output(
            "class Math2 { static twice(x) { return x * 2; } }\
             print Math2.twice(4);",
            &["8"],
        );
    }

    #[test]
    fn test_statics_are_not_inherited() {
        assert_runtime_error(
            "class A { static s() { return 1; } }\
             class B < A {}\
             print B.s();",
        );
    }

    #[test]
    fn test_method_inheritance_walks_the_chain() {
        assert_output(
            "class A { m() { return 1; } }\
             class B < A {}\
             class C < B {}\
             print C().m();",
            &["1"],
        );
    }

    #[test]
    fn test_getters_and_setters_inherit() {
        assert_output(
            "class A {\
               get g { return 7; }\
               set s(v) { this.x = v * 2; }\
             }\
             class B < A {}\
             var b = B();\
             print b.g;\
             b.s = 3;\
             print b.x;",
            &["7", "6"],
        );
    }

    #[test]
    fn test_super_uses_same_receiver() {
        assert_output(
            "class A { who() { return this.name; } }\
             class B < A {\
               init(name) { this.name = name; }\
               who() { return super.who() + \"!\"; }\
             }\
             print B(\"b\").who();",
            &["b!"],
        );
    }

    #[test]
    fn test_class_stringification() {
        assert_output("class A {} print A;", &["A"]);
        assert_output("class A {} print A();", &["A instance"]);
        assert_output("fun f() {} print f;", &["<fn f>"]);
    }

    #[test]
    fn test_property_compound_assignment() {
        assert_output(
            "class C {} var c = C(); c.x = 1; c.x += 2; print c.x;",
            &["3"],
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Subscripts
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_subscript_reads_and_writes_properties() {
        assert_output(
            "class C {}\
             var c = C();\
             c[\"k\"] = 5;\
             print c[\"k\"];\
             print c.k;",
            &["5", "5"],
        );

        // The key's string form names the property.
        assert_output(
            "class C {}\
             var c = C();\
             c[1] = \"one\";\
             print c[1];",
            &["one"],
        );
    }

    #[test]
    fn test_subscript_on_non_instance_is_an_error() {
        assert_runtime_error("var a = 1; a[0];");
        assert_runtime_error("var a = \"s\"; a[0] = 1;");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Arrays
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_array_literals() {
        assert_output("print [];", &["[]"]);
        assert_output("print [1, 2, 3];", &["[1, 2, 3]"]);
        assert_output("print [1 + 1, \"a\"];", &["[2, a]"]);
        assert_output("print [1, 2].length;", &["2"]);
    }

    #[test]
    fn test_array_pop() {
        assert_output(
            "var xs = [1, 2]; print xs.pop(); print xs.length;",
            &["2", "1"],
        );

        assert_runtime_error("var xs = []; xs.pop();");
    }

    #[test]
    fn test_array_append_returns_value() {
        assert_output("var xs = []; print xs.append(9); print xs;", &["9", "[9]"]);
    }

    #[test]
    fn test_is_array_static() {
        assert_output("print Array.isArray([1]);", &["true"]);
        assert_output("print Array.isArray(1);", &["false"]);
        assert_output("class C {} print Array.isArray(C());", &["false"]);
    }

    #[test]
    fn test_array_identity_equality() {
        assert_output("var xs = [1]; print xs == xs;", &["true"]);
        assert_output("print [1] == [1];", &["false"]);
    }

    #[test]
    fn test_array_literal_evaluation_order() {
        assert_output(
            "var log = \"\";\
             fun note(x) { log += x; return x; }\
             [note(\"a\"), note(\"b\"), note(\"c\")];\
             print log;",
            &["abc"],
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stringification and REPL mode
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_stringification() {
        assert_output("print nil;", &["nil"]);
        assert_output("print true;", &["true"]);
        assert_output("print false;", &["false"]);
        assert_output("print 42;", &["42"]);
        assert_output("print 2.5;", &["2.5"]);
        assert_output("print \"s\";", &["s"]);
    }

    #[test]
    fn test_repl_mode_echoes_non_nil_expression_values() {
        let (output, had_error) = run_mode("1 + 2", true);
        assert!(!had_error);
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["3"]);

        let (output, had_error) = run_mode("nil", true);
        assert!(!had_error);
        assert!(output.is_empty());
    }

    #[test]
    fn test_file_mode_does_not_echo_expression_values() {
        let (output, had_error) = run_source("1 + 2;");
        assert!(!had_error);
        assert!(output.is_empty());
    }

    #[test]
    fn test_interpreter_is_deterministic() {
        let source = "var a = 0; for (var i = 0; i < 5; i = i + 1) a += i; print a;";

        assert_eq!(run_source(source), run_source(source));
    }

    #[test]
    fn test_clock_native() {
        assert_output("print clock() > 0;", &["true"]);
    }

    // One interpreter, several parses: annotations recorded for an earlier
    // line must never alias expressions from a later one, so the expression
    // id counter threads through.
    #[test]
    fn test_annotations_stay_valid_across_repl_lines() {
        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(true, Box::new(buffer.clone()));
        let mut next_id = 0;

        for line in ["{ var a = 1; { var c = a; print c; } }", "var x = 5; print x;"] {
            let scanner = Scanner::new(line.as_bytes().to_vec());
            let tokens: Vec<Token> = scanner
                .collect::<Result<Vec<_>, _>>()
                .expect("unexpected scan error");

            let mut parser = Parser::with_first_id(tokens, next_id);
            let (statements, had_error) = parser.parse();
            next_id = parser.next_free_id();
            assert!(!had_error, "syntax error in {:?}", line);

            let mut resolver = Resolver::new(&mut interpreter);
            assert!(!resolver.resolve(&statements), "resolve error in {:?}", line);

            assert!(!interpreter.interpret(&statements));
        }

        assert_eq!(buffer.contents().lines().collect::<Vec<_>>(), vec!["1", "5"]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Runtime errors
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_runtime_errors() {
        assert_runtime_error("true - true;");
        assert_runtime_error("1 + \"a string\";");
        assert_runtime_error("-\"a string\";");
        assert_runtime_error("\"a\" < \"b\";");
        assert_runtime_error("a;");
        assert_runtime_error("a = 1;");
    }

    #[test]
    fn test_modulo_requires_integers() {
        assert_runtime_error("5.0 % 2;");
        assert_runtime_error("5 % 2.0;");
        assert_runtime_error("\"a string\" % \"another string\";");
    }

    #[test]
    fn test_integer_division_by_zero() {
        assert_runtime_error("1 / 0;");
        assert_runtime_error("5 % 0;");

        // Float division by zero follows IEEE-754 instead.
        assert_output("print 1.0 / 0.0;", &["inf"]);
    }

    #[test]
    fn test_call_errors() {
        assert_runtime_error("\"notAFun\"();");
        assert_runtime_error("45();");
        assert_runtime_error("nil();");
        assert_runtime_error("fun f(a) {} f(1, 2);");
        assert_runtime_error("fun f(a, b) { print a + b; } f(1, 2, 3);");
        assert_runtime_error("class C {} C(1);");
    }

    #[test]
    fn test_property_errors() {
        assert_runtime_error("class C {} C().missing;");
        assert_runtime_error("var x = 1; x.y;");
        assert_runtime_error("var x = 1; x.y = 2;");
    }

    #[test]
    fn test_super_method_miss() {
        assert_runtime_error(
            "class A {}\
             class B < A { m() { return super.m(); } }\
             B().m();",
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_runtime_error("var x = 1; class B < x {}");
    }

    #[test]
    fn test_error_aborts_execution() {
        let (output, had_error) = run_source("print 1; 1 + \"a\"; print 2;");

        assert!(had_error);
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["1"]);
    }
}
