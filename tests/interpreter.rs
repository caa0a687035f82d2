//! End-to-end scenarios through the full pipeline: scan, parse, resolve,
//! evaluate, asserting on captured stdout.

use roxide::error::LoxError;
use roxide::runner::Runner;

fn run(source: &str) -> Result<String, Vec<LoxError>> {
    let mut out: Vec<u8> = Vec::new();

    {
        let mut runner = Runner::new(&mut out);
        runner.run(source.as_bytes())?;
    }

    Ok(String::from_utf8(out).expect("interpreter output is UTF-8"))
}

#[test]
fn addition_prints_without_decimal() {
    assert_eq!(run("print 1 + 2;").unwrap(), "3\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(
        run(r#"var a = "hi "; var b = "there"; print a + b;"#).unwrap(),
        "hi there\n"
    );
}

#[test]
fn for_loop_accumulates() {
    assert_eq!(
        run("var a = 0; for (var i = 0; i < 3; i = i + 1) a = a + i; print a;").unwrap(),
        "3\n"
    );
}

#[test]
fn closure_counter_increments_across_calls() {
    let src = r#"
        fun mk() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }
        var f = mk(); print f(); print f(); print f();
    "#;
    assert_eq!(run(src).unwrap(), "1\n2\n3\n");
}

#[test]
fn variable_use_binds_at_declaration_scope() {
    let src = r#"
        var a = "global";
        { fun show() { print a; } show(); var a = "local"; show(); }
    "#;
    assert_eq!(run(src).unwrap(), "global\nglobal\n");
}

#[test]
fn inheritance_and_super_dispatch() {
    let src = r#"
        class A { hi() { print "A"; } }
        class B < A { hi() { super.hi(); print "B"; } }
        B().hi();
    "#;
    assert_eq!(run(src).unwrap(), "A\nB\n");
}

#[test]
fn initializer_returns_this_even_on_early_return() {
    assert_eq!(
        run("class C { init() { return; } } print C();").unwrap(),
        "C instance\n"
    );
}

#[test]
fn subtracting_a_string_is_a_runtime_error() {
    let errors = run(r#"print "x" - 1;"#).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], LoxError::Runtime { .. }));

    // stderr shape: message line, then "[line 1]".
    let rendered = errors[0].to_string();
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("Operands must be numbers."));
    assert_eq!(lines.next(), Some("[line 1]"));
}

#[test]
fn environment_pointer_survives_a_failed_block() {
    // The block errors halfway; the globals frame must still be the
    // current environment afterwards, so the follow-up line works.
    let mut out: Vec<u8> = Vec::new();
    let mut runner = Runner::new(&mut out);

    runner.run(b"var a = 1;").unwrap();
    assert!(runner
        .run(b"{ var b = 2; print b + nil; print 99; }")
        .is_err());
    runner.run(b"print a;").unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed, "1\n");
}

#[test]
fn two_reads_of_a_method_yield_distinct_but_equivalent_bindings() {
    let src = r#"
        class C {
            init() { this.n = 41; }
            m() { return this.n + 1; }
        }
        var i = C();
        var f = i.m;
        var g = i.m;
        print f == g;
        print f();
        print g();
    "#;
    assert_eq!(run(src).unwrap(), "false\n42\n42\n");
}

#[test]
fn fields_shadow_methods_after_assignment() {
    let src = r#"
        class C { m() { return "method"; } }
        var c = C();
        print c.m();
        c.m = "field";
        print c.m;
    "#;
    assert_eq!(run(src).unwrap(), "method\nfield\n");
}

#[test]
fn instances_compare_by_identity() {
    let src = r#"
        class C {}
        var a = C();
        var b = C();
        print a == a;
        print a == b;
    "#;
    assert_eq!(run(src).unwrap(), "true\nfalse\n");
}

#[test]
fn nil_equality_table() {
    assert_eq!(run("print nil == nil;").unwrap(), "true\n");
    assert_eq!(run("print nil == false;").unwrap(), "false\n");
    assert_eq!(run("print nil == 0;").unwrap(), "false\n");
}

#[test]
fn argument_evaluation_order_is_source_order() {
    let src = r#"
        fun three(a, b, c) { return a; }
        var log = "";
        fun note(x) { log = log + x; return x; }
        three(note("1"), note("2"), note("3"));
        print log;
    "#;
    assert_eq!(run(src).unwrap(), "123\n");
}

#[test]
fn clock_is_monotonic_within_a_run() {
    assert_eq!(
        run("var a = clock(); var b = clock(); print b >= a;").unwrap(),
        "true\n"
    );
}

#[test]
fn resolver_errors_abort_before_evaluation() {
    let mut out: Vec<u8> = Vec::new();
    let mut runner = Runner::new(&mut out);

    let errors = runner.run(b"print 1; return 2;").unwrap_err();

    assert!(errors[0]
        .to_string()
        .contains("Can't return from top-level code."));
    // `print 1;` resolved fine but must not have run.
    assert_eq!(out.len(), 0);
}

#[test]
fn resolver_reports_every_error_in_one_statement() {
    // Both mistakes live inside a single block; the resolver must keep
    // walking past the first instead of abandoning the statement.
    let mut out: Vec<u8> = Vec::new();
    let mut runner = Runner::new(&mut out);

    let errors = runner.run(b"{ return 1; this; }").unwrap_err();

    assert_eq!(errors.len(), 2);
    assert!(errors[0]
        .to_string()
        .contains("Can't return from top-level code."));
    assert!(errors[1]
        .to_string()
        .contains("Can't use 'this' outside of a class."));
    assert_eq!(out.len(), 0);
}
