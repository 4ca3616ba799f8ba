// tests/interpreter_tests.rs

use std::rc::Rc;

use pretty_assertions::assert_eq;

use focal_lang::ast::BinaryOp;
use focal_lang::interpreter::{Interpreter, RunError, RuntimeError};
use focal_lang::lexer::Lexer;
use focal_lang::parser::Parser;
use focal_lang::series::Series;
use focal_lang::symbols::{self, Scope};
use focal_lang::value::{SetEntry, Value};
use focal_lang::{fixup_forest, Loc};

fn run(source: &str) -> Result<Value, RunError> {
    let mut interpreter = Interpreter::new();
    interpreter.reporter_mut().set_quiet(true);
    interpreter.run(source)
}

fn eval(source: &str) -> Value {
    run(source).unwrap_or_else(|e| panic!("evaluation failed for '{}': {}", source, e))
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_arithmetic() {
    assert_eq!(eval("2 + 3 * 4"), Value::Int(14));
    assert_eq!(eval("(2 + 3) * 4"), Value::Int(20));
    assert_eq!(eval("7 // 2"), Value::Int(3));
    assert_eq!(eval("7 % 2"), Value::Int(1));
    assert_eq!(eval("2 ^ 10"), Value::Int(1024));
}

#[test]
fn test_division_preserves_integers_when_exact() {
    assert_eq!(eval("10 / 2"), Value::Int(5));
    assert_eq!(eval("7 / 2"), Value::Float(3.5));
}

#[test]
fn test_mixed_arithmetic_collapses_whole_results() {
    assert_eq!(eval("1 + 2.0"), Value::Int(3));
    assert_eq!(eval("0.5 * 4"), Value::Int(2));
    assert_eq!(eval("1 + 0.5"), Value::Float(1.5));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("\"foo\" + \"bar\""), Value::Str("foobar".to_string()));
}

#[test]
fn test_division_by_zero_is_a_runtime_error() {
    // the fold pass leaves `1 / 0` alone; evaluation raises
    match run("x := 0; 1 / x") {
        Err(RunError::Runtime(RuntimeError::Unsupported { error, .. })) => {
            assert_eq!(error.to_string(), "division by zero");
        }
        other => panic!("expected a division error, got {:?}", other),
    }
}

// ============================================================================
// Percent, Duration, Time
// ============================================================================

#[test]
fn test_percent_scaling() {
    assert_eq!(eval("100 + 5%"), Value::Int(105));
    assert_eq!(eval("100 - 5%"), Value::Int(95));
    assert_eq!(eval("200 * 5%"), Value::Int(10));
    assert_eq!(eval("5% + 2.5%"), Value::Percent(0.05 + 0.025));
}

#[test]
fn test_duration_arithmetic() {
    assert_eq!(eval("1d + 1d"), Value::Duration(2.0));
    assert_eq!(eval("2wk - 1d"), Value::Duration(13.0));
    assert_eq!(eval("2d * 3"), Value::Duration(6.0));
    assert_eq!(eval("1d / 12h"), Value::Float(2.0));
}

#[test]
fn test_duration_to_whole_days() {
    assert_eq!(eval("2d.days"), Value::Int(2));
    assert_eq!(eval("(2wk + 12h).days"), Value::Int(14));
}

#[test]
fn test_time_arithmetic() {
    assert_eq!(eval("09:30 - 09:00"), Value::Duration(1800.0 / 86_400.0));
    assert_eq!(eval("09:30 + 1h"), Value::Time(37_800));
    assert_eq!(eval("09:30.hour"), Value::Int(9));
    assert_eq!(eval("09:30.minute"), Value::Int(30));
}

// ============================================================================
// Comparison and Logic
// ============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(eval("2 < 3"), Value::Bool(true));
    assert_eq!(eval("2.5 >= 3"), Value::Bool(false));
    assert_eq!(eval("\"abc\" < \"abd\""), Value::Bool(true));
    assert_eq!(eval("1d < 2wk"), Value::Bool(true));
    assert_eq!(eval("09:00 < 09:30"), Value::Bool(true));
}

#[test]
fn test_falls_rises_degenerate_to_ordering_on_scalars() {
    assert_eq!(eval("95 falls 100"), Value::Bool(true));
    assert_eq!(eval("105 rises 100"), Value::Bool(true));
    assert_eq!(eval("95 rises 100"), Value::Bool(false));
}

#[test]
fn test_membership() {
    assert_eq!(eval("2 in [1, 2, 3]"), Value::Bool(true));
    assert_eq!(eval("5 in [1, 2, 3]"), Value::Bool(false));
    assert_eq!(eval("\"ell\" in \"hello\""), Value::Bool(true));
    assert_eq!(eval("\"a\" in {a: 1, b: 2}"), Value::Bool(true));
}

#[test]
fn test_logic_uses_the_boolean_coercion_rule() {
    assert_eq!(eval("1 and \"x\""), Value::Bool(true));
    assert_eq!(eval("0 or none"), Value::Bool(false));
    assert_eq!(eval("not 0"), Value::Bool(true));
    assert_eq!(eval("not empty"), Value::Bool(true));
}

#[test]
fn test_quantifiers() {
    assert_eq!(eval("all: [1, 2, 3]"), Value::Bool(true));
    assert_eq!(eval("all: [1, 0]"), Value::Bool(false));
    assert_eq!(eval("any: [0, 2]"), Value::Bool(true));
    assert_eq!(eval("none: [0, false]"), Value::Bool(true));
    assert_eq!(eval("all: {a: 1, b: 0}"), Value::Bool(false));
}

// ============================================================================
// Assignment and Scopes
// ============================================================================

#[test]
fn test_define_and_read() {
    assert_eq!(eval("x := 5; x"), Value::Int(5));
    assert_eq!(eval("var y = 7\ny + 1"), Value::Int(8));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("x := 5; x += 3; x"), Value::Int(8));
    assert_eq!(eval("x := 5; x -= 3; x"), Value::Int(2));
}

#[test]
fn test_increment_decrement_mutate_storage() {
    assert_eq!(eval("x := 5; ++x"), Value::Int(6));
    assert_eq!(eval("x := 5; ++x; x"), Value::Int(6));
    assert_eq!(eval("x := 5; --x; x"), Value::Int(4));
}

#[test]
fn test_block_value_is_its_last_element() {
    assert_eq!(eval("{x := 1; x + 1}"), Value::Int(2));
}

#[test]
fn test_var_in_block_shadows_without_leaking() {
    assert_eq!(eval("x := 1; y := {var x = 2; x}; x + y"), Value::Int(3));
}

#[test]
fn test_plain_assignment_writes_outward() {
    assert_eq!(eval("x := 1; {x = 5; x}; x"), Value::Int(5));
}

#[test]
fn test_scopes_do_not_leak_between_runs() {
    assert_eq!(eval("x := 5; x"), Value::Int(5));
    // a fresh interpreter knows nothing about x
    assert_eq!(eval("x"), Value::None);
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_if_then_else() {
    assert_eq!(eval("if 1 < 2 then \"a\" else \"b\""), Value::Str("a".to_string()));
    assert_eq!(eval("if 1 > 2 then \"a\" else \"b\""), Value::Str("b".to_string()));
    assert_eq!(eval("if false then 1"), Value::None);
}

#[test]
fn test_untaken_branch_is_never_evaluated() {
    assert_eq!(
        eval("x := 0; if true then 1 else (x = 99); x"),
        Value::Int(0)
    );
}

// ============================================================================
// Evaluation Order
// ============================================================================

#[test]
fn test_binary_operands_evaluate_right_to_left() {
    let source = r#"
        log := ""
        def lhs() = { log = log + "L"; 1 }
        def rhs() = { log = log + "R"; 2 }
        lhs() + rhs()
        log
    "#;
    assert_eq!(eval(source), Value::Str("RL".to_string()));
}

#[test]
fn test_assignment_value_runs_before_target_resolution() {
    let source = r#"
        log := ""
        def effect() = { log = log + "V"; 1 }
        target := 0
        target = effect()
        log
    "#;
    assert_eq!(eval(source), Value::Str("V".to_string()));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_definition_spellings() {
    for source in [
        "def f(x) = x * 2; f(4)",
        "f(x) := x * 2; f(4)",
        "f(x) => x * 2; f(4)",
    ] {
        assert_eq!(eval(source), Value::Int(8), "failed for: {}", source);
    }
}

#[test]
fn test_parameter_defaults() {
    assert_eq!(eval("def f(a = 1, b = 2) = a * 10 + b; f(b = 5)"), Value::Int(15));
    assert_eq!(eval("def f(a = 1, b = 2) = a * 10 + b; f(7)"), Value::Int(72));
    assert_eq!(eval("def f(a = 1, b = 2) = a * 10 + b; f()"), Value::Int(12));
}

#[test]
fn test_unknown_named_argument_is_an_error() {
    match run("def f(a) = a; f(b = 1)") {
        Err(RunError::Runtime(RuntimeError::UnknownParameter { name, .. })) => {
            assert_eq!(name, "b");
        }
        other => panic!("expected an unknown-parameter error, got {:?}", other),
    }
}

#[test]
fn test_too_many_arguments_is_an_error() {
    assert!(matches!(
        run("def f(a) = a; f(1, 2)"),
        Err(RunError::Runtime(RuntimeError::TooManyArguments { .. }))
    ));
}

#[test]
fn test_calling_a_non_function_is_an_error() {
    assert!(matches!(
        run("x := 5; x(1)"),
        Err(RunError::Runtime(RuntimeError::NotCallable { .. }))
    ));
}

#[test]
fn test_functions_close_over_their_defining_scope() {
    let source = "def outer() { var n = 5; def inner() = n; inner() }\nouter()";
    assert_eq!(eval(source), Value::Int(5));
}

#[test]
fn test_block_bodied_function() {
    assert_eq!(eval("def f(a) { var b = a + 1; b * 2 }; f(3)"), Value::Int(8));
}

// ============================================================================
// Flow Chains
// ============================================================================

#[test]
fn test_flow_pipes_into_functions() {
    assert_eq!(eval("double(x) := x * 2; 5 | double"), Value::Int(10));
    assert_eq!(eval("double(x) := x * 2; 5 | double | double"), Value::Int(20));
}

#[test]
fn test_flow_call_step_gets_the_running_value_first() {
    assert_eq!(eval("add(a, b) := a + b; 5 | add(3)"), Value::Int(8));
}

#[test]
fn test_flow_terminal_name_receives_an_assignment() {
    assert_eq!(eval("double(x) := x * 2; 5 | double | out; out"), Value::Int(10));
}

#[test]
fn test_flow_operators_are_interchangeable() {
    assert_eq!(eval("double(x) := x * 2; 5 >> double -> out; out"), Value::Int(10));
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_set_literal_value() {
    assert_eq!(
        eval("{1, 2}"),
        Value::Set(vec![
            SetEntry { name: None, value: Value::Int(1) },
            SetEntry { name: None, value: Value::Int(2) },
        ])
    );
}

#[test]
fn test_named_set_property_access() {
    assert_eq!(eval("s := {a: 1, b: 2}; s.a + s.b"), Value::Int(3));
    assert_eq!(eval("s := {a: 1}; s[\"a\"]"), Value::Int(1));
}

#[test]
fn test_set_property_assignment() {
    assert_eq!(eval("s := {a: 1}; s.a = 5; s.a"), Value::Int(5));
    assert_eq!(eval("s := {a: 1}; s.b = 2; s.b"), Value::Int(2));
}

#[test]
fn test_list_indexing_and_slicing() {
    assert_eq!(eval("xs := [10, 20, 30]; xs[1]"), Value::Int(20));
    assert_eq!(eval("xs := [10, 20, 30]; xs[-1]"), Value::Int(30));
    assert_eq!(
        eval("xs := [1, 2, 3, 4]; xs[1 .. 3]"),
        Value::List(vec![Value::Int(2), Value::Int(3)])
    );
    assert_eq!(eval("xs := [1]; xs[9]"), Value::None);
}

#[test]
fn test_indexed_assignment() {
    assert_eq!(
        eval("xs := [1, 2]; xs[0] = 9; xs"),
        Value::List(vec![Value::Int(9), Value::Int(2)])
    );
}

#[test]
fn test_out_of_bounds_indexed_assignment_is_an_error() {
    assert!(matches!(
        run("xs := [1]; xs[5] = 9"),
        Err(RunError::Runtime(RuntimeError::IndexOutOfBounds { .. }))
    ));
}

#[test]
fn test_range_builds_a_list() {
    assert_eq!(
        eval("1 .. 4"),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_list_methods() {
    assert_eq!(eval("[1, 2, 3].sum()"), Value::Int(6));
    assert_eq!(eval("[1d, 2d].sum()"), Value::Duration(3.0));
    assert_eq!(eval("[3, 1, 2].min()"), Value::Int(1));
    assert_eq!(eval("[3, 1, 2].max()"), Value::Int(3));
    assert_eq!(eval("[1, 2].first()"), Value::Int(1));
    assert_eq!(eval("\"abc\".upper()"), Value::Str("ABC".to_string()));
}

// ============================================================================
// Errors, Warnings, Strict Mode
// ============================================================================

#[test]
fn test_undefined_read_warns_and_yields_none() {
    let mut interpreter = Interpreter::new();
    interpreter.reporter_mut().set_quiet(true);
    assert_eq!(interpreter.run("ghost").unwrap(), Value::None);
    assert_eq!(interpreter.reporter().warning_count(), 1);
}

#[test]
fn test_strict_mode_promotes_the_warning() {
    let mut interpreter = Interpreter::new();
    interpreter.reporter_mut().set_quiet(true);
    interpreter.reporter_mut().set_strict(true);
    assert!(matches!(
        interpreter.run("ghost"),
        Err(RunError::Runtime(RuntimeError::Undefined { .. }))
    ));
}

#[test]
fn test_dispatch_error_names_operator_and_kinds() {
    match run("x := \"a\"; x - 1") {
        Err(RunError::Runtime(RuntimeError::Unsupported { error, .. })) => {
            let message = error.to_string();
            assert!(message.contains("'-'"));
            assert!(message.contains("string"));
            assert!(message.contains("integer"));
        }
        other => panic!("expected a dispatch error, got {:?}", other),
    }
}

#[test]
fn test_forest_continues_after_a_failed_tree() {
    let mut interpreter = Interpreter::new();
    interpreter.reporter_mut().set_quiet(true);

    let lexer = Lexer::new("y := \"a\"\ny - 1\n2 + 2", interpreter.globals());
    let mut parser = Parser::new(lexer);
    let (forest, errors) = parser.parse_forest();
    assert!(errors.is_empty());

    let forest = fixup_forest(forest);
    let results = interpreter.eval_forest(&forest);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap(), &Value::Int(4));
}

// ============================================================================
// External Series Values
// ============================================================================

#[derive(Debug)]
struct ConstSeries(f64);

impl Series for ConstSeries {
    fn label(&self) -> &str {
        "const"
    }

    fn binary(&self, op: BinaryOp, other: &Value, reversed: bool) -> Option<Value> {
        let n = other.as_number()?;
        let (a, b) = if reversed { (n, self.0) } else { (self.0, n) };
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            _ => return None,
        };
        Some(Value::Float(result))
    }

    fn compare(&self, op: BinaryOp, other: &Value, reversed: bool) -> Option<Value> {
        let n = other.as_number()?;
        let (a, b) = if reversed { (n, self.0) } else { (self.0, n) };
        let result = match op {
            BinaryOp::Lt | BinaryOp::Falls => a < b,
            BinaryOp::Gt | BinaryOp::Rises => a > b,
            _ => return None,
        };
        Some(Value::Bool(result))
    }

    fn negate(&self) -> Option<Value> {
        Some(Value::Float(-self.0))
    }
}

fn interpreter_with_series(name: &str, level: f64) -> Interpreter {
    let interpreter = Interpreter::new();
    symbols::define(
        &interpreter.globals(),
        name,
        Value::Series(Rc::new(ConstSeries(level))),
        false,
        true,
        Loc::default(),
    );
    interpreter
}

#[test]
fn test_series_participates_in_dispatch() {
    let mut interpreter = interpreter_with_series("prices", 100.0);
    assert_eq!(interpreter.run("prices * 2").unwrap(), Value::Float(200.0));
    assert_eq!(interpreter.run("2 * prices").unwrap(), Value::Float(200.0));
    assert_eq!(interpreter.run("-prices").unwrap(), Value::Float(-100.0));
}

#[test]
fn test_series_threshold_operators() {
    let mut interpreter = interpreter_with_series("prices", 100.0);
    assert_eq!(interpreter.run("prices rises 50").unwrap(), Value::Bool(true));
    assert_eq!(interpreter.run("prices falls 50").unwrap(), Value::Bool(false));
    assert_eq!(interpreter.run("200 rises prices").unwrap(), Value::Bool(true));
}

#[test]
fn test_series_capability_miss_is_a_dispatch_error() {
    let mut interpreter = interpreter_with_series("prices", 100.0);
    interpreter.reporter_mut().set_quiet(true);
    assert!(matches!(
        interpreter.run("prices / 2"),
        Err(RunError::Runtime(RuntimeError::Unsupported { .. }))
    ));
}
