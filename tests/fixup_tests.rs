// tests/fixup_tests.rs
//
// Each fixup behavior is independently testable: write-target re-tagging,
// call-to-definition promotion, key:value normalization, constant folding.

use focal_lang::ast::{AssignOp, BinaryOp, NodeKind, TokenKind};
use focal_lang::lexer::Lexer;
use focal_lang::parser::Parser;
use focal_lang::symbols::Scope;
use focal_lang::value::Value;
use focal_lang::{fixup, Interpreter, Loc, Node, Token};

fn parse_one(source: &str) -> Node {
    let lexer = Lexer::new(source, Scope::globals());
    let mut parser = Parser::new(lexer);
    let (mut forest, errors) = parser.parse_forest();
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(forest.len(), 1);
    forest.remove(0)
}

fn fixed(source: &str) -> Node {
    fixup(parse_one(source))
}

// ============================================================================
// (a) Reference Resolution
// ============================================================================

#[test]
fn test_read_target_becomes_write() {
    let node = fixed("x = 1");
    match node.kind {
        NodeKind::Assign { target, .. } => {
            assert!(matches!(target.kind, NodeKind::Write(ref n) if n == "x"));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn test_write_retag_keeps_lexeme_and_location() {
    let node = fixed("price = 1");
    match node.kind {
        NodeKind::Assign { target, .. } => {
            assert_eq!(target.token.lexeme, "price");
            assert_eq!(target.token.loc, Loc::new(1, 1));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn test_reads_in_value_position_stay_reads() {
    let node = fixed("x = y");
    match node.kind {
        NodeKind::Assign { value, .. } => {
            assert!(matches!(value.kind, NodeKind::Read(ref n) if n == "y"));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}

// ============================================================================
// (b) Call-to-Definition Promotion
// ============================================================================

#[test]
fn test_fixup_promotes_call_targets_the_parser_missed() {
    // hand-built shape: f(x) on the left of an assignment, as if the
    // parser's inline rewrite had not run
    let loc = Loc::new(1, 1);
    let read = |name: &str| {
        Node::new(
            Token::new(TokenKind::Identifier, name, loc),
            NodeKind::Read(name.to_string()),
        )
    };
    let call = Node::new(
        Token::new(TokenKind::Identifier, "f", loc),
        NodeKind::FuncCall {
            callee: Box::new(read("f")),
            args: vec![read("x")],
        },
    );
    let assign = Node::new(
        Token::new(TokenKind::Define, ":=", loc),
        NodeKind::Assign {
            op: AssignOp::Define,
            target: Box::new(call),
            value: Box::new(read("x")),
        },
    );

    let node = fixup(assign);
    match node.kind {
        NodeKind::FuncDef { name, params, .. } => {
            assert_eq!(name, "f");
            assert_eq!(params.len(), 1);
        }
        other => panic!("expected promotion to a definition, got {:?}", other),
    }
}

// ============================================================================
// (c) Key:Value Normalization
// ============================================================================

#[test]
fn test_named_argument_assignment_becomes_pair() {
    let node = fixed("f(a = 1, 2)");
    match node.kind {
        NodeKind::FuncCall { args, .. } => {
            assert!(matches!(args[0].kind, NodeKind::Pair { .. }));
            assert!(args[1].is_literal());
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_parameter_defaults_normalize_to_pairs() {
    let node = fixed("def f(a = 1, b) = a");
    match node.kind {
        NodeKind::FuncDef { params, .. } => {
            assert!(matches!(params[0].kind, NodeKind::Pair { .. }));
            assert!(matches!(params[1].kind, NodeKind::Read(_)));
        }
        other => panic!("expected a definition, got {:?}", other),
    }
}

// ============================================================================
// (d) Constant Folding
// ============================================================================

#[test]
fn test_folds_literal_arithmetic() {
    let node = fixed("2 + 3 * 4");
    assert_eq!(node.literal_value(), Some(&Value::Int(14)));
}

#[test]
fn test_folded_node_keeps_the_original_location() {
    // the root addition sits at column 3; the folded literal inherits it
    let node = fixed("2 + 3 * 4");
    assert_eq!(node.token.loc, Loc::new(1, 3));
    assert_eq!(node.token.kind, TokenKind::Integer);
}

#[test]
fn test_folds_unary_negation() {
    let node = fixed("-5");
    assert_eq!(node.literal_value(), Some(&Value::Int(-5)));
}

#[test]
fn test_folds_duration_and_percent() {
    assert_eq!(fixed("1d + 1d").literal_value(), Some(&Value::Duration(2.0)));
    assert_eq!(fixed("100 + 5%").literal_value(), Some(&Value::Int(105)));
}

#[test]
fn test_unsupported_fold_is_left_unfolded() {
    // no dispatch rule for string minus integer: the node survives and
    // only errors at evaluation time
    let node = fixed("\"a\" - 1");
    assert!(matches!(
        node.kind,
        NodeKind::Binary {
            op: BinaryOp::Sub,
            ..
        }
    ));
}

#[test]
fn test_division_by_zero_is_left_unfolded() {
    let node = fixed("1 / 0");
    assert!(matches!(node.kind, NodeKind::Binary { .. }));
}

#[test]
fn test_folding_does_not_touch_non_literal_operands() {
    let node = fixed("x + 1");
    assert!(matches!(node.kind, NodeKind::Binary { .. }));
}

#[test]
fn test_children_fold_before_parents() {
    // the inner multiplication folds even though the outer addition can't
    let node = fixed("x + 3 * 4");
    match node.kind {
        NodeKind::Binary { right, .. } => {
            assert_eq!(right.literal_value(), Some(&Value::Int(12)));
        }
        other => panic!("expected a binary node, got {:?}", other),
    }
}

// ============================================================================
// Folding Equivalence
// ============================================================================

#[test]
fn test_fold_matches_runtime_evaluation() {
    let sources = [
        "2 + 3 * 4",
        "10 / 4",
        "2 ^ 10",
        "7 // 2",
        "1d + 12h",
        "100 - 5%",
        "\"a\" + \"b\"",
        "3 < 4",
        "not true",
        "09:30 - 09:00",
    ];
    for source in sources {
        let unfolded = parse_one(source);
        let mut interpreter = Interpreter::new();
        interpreter.reporter_mut().set_quiet(true);
        let evaluated = interpreter
            .eval_tree(&unfolded)
            .unwrap_or_else(|e| panic!("evaluation failed for '{}': {}", source, e));
        let folded = fixup(unfolded);
        assert_eq!(
            folded.literal_value(),
            Some(&evaluated),
            "fold/eval mismatch for '{}'",
            source
        );
    }
}
