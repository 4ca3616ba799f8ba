// tests/parser_tests.rs

use focal_lang::ast::{AssignOp, BinaryOp, NodeKind, UnaryOp};
use focal_lang::lexer::Lexer;
use focal_lang::parser::{ParseError, Parser};
use focal_lang::symbols::Scope;
use focal_lang::value::Value;
use focal_lang::Node;

fn parse(source: &str) -> (Vec<Node>, Vec<ParseError>) {
    let lexer = Lexer::new(source, Scope::globals());
    let mut parser = Parser::new(lexer);
    parser.parse_forest()
}

fn parse_one(source: &str) -> Node {
    let (mut forest, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(forest.len(), 1, "expected exactly one tree");
    forest.remove(0)
}

// ============================================================================
// Precedence and Associativity
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let node = parse_one("2 + 3 * 4");
    match node.kind {
        NodeKind::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } => {
            assert_eq!(left.literal_value(), Some(&Value::Int(2)));
            assert!(matches!(
                right.kind,
                NodeKind::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        other => panic!("expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_parentheses_override_precedence() {
    let node = parse_one("(2 + 3) * 4");
    match node.kind {
        NodeKind::Binary {
            op: BinaryOp::Mul,
            left,
            ..
        } => assert!(matches!(
            left.kind,
            NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        )),
        other => panic!("expected multiplication at the root, got {:?}", other),
    }
}

#[test]
fn test_comparison_over_logic() {
    // `a < b and c > d` groups the comparisons under the `and`
    let node = parse_one("a < b and c > d");
    match node.kind {
        NodeKind::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            assert!(matches!(left.kind, NodeKind::Binary { op: BinaryOp::Lt, .. }));
            assert!(matches!(right.kind, NodeKind::Binary { op: BinaryOp::Gt, .. }));
        }
        other => panic!("expected 'and' at the root, got {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let node = parse_one("a = b = 1");
    match node.kind {
        NodeKind::Assign { op: AssignOp::Assign, value, .. } => {
            assert!(matches!(value.kind, NodeKind::Assign { op: AssignOp::Assign, .. }));
        }
        other => panic!("expected nested assignment, got {:?}", other),
    }
}

#[test]
fn test_flow_binds_loosest() {
    let node = parse_one("x := 1 | f");
    // the whole assignment is the first chain step
    match node.kind {
        NodeKind::Flow(steps) => {
            assert!(matches!(steps[0].kind, NodeKind::Assign { .. }));
        }
        other => panic!("expected a flow chain, got {:?}", other),
    }
}

// ============================================================================
// Unary Operators and Quantifiers
// ============================================================================

#[test]
fn test_prefix_operators() {
    assert!(matches!(
        parse_one("not x").kind,
        NodeKind::Unary { op: UnaryOp::Not, .. }
    ));
    assert!(matches!(
        parse_one("-x").kind,
        NodeKind::Unary { op: UnaryOp::Neg, .. }
    ));
    assert!(matches!(
        parse_one("++x").kind,
        NodeKind::Unary { op: UnaryOp::Incr, .. }
    ));
}

#[test]
fn test_minus_is_retagged_not_mutated() {
    // binary and unary minus resolve to distinct derived token kinds
    use focal_lang::ast::TokenKind;
    let binary = parse_one("a - b");
    assert_eq!(binary.token.kind, TokenKind::Subtract);
    let unary = parse_one("-a");
    assert_eq!(unary.token.kind, TokenKind::Negate);
}

#[test]
fn test_quantifier_prefixes() {
    assert!(matches!(
        parse_one("all: xs").kind,
        NodeKind::Unary { op: UnaryOp::All, .. }
    ));
    assert!(matches!(
        parse_one("any: [1, 2]").kind,
        NodeKind::Unary { op: UnaryOp::Any, .. }
    ));
    assert!(matches!(
        parse_one("none: xs").kind,
        NodeKind::Unary { op: UnaryOp::NoneOf, .. }
    ));
}

#[test]
fn test_bare_none_is_still_a_literal() {
    assert_eq!(parse_one("none").literal_value(), Some(&Value::None));
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_var_definition() {
    let node = parse_one("var x = 5");
    assert!(matches!(node.kind, NodeKind::Assign { op: AssignOp::Define, .. }));
}

#[test]
fn test_def_with_expression_body() {
    let node = parse_one("def f(a, b = 2) = a + b");
    match node.kind {
        NodeKind::FuncDef { name, params, .. } => {
            assert_eq!(name, "f");
            assert_eq!(params.len(), 2);
        }
        other => panic!("expected a function definition, got {:?}", other),
    }
}

#[test]
fn test_call_syntax_assignment_becomes_definition() {
    for source in ["double(x) := x * 2", "double(x) = x * 2", "double(x) => x * 2"] {
        let node = parse_one(source);
        assert!(
            matches!(node.kind, NodeKind::FuncDef { ref name, .. } if name == "double"),
            "failed for input: {}",
            source
        );
    }
}

#[test]
fn test_arrow_without_parameter_list_is_an_error() {
    let (_, errors) = parse("5 => 3");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("parameter list"));
}

// ============================================================================
// Aggregates: Set vs Block
// ============================================================================

#[test]
fn test_all_literals_is_a_set() {
    assert!(matches!(parse_one("{1, 2, 3}").kind, NodeKind::SetLit(_)));
}

#[test]
fn test_named_pairs_is_a_set() {
    assert!(matches!(
        parse_one("{a: 1, b: 2}").kind,
        NodeKind::SetLit(_)
    ));
}

#[test]
fn test_embedded_definition_is_a_block() {
    assert!(matches!(
        parse_one("{x := 1; x + 1}").kind,
        NodeKind::Block(_)
    ));
}

#[test]
fn test_semicolon_forces_block() {
    assert!(matches!(parse_one("{1; 2}").kind, NodeKind::Block(_)));
}

#[test]
fn test_bare_expression_element_is_a_block() {
    // an arithmetic element is executable, so the aggregate is a block
    assert!(matches!(parse_one("{x + 1}").kind, NodeKind::Block(_)));
}

#[test]
fn test_empty_braces_are_a_set() {
    assert!(matches!(parse_one("{}").kind, NodeKind::SetLit(ref items) if items.is_empty()));
}

// ============================================================================
// Flow Chains
// ============================================================================

#[test]
fn test_terminal_bare_reference_becomes_apply() {
    let node = parse_one("5 | double | out");
    match node.kind {
        NodeKind::Flow(steps) => {
            assert_eq!(steps.len(), 3);
            assert!(matches!(steps[1].kind, NodeKind::Read(_)));
            assert!(matches!(steps[2].kind, NodeKind::Apply));
        }
        other => panic!("expected a flow chain, got {:?}", other),
    }
}

#[test]
fn test_terminal_call_is_not_rewritten() {
    let node = parse_one("5 | double()");
    match node.kind {
        NodeKind::Flow(steps) => {
            assert!(matches!(steps[1].kind, NodeKind::FuncCall { .. }));
        }
        other => panic!("expected a flow chain, got {:?}", other),
    }
}

#[test]
fn test_mixed_flow_operators() {
    let node = parse_one("a >> b -> c | d");
    assert!(matches!(node.kind, NodeKind::Flow(ref steps) if steps.len() == 4));
}

// ============================================================================
// Postfix Forms
// ============================================================================

#[test]
fn test_index_and_slice() {
    assert!(matches!(parse_one("xs[0]").kind, NodeKind::Index { .. }));
    assert!(matches!(
        parse_one("xs[1 .. 3]").kind,
        NodeKind::Slice { .. }
    ));
}

#[test]
fn test_indexed_assignment_is_ternary() {
    assert!(matches!(
        parse_one("xs[0] = 9").kind,
        NodeKind::IndexSet { .. }
    ));
}

#[test]
fn test_property_forms() {
    assert!(matches!(
        parse_one("s.price").kind,
        NodeKind::Property { .. }
    ));
    assert!(matches!(
        parse_one("s.price = 9").kind,
        NodeKind::PropertySet { .. }
    ));
    assert!(matches!(
        parse_one("xs.sum()").kind,
        NodeKind::PropertyCall { .. }
    ));
}

#[test]
fn test_bullet_is_the_chain_dot() {
    assert!(matches!(
        parse_one("s•price").kind,
        NodeKind::Property { .. }
    ));
}

#[test]
fn test_call_with_named_arguments() {
    let node = parse_one("f(1, b = 2)");
    match node.kind {
        NodeKind::FuncCall { args, .. } => {
            assert_eq!(args.len(), 2);
            // `b = 2` parses as an assignment; the fixup pass re-tags it
            assert!(matches!(args[1].kind, NodeKind::Assign { .. }));
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_if_then_else() {
    let node = parse_one("if a > 1 then a else 0");
    match node.kind {
        NodeKind::If { otherwise, .. } => assert!(otherwise.is_some()),
        other => panic!("expected a conditional, got {:?}", other),
    }
}

#[test]
fn test_if_without_else() {
    let node = parse_one("if a then b");
    match node.kind {
        NodeKind::If { otherwise, .. } => assert!(otherwise.is_none()),
        other => panic!("expected a conditional, got {:?}", other),
    }
}

// ============================================================================
// Errors and Recovery
// ============================================================================

#[test]
fn test_expected_found_message() {
    let (_, errors) = parse("1 +");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("expected an expression"));
    assert!(errors[0].message.contains("found end of file"));
}

#[test]
fn test_recovery_keeps_later_statements() {
    let (forest, errors) = parse("1 + \n2 + 3");
    assert_eq!(errors.len(), 1);
    assert_eq!(forest.len(), 1);
}

#[test]
fn test_recovery_after_lexical_error() {
    let long = "x".repeat(200);
    let (forest, errors) = parse(&format!("{}\n42", long));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("128"));
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].literal_value(), Some(&Value::Int(42)));
}

#[test]
fn test_multiple_statements_parse_into_a_forest() {
    let (forest, errors) = parse("x := 1; y := 2\nz := 3");
    assert!(errors.is_empty());
    assert_eq!(forest.len(), 3);
}

#[test]
fn test_error_carries_location() {
    let (_, errors) = parse("x :=\n@");
    assert!(!errors.is_empty());
    assert!(errors[0].loc.line >= 1);
}
