//! The fixup pass: a tree-to-tree rewrite applied to each parsed tree
//! before evaluation.
//!
//! Four behaviors, each independently testable:
//!
//! - **reference resolution** — read references in write-target position
//!   become write references of the same lexeme and location; no symbol
//!   lookup happens here (that is the interpreter's job),
//! - **call-to-definition promotion** — a call node on the left of an
//!   assignment becomes a function definition with the parameter list
//!   hoisted out of the call (backstop for shapes the parser's inline
//!   rewrite did not see),
//! - **key:value normalization** — `k = v` children of parameter lists and
//!   argument lists are re-tagged into `k: v` pairs so positional and
//!   named entries flow through one shape,
//! - **constant folding** — once both operands of a binary or unary node
//!   are literals, the dispatch engine runs immediately and the node is
//!   replaced wholesale by a fresh literal node at the original location.
//!   Folding is best-effort: a dispatch miss leaves the node unfolded and
//!   never raises during this pass.
//!
//! Children are rewritten before their parent is considered for folding.
//! The pass consumes the tree and rebuilds it, so there are no parent
//! pointers to maintain — the recursion stack is the parent chain.

use crate::ast::nodes::{Node, NodeKind};
use crate::ast::operators::AssignOp;
use crate::ast::tokens::{Token, TokenKind};
use crate::dispatch;
use crate::value::Value;

/// Rewrite one tree.
pub fn fixup(node: Node) -> Node {
    let Node { token, kind } = node;
    match kind {
        NodeKind::Literal(_)
        | NodeKind::Read(_)
        | NodeKind::Write(_)
        | NodeKind::Apply => Node::new(token, kind),

        NodeKind::Assign { op, target, value } => {
            let target = fixup(*target);
            let value = fixup(*value);
            if matches!(op, AssignOp::Assign | AssignOp::Define)
                && let NodeKind::FuncCall { callee, args } = &target.kind
                && let NodeKind::Read(name) = &callee.kind
            {
                let params = args.iter().cloned().map(normalize_entry).collect();
                return Node::new(
                    token,
                    NodeKind::FuncDef {
                        name: name.clone(),
                        params,
                        body: Box::new(value),
                    },
                );
            }
            let target = write_target(target);
            Node::new(
                token,
                NodeKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
            )
        }

        NodeKind::Binary { op, left, right } => {
            let left = fixup(*left);
            let right = fixup(*right);
            if let (Some(l), Some(r)) = (left.literal_value(), right.literal_value())
                && let Ok(folded) = dispatch::binary(op, l, r)
            {
                let tok = literal_token(&token, &folded);
                return Node::literal(tok, folded);
            }
            Node::new(
                token,
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            )
        }

        NodeKind::Unary { op, expr } => {
            let expr = fixup(*expr);
            if let Some(v) = expr.literal_value()
                && let Ok(folded) = dispatch::unary(op, v)
            {
                let tok = literal_token(&token, &folded);
                return Node::literal(tok, folded);
            }
            Node::new(
                token,
                NodeKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
            )
        }

        NodeKind::Pair { key, value } => Node::new(
            token,
            NodeKind::Pair {
                key: Box::new(fixup(*key)),
                value: Box::new(fixup(*value)),
            },
        ),

        NodeKind::If {
            test,
            then,
            otherwise,
        } => Node::new(
            token,
            NodeKind::If {
                test: Box::new(fixup(*test)),
                then: Box::new(fixup(*then)),
                otherwise: otherwise.map(|n| Box::new(fixup(*n))),
            },
        ),

        NodeKind::Index { base, index } => Node::new(
            token,
            NodeKind::Index {
                base: Box::new(fixup(*base)),
                index: Box::new(fixup(*index)),
            },
        ),

        NodeKind::IndexSet { base, index, value } => Node::new(
            token,
            NodeKind::IndexSet {
                base: Box::new(fixup(*base)),
                index: Box::new(fixup(*index)),
                value: Box::new(fixup(*value)),
            },
        ),

        NodeKind::Slice { base, start, end } => Node::new(
            token,
            NodeKind::Slice {
                base: Box::new(fixup(*base)),
                start: Box::new(fixup(*start)),
                end: Box::new(fixup(*end)),
            },
        ),

        NodeKind::Property { base, name } => Node::new(
            token,
            NodeKind::Property {
                base: Box::new(fixup(*base)),
                name,
            },
        ),

        NodeKind::PropertySet { base, name, value } => Node::new(
            token,
            NodeKind::PropertySet {
                base: Box::new(fixup(*base)),
                name,
                value: Box::new(fixup(*value)),
            },
        ),

        NodeKind::PropertyCall { base, name, args } => Node::new(
            token,
            NodeKind::PropertyCall {
                base: Box::new(fixup(*base)),
                name,
                args: args.into_iter().map(fixup).collect(),
            },
        ),

        NodeKind::Block(items) => Node::new(
            token,
            NodeKind::Block(items.into_iter().map(fixup).collect()),
        ),

        NodeKind::ListLit(items) => Node::new(
            token,
            NodeKind::ListLit(items.into_iter().map(fixup).collect()),
        ),

        NodeKind::SetLit(items) => Node::new(
            token,
            NodeKind::SetLit(items.into_iter().map(fixup).collect()),
        ),

        NodeKind::Flow(steps) => Node::new(
            token,
            NodeKind::Flow(steps.into_iter().map(fixup).collect()),
        ),

        NodeKind::FuncDef { name, params, body } => Node::new(
            token,
            NodeKind::FuncDef {
                name,
                params: params
                    .into_iter()
                    .map(|p| normalize_entry(fixup(p)))
                    .collect(),
                body: Box::new(fixup(*body)),
            },
        ),

        NodeKind::FuncCall { callee, args } => Node::new(
            token,
            NodeKind::FuncCall {
                callee: Box::new(fixup(*callee)),
                args: args
                    .into_iter()
                    .map(|a| normalize_entry(fixup(a)))
                    .collect(),
            },
        ),
    }
}

/// Rewrite every tree of a forest.
pub fn fixup_forest(forest: Vec<Node>) -> Vec<Node> {
    forest.into_iter().map(fixup).collect()
}

/// A read reference in target position becomes a write reference with the
/// same lexeme and location.
fn write_target(node: Node) -> Node {
    match node.kind {
        NodeKind::Read(name) => Node::new(node.token, NodeKind::Write(name)),
        _ => node,
    }
}

/// `k = v` inside a parameter or argument list is the named-entry form;
/// re-tag it into `k: v`.
fn normalize_entry(node: Node) -> Node {
    let Node { token, kind } = node;
    match kind {
        NodeKind::Assign {
            op: AssignOp::Assign,
            target,
            value,
        } => {
            let t = *target;
            match t.kind {
                NodeKind::Read(name) | NodeKind::Write(name) => {
                    let key = Node::new(t.token, NodeKind::Read(name));
                    Node::new(
                        token,
                        NodeKind::Pair {
                            key: Box::new(key),
                            value,
                        },
                    )
                }
                other => Node::new(
                    token,
                    NodeKind::Assign {
                        op: AssignOp::Assign,
                        target: Box::new(Node::new(t.token, other)),
                        value,
                    },
                ),
            }
        }
        other => Node::new(token, other),
    }
}

/// A fresh literal token at the original node's location.
fn literal_token(original: &Token, value: &Value) -> Token {
    let kind = match value {
        Value::Bool(true) => TokenKind::True,
        Value::Bool(false) => TokenKind::False,
        Value::Int(_) => TokenKind::Integer,
        Value::Float(_) => TokenKind::Float,
        Value::Percent(_) => TokenKind::PercentLit,
        Value::Duration(_) => TokenKind::DurationLit,
        Value::Time(_) => TokenKind::TimeLit,
        Value::Str(_) => TokenKind::Str,
        Value::None => TokenKind::NoneLit,
        Value::Empty => TokenKind::EmptyLit,
        _ => original.kind,
    };
    Token::new(kind, original.lexeme.clone(), original.loc)
}
