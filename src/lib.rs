//! Focal: a small expression/rule language for formulaic computations over
//! scalars, durations, percentages, and aggregate literals.
//!
//! The pipeline: [`lexer::Lexer`] turns source text into tokens,
//! [`parser::Parser`] builds one tree per top-level statement,
//! [`fixup::fixup`] rewrites and constant-folds each tree, and
//! [`interpreter::Interpreter`] evaluates the forest against its scope
//! chain. The [`dispatch`] engine is shared by folding and evaluation.

pub mod ast;
pub mod dispatch;
pub mod fixup;
pub mod interpreter;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod report;
pub mod series;
pub mod symbols;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{AssignOp, BinaryOp, Loc, Node, NodeKind, Token, TokenClass, TokenKind, UnaryOp};
pub use dispatch::DispatchError;
pub use fixup::{fixup, fixup_forest};
pub use interpreter::{Interpreter, RunError, RuntimeError};
pub use lexer::Lexer;
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use report::Reporter;
pub use series::Series;
pub use symbols::{Scope, ScopeRef, ScopeStack, Symbol};
pub use value::{Function, Param, SetEntry, Value};
