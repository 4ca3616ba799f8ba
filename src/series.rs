//! Capability contract for external tabular/array values.
//!
//! A data provider (DataFrame, Series, ndarray) plugs its values into the
//! language as [`crate::value::Value::Series`]. The core never constructs
//! or introspects such a value; it only routes operator dispatch through
//! this trait. A capability returning `None` means the combination is
//! unsupported and surfaces as the usual typed dispatch error.

use std::fmt;

use crate::ast::operators::BinaryOp;
use crate::value::Value;

pub trait Series: fmt::Debug {
    /// Short label used in diagnostics and display.
    fn label(&self) -> &str;

    /// Arithmetic capability. `reversed` is true when the series was the
    /// right-hand operand (`2 * series` rather than `series * 2`).
    fn binary(&self, op: BinaryOp, other: &Value, reversed: bool) -> Option<Value>;

    /// Comparison capability, including the `falls`/`rises` threshold
    /// operators.
    fn compare(&self, op: BinaryOp, other: &Value, reversed: bool) -> Option<Value>;

    /// Negation capability.
    fn negate(&self) -> Option<Value>;
}
