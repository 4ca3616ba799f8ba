//! The operator dispatch engine.
//!
//! One function per operator family, each matching exhaustively over the
//! closed [`Value`] sum type, so every (operator, kind, kind) combination
//! is either handled or an explicit [`DispatchError`]. The same entry
//! points serve the fixup pass (constant folding, where a miss means
//! "leave the node unfolded") and the interpreter (where a miss is a typed
//! runtime error).
//!
//! External series values participate through the [`Series`] capability
//! contract only; the engine never looks inside one.

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::ast::operators::{BinaryOp, UnaryOp};
use crate::value::{SetEntry, Value};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A dispatch miss or arithmetic fault, reported with the operator and the
/// operand kind names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    Unsupported {
        operator: String,
        left: &'static str,
        right: Option<&'static str>,
    },
    DivisionByZero,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Unsupported {
                operator,
                left,
                right: Some(right),
            } => write!(
                f,
                "unsupported operator '{}' for operand types {} and {}",
                operator, left, right
            ),
            DispatchError::Unsupported {
                operator,
                left,
                right: None,
            } => write!(
                f,
                "unsupported operator '{}' for operand type {}",
                operator, left
            ),
            DispatchError::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for DispatchError {}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> DispatchError {
    DispatchError::Unsupported {
        operator: op.to_string(),
        left: left.kind(),
        right: Some(right.kind()),
    }
}

fn unsupported_unary(op: UnaryOp, value: &Value) -> DispatchError {
    DispatchError::Unsupported {
        operator: op.to_string(),
        left: value.kind(),
        right: None,
    }
}

/// Evaluate `left op right`.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, DispatchError> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Pow
        | BinaryOp::Mod => arithmetic(op, left, right),
        BinaryOp::Range => range(left, right),
        BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Falls
        | BinaryOp::Rises => comparison(op, left, right),
        BinaryOp::In => membership(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::And => Ok(Value::Bool(left.truthy() && right.truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.truthy() || right.truthy())),
    }
}

/// Evaluate `op value`. The storage-mutating `++`/`--` are resolved by the
/// interpreter against the symbol table and never reach the engine.
pub fn unary(op: UnaryOp, value: &Value) -> Result<Value, DispatchError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
        UnaryOp::Neg => match value {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            Value::Percent(p) => Ok(Value::Percent(-p)),
            Value::Duration(d) => Ok(Value::Duration(-d)),
            Value::Series(s) => s.negate().ok_or_else(|| unsupported_unary(op, value)),
            _ => Err(unsupported_unary(op, value)),
        },
        UnaryOp::Pos => match value {
            Value::Int(_)
            | Value::Float(_)
            | Value::Percent(_)
            | Value::Duration(_)
            | Value::Series(_) => Ok(value.clone()),
            _ => Err(unsupported_unary(op, value)),
        },
        UnaryOp::All => quantify(op, value).map(|flags| Value::Bool(flags.iter().all(|b| *b))),
        UnaryOp::Any => quantify(op, value).map(|flags| Value::Bool(flags.iter().any(|b| *b))),
        UnaryOp::NoneOf => quantify(op, value).map(|flags| Value::Bool(!flags.iter().any(|b| *b))),
        UnaryOp::Incr | UnaryOp::Decr => Err(unsupported_unary(op, value)),
    }
}

fn quantify(op: UnaryOp, value: &Value) -> Result<Vec<bool>, DispatchError> {
    match value {
        Value::List(items) => Ok(items.iter().map(Value::truthy).collect()),
        Value::Set(entries) => Ok(entries.iter().map(|e| e.value.truthy()).collect()),
        Value::Empty => Ok(Vec::new()),
        _ => Err(unsupported_unary(op, value)),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, DispatchError> {
    if let Value::Series(s) = left {
        return s
            .binary(op, right, false)
            .ok_or_else(|| unsupported(op, left, right));
    }
    if let Value::Series(s) = right {
        return s
            .binary(op, left, true)
            .ok_or_else(|| unsupported(op, left, right));
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_int(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_float(op, *a, *b),
        (Value::Int(a), Value::Float(b)) => mixed(
            op,
            Decimal::from_i64(*a),
            Decimal::from_f64(*b),
            *a as f64,
            *b,
        ),
        (Value::Float(a), Value::Int(b)) => mixed(
            op,
            Decimal::from_f64(*a),
            Decimal::from_i64(*b),
            *a,
            *b as f64,
        ),

        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            Ok(Value::Str(format!("{}{}", a, b)))
        }
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::List(items))
        }

        (Value::Duration(a), Value::Duration(b)) => match op {
            BinaryOp::Add => Ok(Value::Duration(a + b)),
            BinaryOp::Sub => Ok(Value::Duration(a - b)),
            BinaryOp::Div => {
                if *b == 0.0 {
                    Err(DispatchError::DivisionByZero)
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            _ => Err(unsupported(op, left, right)),
        },
        (Value::Duration(d), Value::Int(_) | Value::Float(_)) => {
            let n = right.as_number().expect("numeric operand");
            match op {
                BinaryOp::Mul => Ok(Value::Duration(d * n)),
                BinaryOp::Div => {
                    if n == 0.0 {
                        Err(DispatchError::DivisionByZero)
                    } else {
                        Ok(Value::Duration(d / n))
                    }
                }
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::Int(_) | Value::Float(_), Value::Duration(d)) if op == BinaryOp::Mul => {
            let n = left.as_number().expect("numeric operand");
            Ok(Value::Duration(n * d))
        }

        (Value::Time(t), Value::Duration(d)) => {
            let shift = (d * SECONDS_PER_DAY) as i64;
            match op {
                BinaryOp::Add => Ok(Value::Time(wrap_time(*t as i64 + shift))),
                BinaryOp::Sub => Ok(Value::Time(wrap_time(*t as i64 - shift))),
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::Duration(d), Value::Time(t)) if op == BinaryOp::Add => {
            let shift = (d * SECONDS_PER_DAY) as i64;
            Ok(Value::Time(wrap_time(*t as i64 + shift)))
        }
        (Value::Time(a), Value::Time(b)) if op == BinaryOp::Sub => {
            Ok(Value::Duration((*a as f64 - *b as f64) / SECONDS_PER_DAY))
        }

        (Value::Percent(p), Value::Percent(q)) => match op {
            BinaryOp::Add => Ok(Value::Percent(p + q)),
            BinaryOp::Sub => Ok(Value::Percent(p - q)),
            _ => Err(unsupported(op, left, right)),
        },
        // `price + 5%` scales the number; `price * 5%` takes the fraction.
        (Value::Int(_) | Value::Float(_), Value::Percent(p)) => {
            let n = left.as_number().expect("numeric operand");
            let was_int = matches!(left, Value::Int(_));
            match op {
                BinaryOp::Add => Ok(number(n * (1.0 + p), was_int)),
                BinaryOp::Sub => Ok(number(n * (1.0 - p), was_int)),
                BinaryOp::Mul => Ok(number(n * p, was_int)),
                BinaryOp::Div => {
                    if *p == 0.0 {
                        Err(DispatchError::DivisionByZero)
                    } else {
                        Ok(number(n / p, was_int))
                    }
                }
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::Percent(p), Value::Int(_) | Value::Float(_)) if op == BinaryOp::Mul => {
            let n = right.as_number().expect("numeric operand");
            Ok(number(n * p, matches!(right, Value::Int(_))))
        }

        _ => Err(unsupported(op, left, right)),
    }
}

/// Collapse a whole-number float result back to an integer when the
/// operation started from an integer operand.
fn number(n: f64, was_int: bool) -> Value {
    if was_int && n.is_finite() && n.fract() == 0.0 {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

fn wrap_time(seconds: i64) -> u32 {
    seconds.rem_euclid(SECONDS_PER_DAY as i64) as u32
}

fn int_int(op: BinaryOp, a: i64, b: i64) -> Result<Value, DispatchError> {
    match op {
        BinaryOp::Add => Ok(Value::Int(a + b)),
        BinaryOp::Sub => Ok(Value::Int(a - b)),
        BinaryOp::Mul => Ok(Value::Int(a * b)),
        BinaryOp::Div => {
            if b == 0 {
                Err(DispatchError::DivisionByZero)
            } else if a % b == 0 {
                Ok(Value::Int(a / b))
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                Err(DispatchError::DivisionByZero)
            } else {
                Ok(Value::Int(a.div_euclid(b)))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(DispatchError::DivisionByZero)
            } else {
                Ok(Value::Int(a % b))
            }
        }
        BinaryOp::Pow => {
            if (0..=u32::MAX as i64).contains(&b)
                && let Some(n) = a.checked_pow(b as u32)
            {
                Ok(Value::Int(n))
            } else {
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }
        _ => Err(unsupported(op, &Value::Int(a), &Value::Int(b))),
    }
}

fn float_float(op: BinaryOp, a: f64, b: f64) -> Result<Value, DispatchError> {
    let r = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a % b,
        BinaryOp::Pow => a.powf(b),
        _ => return Err(unsupported(op, &Value::Float(a), &Value::Float(b))),
    };
    Ok(Value::Float(r))
}

/// Mixed int/float arithmetic through exact decimals: a whole result
/// collapses back to an integer, everything else stays a float.
fn mixed(
    op: BinaryOp,
    ad: Option<Decimal>,
    bd: Option<Decimal>,
    af: f64,
    bf: f64,
) -> Result<Value, DispatchError> {
    if let (Some(ad), Some(bd)) = (ad, bd) {
        let rd = match op {
            BinaryOp::Add => Some(ad + bd),
            BinaryOp::Sub => Some(ad - bd),
            BinaryOp::Mul => Some(ad * bd),
            BinaryOp::Div if !bd.is_zero() => Some(ad / bd),
            BinaryOp::Mod if !bd.is_zero() => Some(ad % bd),
            _ => None,
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Ok(Value::Int(r));
            } else if let Some(r) = rd.to_f64() {
                return Ok(Value::Float(r));
            }
        }
    }
    float_float(op, af, bf)
}

/// `a .. b` builds the half-open integer range as a list.
fn range(left: &Value, right: &Value) -> Result<Value, DispatchError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            Ok(Value::List((*a..*b).map(Value::Int).collect()))
        }
        _ => Err(unsupported(BinaryOp::Range, left, right)),
    }
}

fn comparison(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, DispatchError> {
    if let Value::Series(s) = left {
        return s
            .compare(op, right, false)
            .ok_or_else(|| unsupported(op, left, right));
    }
    if let Value::Series(s) = right {
        return s
            .compare(op, left, true)
            .ok_or_else(|| unsupported(op, left, right));
    }

    use std::cmp::Ordering;
    let ord = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Int(a), Value::Float(b)) => {
            (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (Value::Float(a), Value::Int(b)) => {
            a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
        }
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Duration(a), Value::Duration(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        (Value::Percent(a), Value::Percent(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        _ => return Err(unsupported(op, left, right)),
    };

    // On scalars the threshold operators degenerate to strict ordering;
    // crossing semantics live with the series provider.
    let result = match op {
        BinaryOp::Lt | BinaryOp::Falls => ord == Ordering::Less,
        BinaryOp::Le => ord != Ordering::Greater,
        BinaryOp::Gt | BinaryOp::Rises => ord == Ordering::Greater,
        BinaryOp::Ge => ord != Ordering::Less,
        _ => return Err(unsupported(op, left, right)),
    };
    Ok(Value::Bool(result))
}

fn membership(item: &Value, container: &Value) -> Result<Value, DispatchError> {
    match container {
        Value::List(items) => Ok(Value::Bool(items.iter().any(|v| v == item))),
        Value::Set(entries) => Ok(Value::Bool(entries.iter().any(|e| entry_matches(e, item)))),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
            _ => Err(unsupported(BinaryOp::In, item, container)),
        },
        Value::Empty => Ok(Value::Bool(false)),
        _ => Err(unsupported(BinaryOp::In, item, container)),
    }
}

fn entry_matches(entry: &SetEntry, item: &Value) -> bool {
    if entry.value == *item {
        return true;
    }
    match (&entry.name, item) {
        (Some(name), Value::Str(s)) => name == s,
        _ => false,
    }
}
