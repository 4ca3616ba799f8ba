use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::ast::nodes::Node;
use crate::series::Series;
use crate::symbols::ScopeRef;

/// A runtime value of the Focal language.
///
/// The value kinds form a closed sum type; the operator dispatch engine
/// matches exhaustively over pairs of kinds, so an unsupported combination
/// is an explicit error rather than a missing table entry.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value, also the result of reading an undefined name.
    None,

    /// The empty aggregate (`empty`, or its extended spelling `Ø`).
    Empty,

    /// Boolean (`true`/`false`)
    Bool(bool),

    /// Integer
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// Percentage, stored as the normalized fraction (`5%` → `0.05`).
    Percent(f64),

    /// Time span, normalized to days (`2wk` → `14.0`). A month is exactly
    /// 28 days and a year exactly 365; see DESIGN.md.
    Duration(f64),

    /// Time of day, seconds since midnight (`09:30` → `34200`).
    Time(u32),

    /// UTF-8 string
    Str(String),

    /// Ordered list of values
    List(Vec<Value>),

    /// Unordered name/value aggregate (entries may be unnamed)
    Set(Vec<SetEntry>),

    /// Function value carrying its parameter list, body, and closure
    Function(Rc<Function>),

    /// External tabular/array value, opaque to the core; participates in
    /// dispatch only through the [`Series`] capability contract.
    Series(Rc<dyn Series>),
}

/// One entry of a set aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    pub name: Option<String>,
    pub value: Value,
}

/// A declared function parameter with its default value.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Value,
}

/// A function value.
///
/// Functions close over their defining scope; calls run in a fresh scope
/// chained under that closure.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Node,
    pub closure: ScopeRef,
}

// The closure link can reach back to a scope that contains this very
// function, so Debug prints the signature only.
impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.params.len())
            .finish()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Empty, Value::Empty) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Percent(a), Value::Percent(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Series(a), Value::Series(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Human-readable kind name, used in dispatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Empty => "empty",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Percent(_) => "percent",
            Value::Duration(_) => "duration",
            Value::Time(_) => "time",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Function(_) => "function",
            Value::Series(_) => "series",
        }
    }

    /// The boolean coercion rule shared by `not`, `and`/`or`, quantifiers,
    /// and `if` tests.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None | Value::Empty => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Percent(p) => *p != 0.0,
            Value::Duration(d) => *d != 0.0,
            Value::Time(_) => true,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Set(entries) => !entries.is_empty(),
            Value::Function(_) => true,
            Value::Series(_) => true,
        }
    }

    /// Numeric view of integers and floats; other kinds have their own
    /// arithmetic rules and are excluded deliberately.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days per unit word. A month is exactly 28 days and a year exactly 365;
/// see DESIGN.md before changing either.
fn unit_days(unit: &str) -> Option<f64> {
    match unit {
        "s" => Some(1.0 / SECONDS_PER_DAY),
        "min" => Some(60.0 / SECONDS_PER_DAY),
        "h" => Some(1.0 / 24.0),
        "d" => Some(1.0),
        "wk" => Some(7.0),
        "mo" => Some(28.0),
        "yr" => Some(365.0),
        _ => None,
    }
}

static DURATION_RE: OnceLock<Regex> = OnceLock::new();

/// Decode a duration literal like `2wk` or `1.5d` into days.
///
/// Returns `None` for an unknown unit word so the lexer can turn the
/// lexeme into an error token instead of crashing.
pub fn parse_duration(text: &str) -> Option<f64> {
    let re = DURATION_RE
        .get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)([A-Za-z]+)$").expect("duration pattern"));
    let caps = re.captures(text)?;
    let magnitude: f64 = caps[1].parse().ok()?;
    let per = unit_days(&caps[2])?;
    Some(magnitude * per)
}

/// Decode a time-of-day literal (`HH:MM` or `HH:MM:SS`) into seconds since
/// midnight. Out-of-range fields return `None`.
pub fn parse_time(text: &str) -> Option<u32> {
    let mut parts = text.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(hour * 3600 + minute * 60 + second)
}

/// Render a duration in its largest whole unit, falling back to fractional
/// days. `14.0` days prints as `14d`, a 90-minute span as `90min`.
fn format_duration(days: f64) -> String {
    let negative = days < 0.0;
    let d = days.abs();
    let body = if d == 0.0 {
        "0d".to_string()
    } else if d.fract() == 0.0 {
        format!("{}d", d as i64)
    } else if (d * 24.0).fract() == 0.0 {
        format!("{}h", (d * 24.0) as i64)
    } else if (d * 1440.0).fract() == 0.0 {
        format!("{}min", (d * 1440.0) as i64)
    } else if (d * SECONDS_PER_DAY).fract() == 0.0 {
        format!("{}s", (d * SECONDS_PER_DAY) as i64)
    } else {
        format!("{}d", d)
    };
    if negative { format!("-{}", body) } else { body }
}

fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

pub(crate) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

impl std::fmt::Display for Value {
    /// Canonical textual form; re-lexing it yields an equal literal for
    /// every scalar kind.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Empty => write!(f, "empty"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
            Value::Percent(p) => {
                let scaled = p * 100.0;
                if scaled.fract() == 0.0 {
                    write!(f, "{}%", scaled as i64)
                } else {
                    write!(f, "{}%", scaled)
                }
            }
            Value::Duration(d) => write!(f, "{}", format_duration(*d)),
            Value::Time(secs) => {
                let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
                if s == 0 {
                    write!(f, "{:02}:{:02}", h, m)
                } else {
                    write!(f, "{:02}:{:02}:{:02}", h, m, s)
                }
            }
            Value::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Set(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|e| match &e.name {
                        Some(name) => format!("{}: {}", name, e.value),
                        None => e.value.to_string(),
                    })
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "def {}({})", func.name, params.join(", "))
            }
            Value::Series(s) => write!(f, "<series {}>", s.label()),
        }
    }
}
