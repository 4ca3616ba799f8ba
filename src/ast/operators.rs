/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition, concatenation, percent scaling (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Floor division (`//`)
    FloorDiv,
    /// Exponentiation (`^`)
    Pow,
    /// Modulo (`%`)
    Mod,
    /// Integer range (`..`), half-open
    Range,

    // Comparison
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
    /// Membership (`in`)
    In,
    /// Falls below the right-hand threshold (`falls`)
    Falls,
    /// Rises above the right-hand threshold (`rises`)
    Rises,

    // Equality
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,

    // Logical
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Pow => "^",
            BinaryOp::Mod => "%",
            BinaryOp::Range => "..",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Falls => "falls",
            BinaryOp::Rises => "rises",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

impl BinaryOp {
    /// True for the comparison family, including the domain ordering
    /// operators `falls` and `rises`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Falls
                | BinaryOp::Rises
        )
    }
}

/// Unary (prefix) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation (`not`)
    Not,
    /// Numeric negation (`-`); flips the magnitude of durations and percents
    Neg,
    /// Numeric identity (`+`)
    Pos,
    /// Pre-increment (`++`); mutates the resolved storage
    Incr,
    /// Pre-decrement (`--`); mutates the resolved storage
    Decr,
    /// Set quantifier `all:`
    All,
    /// Set quantifier `any:`
    Any,
    /// Set quantifier `none:`
    NoneOf,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Incr => "++",
            UnaryOp::Decr => "--",
            UnaryOp::All => "all:",
            UnaryOp::Any => "any:",
            UnaryOp::NoneOf => "none:",
        };
        write!(f, "{}", s)
    }
}

/// Assignment and definition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// Plain assignment (`=`) — binds outward to the nearest existing
    /// binding, or creates one in the current scope
    Assign,
    /// Definition (`:=`, also `var`) — always binds in the current scope
    Define,
    /// Add-assign (`+=`)
    AddAssign,
    /// Subtract-assign (`-=`)
    SubAssign,
}

impl std::fmt::Display for AssignOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
        };
        write!(f, "{}", s)
    }
}
