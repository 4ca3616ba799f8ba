//! The diagnostic reporter.
//!
//! The core hands every warning and error here together with an optional
//! source location; the reporter owns formatting (the offending source
//! line with a column-aligned caret) and the strict/force-error policy.
//! The interpreter only ever asks `is_strict()`.

use crate::ast::tokens::Loc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Reporter {
    lines: Vec<String>,
    strict: bool,
    force_errors: bool,
    quiet: bool,
    warnings: usize,
    errors: usize,
}

impl Reporter {
    pub fn new(source: &str) -> Self {
        let mut reporter = Reporter::default();
        reporter.attach_source(source);
        reporter
    }

    /// Remember the source lines so later reports can show the offending
    /// line and caret.
    pub fn attach_source(&mut self, source: &str) {
        self.lines = source.lines().map(str::to_string).collect();
    }

    /// Promote binding warnings to hard errors.
    pub fn set_strict(&mut self, on: bool) {
        self.strict = on;
    }

    /// Treat every warning as fatal, regardless of its kind.
    pub fn set_force_errors(&mut self, on: bool) {
        self.force_errors = on;
    }

    /// Count reports without printing them (used by tests).
    pub fn set_quiet(&mut self, on: bool) {
        self.quiet = on;
    }

    pub fn is_strict(&self) -> bool {
        self.strict || self.force_errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning(&mut self, message: &str, loc: Option<Loc>) {
        self.warnings += 1;
        self.emit(Severity::Warning, message, loc);
    }

    pub fn error(&mut self, message: &str, loc: Option<Loc>) {
        self.errors += 1;
        self.emit(Severity::Error, message, loc);
    }

    fn emit(&self, severity: Severity, message: &str, loc: Option<Loc>) {
        if self.quiet {
            return;
        }
        eprint!("{}", self.render(severity, message, loc));
    }

    /// Format a report: the message, then the source line with a caret
    /// under the offending column when the location is known.
    pub fn render(&self, severity: Severity, message: &str, loc: Option<Loc>) -> String {
        let mut out = format!("focal: {}: {}\n", severity, message);
        if let Some(loc) = loc
            && loc.line >= 1
            && let Some(line) = self.lines.get(loc.line as usize - 1)
        {
            let number = loc.line.to_string();
            out.push_str(&format!("  {} | {}\n", number, line));
            let caret_pad = " ".repeat((loc.column as usize).saturating_sub(1));
            out.push_str(&format!("  {} | {}^\n", " ".repeat(number.len()), caret_pad));
        }
        out
    }
}
