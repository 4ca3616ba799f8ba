//! CLI support for focal-lang.
//!
//! Thin glue over the core pipeline so the `focal` binary (and anything
//! embedding it) can load a script, evaluate it, and render the result.

use std::io;

use crate::interpreter::{Interpreter, RunError};
use crate::output;
use crate::report::Reporter;
use crate::value::Value;

/// Errors that can occur during CLI operations.
#[derive(Debug)]
pub enum CliError {
    /// Parse or evaluation failure
    Run(RunError),
    /// IO error reading the script
    Io(io::Error),
    /// No script provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Run(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "No input provided. Pass a script file, --eval, or pipe to stdin.")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Run(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        CliError::Run(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// Options for one evaluation run.
pub struct RunOptions {
    /// Script source text
    pub program: String,
    /// Promote binding warnings to errors
    pub strict: bool,
    /// Render the result as JSON instead of the canonical textual form
    pub json: bool,
    /// Pretty-print the JSON output
    pub pretty: bool,
}

/// Evaluate a program and render its final value.
pub fn execute_run(options: &RunOptions) -> Result<String, CliError> {
    let mut reporter = Reporter::new(&options.program);
    reporter.set_strict(options.strict);
    let mut interpreter = Interpreter::with_reporter(reporter);
    let value = interpreter.run(&options.program)?;
    Ok(render(&value, options))
}

fn render(value: &Value, options: &RunOptions) -> String {
    if options.json {
        if options.pretty {
            output::to_json_pretty(value)
        } else {
            output::to_json(value)
        }
    } else {
        value.to_string()
    }
}
