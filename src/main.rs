use clap::Parser as ClapParser;
use focal_lang::cli::{self, CliError, RunOptions};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "focal")]
#[command(about = "Focal - a small expression language for formulaic computations")]
#[command(version)]
struct Cli {
    /// Script file to evaluate (reads from stdin if omitted)
    script: Option<PathBuf>,

    /// Evaluate an expression given on the command line
    #[arg(short, long, conflicts_with = "script")]
    eval: Option<String>,

    /// Promote binding warnings to errors
    #[arg(long)]
    strict: bool,

    /// Render the result as JSON
    #[arg(long)]
    json: bool,

    /// Pretty-print the JSON output
    #[arg(short, long, requires = "json")]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let program = match (cli.eval, cli.script) {
        (Some(expr), _) => expr,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, None) => return Err(CliError::NoInput),
    };

    let options = RunOptions {
        program,
        strict: cli.strict,
        json: cli.json,
        pretty: cli.pretty,
    };
    println!("{}", cli::execute_run(&options)?);
    Ok(())
}
