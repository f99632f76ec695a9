use clap::{Args, Parser as ClapParser, Subcommand};
use sieve_lang::cli::{self, CheckOptions, CheckResult, CliError};
use sieve_lang::parser::DEFAULT_MAX_DEPTH;
use sieve_lang::{Lexer, Parser, TokenKind};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sieve")]
#[command(about = "Sieve - select and reshape JSON with jq-like expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an expression against a JSON document
    Check(CheckArgs),

    /// Print the tokens of an expression, one per line
    Tokens {
        expression: String,
    },

    /// Print an expression in normalized form
    Parse {
        expression: String,

        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// The sieve expression to execute
    expression: String,

    /// JSON input (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,

    /// Only validate syntax, don't execute
    #[arg(long)]
    syntax_only: bool,

    /// Deepest allowed nesting of `{ ... }` mappings
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SIEVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match Cli::parse().command {
        Commands::Check(args) => run_check(args),
        Commands::Tokens { expression } => print_tokens(&expression),
        Commands::Parse {
            expression,
            max_depth,
        } => print_normalized(&expression, max_depth),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Reads stdin unless it is a terminal.
fn piped_stdin() -> io::Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(Some(buffer))
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let input = match args.input {
        Some(s) => Some(s),
        None if !args.syntax_only => piped_stdin()?,
        None => None,
    };

    let options = CheckOptions {
        expression: args.expression,
        input,
        syntax_only: args.syntax_only,
        max_depth: args.max_depth,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) if args.pretty => {
            println!("{}", serde_json::to_string_pretty(&output)?)
        }
        CheckResult::Success(output) => println!("{}", serde_json::to_string(&output)?),
    }
    Ok(())
}

fn print_tokens(expression: &str) -> Result<(), CliError> {
    let mut lexer = Lexer::new(expression);
    loop {
        let token = lexer.next_token().map_err(sieve_lang::ParseError::from)?;
        println!(
            "{}:{}\t{:?}\t{}",
            token.position.line, token.position.column, token.kind, token
        );
        if token.is(TokenKind::Eof) {
            return Ok(());
        }
    }
}

fn print_normalized(expression: &str, max_depth: usize) -> Result<(), CliError> {
    let filter = Parser::with_max_depth(Lexer::new(expression), max_depth).parse()?;
    println!("{}", filter);
    Ok(())
}
