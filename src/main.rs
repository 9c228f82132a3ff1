// ABOUTME: clap-derived CLI dispatching to the scanner/parser/interpreter subcommands

mod ast;
mod callable;
mod config;
mod environment;
mod error;
mod highlighter;
mod interpreter;
mod parser;
mod printer;
mod repl;
mod resolver;
mod scanner;
mod token;
mod value;

use clap::{Parser as ClapParser, Subcommand};
use config::{VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use error::LoxError;
use interpreter::Interpreter;
use parser::Parser;
use printer::print_program;
use resolver::Resolver;
use scanner::Scanner;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "loxtree")]
#[command(version = VERSION)]
#[command(about = WELCOME_MESSAGE)]
#[command(long_about = WELCOME_SUBTITLE)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize source and print one token per line.
    Scanner {
        #[arg(short, long)]
        interactive: bool,
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Parse source and pretty-print the AST as S-expressions.
    Parser {
        #[arg(short, long)]
        interactive: bool,
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Resolve and evaluate source.
    Interpreter {
        #[arg(short, long)]
        interactive: bool,
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Scanner { interactive, file } => run_pipeline(interactive, file, &mut scanner_line),
        Command::Parser { interactive, file } => run_pipeline(interactive, file, &mut parser_line),
        Command::Interpreter { interactive, file } => {
            let mut interpreter = Interpreter::new();
            run_pipeline(interactive, file, &mut |source| interpreter_line(source, &mut interpreter))
        }
    }
}

/// Reads either the given file, standard input (non-interactive with no
/// file), or drives the REPL line loop; `line_fn` returns whether that line
/// was free of errors. Exit code 1 if any line failed.
fn run_pipeline(interactive: bool, file: Option<PathBuf>, line_fn: &mut dyn FnMut(&str) -> bool) -> ExitCode {
    if interactive {
        println!("{}", WELCOME_MESSAGE);
        println!("{}", WELCOME_SUBTITLE);
        let mut all_ok = true;
        repl::run(|line| {
            if !line_fn(line) {
                all_ok = false;
            }
        });
        return if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    let source = match file {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("Could not read file '{}': {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            if std::io::stdin().read_to_string(&mut buf).is_err() {
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    if line_fn(&source) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(errors: impl IntoIterator<Item = LoxError>) -> bool {
    let mut any = false;
    for err in errors {
        eprintln!("{err}");
        any = true;
    }
    !any
}

fn scanner_line(source: &str) -> bool {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    for token in &tokens {
        println!("{}", token.display_line());
    }
    report(errors)
}

fn parser_line(source: &str) -> bool {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    let scan_ok = report(scan_errors);
    let (program, parse_errors) = Parser::new(tokens).parse();
    let parse_ok = report(parse_errors);
    if parse_ok {
        println!("{}", print_program(&program));
    }
    scan_ok && parse_ok
}

fn interpreter_line(source: &str, interpreter: &mut Interpreter) -> bool {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    let scan_ok = report(scan_errors);
    let (program, parse_errors) = Parser::new(tokens).parse();
    let parse_ok = report(parse_errors);
    if !scan_ok || !parse_ok {
        return false;
    }

    let (distances, resolve_errors) = Resolver::new().resolve(&program);
    let resolve_ok = report(resolve_errors);
    if !resolve_ok {
        return false;
    }

    interpreter.set_distances(distances);
    match interpreter.interpret(&program) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("{err}");
            false
        }
    }
}
