use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as ClapParser;
use log::info;

use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; the REPL starts when omitted.
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => run_prompt(),

        [script] => run_file(script),

        _ => {
            println!("Usage: lox [script]");
            Ok(())
        }
    }
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let resolved: PathBuf = match path.canonicalize() {
        Ok(resolved) => resolved,

        Err(err) => {
            eprintln!("Unable to resolve path {}: {}", path.display(), err);
            process::exit(-1);
        }
    };

    info!("Running file {}", resolved.display());

    let bytes: Vec<u8> = match fs::read(&resolved) {
        Ok(bytes) => bytes,

        Err(err) => {
            eprintln!("Unable to read from file {}: {}", resolved.display(), err);
            process::exit(1);
        }
    };

    let source: String = match String::from_utf8(bytes) {
        Ok(source) => source,

        Err(err) => {
            eprintln!("Unable to read from file {}: {}", resolved.display(), err);
            process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new(false);
    let mut next_id = 0;

    let (had_error, had_runtime_error) = run(&mut interpreter, source, &mut next_id);

    if had_error {
        process::exit(65);
    }

    if had_runtime_error {
        process::exit(79);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    info!("Starting REPL");

    let stdin = io::stdin();
    let mut handle = stdin.lock();

    // One interpreter for the whole session: globals persist between lines,
    // and so do resolver annotations, so expression ids keep counting up.
    let mut interpreter = Interpreter::new(true);
    let mut next_id = 0;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();

        match handle.read_line(&mut line) {
            // EOF (Ctrl-D) ends the session cleanly.
            Ok(0) => {
                println!();
                process::exit(0);
            }

            // Error flags are consumed by the line that produced them.
            Ok(_) => {
                run(&mut interpreter, line, &mut next_id);
            }

            Err(err) => {
                eprintln!("error reading from stdin: {}", err);
                process::exit(80);
            }
        }
    }
}

/// Run one source unit through the full pipeline. Each phase is skipped
/// when an earlier phase reported errors. Returns (static error, runtime
/// error). `next_id` carries the expression-id counter across inputs.
fn run(interpreter: &mut Interpreter, source: String, next_id: &mut usize) -> (bool, bool) {
    let scanner: Scanner = Scanner::new(source.into_bytes());

    let mut tokens: Vec<Token> = Vec::new();
    let mut had_error = false;

    for result in scanner {
        match result {
            Ok(token) => tokens.push(token),

            Err(err) => {
                eprintln!("{}", err);
                had_error = true;
            }
        }
    }

    if had_error {
        return (true, false);
    }

    let mut parser: Parser = Parser::with_first_id(tokens, *next_id);
    let (statements, parse_error) = parser.parse();
    *next_id = parser.next_free_id();

    if parse_error {
        return (true, false);
    }

    let mut resolver = Resolver::new(interpreter);

    if resolver.resolve(&statements) {
        return (true, false);
    }

    let had_runtime_error = interpreter.interpret(&statements);

    (false, had_runtime_error)
}
