//! monk - A Small Expression-Oriented Scripting Language
//!
//! This is the entry point for the `monk` interpreter. The language is
//! scanned, parsed, and evaluated by three independent modules chained
//! together here:
//!
//! - **lexer**: Tokenizes source text into a flat token stream.
//! - **parser**: Builds an Abstract Syntax Tree using Pratt (precedence
//!   climbing) parsing, accumulating syntax errors instead of aborting on
//!   the first one.
//! - **ast**: Defines the syntax tree's node types.
//! - **object**: Defines the runtime value model.
//! - **evaluator**: Walks the AST and reduces it to a `Value`, maintaining
//!   the lexical `Environment` bindings are looked up and stored in.
//! - **error**: Ambient (non-language) error handling for file I/O.
//!
//! Run with no arguments for an interactive REPL, or with a path to a
//! script file to execute it once and exit.

use monk::error::{MonkError, Result};
use monk::evaluator::{Environment, Evaluator};
use monk::lexer::Lexer;
use monk::parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::{env, fs, process, rc::Rc};

const PROMPT: &str = ">> ";

fn main() {
    let args: Vec<String> = env::args().collect();

    let result = match args.get(1) {
        Some(path) => run_source(path),
        None => run_prompt(),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

/// Executes a single script file against a fresh environment and exits.
fn run_source(path: &str) -> Result<()> {
    let source = fs::read_to_string(path)?;
    let env = Environment::new();
    let evaluator = Evaluator::new();

    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for message in parser.errors() {
            eprintln!("parse error: {}", message);
        }
        process::exit(1);
    }

    let value = evaluator.eval_program(&program, &env);
    if value.is_error() {
        println!("{}", value.inspect());
        process::exit(1);
    }
    println!("{}", value.inspect());
    Ok(())
}

/// Runs an interactive read-eval-print loop. Bindings made on one line
/// persist in the environment for the rest of the session, so a `let` on
/// one prompt is visible to expressions typed afterward.
fn run_prompt() -> Result<()> {
    let mut editor = DefaultEditor::new().map_err(|err| MonkError::IOError(err.to_string()))?;
    let env: Rc<Environment> = Environment::new();
    let evaluator = Evaluator::new();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit()" {
                    break;
                }
                let _ = editor.add_history_entry(trimmed);

                let mut parser = Parser::new(Lexer::new(trimmed));
                let program = parser.parse_program();

                if !parser.errors().is_empty() {
                    for message in parser.errors() {
                        println!("parse error: {}", message);
                    }
                    continue;
                }

                let value = evaluator.eval_program(&program, &env);
                println!("{}", value.inspect());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(MonkError::IOError(err.to_string())),
        }
    }

    Ok(())
}
