//! Library surface for the monk interpreter: scanner, parser, AST, runtime
//! value model, and evaluator. Split out from `main.rs` so the pipeline can
//! be driven from integration tests the same way the REPL and one-shot file
//! runner drive it.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod token;
