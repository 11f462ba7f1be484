//! Crate root: wires together the compilation pipeline.
//!
//! Source text flows one way through three stages:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the program AST.
//! - `codegen` lowers the program into x86-64 NASM assembly.
//!
//! `error` holds the diagnostics shared by all stages, and `driver` wraps the
//! pipeline with file output and the external assembler and linker.

pub mod codegen;
pub mod driver;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use driver::{BuildConfig, build};
pub use error::{CompileError, CompileResult};

/// Compile a source string into NASM assembly.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let program = parser::parse(tokens, source)?;
  codegen::generate(&program, source)
}
