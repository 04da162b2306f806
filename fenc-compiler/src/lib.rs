//! Single-pass compiler: turns source text straight into bytecode with no
//! intermediate AST, the way clox's `compiler.c` does.

mod compiler;
mod expr;
mod parser;
mod rules;
mod stmt;

pub use compiler::compile;
