//! The bytecode interpreter: call frames, the dispatch loop, and the
//! disassembler.

mod disassemble;
mod error;
mod frame;
mod natives;
mod vm;

pub use disassemble::{disassemble_chunk, disassemble_instruction, disassemble_program};
pub use error::{InterpretOutcome, RuntimeError};
pub use vm::Vm;
