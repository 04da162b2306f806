//! Runtime error reporting.
//!
//! Every variant here corresponds to one condition the dispatch loop can
//! hit that isn't a straightforward compile-time guarantee. The VM never
//! matches on these programmatically beyond deciding whether to keep
//! running — they exist to carry a message into the stack-trace text
//! protocol.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Only instances have properties.")]
    OnlyInstancesHaveProperties,
    #[error("Only instances have fields.")]
    OnlyInstancesHaveFields,
    #[error("Only instances have methods.")]
    OnlyInstancesHaveMethods,
    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),
    #[error("Superclass must be a class.")]
    SuperclassMustBeClass,
    #[error("Can only call functions and classes.")]
    NotCallable,
    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: u8, got: u8 },
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("{0}")]
    Native(String),
}

/// The three outcomes `interpret` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretOutcome {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretOutcome {
    /// Process exit code for the CLI collaborator.
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretOutcome::Ok => 0,
            InterpretOutcome::CompileError => 65,
            InterpretOutcome::RuntimeError => 70,
        }
    }
}
