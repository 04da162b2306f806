//! Compiled function bodies.

use crate::chunk::Chunk;
use crate::object::StringRef;

/// Distinguishes the handful of compile-time behaviors that hinge on what
/// kind of body is being compiled: top-level script code gets
/// an implicit `return;`, methods get `this` bound to local slot 0,
/// initializers additionally forbid `return value;` and implicitly
/// `return this;`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FunctionKind {
    Script,
    Function,
    Method,
    Initializer,
}

/// A compiled function body, named and arity-checked at call time.
/// Shared (never copied) between every closure created over the same
/// `fun` declaration — that's exactly what [`crate::object::ClosureObj`]
/// wraps a [`crate::object::FunctionRef`] for.
#[derive(Clone)]
pub struct FunctionObj {
    pub arity: u8,
    pub upvalue_count: usize,
    pub chunk: Chunk,
    /// `None` for the implicit top-level script function.
    pub name: Option<StringRef>,
    pub kind: FunctionKind,
}

impl FunctionObj {
    pub fn new(name: Option<StringRef>, kind: FunctionKind) -> Self {
        Self {
            arity: 0,
            upvalue_count: 0,
            chunk: Chunk::new(),
            name,
            kind,
        }
    }
}
