//! Closures and upvalues.

use crate::object::{FunctionRef, UpvalueRef};
use crate::value::Value;

/// A function body paired with the upvalues it closed over at creation
/// time. What a `Value::Obj(ObjRef::Closure(..))` actually calls — bare
/// `FunctionRef`s are never called directly, only wrapped.
#[derive(Clone)]
pub struct ClosureObj {
    pub function: FunctionRef,
    pub upvalues: Vec<UpvalueRef>,
}

impl ClosureObj {
    pub fn new(function: FunctionRef, upvalues: Vec<UpvalueRef>) -> Self {
        Self { function, upvalues }
    }
}

/// An open upvalue refers to a live stack slot by absolute index; closing
/// it (when the frame that owns that slot returns) copies the value out
/// and the upvalue becomes self-contained.
#[derive(Clone, Debug)]
pub enum UpvalueState {
    Open(usize),
    Closed(Value),
}

pub struct UpvalueObj {
    pub state: UpvalueState,
}

impl UpvalueObj {
    pub fn open(stack_index: usize) -> Self {
        Self {
            state: UpvalueState::Open(stack_index),
        }
    }
}
