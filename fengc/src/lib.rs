//! fengc - the value representation, bytecode container, object heap, and
//! tracing garbage collector shared by the compiler and VM.
//!
//! Mirrors the way `fgc` stands apart from the compiler/runtime crates
//! that use it, trimmed to a single-threaded
//! mark-sweep collector instead of `fgc`'s concurrent
//! generational design — this language has one thread, one heap, and no
//! pause-time budget to hit.

pub mod chunk;
pub mod config;
pub mod display;
pub mod heap;
pub mod object;
pub mod opcode;
pub mod table;
pub mod value;

pub use chunk::Chunk;
pub use config::GcConfig;
pub use display::format_value;
pub use heap::Heap;
pub use object::{
    BoundMethodObj, BoundMethodRef, ClassObj, ClassRef, ClosureObj, ClosureRef, FunctionKind,
    FunctionObj, FunctionRef, InstanceObj, InstanceRef, NativeFn, NativeObj, NativeRef, ObjRef,
    StringObj, StringRef, UpvalueObj, UpvalueRef, UpvalueState,
};
pub use opcode::Op;
pub use table::Table;
pub use value::Value;
