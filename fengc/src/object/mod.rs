//! Heap-allocated object kinds and their typed handles.
//!
//! Every object lives in a per-kind [`crate::heap::Arena`] and carries a
//! [`GcHeader`] (just a mark bit — this collector is non-generational).
//! A [`crate::value::Value::Obj`] never points at an object
//! directly; it holds one of the typed refs below, so the collector is
//! free to reuse a freed slot without anything chasing a stale pointer
//! across the reuse — the classic "handle into an arena" shape, the same
//! one `CppCXY-lua-rs`'s `ObjectAllocator`/`ObjectPool` use for its Lua
//! object graph.

pub mod class;
pub mod closure;
pub mod function;
pub mod native;
pub mod string;

pub use class::{BoundMethodObj, ClassObj, InstanceObj};
pub use closure::{ClosureObj, UpvalueObj, UpvalueState};
pub use function::{FunctionKind, FunctionObj};
pub use native::{NativeFn, NativeObj};
pub use string::StringObj;

/// Embedded in every arena slot. Mark-sweep only needs one bit; age/
/// generation counters `fgc`'s concurrent collector tracks have no
/// counterpart here.
#[derive(Clone, Copy, Default)]
pub struct GcHeader {
    pub marked: bool,
}

macro_rules! define_obj_ref {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(pub u32);
    };
}

define_obj_ref!(StringRef);
define_obj_ref!(FunctionRef);
define_obj_ref!(NativeRef);
define_obj_ref!(ClosureRef);
define_obj_ref!(UpvalueRef);
define_obj_ref!(ClassRef);
define_obj_ref!(InstanceRef);
define_obj_ref!(BoundMethodRef);

/// A handle to any heap object, tagged by kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ObjRef {
    String(StringRef),
    Function(FunctionRef),
    Native(NativeRef),
    Closure(ClosureRef),
    Upvalue(UpvalueRef),
    Class(ClassRef),
    Instance(InstanceRef),
    BoundMethod(BoundMethodRef),
}

impl ObjRef {
    /// The noun a runtime error message uses, e.g. "Can only call
    /// functions and classes.", "Undefined property 'x'."
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjRef::String(_) => "string",
            ObjRef::Function(_) => "function",
            ObjRef::Native(_) => "native function",
            ObjRef::Closure(_) => "closure",
            ObjRef::Upvalue(_) => "upvalue",
            ObjRef::Class(_) => "class",
            ObjRef::Instance(_) => "instance",
            ObjRef::BoundMethod(_) => "bound method",
        }
    }
}

impl From<StringRef> for ObjRef {
    fn from(r: StringRef) -> Self {
        ObjRef::String(r)
    }
}
impl From<FunctionRef> for ObjRef {
    fn from(r: FunctionRef) -> Self {
        ObjRef::Function(r)
    }
}
impl From<NativeRef> for ObjRef {
    fn from(r: NativeRef) -> Self {
        ObjRef::Native(r)
    }
}
impl From<ClosureRef> for ObjRef {
    fn from(r: ClosureRef) -> Self {
        ObjRef::Closure(r)
    }
}
impl From<ClassRef> for ObjRef {
    fn from(r: ClassRef) -> Self {
        ObjRef::Class(r)
    }
}
impl From<InstanceRef> for ObjRef {
    fn from(r: InstanceRef) -> Self {
        ObjRef::Instance(r)
    }
}
impl From<BoundMethodRef> for ObjRef {
    fn from(r: BoundMethodRef) -> Self {
        ObjRef::BoundMethod(r)
    }
}
