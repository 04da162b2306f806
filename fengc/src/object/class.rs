//! Classes, instances, and bound methods.

use crate::object::{ClassRef, ClosureRef, StringRef};
use crate::table::Table;
use crate::value::Value;

/// A class. `methods` maps method name to the `ClosureRef` that
/// implements it; single inheritance copies the superclass's table into
/// the subclass's at class-creation time (`OP_INHERIT`), so lookup never
/// needs to walk a superclass chain at call time.
pub struct ClassObj {
    pub name: StringRef,
    pub methods: Table<ClosureRef>,
}

impl ClassObj {
    pub fn new(name: StringRef) -> Self {
        Self {
            name,
            methods: Table::new(),
        }
    }
}

/// An instance of a class: a reference back to its class (for method
/// lookup and `instanceof`-style checks) plus an open field table (spec
/// fields are created on first assignment, not declared up front).
pub struct InstanceObj {
    pub class: ClassRef,
    pub fields: Table<Value>,
}

impl InstanceObj {
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            fields: Table::new(),
        }
    }
}

/// The result of `instance.method` when `method` resolves to a class
/// method rather than a field: the method closure plus the receiver it
/// should see as `this` when later called.
pub struct BoundMethodObj {
    pub receiver: Value,
    pub method: ClosureRef,
}
