//! Native (host-implemented) functions.

use std::rc::Rc;

use crate::value::Value;

pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Clone)]
pub struct NativeObj {
    pub name: Rc<str>,
    pub arity: u8,
    pub function: NativeFn,
}
