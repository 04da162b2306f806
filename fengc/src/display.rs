//! The `print` statement's text protocol. Needs a [`Heap`] alongside the [`Value`] itself — strings,
//! function names, and class names are all indirections through an arena.

use crate::heap::Heap;
use crate::object::ObjRef;
use crate::value::Value;

/// Render `value` the way `print` and the disassembler's constant dumps
/// do. Numbers use Rust's shortest round-tripping `f64` formatting, which
/// coincides with clox's `%.14g` for every value this language can
/// produce.
pub fn format_value(heap: &Heap, value: Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::Obj(r) => format_object(heap, r),
    }
}

fn format_number(n: f64) -> String {
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    n.to_string()
}

fn format_object(heap: &Heap, r: ObjRef) -> String {
    match r {
        ObjRef::String(s) => heap.string(s).as_str().to_string(),
        ObjRef::Function(f) => format_fn_name(heap, heap.function(f).name),
        ObjRef::Native(n) => format!("<native fn {}>", heap.native(n).name),
        ObjRef::Closure(c) => format_fn_name(heap, heap.function(heap.closure(c).function).name),
        ObjRef::Upvalue(_) => "<upvalue>".to_string(),
        ObjRef::Class(c) => format!("<class '{}'>", heap.string(heap.class(c).name).as_str()),
        ObjRef::Instance(i) => {
            let class_name = heap.string(heap.class(heap.instance(i).class).name).as_str();
            format!("<'{}' object>", class_name)
        }
        ObjRef::BoundMethod(b) => {
            let bound = heap.bound_method(b);
            format_fn_name(heap, heap.function(heap.closure(bound.method).function).name)
        }
    }
}

fn format_fn_name(heap: &Heap, name: Option<crate::object::StringRef>) -> String {
    match name {
        None => "<script>".to_string(),
        Some(name) => format!("<fn {}>", heap.string(name).as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GcConfig;
    use crate::object::{ClassObj, FunctionKind, FunctionObj, InstanceObj};

    #[test]
    fn nil_bool_and_number_use_the_spec_text_forms() {
        let heap = Heap::new(GcConfig::default());
        assert_eq!(format_value(&heap, Value::Nil), "nil");
        assert_eq!(format_value(&heap, Value::Bool(true)), "true");
        assert_eq!(format_value(&heap, Value::Bool(false)), "false");
        assert_eq!(format_value(&heap, Value::Number(7.0)), "7");
        assert_eq!(format_value(&heap, Value::Number(1.5)), "1.5");
    }

    #[test]
    fn instance_prints_with_its_class_name() {
        let mut heap = Heap::new(GcConfig::default());
        let name = heap.intern_string("Point");
        let class = heap.alloc_class(ClassObj::new(name));
        let instance = heap.alloc_instance(InstanceObj::new(class));
        assert_eq!(
            format_value(&heap, Value::Obj(ObjRef::Instance(instance))),
            "<'Point' object>"
        );
    }

    #[test]
    fn named_function_prints_as_fn_name() {
        let mut heap = Heap::new(GcConfig::default());
        let name = heap.intern_string("f");
        let function = heap.alloc_function(FunctionObj::new(Some(name), FunctionKind::Function));
        assert_eq!(format_value(&heap, Value::Obj(ObjRef::Function(function))), "<fn f>");
    }

    #[test]
    fn unnamed_script_function_prints_as_script() {
        let mut heap = Heap::new(GcConfig::default());
        let function = heap.alloc_function(FunctionObj::new(None, FunctionKind::Script));
        assert_eq!(format_value(&heap, Value::Obj(ObjRef::Function(function))), "<script>");
    }
}
