//! The stack-based bytecode interpreter.
//!
//! Grounded directly on clox's `vm.c`: a flat value stack, a ring of call
//! frames, and a `match` over [`Op`] that plays the part of `run()`'s
//! `switch`. The differences from that reference are all about how Rust
//! expresses the same machine rather than anything behavioral — handles
//! into [`Heap`] arenas instead of raw `Obj*` pointers, and a `Result`
//! return from every fallible step instead of a `goto errorLabel`.

use std::io::Write;

use fengc::{
    BoundMethodObj, ClosureObj, GcConfig, Heap, InstanceObj, NativeFn, NativeObj, ObjRef, Op,
    UpvalueObj, UpvalueState, Value,
};
use fenc_util::Diagnostic;
use tracing::{debug, debug_span, trace};

use crate::error::{InterpretOutcome, RuntimeError};
use crate::frame::{CallFrame, FRAMES_MAX};
use crate::natives;

pub struct Vm {
    heap: Heap,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    /// Kept sorted by descending stack index, mirroring clox's
    /// `vm.openUpvalues` singly-linked list.
    open_upvalues: Vec<fengc::UpvalueRef>,
    pub trace_exec: bool,
}

impl Vm {
    pub fn new(gc_config: GcConfig, trace_exec: bool) -> Self {
        let heap = Heap::new(gc_config);
        let mut vm = Self {
            heap,
            stack: Vec::new(),
            frames: Vec::new(),
            open_upvalues: Vec::new(),
            trace_exec,
        };
        vm.define_native("clock", 0, natives::clock);
        vm
    }

    fn define_native(&mut self, name: &str, arity: u8, function: NativeFn) {
        let name_ref = self.heap.intern_string(name);
        let native_ref = self.heap.alloc_native(NativeObj {
            name: name.into(),
            arity,
            function,
        });
        let hash = self.heap.hash_of(name_ref);
        self.heap.define_global(name_ref, hash, Value::Obj(ObjRef::Native(native_ref)));
    }

    /// Compile and run `source`, writing `print` output to `out`. Compile
    /// errors are returned rather than printed so the caller decides how
    /// to surface them; runtime errors are reported to stderr directly,
    /// matching the reference interpreter's split.
    pub fn interpret(
        &mut self,
        source: &str,
        out: &mut dyn Write,
        dump_bytecode: bool,
    ) -> (InterpretOutcome, Vec<Diagnostic>) {
        let _span = debug_span!("interpret").entered();
        let function = match fenc_compiler::compile(source, &mut self.heap) {
            Ok(f) => f,
            Err(diagnostics) => return (InterpretOutcome::CompileError, diagnostics),
        };

        if dump_bytecode {
            let mut dump = String::new();
            crate::disassemble::disassemble_program(&self.heap, function, &mut dump);
            eprintln!("{dump}");
        }

        self.reset_stack();
        self.push(Value::Obj(ObjRef::Function(function)));
        let closure = self.heap.alloc_closure(ClosureObj::new(function, Vec::new()));
        self.pop();
        self.push(Value::Obj(ObjRef::Closure(closure)));
        self.call(closure, 0)
            .expect("calling the freshly compiled top-level closure with 0 args cannot fail");

        match self.run(out) {
            Ok(()) => (InterpretOutcome::Ok, Vec::new()),
            Err(err) => {
                self.report_runtime_error(&err);
                self.reset_stack();
                (InterpretOutcome::RuntimeError, Vec::new())
            }
        }
    }

    fn reset_stack(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();
    }

    fn report_runtime_error(&self, err: &RuntimeError) {
        eprintln!("{err}");
        for frame in self.frames.iter().rev() {
            let closure = self.heap.closure(frame.closure);
            let function = self.heap.function(closure.function);
            let instruction = frame.ip.saturating_sub(1);
            let line = function.chunk.line_at(instruction);
            match function.name {
                None => eprintln!("[line {line}] in script"),
                Some(name) => eprintln!("[line {line}] in {}", self.heap.string(name).as_str()),
            }
        }
    }

    // ---- stack primitives ----

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("pop on an empty stack is a compiler bug")
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    // ---- bytecode reading ----

    fn current_frame(&self) -> &CallFrame {
        self.frames.last().expect("frame stack is never empty while running")
    }

    fn current_frame_mut(&mut self) -> &mut CallFrame {
        self.frames.last_mut().expect("frame stack is never empty while running")
    }

    fn read_byte(&mut self) -> u8 {
        let frame = self.frames.last_mut().expect("frame stack is never empty while running");
        let closure = self.heap.closure(frame.closure);
        let byte = self.heap.function(closure.function).chunk.code[frame.ip];
        frame.ip += 1;
        byte
    }

    fn read_short(&mut self) -> u16 {
        let hi = self.read_byte();
        let lo = self.read_byte();
        ((hi as u16) << 8) | lo as u16
    }

    fn read_constant(&mut self) -> Value {
        let index = self.read_byte();
        let closure = self.heap.closure(self.current_frame().closure);
        self.heap.function(closure.function).chunk.constants[index as usize]
    }

    fn read_string(&mut self) -> fengc::StringRef {
        match self.read_constant() {
            Value::Obj(ObjRef::String(s)) => s,
            _ => unreachable!("the compiler only emits string constants for name operands"),
        }
    }

    // ---- garbage collection ----

    fn maybe_collect(&mut self) {
        if self.heap.should_collect() {
            self.mark_roots();
            self.heap.collect_garbage();
        }
    }

    /// Roots: every stack slot, every active frame's closure, and every
    /// open upvalue. Globals (keys and values) and the `"init"` sentinel
    /// string are permanent roots `Heap` marks on every collection itself
    /// (see `fengc::Heap::collect_garbage`), since compiler-triggered
    /// collections have no access to VM state to mark them from here.
    fn mark_roots(&mut self) {
        for &value in &self.stack {
            self.heap.mark_value(value);
        }
        for frame in &self.frames {
            self.heap.mark_object(ObjRef::Closure(frame.closure));
        }
        for &upvalue in &self.open_upvalues {
            self.heap.mark_object(ObjRef::Upvalue(upvalue));
        }
    }

    // ---- calling ----

    fn call_value(&mut self, arg_count: u8) -> Result<(), RuntimeError> {
        match self.peek(arg_count as usize) {
            Value::Obj(ObjRef::Closure(c)) => self.call(c, arg_count),
            Value::Obj(ObjRef::Native(n)) => self.call_native(n, arg_count),
            Value::Obj(ObjRef::Class(class)) => self.call_class(class, arg_count),
            Value::Obj(ObjRef::BoundMethod(b)) => self.call_bound_method(b, arg_count),
            _ => Err(RuntimeError::NotCallable),
        }
    }

    fn call(&mut self, closure: fengc::ClosureRef, arg_count: u8) -> Result<(), RuntimeError> {
        let function = self.heap.closure(closure).function;
        let arity = self.heap.function(function).arity;
        if arg_count != arity {
            return Err(RuntimeError::ArityMismatch { expected: arity, got: arg_count });
        }
        if self.frames.len() >= FRAMES_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        let slot_base = self.stack.len() - arg_count as usize - 1;
        trace!(slot_base, arg_count, "call");
        self.frames.push(CallFrame { closure, ip: 0, slot_base });
        Ok(())
    }

    fn call_native(&mut self, native: fengc::NativeRef, arg_count: u8) -> Result<(), RuntimeError> {
        let start = self.stack.len() - arg_count as usize;
        let args: Vec<Value> = self.stack[start..].to_vec();
        let function = self.heap.native(native).function;
        let result = function(&args).map_err(RuntimeError::Native)?;
        self.stack.truncate(start - 1);
        self.push(result);
        Ok(())
    }

    fn call_class(&mut self, class: fengc::ClassRef, arg_count: u8) -> Result<(), RuntimeError> {
        self.maybe_collect();
        let instance = self.heap.alloc_instance(InstanceObj::new(class));
        let idx = self.stack.len() - arg_count as usize - 1;
        self.stack[idx] = Value::Obj(ObjRef::Instance(instance));

        let init_string = self.heap.init_string();
        let hash = self.heap.hash_of(init_string);
        if let Some(&initializer) = self.heap.class(class).methods.get(init_string, hash) {
            return self.call(initializer, arg_count);
        }
        if arg_count != 0 {
            return Err(RuntimeError::ArityMismatch { expected: 0, got: arg_count });
        }
        Ok(())
    }

    fn call_bound_method(&mut self, bound: fengc::BoundMethodRef, arg_count: u8) -> Result<(), RuntimeError> {
        let bound_method = self.heap.bound_method(bound);
        let receiver = bound_method.receiver;
        let method = bound_method.method;
        let idx = self.stack.len() - arg_count as usize - 1;
        self.stack[idx] = receiver;
        self.call(method, arg_count)
    }

    fn invoke_from_class(
        &mut self,
        class: fengc::ClassRef,
        name: fengc::StringRef,
        arg_count: u8,
    ) -> Result<(), RuntimeError> {
        let hash = self.heap.hash_of(name);
        let method = *self
            .heap
            .class(class)
            .methods
            .get(name, hash)
            .ok_or_else(|| RuntimeError::UndefinedProperty(self.heap.string(name).as_str().to_string()))?;
        self.call(method, arg_count)
    }

    fn invoke(&mut self, name: fengc::StringRef, arg_count: u8) -> Result<(), RuntimeError> {
        let receiver = self.peek(arg_count as usize);
        let Value::Obj(ObjRef::Instance(instance)) = receiver else {
            return Err(RuntimeError::OnlyInstancesHaveMethods);
        };
        let hash = self.heap.hash_of(name);
        if let Some(&value) = self.heap.instance(instance).fields.get(name, hash) {
            let idx = self.stack.len() - arg_count as usize - 1;
            self.stack[idx] = value;
            return self.call_value(arg_count);
        }
        let class = self.heap.instance(instance).class;
        self.invoke_from_class(class, name, arg_count)
    }

    fn bind_method(&mut self, class: fengc::ClassRef, name: fengc::StringRef) -> Result<(), RuntimeError> {
        let hash = self.heap.hash_of(name);
        let method = *self
            .heap
            .class(class)
            .methods
            .get(name, hash)
            .ok_or_else(|| RuntimeError::UndefinedProperty(self.heap.string(name).as_str().to_string()))?;
        self.maybe_collect();
        let receiver = self.pop();
        let bound = self.heap.alloc_bound_method(BoundMethodObj { receiver, method });
        self.push(Value::Obj(ObjRef::BoundMethod(bound)));
        Ok(())
    }

    // ---- upvalues ----

    fn upvalue_slot(&self, u: fengc::UpvalueRef) -> Option<usize> {
        match self.heap.upvalue(u).state {
            UpvalueState::Open(i) => Some(i),
            UpvalueState::Closed(_) => None,
        }
    }

    /// Reuse an existing open upvalue for `stack_index` if one exists,
    /// otherwise allocate a new one and splice it into the
    /// descending-by-slot list.
    fn capture_upvalue(&mut self, stack_index: usize) -> fengc::UpvalueRef {
        if let Some(&existing) = self.open_upvalues.iter().find(|&&u| self.upvalue_slot(u) == Some(stack_index)) {
            return existing;
        }
        self.maybe_collect();
        let created = self.heap.alloc_upvalue(UpvalueObj::open(stack_index));
        let position = self
            .open_upvalues
            .iter()
            .position(|&u| self.upvalue_slot(u).map_or(true, |slot| slot < stack_index))
            .unwrap_or(self.open_upvalues.len());
        self.open_upvalues.insert(position, created);
        created
    }

    /// Close every open upvalue at or above `from`, copying the stack
    /// value into it so it survives the frame going away.
    fn close_upvalues(&mut self, from: usize) {
        while let Some(&top) = self.open_upvalues.first() {
            let Some(slot) = self.upvalue_slot(top) else { break };
            if slot < from {
                break;
            }
            let value = self.stack[slot];
            self.heap.upvalue_mut(top).state = UpvalueState::Closed(value);
            self.open_upvalues.remove(0);
        }
    }

    fn read_upvalue_value(&self, u: fengc::UpvalueRef) -> Value {
        match self.heap.upvalue(u).state {
            UpvalueState::Open(i) => self.stack[i],
            UpvalueState::Closed(v) => v,
        }
    }

    fn write_upvalue_value(&mut self, u: fengc::UpvalueRef, value: Value) {
        match self.heap.upvalue(u).state {
            UpvalueState::Open(i) => self.stack[i] = value,
            UpvalueState::Closed(_) => self.heap.upvalue_mut(u).state = UpvalueState::Closed(value),
        }
    }

    // ---- binary operators ----

    fn add(&mut self) -> Result<(), RuntimeError> {
        match (self.peek(1), self.peek(0)) {
            (Value::Obj(ObjRef::String(_)), Value::Obj(ObjRef::String(_))) => self.concatenate(),
            (Value::Number(a), Value::Number(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(a + b));
                Ok(())
            }
            _ => Err(RuntimeError::OperandsMustBeNumbersOrStrings),
        }
    }

    fn concatenate(&mut self) -> Result<(), RuntimeError> {
        let Value::Obj(ObjRef::String(a)) = self.peek(1) else { unreachable!() };
        let Value::Obj(ObjRef::String(b)) = self.peek(0) else { unreachable!() };
        let mut combined = String::with_capacity(self.heap.string(a).as_str().len() + self.heap.string(b).as_str().len());
        combined.push_str(self.heap.string(a).as_str());
        combined.push_str(self.heap.string(b).as_str());
        // Both operands stay on the stack (and thus reachable) until after
        // the allocation that might trigger a collection.
        self.maybe_collect();
        let result = self.heap.intern_string(&combined);
        self.pop();
        self.pop();
        self.push(Value::Obj(ObjRef::String(result)));
        Ok(())
    }

    fn binary_number(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let (Some(b), Some(a)) = (self.peek(0).as_number(), self.peek(1).as_number()) else {
            return Err(RuntimeError::OperandsMustBeNumbers);
        };
        self.pop();
        self.pop();
        self.push(Value::Number(f(a, b)));
        Ok(())
    }

    fn binary_compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let (Some(b), Some(a)) = (self.peek(0).as_number(), self.peek(1).as_number()) else {
            return Err(RuntimeError::OperandsMustBeNumbers);
        };
        self.pop();
        self.pop();
        self.push(Value::Bool(f(a, b)));
        Ok(())
    }

    // ---- dispatch loop ----

    fn run(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        loop {
            if self.trace_exec {
                self.trace_stack();
            }
            let byte = self.read_byte();
            let op = Op::from_byte(byte).expect("the compiler only emits defined opcodes");
            match op {
                Op::Constant => {
                    let value = self.read_constant();
                    self.push(value);
                }
                Op::Nil => self.push(Value::Nil),
                Op::True => self.push(Value::Bool(true)),
                Op::False => self.push(Value::Bool(false)),
                Op::Pop => {
                    self.pop();
                }
                Op::GetLocal => {
                    let slot = self.read_byte();
                    let value = self.stack[self.current_frame().slot_base + slot as usize];
                    self.push(value);
                }
                Op::SetLocal => {
                    let slot = self.read_byte();
                    let value = self.peek(0);
                    let idx = self.current_frame().slot_base + slot as usize;
                    self.stack[idx] = value;
                }
                Op::GetGlobal => {
                    let name = self.read_string();
                    let hash = self.heap.hash_of(name);
                    let Some(value) = self.heap.get_global(name, hash) else {
                        return Err(RuntimeError::UndefinedVariable(self.heap.string(name).as_str().to_string()));
                    };
                    self.push(value);
                }
                Op::DefineGlobal => {
                    let name = self.read_string();
                    let hash = self.heap.hash_of(name);
                    let value = self.pop();
                    self.heap.define_global(name, hash, value);
                }
                Op::SetGlobal => {
                    let name = self.read_string();
                    let hash = self.heap.hash_of(name);
                    let value = self.peek(0);
                    if self.heap.define_global(name, hash, value) {
                        self.heap.delete_global(name, hash);
                        return Err(RuntimeError::UndefinedVariable(self.heap.string(name).as_str().to_string()));
                    }
                }
                Op::GetUpvalue => {
                    let slot = self.read_byte();
                    let upvalue = self.heap.closure(self.current_frame().closure).upvalues[slot as usize];
                    let value = self.read_upvalue_value(upvalue);
                    self.push(value);
                }
                Op::SetUpvalue => {
                    let slot = self.read_byte();
                    let upvalue = self.heap.closure(self.current_frame().closure).upvalues[slot as usize];
                    let value = self.peek(0);
                    self.write_upvalue_value(upvalue, value);
                }
                Op::GetProperty => {
                    let name = self.read_string();
                    let Value::Obj(ObjRef::Instance(instance)) = self.peek(0) else {
                        return Err(RuntimeError::OnlyInstancesHaveProperties);
                    };
                    let hash = self.heap.hash_of(name);
                    if let Some(&value) = self.heap.instance(instance).fields.get(name, hash) {
                        self.pop();
                        self.push(value);
                    } else {
                        let class = self.heap.instance(instance).class;
                        self.bind_method(class, name)?;
                    }
                }
                Op::SetProperty => {
                    let name = self.read_string();
                    let Value::Obj(ObjRef::Instance(instance)) = self.peek(1) else {
                        return Err(RuntimeError::OnlyInstancesHaveFields);
                    };
                    let value = self.peek(0);
                    let hash = self.heap.hash_of(name);
                    self.heap.instance_mut(instance).fields.set(name, hash, value);
                    let value = self.pop();
                    self.pop();
                    self.push(value);
                }
                Op::GetSuper => {
                    let name = self.read_string();
                    let Value::Obj(ObjRef::Class(superclass)) = self.pop() else {
                        unreachable!("the compiler only emits GET_SUPER with a class on top")
                    };
                    self.bind_method(superclass, name)?;
                }
                Op::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                }
                Op::Greater => self.binary_compare(|a, b| a > b)?,
                Op::Less => self.binary_compare(|a, b| a < b)?,
                Op::Add => self.add()?,
                Op::Subtract => self.binary_number(|a, b| a - b)?,
                Op::Multiply => self.binary_number(|a, b| a * b)?,
                Op::Divide => self.binary_number(|a, b| a / b)?,
                Op::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()));
                }
                Op::Negate => {
                    let Some(n) = self.peek(0).as_number() else {
                        return Err(RuntimeError::OperandMustBeNumber);
                    };
                    self.pop();
                    self.push(Value::Number(-n));
                }
                Op::Print => {
                    let value = self.pop();
                    let text = fengc::format_value(&self.heap, value);
                    writeln!(out, "{text}").map_err(|e| RuntimeError::Native(e.to_string()))?;
                }
                Op::Jump => {
                    let offset = self.read_short();
                    self.current_frame_mut().ip += offset as usize;
                }
                Op::JumpIfFalse => {
                    let offset = self.read_short();
                    if self.peek(0).is_falsey() {
                        self.current_frame_mut().ip += offset as usize;
                    }
                }
                Op::Loop => {
                    let offset = self.read_short();
                    self.current_frame_mut().ip -= offset as usize;
                }
                Op::Call => {
                    let arg_count = self.read_byte();
                    self.call_value(arg_count)?;
                }
                Op::Invoke => {
                    let name = self.read_string();
                    let arg_count = self.read_byte();
                    self.invoke(name, arg_count)?;
                }
                Op::SuperInvoke => {
                    let name = self.read_string();
                    let arg_count = self.read_byte();
                    let Value::Obj(ObjRef::Class(superclass)) = self.pop() else {
                        unreachable!("the compiler only emits SUPER_INVOKE with a class on top")
                    };
                    self.invoke_from_class(superclass, name, arg_count)?;
                }
                Op::Closure => {
                    let Value::Obj(ObjRef::Function(function)) = self.read_constant() else {
                        unreachable!("the compiler only emits OP_CLOSURE over a function constant")
                    };
                    let upvalue_count = self.heap.function(function).upvalue_count;
                    let mut upvalues = Vec::with_capacity(upvalue_count);
                    for _ in 0..upvalue_count {
                        let is_local = self.read_byte() != 0;
                        let index = self.read_byte();
                        if is_local {
                            let stack_index = self.current_frame().slot_base + index as usize;
                            upvalues.push(self.capture_upvalue(stack_index));
                        } else {
                            let enclosing = self.heap.closure(self.current_frame().closure);
                            upvalues.push(enclosing.upvalues[index as usize]);
                        }
                    }
                    self.maybe_collect();
                    let closure = self.heap.alloc_closure(ClosureObj::new(function, upvalues));
                    self.push(Value::Obj(ObjRef::Closure(closure)));
                }
                Op::CloseUpvalue => {
                    self.close_upvalues(self.stack.len() - 1);
                    self.pop();
                }
                Op::Return => {
                    let result = self.pop();
                    let slot_base = self.current_frame().slot_base;
                    self.close_upvalues(slot_base);
                    self.frames.pop();
                    self.stack.truncate(slot_base);
                    if self.frames.is_empty() {
                        return Ok(());
                    }
                    self.push(result);
                }
                Op::Class => {
                    let name = self.read_string();
                    self.maybe_collect();
                    let class = self.heap.alloc_class(fengc::ClassObj::new(name));
                    self.push(Value::Obj(ObjRef::Class(class)));
                }
                Op::Inherit => {
                    let Value::Obj(ObjRef::Class(superclass)) = self.peek(1) else {
                        return Err(RuntimeError::SuperclassMustBeClass);
                    };
                    let Value::Obj(ObjRef::Class(subclass)) = self.peek(0) else {
                        unreachable!("the compiler only emits OP_INHERIT with a class on top")
                    };
                    let methods = self.heap.class(superclass).methods.clone();
                    self.heap.class_mut(subclass).methods.add_all(&methods);
                    self.pop(); // the subclass; the superclass stays as the `super` local
                }
                Op::Method => {
                    let name = self.read_string();
                    let Value::Obj(ObjRef::Closure(method)) = self.pop() else {
                        unreachable!("the compiler only emits OP_METHOD over a closure")
                    };
                    let Value::Obj(ObjRef::Class(class)) = self.peek(0) else {
                        unreachable!("the compiler only emits OP_METHOD with a class on top")
                    };
                    let hash = self.heap.hash_of(name);
                    self.heap.class_mut(class).methods.set(name, hash, method);
                }
            }
        }
    }

    fn trace_stack(&mut self) {
        let mut rendered = String::from("          ");
        for &value in &self.stack {
            rendered.push('[');
            rendered.push_str(&fengc::format_value(&self.heap, value));
            rendered.push(']');
        }
        let frame = self.current_frame();
        let closure = self.heap.closure(frame.closure);
        let chunk = &self.heap.function(closure.function).chunk;
        let (disassembled, _) = crate::disassemble::disassemble_instruction(&self.heap, chunk, frame.ip);
        debug!(stack = %rendered, instruction = %disassembled, "trace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (InterpretOutcome, String) {
        let mut vm = Vm::new(GcConfig::default(), false);
        let mut out = Vec::new();
        let (outcome, diagnostics) = vm.interpret(source, &mut out, false);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn arithmetic_honors_precedence_and_grouping() {
        let (outcome, out) = run("print 2 + 3 * 4 - (1 + 1);\n");
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "12\n");
    }

    #[test]
    fn string_concatenation_uses_plus() {
        let (outcome, out) = run(r#"print "foo" + "bar";"#);
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "foobar\n");
    }

    #[test]
    fn block_scoping_shadows_the_outer_binding() {
        let (outcome, out) = run(
            r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
            "#,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "inner\nouter\n");
    }

    #[test]
    fn closures_share_state_through_a_captured_upvalue() {
        let (outcome, out) = run(
            r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    print count;
                }
                return increment;
            }
            var counter = makeCounter();
            counter();
            counter();
            "#,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn single_inheritance_resolves_super_calls() {
        let (outcome, out) = run(
            r#"
            class Animal {
                speak() {
                    print "generic noise";
                }
            }
            class Dog < Animal {
                speak() {
                    super.speak();
                    print "woof";
                }
            }
            Dog().speak();
            "#,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "generic noise\nwoof\n");
    }

    #[test]
    fn class_init_runs_implicitly_and_returns_the_instance() {
        let (outcome, out) = run(
            r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
                sum() {
                    print this.x + this.y;
                }
            }
            var p = Point(3, 4);
            p.sum();
            "#,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "7\n");
    }

    #[test]
    fn for_loop_desugars_to_a_counted_while() {
        let (outcome, out) = run(
            r#"
            for (var i = 0; i < 3; i = i + 1) {
                print i;
            }
            "#,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(out, "0\n1\n2\n");
    }

    #[test]
    fn adding_a_number_to_a_string_is_a_runtime_error() {
        let mut vm = Vm::new(GcConfig::default(), false);
        let mut out = Vec::new();
        let (outcome, diagnostics) = vm.interpret(r#"print "x" + 1;"#, &mut out, false);
        assert!(diagnostics.is_empty());
        assert_eq!(outcome, InterpretOutcome::RuntimeError);
        assert_eq!(outcome.exit_code(), 70);
    }

    #[test]
    fn assigning_to_an_undeclared_global_is_a_runtime_error() {
        let mut vm = Vm::new(GcConfig::default(), false);
        let mut out = Vec::new();
        let (outcome, _) = vm.interpret("x = 1;", &mut out, false);
        assert_eq!(outcome, InterpretOutcome::RuntimeError);
    }

    #[test]
    fn stress_gc_does_not_change_observable_output() {
        let mut config = GcConfig::default();
        config.stress_gc = true;
        let mut vm = Vm::new(config, false);
        let mut out = Vec::new();
        let (outcome, _) = vm.interpret(
            r#"
            class Tree {
                init(value) {
                    this.value = value;
                }
            }
            fun build(n) {
                var t = Tree(n);
                var s = "leaf" + "y";
                print t.value;
                print s;
            }
            build(1);
            build(2);
            "#,
            &mut out,
            false,
        );
        assert_eq!(outcome, InterpretOutcome::Ok);
        assert_eq!(String::from_utf8(out).unwrap(), "1\nleafy\n2\nleafy\n");
    }
}
