//! The compiler's per-function state and the handful of low-level emit/
//! scope/variable-resolution helpers every parsing function builds on.
//!
//! There is no AST: `expr.rs`/`stmt.rs` walk tokens once and call straight
//! into these helpers to append bytes to the function currently being
//! compiled. "Currently being compiled" is `self.frames.last()` — a stack
//! standing in for clox's linked list of `Compiler` structs, since Rust's
//! ownership rules make an intrusive parent pointer awkward where a `Vec`
//! isn't.

use fengc::{FunctionKind, FunctionObj, FunctionRef, Heap, ObjRef, Op, StringRef, Value};

use crate::parser::Parser;

pub(crate) struct Local<'src> {
    pub name: &'src str,
    /// `None` while the initializer expression is still being compiled —
    /// reading the variable in that window is an error.
    pub depth: Option<u32>,
    pub is_captured: bool,
}

#[derive(Clone, Copy)]
pub(crate) struct UpvalueSlot {
    pub index: u8,
    pub is_local: bool,
}

pub(crate) struct FunctionFrame<'src> {
    pub function: FunctionObj,
    pub kind: FunctionKind,
    pub locals: Vec<Local<'src>>,
    pub upvalues: Vec<UpvalueSlot>,
    pub scope_depth: u32,
}

impl<'src> FunctionFrame<'src> {
    pub(crate) fn new(name: Option<StringRef>, kind: FunctionKind) -> Self {
        // Stack slot 0 is reserved: `this` for methods/initializers, an
        // unnamed placeholder (never resolvable by name) everywhere else.
        let slot_zero_name = match kind {
            FunctionKind::Method | FunctionKind::Initializer => "this",
            FunctionKind::Function | FunctionKind::Script => "",
        };
        Self {
            function: FunctionObj::new(name, kind),
            kind,
            locals: vec![Local {
                name: slot_zero_name,
                depth: Some(0),
                is_captured: false,
            }],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }
}

pub(crate) struct ClassFrame {
    pub has_superclass: bool,
}

pub struct Compiler<'src, 'heap> {
    pub(crate) parser: Parser<'src>,
    pub(crate) heap: &'heap mut Heap,
    pub(crate) frames: Vec<FunctionFrame<'src>>,
    pub(crate) classes: Vec<ClassFrame>,
}

/// Compile `source` into a top-level script function. On success, every
/// nested function/closure/class referenced by it has already been
/// allocated into `heap` too — what's returned is just the entry point.
pub fn compile(source: &str, heap: &mut Heap) -> Result<FunctionRef, Vec<fenc_util::Diagnostic>> {
    let mut compiler = Compiler {
        parser: Parser::new(source),
        heap,
        frames: vec![FunctionFrame::new(None, FunctionKind::Script)],
        classes: Vec::new(),
    };

    compiler.parser.advance();
    while !compiler.parser.match_token(fenc_lex::TokenKind::Eof) {
        compiler.declaration();
    }

    let (function, _upvalues) = compiler.end_current_function();
    if compiler.parser.handler.had_error() {
        Err(compiler.parser.handler.diagnostics().to_vec())
    } else {
        compiler.collect_if_needed(Some(&function));
        Ok(compiler.heap.alloc_function(function))
    }
}

impl<'src, 'heap> Compiler<'src, 'heap> {
    pub(crate) fn current_frame(&self) -> &FunctionFrame<'src> {
        self.frames.last().expect("frame stack is never empty while compiling")
    }

    pub(crate) fn current_frame_mut(&mut self) -> &mut FunctionFrame<'src> {
        self.frames.last_mut().expect("frame stack is never empty while compiling")
    }

    fn current_line(&self) -> u32 {
        self.parser.previous.line
    }

    // ---- byte emission ----

    pub(crate) fn emit_byte(&mut self, byte: u8) {
        let line = self.current_line();
        self.current_frame_mut().function.chunk.write(byte, line);
    }

    pub(crate) fn emit_op(&mut self, op: Op) {
        self.emit_byte(op.as_byte());
    }

    pub(crate) fn emit_bytes(&mut self, a: u8, b: u8) {
        self.emit_byte(a);
        self.emit_byte(b);
    }

    pub(crate) fn emit_op_byte(&mut self, op: Op, operand: u8) {
        self.emit_bytes(op.as_byte(), operand);
    }

    /// `OP_RETURN` with the correct implicit return value: `this` for an
    /// initializer, `nil` everywhere else.
    pub(crate) fn emit_return(&mut self) {
        if self.current_frame().kind == FunctionKind::Initializer {
            self.emit_op_byte(Op::GetLocal, 0);
        } else {
            self.emit_op(Op::Nil);
        }
        self.emit_op(Op::Return);
    }

    /// Emits `op` followed by a two-byte placeholder offset, returning the
    /// offset of the first placeholder byte for `patch_jump` to fill in
    /// once the jump target is known.
    pub(crate) fn emit_jump(&mut self, op: Op) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.current_frame().function.chunk.code.len() - 2
    }

    pub(crate) fn patch_jump(&mut self, offset: usize) {
        let jump = self.current_frame().function.chunk.code.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.parser.error("Too much code to jump over.");
        }
        let hi = ((jump >> 8) & 0xff) as u8;
        let lo = (jump & 0xff) as u8;
        let chunk = &mut self.current_frame_mut().function.chunk;
        chunk.code[offset] = hi;
        chunk.code[offset + 1] = lo;
    }

    pub(crate) fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(Op::Loop);
        let offset = self.current_frame().function.chunk.code.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.parser.error("Loop body too large.");
        }
        self.emit_byte(((offset >> 8) & 0xff) as u8);
        self.emit_byte((offset & 0xff) as u8);
    }

    pub(crate) fn current_chunk_len(&self) -> usize {
        self.current_frame().function.chunk.code.len()
    }

    // ---- constants ----

    pub(crate) fn make_constant(&mut self, value: Value) -> u8 {
        let frame = self.current_frame_mut();
        if frame.function.chunk.constants.len() >= 256 {
            self.parser.error("Too many constants in one chunk.");
            return 0;
        }
        frame.function.chunk.add_constant(value)
    }

    pub(crate) fn emit_constant(&mut self, value: Value) {
        let constant = self.make_constant(value);
        self.emit_op_byte(Op::Constant, constant);
    }

    pub(crate) fn identifier_constant(&mut self, name: &str) -> u8 {
        self.collect_if_needed(None);
        let string_ref = self.heap.intern_string(name);
        self.make_constant(Value::Obj(ObjRef::String(string_ref)))
    }

    /// Run a collection if the heap is over threshold, first marking every
    /// value already reachable through this compiler: the constant pools of
    /// every function currently being compiled (the enclosing chain), plus
    /// `pending` if a just-finished function hasn't been handed to the heap
    /// yet.
    pub(crate) fn collect_if_needed(&mut self, pending: Option<&FunctionObj>) {
        if !self.heap.should_collect() {
            return;
        }
        for frame in &self.frames {
            Self::mark_function_roots(self.heap, &frame.function);
        }
        if let Some(function) = pending {
            Self::mark_function_roots(self.heap, function);
        }
        self.heap.collect_garbage();
    }

    fn mark_function_roots(heap: &mut Heap, function: &FunctionObj) {
        if let Some(name) = function.name {
            heap.mark_object(ObjRef::String(name));
        }
        for constant in &function.chunk.constants {
            heap.mark_value(*constant);
        }
    }

    // ---- scope / locals ----

    pub(crate) fn begin_scope(&mut self) {
        self.current_frame_mut().scope_depth += 1;
    }

    pub(crate) fn end_scope(&mut self) {
        self.current_frame_mut().scope_depth -= 1;
        loop {
            let depth = self.current_frame().scope_depth;
            let should_pop = matches!(self.current_frame().locals.last(), Some(l) if l.depth.map_or(false, |d| d > depth));
            if !should_pop {
                break;
            }
            let is_captured = self.current_frame().locals.last().unwrap().is_captured;
            if is_captured {
                self.emit_op(Op::CloseUpvalue);
            } else {
                self.emit_op(Op::Pop);
            }
            self.current_frame_mut().locals.pop();
        }
    }

    pub(crate) fn add_local(&mut self, name: &'src str) {
        if self.current_frame().locals.len() >= 256 {
            self.parser.error("Too many local variables in function.");
            return;
        }
        self.current_frame_mut().locals.push(Local {
            name,
            depth: None,
            is_captured: false,
        });
    }

    pub(crate) fn declare_variable(&mut self) {
        if self.current_frame().scope_depth == 0 {
            return;
        }
        let name = self.parser.previous.lexeme;
        let depth = self.current_frame().scope_depth;
        let redeclared = self
            .current_frame()
            .locals
            .iter()
            .rev()
            .take_while(|l| l.depth.map_or(true, |d| d >= depth))
            .any(|l| l.name == name);
        if redeclared {
            self.parser.error("Already a variable with this name in this scope.");
            return;
        }
        self.add_local(name);
    }

    pub(crate) fn mark_initialized(&mut self) {
        if self.current_frame().scope_depth == 0 {
            return;
        }
        let depth = self.current_frame().scope_depth;
        self.current_frame_mut().locals.last_mut().unwrap().depth = Some(depth);
    }

    pub(crate) fn parse_variable(&mut self, error_message: &str) -> u8 {
        self.parser.consume(fenc_lex::TokenKind::Identifier, error_message);
        self.declare_variable();
        if self.current_frame().scope_depth > 0 {
            return 0;
        }
        let name = self.parser.previous.lexeme;
        self.identifier_constant(name)
    }

    pub(crate) fn define_variable(&mut self, global: u8) {
        if self.current_frame().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_op_byte(Op::DefineGlobal, global);
    }

    // ---- local/upvalue resolution ----

    pub(crate) fn resolve_local(&mut self, frame_idx: usize, name: &str) -> Option<u8> {
        let frame = &self.frames[frame_idx];
        for (i, local) in frame.locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth.is_none() {
                    self.parser.error("Can't read local variable in its own initializer.");
                }
                return Some(i as u8);
            }
        }
        None
    }

    pub(crate) fn resolve_upvalue(&mut self, frame_idx: usize, name: &str) -> Option<u8> {
        if frame_idx == 0 {
            return None;
        }
        let enclosing = frame_idx - 1;
        if let Some(local) = self.resolve_local(enclosing, name) {
            self.frames[enclosing].locals[local as usize].is_captured = true;
            return Some(self.add_upvalue(frame_idx, local, true));
        }
        if let Some(upvalue) = self.resolve_upvalue(enclosing, name) {
            return Some(self.add_upvalue(frame_idx, upvalue, false));
        }
        None
    }

    fn add_upvalue(&mut self, frame_idx: usize, index: u8, is_local: bool) -> u8 {
        let frame = &mut self.frames[frame_idx];
        for (i, existing) in frame.upvalues.iter().enumerate() {
            if existing.index == index && existing.is_local == is_local {
                return i as u8;
            }
        }
        if frame.upvalues.len() >= 256 {
            self.parser.error("Too many closure variables in function.");
            return 0;
        }
        frame.upvalues.push(UpvalueSlot { index, is_local });
        frame.function.upvalue_count = frame.upvalues.len();
        (frame.upvalues.len() - 1) as u8
    }

    /// Ends the innermost function body, returning its (not yet heap
    /// allocated) `FunctionObj` plus the upvalue layout its closures must
    /// be created with. The caller decides what to do with both — a
    /// nested `fun` wraps them in an `OP_CLOSURE`; the top-level script
    /// just hands the object straight to the heap.
    pub(crate) fn end_current_function(&mut self) -> (FunctionObj, Vec<UpvalueSlot>) {
        self.emit_return();
        let frame = self.frames.pop().expect("ending a function with no active frame");
        (frame.function, frame.upvalues)
    }
}
