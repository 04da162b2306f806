//! Bytecode disassembler: a human-readable dump of a chunk's instructions.
//! Used by `fent --dump-bytecode` and by the `--trace-exec` tracing span
//! in [`crate::vm::Vm`].

use fengc::{Chunk, Heap, Op};

/// One line per instruction in `chunk`, prefixed with `name` the way
/// `disassembleChunk` prints a `== name ==` banner first.
pub fn disassemble_chunk(heap: &Heap, chunk: &Chunk, name: &str) -> String {
    let mut out = format!("== {name} ==\n");
    let mut offset = 0;
    while offset < chunk.code.len() {
        let (line, next) = disassemble_instruction(heap, chunk, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Disassemble the single instruction at `offset`, returning its text and
/// the offset of the instruction that follows it.
pub fn disassemble_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut line = format!("{offset:04} ");
    let source_line = chunk.line_at(offset);
    if offset > 0 && source_line == chunk.line_at(offset - 1) {
        line.push_str("   | ");
    } else {
        line.push_str(&format!("{source_line:4} "));
    }

    let byte = chunk.code[offset];
    let Some(op) = Op::from_byte(byte) else {
        line.push_str(&format!("Unknown opcode {byte}"));
        return (line, offset + 1);
    };

    match op {
        Op::Nil | Op::True | Op::False | Op::Pop | Op::Equal | Op::Greater | Op::Less | Op::Add
        | Op::Subtract | Op::Multiply | Op::Divide | Op::Not | Op::Negate | Op::Print
        | Op::CloseUpvalue | Op::Return | Op::Inherit => {
            line.push_str(op_name(op));
            (line, offset + 1)
        }
        Op::Constant | Op::GetGlobal | Op::DefineGlobal | Op::SetGlobal | Op::GetProperty
        | Op::SetProperty | Op::GetSuper | Op::Class | Op::Method => {
            let index = chunk.code[offset + 1];
            let value = fengc::format_value(heap, chunk.constants[index as usize]);
            line.push_str(&format!("{:-16} {index:4} '{value}'", op_name(op)));
            (line, offset + 2)
        }
        Op::GetLocal | Op::SetLocal | Op::GetUpvalue | Op::SetUpvalue | Op::Call => {
            let slot = chunk.code[offset + 1];
            line.push_str(&format!("{:-16} {slot:4}", op_name(op)));
            (line, offset + 2)
        }
        Op::Jump | Op::JumpIfFalse => {
            let jump = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let target = offset as isize + 3 + jump as isize;
            line.push_str(&format!("{:-16} {offset:4} -> {target}", op_name(op)));
            (line, offset + 3)
        }
        Op::Loop => {
            let jump = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let target = offset as isize + 3 - jump as isize;
            line.push_str(&format!("{:-16} {offset:4} -> {target}", op_name(op)));
            (line, offset + 3)
        }
        Op::Invoke | Op::SuperInvoke => {
            let index = chunk.code[offset + 1];
            let arg_count = chunk.code[offset + 2];
            let name = fengc::format_value(heap, chunk.constants[index as usize]);
            line.push_str(&format!(
                "{:-16} ({arg_count} args) {index:4} '{name}'",
                op_name(op)
            ));
            (line, offset + 3)
        }
        Op::Closure => {
            let mut cursor = offset + 1;
            let index = chunk.code[cursor];
            cursor += 1;
            let value = fengc::format_value(heap, chunk.constants[index as usize]);
            line.push_str(&format!("{:-16} {index:4} {value}", op_name(op)));
            if let fengc::Value::Obj(fengc::ObjRef::Function(f)) = chunk.constants[index as usize] {
                let upvalue_count = heap.function(f).upvalue_count;
                for _ in 0..upvalue_count {
                    let is_local = chunk.code[cursor];
                    let upvalue_index = chunk.code[cursor + 1];
                    let kind = if is_local != 0 { "local" } else { "upvalue" };
                    line.push_str(&format!(
                        "\n{cursor:04}      |                     {kind} {upvalue_index}"
                    ));
                    cursor += 2;
                }
            }
            (line, cursor)
        }
    }
}

fn op_name(op: Op) -> &'static str {
    match op {
        Op::Constant => "OP_CONSTANT",
        Op::Nil => "OP_NIL",
        Op::True => "OP_TRUE",
        Op::False => "OP_FALSE",
        Op::Pop => "OP_POP",
        Op::GetLocal => "OP_GET_LOCAL",
        Op::SetLocal => "OP_SET_LOCAL",
        Op::GetGlobal => "OP_GET_GLOBAL",
        Op::DefineGlobal => "OP_DEFINE_GLOBAL",
        Op::SetGlobal => "OP_SET_GLOBAL",
        Op::GetUpvalue => "OP_GET_UPVALUE",
        Op::SetUpvalue => "OP_SET_UPVALUE",
        Op::GetProperty => "OP_GET_PROPERTY",
        Op::SetProperty => "OP_SET_PROPERTY",
        Op::GetSuper => "OP_GET_SUPER",
        Op::Equal => "OP_EQUAL",
        Op::Greater => "OP_GREATER",
        Op::Less => "OP_LESS",
        Op::Add => "OP_ADD",
        Op::Subtract => "OP_SUBTRACT",
        Op::Multiply => "OP_MULTIPLY",
        Op::Divide => "OP_DIVIDE",
        Op::Not => "OP_NOT",
        Op::Negate => "OP_NEGATE",
        Op::Print => "OP_PRINT",
        Op::Jump => "OP_JUMP",
        Op::JumpIfFalse => "OP_JUMP_IF_FALSE",
        Op::Loop => "OP_LOOP",
        Op::Call => "OP_CALL",
        Op::Invoke => "OP_INVOKE",
        Op::SuperInvoke => "OP_SUPER_INVOKE",
        Op::Closure => "OP_CLOSURE",
        Op::CloseUpvalue => "OP_CLOSE_UPVALUE",
        Op::Return => "OP_RETURN",
        Op::Class => "OP_CLASS",
        Op::Inherit => "OP_INHERIT",
        Op::Method => "OP_METHOD",
    }
}

/// Recursively dump `function`'s chunk and every nested function chunk
/// reachable through its constant pool, the way `compiler.c`'s
/// `DEBUG_PRINT_CODE` dumps each function as soon as it finishes
/// compiling.
pub fn disassemble_program(heap: &Heap, function: fengc::FunctionRef, out: &mut String) {
    let f = heap.function(function);
    let name = f.name.map(|n| heap.string(n).as_str().to_string()).unwrap_or_else(|| "script".to_string());
    out.push_str(&disassemble_chunk(heap, &f.chunk, &name));
    let nested: Vec<fengc::FunctionRef> = f
        .chunk
        .constants
        .iter()
        .filter_map(|c| match c {
            fengc::Value::Obj(fengc::ObjRef::Function(nested)) => Some(*nested),
            _ => None,
        })
        .collect();
    for nested_fn in nested {
        out.push('\n');
        disassemble_program(heap, nested_fn, out);
    }
}
