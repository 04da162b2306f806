//! Statement and declaration parsing: control flow, variable/function/class
//! declarations, and the `declaration -> statement` dispatch loop that
//! drives the whole compile.

use fengc::{FunctionKind, ObjRef, Op, Value};

use crate::compiler::{ClassFrame, Compiler, FunctionFrame};
use fenc_lex::TokenKind;

impl<'src, 'heap> Compiler<'src, 'heap> {
    pub(crate) fn declaration(&mut self) {
        if self.parser.match_token(TokenKind::Class) {
            self.class_declaration();
        } else if self.parser.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.parser.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.parser.handler.is_panicking() {
            self.parser.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.parser.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(Op::Nil);
        }
        self.parser
            .consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");
        self.define_variable(global);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        // Mark initialized before compiling the body so a function can
        // call itself recursively by name.
        self.mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn class_declaration(&mut self) {
        self.parser.consume(TokenKind::Identifier, "Expect class name.");
        let class_name = self.parser.previous.lexeme;
        let name_constant = self.identifier_constant(class_name);
        self.declare_variable();

        self.emit_op_byte(Op::Class, name_constant);
        self.define_variable(name_constant);

        self.classes.push(ClassFrame { has_superclass: false });

        if self.parser.match_token(TokenKind::Less) {
            self.parser.consume(TokenKind::Identifier, "Expect superclass name.");
            let superclass_name = self.parser.previous.lexeme;
            if superclass_name == class_name {
                self.parser.error("A class can't inherit from itself.");
            }
            self.named_variable(superclass_name, false);

            self.begin_scope();
            self.add_local("super");
            self.define_variable(0);

            self.named_variable(class_name, false);
            self.emit_op(Op::Inherit);
            self.classes.last_mut().unwrap().has_superclass = true;
        }

        self.named_variable(class_name, false);
        self.parser.consume(TokenKind::LeftBrace, "Expect '{' before class body.");
        while !self.parser.check(TokenKind::RightBrace) && !self.parser.check(TokenKind::Eof) {
            self.method();
        }
        self.parser.consume(TokenKind::RightBrace, "Expect '}' after class body.");
        self.emit_op(Op::Pop); // the class itself, pushed back by named_variable above

        let class = self.classes.pop().unwrap();
        if class.has_superclass {
            self.end_scope();
        }
    }

    fn method(&mut self) {
        self.parser.consume(TokenKind::Identifier, "Expect method name.");
        let name = self.parser.previous.lexeme;
        let constant = self.identifier_constant(name);
        let kind = if name == "init" {
            FunctionKind::Initializer
        } else {
            FunctionKind::Method
        };
        self.function(kind);
        self.emit_op_byte(Op::Method, constant);
    }

    /// Compiles a function body (used for both `fun` declarations and
    /// methods) into its own frame, then emits the `OP_CLOSURE` that
    /// wraps it and the upvalue-capture bytes that follow it in the
    /// enclosing function.
    fn function(&mut self, kind: FunctionKind) {
        let name_str = self.parser.previous.lexeme;
        self.collect_if_needed(None);
        let name_ref = self.heap.intern_string(name_str);
        self.frames.push(FunctionFrame::new(Some(name_ref), kind));
        // Never matched with an `end_scope` — the whole frame is about to
        // be torn down by `end_current_function` anyway.
        self.begin_scope();

        self.parser.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.parser.check(TokenKind::RightParen) {
            let mut arity: u32 = 0;
            loop {
                arity += 1;
                if arity > 255 {
                    self.parser.error_at_current("Can't have more than 255 parameters.");
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.parser.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.current_frame_mut().function.arity = arity.min(255) as u8;
        }
        self.parser.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.parser.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let (mut function, upvalues) = self.end_current_function();
        function.upvalue_count = upvalues.len();
        self.collect_if_needed(Some(&function));
        let function_ref = self.heap.alloc_function(function);
        let constant = self.make_constant(Value::Obj(ObjRef::Function(function_ref)));
        self.emit_op_byte(Op::Closure, constant);
        for upvalue in upvalues {
            self.emit_byte(upvalue.is_local as u8);
            self.emit_byte(upvalue.index);
        }
    }

    fn statement(&mut self) {
        if self.parser.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.parser.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.parser.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.parser.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.parser.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.parser.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    pub(crate) fn block(&mut self) {
        while !self.parser.check(TokenKind::RightBrace) && !self.parser.check(TokenKind::Eof) {
            self.declaration();
        }
        self.parser.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.parser.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(Op::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.parser.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(Op::Pop);
    }

    fn if_statement(&mut self) {
        self.parser.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.parser.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(Op::JumpIfFalse);
        self.emit_op(Op::Pop);
        self.statement();

        let else_jump = self.emit_jump(Op::Jump);
        self.patch_jump(then_jump);
        self.emit_op(Op::Pop);

        if self.parser.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_chunk_len();
        self.parser.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.parser.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(Op::JumpIfFalse);
        self.emit_op(Op::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(Op::Pop);
    }

    /// Desugars into the equivalent `while` loop: an optional initializer
    /// runs once outside any loop scope, then condition/increment/body
    /// are stitched together with jumps.
    fn for_statement(&mut self) {
        self.begin_scope();
        self.parser.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");

        if self.parser.match_token(TokenKind::Semicolon) {
            // no initializer
        } else if self.parser.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_chunk_len();
        let mut exit_jump = None;
        if !self.parser.match_token(TokenKind::Semicolon) {
            self.expression();
            self.parser.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(Op::JumpIfFalse));
            self.emit_op(Op::Pop);
        }

        if !self.parser.match_token(TokenKind::RightParen) {
            let body_jump = self.emit_jump(Op::Jump);
            let increment_start = self.current_chunk_len();
            self.expression();
            self.emit_op(Op::Pop);
            self.parser.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(Op::Pop);
        }
        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.current_frame().kind == FunctionKind::Script {
            self.parser.error("Can't return from top-level code.");
        }
        if self.parser.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            if self.current_frame().kind == FunctionKind::Initializer {
                self.parser.error("Can't return a value from an initializer.");
            }
            self.expression();
            self.parser.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_op(Op::Return);
        }
    }
}
