//! Expression parsing: precedence climbing driven by `rules::rule`, plus
//! the individual prefix/infix handlers it dispatches to.

use fengc::{ObjRef, Op, Value};

use crate::compiler::Compiler;
use crate::rules::{rule, Precedence};
use fenc_lex::TokenKind;

impl<'src, 'heap> Compiler<'src, 'heap> {
    pub(crate) fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    pub(crate) fn parse_precedence(&mut self, precedence: Precedence) {
        self.parser.advance();
        let Some(prefix) = rule(self.parser.previous.kind).prefix else {
            self.parser.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= rule(self.parser.current.kind).precedence {
            self.parser.advance();
            let infix = rule(self.parser.previous.kind)
                .infix
                .expect("token reached via the precedence loop always has an infix rule");
            infix(self, can_assign);
        }

        if can_assign && self.parser.match_token(TokenKind::Equal) {
            self.parser.error("Invalid assignment target.");
        }
    }

    pub(crate) fn number(&mut self, _can_assign: bool) {
        let value: f64 = self
            .parser
            .previous
            .lexeme
            .parse()
            .expect("lexer only produces syntactically valid numbers");
        self.emit_constant(Value::Number(value));
    }

    pub(crate) fn string(&mut self, _can_assign: bool) {
        let lexeme = self.parser.previous.lexeme;
        let text = &lexeme[1..lexeme.len() - 1]; // strip the surrounding quotes
        self.collect_if_needed(None);
        let string_ref = self.heap.intern_string(text);
        self.emit_constant(Value::Obj(ObjRef::String(string_ref)));
    }

    pub(crate) fn literal(&mut self, _can_assign: bool) {
        match self.parser.previous.kind {
            TokenKind::False => self.emit_op(Op::False),
            TokenKind::Nil => self.emit_op(Op::Nil),
            TokenKind::True => self.emit_op(Op::True),
            _ => unreachable!("literal() only ever dispatched for false/nil/true"),
        }
    }

    pub(crate) fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.parser.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    pub(crate) fn unary(&mut self, _can_assign: bool) {
        let operator = self.parser.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit_op(Op::Not),
            TokenKind::Minus => self.emit_op(Op::Negate),
            _ => unreachable!("unary() only ever dispatched for !/-"),
        }
    }

    pub(crate) fn binary(&mut self, _can_assign: bool) {
        let operator = self.parser.previous.kind;
        let operator_rule = rule(operator);
        self.parse_precedence(operator_rule.precedence.next());
        match operator {
            TokenKind::BangEqual => {
                self.emit_op(Op::Equal);
                self.emit_op(Op::Not);
            }
            TokenKind::EqualEqual => self.emit_op(Op::Equal),
            TokenKind::Greater => self.emit_op(Op::Greater),
            TokenKind::GreaterEqual => {
                self.emit_op(Op::Less);
                self.emit_op(Op::Not);
            }
            TokenKind::Less => self.emit_op(Op::Less),
            TokenKind::LessEqual => {
                self.emit_op(Op::Greater);
                self.emit_op(Op::Not);
            }
            TokenKind::Plus => self.emit_op(Op::Add),
            TokenKind::Minus => self.emit_op(Op::Subtract),
            TokenKind::Star => self.emit_op(Op::Multiply),
            TokenKind::Slash => self.emit_op(Op::Divide),
            _ => unreachable!("binary() only ever dispatched for a binary operator token"),
        }
    }

    /// Short-circuiting `and`: if the left operand is falsey, leave it on
    /// the stack as the result and skip the right operand entirely.
    pub(crate) fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(Op::JumpIfFalse);
        self.emit_op(Op::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    /// Short-circuiting `or`: if the left operand is truthy, skip the
    /// right operand; otherwise discard it and evaluate the right side.
    pub(crate) fn or_(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(Op::JumpIfFalse);
        let end_jump = self.emit_jump(Op::Jump);
        self.patch_jump(else_jump);
        self.emit_op(Op::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    pub(crate) fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_op_byte(Op::Call, arg_count);
    }

    pub(crate) fn dot(&mut self, can_assign: bool) {
        self.parser.consume(TokenKind::Identifier, "Expect property name after '.'.");
        let name = self.parser.previous.lexeme;
        let constant = self.identifier_constant(name);

        if can_assign && self.parser.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_byte(Op::SetProperty, constant);
        } else if self.parser.match_token(TokenKind::LeftParen) {
            let arg_count = self.argument_list();
            self.emit_op_byte(Op::Invoke, constant);
            self.emit_byte(arg_count);
        } else {
            self.emit_op_byte(Op::GetProperty, constant);
        }
    }

    pub(crate) fn this(&mut self, _can_assign: bool) {
        if self.classes.is_empty() {
            self.parser.error("Can't use 'this' outside of a class.");
            return;
        }
        self.named_variable("this", false);
    }

    pub(crate) fn super_(&mut self, _can_assign: bool) {
        match self.classes.last() {
            None => {
                self.parser.error("Can't use 'super' outside of a class.");
                return;
            }
            Some(class) if !class.has_superclass => {
                self.parser.error("Can't use 'super' in a class with no superclass.");
                return;
            }
            Some(_) => {}
        }

        self.parser.consume(TokenKind::Dot, "Expect '.' after 'super'.");
        self.parser.consume(TokenKind::Identifier, "Expect superclass method name.");
        let name = self.parser.previous.lexeme;
        let constant = self.identifier_constant(name);

        self.named_variable("this", false);
        if self.parser.match_token(TokenKind::LeftParen) {
            let arg_count = self.argument_list();
            self.named_variable("super", false);
            self.emit_op_byte(Op::SuperInvoke, constant);
            self.emit_byte(arg_count);
        } else {
            self.named_variable("super", false);
            self.emit_op_byte(Op::GetSuper, constant);
        }
    }

    pub(crate) fn variable(&mut self, can_assign: bool) {
        let name = self.parser.previous.lexeme;
        self.named_variable(name, can_assign);
    }

    /// Resolves `name` as a local, then an upvalue, then finally a global,
    /// and emits the matching get/set pair — the single place that
    /// implements scoping's "innermost binding wins" rule.
    pub(crate) fn named_variable(&mut self, name: &str, can_assign: bool) {
        let frame_idx = self.frames.len() - 1;
        let (get_op, set_op, slot) = if let Some(slot) = self.resolve_local(frame_idx, name) {
            (Op::GetLocal, Op::SetLocal, slot)
        } else if let Some(slot) = self.resolve_upvalue(frame_idx, name) {
            (Op::GetUpvalue, Op::SetUpvalue, slot)
        } else {
            let constant = self.identifier_constant(name);
            (Op::GetGlobal, Op::SetGlobal, constant)
        };

        if can_assign && self.parser.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_byte(set_op, slot);
        } else {
            self.emit_op_byte(get_op, slot);
        }
    }

    /// Parses a parenthesized, comma-separated argument list, returning
    /// its length (capped at 255 — no call can pass more arguments).
    pub(crate) fn argument_list(&mut self) -> u8 {
        let mut count: u32 = 0;
        if !self.parser.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == 255 {
                    self.parser.error("Can't have more than 255 arguments.");
                }
                count += 1;
                if !self.parser.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.parser.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count.min(255) as u8
    }
}
