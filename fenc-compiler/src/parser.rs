//! Token stream handling and error reporting, split out from [`crate::compiler::Compiler`]
//! the same way `faxc-par` keeps parsing plumbing (`advance`/`consume`/error
//! recovery) apart from the grammar it drives.

use fenc_lex::{Lexer, Token, TokenKind};
use fenc_util::diagnostic::{Level, Locus};
use fenc_util::{Handler, Span};

pub(crate) struct Parser<'src> {
    lexer: Lexer<'src>,
    pub current: Token<'src>,
    pub previous: Token<'src>,
    pub handler: Handler,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        // A placeholder token for both slots. `previous` is only ever
        // genuinely read after the first `advance()` call has replaced it
        // with a real token — mirrors clox leaving `parser.previous`
        // uninitialized until the first `advance()`.
        let placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 1,
        };
        Self {
            lexer: Lexer::new(source),
            current: placeholder,
            previous: placeholder,
            handler: Handler::new(),
        }
    }

    pub fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.lexer.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    pub fn error_at_current(&mut self, message: impl Into<String>) {
        self.error_at(self.current, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.error_at(self.previous, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: impl Into<String>) {
        let locus = match token.kind {
            TokenKind::Eof => Locus::End,
            // The lexer already packed its own message into the token;
            // nothing useful to quote alongside it.
            TokenKind::Error => Locus::None,
            _ => Locus::Lexeme(token.lexeme.to_string()),
        };
        self.handler
            .report(Level::Error, Span::at_line(token.line), locus, message);
    }

    /// Skip tokens until a likely statement boundary, so one syntax error doesn't cascade into a wall of
    /// spurious followup errors.
    pub fn synchronize(&mut self) {
        self.handler.resynchronize();
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}
