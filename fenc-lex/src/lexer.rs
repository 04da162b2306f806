//! The scanner: turns a source buffer into a stream of [`Token`]s.
//!
//! Single-pass, no backtracking beyond one character of lookahead — the
//! same shape as `faxc_lex::lexer::core::Lexer`, trimmed to this
//! language's much smaller token set.

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    token_start: usize,
    token_start_line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_start_line: 1,
        }
    }

    fn make(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            lexeme: self.cursor.slice_from(self.token_start),
            line: self.token_start_line,
        }
    }

    fn error(&self, message: &'static str) -> Token<'a> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            line: self.token_start_line,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.cursor.advance();
                }
                '/' if self.cursor.peek_char(1) == '/' => {
                    while self.cursor.current_char() != '\n' && !self.cursor.is_at_end() {
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace_and_comments();
        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();

        if self.cursor.is_at_end() {
            return self.make(TokenKind::Eof);
        }

        let c = self.cursor.advance();
        if is_ascii_ident_start(c) {
            return self.lex_identifier();
        }
        if c.is_ascii_digit() {
            return self.lex_number();
        }

        match c {
            '(' => self.make(TokenKind::LeftParen),
            ')' => self.make(TokenKind::RightParen),
            '{' => self.make(TokenKind::LeftBrace),
            '}' => self.make(TokenKind::RightBrace),
            ';' => self.make(TokenKind::Semicolon),
            ',' => self.make(TokenKind::Comma),
            '.' => self.make(TokenKind::Dot),
            '-' => self.make(TokenKind::Minus),
            '+' => self.make(TokenKind::Plus),
            '/' => self.make(TokenKind::Slash),
            '*' => self.make(TokenKind::Star),
            '!' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make(kind)
            }
            '=' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make(kind)
            }
            '<' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make(kind)
            }
            '>' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make(kind)
            }
            '"' => self.lex_string(),
            _ => self.error("Unexpected character."),
        }
    }

    fn lex_string(&mut self) -> Token<'a> {
        while self.cursor.current_char() != '"' && !self.cursor.is_at_end() {
            self.cursor.advance();
        }
        if self.cursor.is_at_end() {
            return self.error("Unterminated string.");
        }
        self.cursor.advance(); // closing quote
        self.make(TokenKind::String)
    }

    fn lex_number(&mut self) -> Token<'a> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance(); // the '.'
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        self.make(TokenKind::Number)
    }

    fn lex_identifier(&mut self) -> Token<'a> {
        while is_ascii_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(self.token_start);
        self.make(keyword_from_ident(text).unwrap_or(TokenKind::Identifier))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    /// Yields tokens up to and including `Eof`, then stops — callers that
    /// want a `Vec<Token>` can `collect()` directly.
    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

fn is_ascii_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ascii_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Reserved words. A plain string match rather
/// than clox's hand-rolled character trie, the same approach
/// `faxc_lex::token::keyword_from_ident` takes.
fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn scans_punctuation_and_operators() {
        assert_eq!(
            kinds("(){};,+-*/== <= >= != < >"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::BangEqual,
                TokenKind::Less,
                TokenKind::Greater,
            ]
        );
    }

    #[test]
    fn single_equal_and_bang_are_distinct_from_their_double_forms() {
        assert_eq!(kinds("= !"), vec![TokenKind::Equal, TokenKind::Bang]);
    }

    #[test]
    fn recognizes_every_keyword() {
        let source = "and class else false for fun if nil or print return super this true var while";
        let expected = vec![
            TokenKind::And,
            TokenKind::Class,
            TokenKind::Else,
            TokenKind::False,
            TokenKind::For,
            TokenKind::Fun,
            TokenKind::If,
            TokenKind::Nil,
            TokenKind::Or,
            TokenKind::Print,
            TokenKind::Return,
            TokenKind::Super,
            TokenKind::This,
            TokenKind::True,
            TokenKind::Var,
            TokenKind::While,
        ];
        assert_eq!(kinds(source), expected);
    }

    #[test]
    fn identifier_that_shares_a_keyword_prefix_is_not_misread() {
        assert_eq!(kinds("forest"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("printer"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn number_literals_support_an_optional_fractional_part() {
        let mut lexer = Lexer::new("123 4.5 6.");
        let a = lexer.next_token();
        assert_eq!(a.kind, TokenKind::Number);
        assert_eq!(a.lexeme, "123");
        let b = lexer.next_token();
        assert_eq!(b.lexeme, "4.5");
        let c = lexer.next_token();
        // trailing '.' with no digit after it is not part of the number
        assert_eq!(c.lexeme, "6");
        assert_eq!(lexer.next_token().kind, TokenKind::Dot);
    }

    #[test]
    fn unterminated_string_produces_an_error_token() {
        let mut lexer = Lexer::new("\"abc");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.lexeme, "Unterminated string.");
    }

    #[test]
    fn string_literal_includes_the_quotes_in_its_lexeme() {
        let mut lexer = Lexer::new("\"hi\"");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, "\"hi\"");
    }

    #[test]
    fn line_comment_is_skipped_entirely() {
        assert_eq!(kinds("// comment\n1"), vec![TokenKind::Number]);
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let mut lexer = Lexer::new("1\n2\n3");
        assert_eq!(lexer.next_token().line, 1);
        assert_eq!(lexer.next_token().line, 2);
        assert_eq!(lexer.next_token().line, 3);
    }

    #[test]
    fn unexpected_character_produces_an_error_token() {
        let mut lexer = Lexer::new("@");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Error);
    }
}
