//! Lexical analyzer for SHDL source text.
//!
//! Converts source text into a sequence of [`Token`]s, handling identifiers,
//! decimal/`0x`/`0b` integer literals, `#`-line comments, `"…"` single-line
//! comments, `"""…"""` multi-line block comments (non-nesting), and SHDL's
//! small punctuation set. Errors are reported to the [`DiagnosticSink`] and
//! produce [`TokenKind::Error`] tokens.

use crate::token::{lookup_keyword, Token, TokenKind};
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_source::{FileId, Span};

/// Lexes the given SHDL source text into a vector of tokens.
///
/// Whitespace and comments are skipped. The returned vector always ends with
/// a [`TokenKind::Eof`] token. Lexer errors are reported via the diagnostic
/// sink and produce [`TokenKind::Error`] tokens in the output.
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.source.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.file, self.pos as u32, self.pos as u32),
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        if self.pos < self.source.len() {
            self.source[self.pos]
        } else {
            0
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        let idx = self.pos + offset;
        if idx < self.source.len() {
            self.source[idx]
        } else {
            0
        }
    }

    fn advance(&mut self) -> u8 {
        let b = self.source[self.pos];
        self.pos += 1;
        b
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, number: u8, msg: impl Into<String>, span: Span) {
        self.sink
            .emit(Diagnostic::error(DiagnosticCode::error(Stage::Lex, number), msg, span));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.source.len() {
                return;
            }
            // Line comment: # to end of line.
            if self.peek() == b'#' {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            // Multi-line block comment: """ ... """ (non-nesting).
            if self.peek() == b'"' && self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
                let start = self.pos;
                self.pos += 3;
                loop {
                    if self.pos >= self.source.len() {
                        self.error(
                            2,
                            "unterminated multi-line comment",
                            self.span_from(start),
                        );
                        break;
                    }
                    if self.peek() == b'"' && self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
                        self.pos += 3;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            // Single-line comment: "..." up to end of line.
            if self.peek() == b'"' {
                let start = self.pos;
                self.pos += 1;
                let mut terminated = false;
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    if self.source[self.pos] == b'"' {
                        self.pos += 1;
                        terminated = true;
                        break;
                    }
                    self.pos += 1;
                }
                if !terminated {
                    self.error(2, "unterminated comment", self.span_from(start));
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if is_ident_start(b) {
            return self.lex_identifier_or_keyword(start);
        }
        if b.is_ascii_digit() {
            return self.lex_number(start);
        }

        self.lex_operator(start)
    }

    fn lex_identifier_or_keyword(&mut self, start: usize) -> Token {
        while self.pos < self.source.len() && is_ident_char(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Ident);
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.pos += 2;
            let digits_start = self.pos;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
            if self.pos == digits_start {
                self.error(3, "'0x' with no hex digits", self.span_from(start));
                return Token {
                    kind: TokenKind::Error,
                    span: self.span_from(start),
                };
            }
            return Token {
                kind: TokenKind::Int,
                span: self.span_from(start),
            };
        }
        if self.peek() == b'0' && matches!(self.peek_at(1), b'b' | b'B') {
            self.pos += 2;
            let digits_start = self.pos;
            while self.pos < self.source.len() && matches!(self.source[self.pos], b'0' | b'1') {
                self.pos += 1;
            }
            if self.pos == digits_start {
                self.error(3, "'0b' with no binary digits", self.span_from(start));
                return Token {
                    kind: TokenKind::Error,
                    span: self.span_from(start),
                };
            }
            return Token {
                kind: TokenKind::Int,
                span: self.span_from(start),
            };
        }
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        Token {
            kind: TokenKind::Int,
            span: self.span_from(start),
        }
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        let b = self.advance();
        let kind = match b {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'=' => TokenKind::Equals,
            b':' => {
                if self.peek() == b':' {
                    self.pos += 1;
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            b'-' => {
                if self.peek() == b'>' {
                    self.pos += 1;
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            b'>' => TokenKind::GreaterThan,
            _ => {
                self.error(
                    1,
                    format!("unexpected character '{}'", b as char),
                    self.span_from(start),
                );
                TokenKind::Error
            }
        };
        Token {
            kind,
            span: self.span_from(start),
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_source::FileId;

    fn lex_ok(source: &str) -> Vec<TokenKind> {
        let sink = DiagnosticSink::new();
        let tokens = lex(source, FileId::from_raw(0), &sink);
        assert!(!sink.has_errors(), "unexpected lex errors: {:?}", sink.diagnostics());
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex_ok(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            lex_ok("component HalfAdder use connect"),
            vec![
                TokenKind::Component,
                TokenKind::Ident,
                TokenKind::Use,
                TokenKind::Connect,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn decimal_hex_binary_literals() {
        assert_eq!(
            lex_ok("42 0xFF 0b1010"),
            vec![TokenKind::Int, TokenKind::Int, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            lex_ok("( ) { } [ ] , ; : . -> :: > ="),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::Arrow,
                TokenKind::DoubleColon,
                TokenKind::GreaterThan,
                TokenKind::Equals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_stripped() {
        assert_eq!(
            lex_ok("# this is a comment\ncomponent"),
            vec![TokenKind::Component, TokenKind::Eof]
        );
    }

    #[test]
    fn single_line_block_comment_stripped() {
        assert_eq!(
            lex_ok("\"a note\" component"),
            vec![TokenKind::Component, TokenKind::Eof]
        );
    }

    #[test]
    fn multiline_block_comment_stripped() {
        assert_eq!(
            lex_ok("\"\"\"\nmulti\nline\n\"\"\" component"),
            vec![TokenKind::Component, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_multiline_comment_errors() {
        let sink = DiagnosticSink::new();
        lex("\"\"\"\nnever closed", FileId::from_raw(0), &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn bad_hex_literal_errors() {
        let sink = DiagnosticSink::new();
        lex("0x", FileId::from_raw(0), &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn bad_binary_literal_errors() {
        let sink = DiagnosticSink::new();
        lex("0b", FileId::from_raw(0), &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn reserved_double_underscore_is_plain_ident() {
        assert_eq!(lex_ok("__VCC__"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn unexpected_character_errors() {
        let sink = DiagnosticSink::new();
        let tokens = lex("@", FileId::from_raw(0), &sink);
        assert!(sink.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Error);
    }
}
