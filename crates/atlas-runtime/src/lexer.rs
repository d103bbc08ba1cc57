//! Lexical analysis (tokenization)
//!
//! Converts source text into a `Token` stream with accurate `Span`s. The
//! lexer is a hand-rolled single-pass scanner over the source's `char`
//! vector, in the style of the surrounding tree-walk-to-bytecode pipeline's
//! other leaf components: no external tokenizer crate, one pass, and
//! diagnostics collected rather than raised immediately.

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the whole source, returning tokens (always ending in `Eof`)
    /// and any diagnostics collected along the way.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.current += 1;
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.current += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.current),
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.current;

        if self.is_at_end() {
            return self.make(TokenKind::Eof, start);
        }

        let c = self.advance();
        match c {
            '(' => self.make(TokenKind::LeftParen, start),
            ')' => self.make(TokenKind::RightParen, start),
            '{' => self.make(TokenKind::LeftBrace, start),
            '}' => self.make(TokenKind::RightBrace, start),
            '[' => self.make(TokenKind::LeftBracket, start),
            ']' => self.make(TokenKind::RightBracket, start),
            ';' => self.make(TokenKind::Semicolon, start),
            ',' => self.make(TokenKind::Comma, start),
            ':' => self.make(TokenKind::Colon, start),
            '+' => self.make(TokenKind::Plus, start),
            '-' => self.make(TokenKind::Minus, start),
            '*' => self.make(TokenKind::Star, start),
            '/' => self.make(TokenKind::Slash, start),
            '=' => {
                if self.match_char('=') {
                    self.make(TokenKind::EqualEqual, start)
                } else {
                    self.make(TokenKind::Equal, start)
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make(TokenKind::BangEqual, start)
                } else {
                    self.error_token(
                        error_codes::LEX_UNEXPECTED_CHAR,
                        format!("unexpected character '{c}'"),
                        start,
                    )
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.make(TokenKind::LessEqual, start)
                } else {
                    self.make(TokenKind::Less, start)
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make(TokenKind::GreaterEqual, start)
                } else {
                    self.make(TokenKind::Greater, start)
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.make(TokenKind::AmpAmp, start)
                } else {
                    self.error_token(
                        error_codes::LEX_UNEXPECTED_CHAR,
                        "unexpected character '&'; did you mean '&&'?",
                        start,
                    )
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.make(TokenKind::PipePipe, start)
                } else {
                    self.error_token(
                        error_codes::LEX_UNEXPECTED_CHAR,
                        "unexpected character '|'; did you mean '||'?",
                        start,
                    )
                }
            }
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(start),
            other => self.error_token(
                error_codes::LEX_UNEXPECTED_CHAR,
                format!("unexpected character '{other}'"),
                start,
            ),
        }
    }

    fn error_token(&mut self, code: &'static str, message: impl Into<String>, start: usize) -> Token {
        let span = Span::new(start, self.current);
        self.diagnostics.push(Diagnostic::error(code, message, span));
        Token {
            kind: TokenKind::Eof,
            span,
        }
    }

    fn number(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }
        let text: String = self.chars[start..self.current].iter().collect();
        match text.parse::<i64>() {
            Ok(n) => self.make(TokenKind::Int(n), start),
            Err(_) => self.error_token(
                error_codes::LEX_UNEXPECTED_CHAR,
                format!("integer literal '{text}' out of range"),
                start,
            ),
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.current += 1;
        }
        let text: String = self.chars[start..self.current].iter().collect();
        let kind = match text.as_str() {
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "return" => TokenKind::Return,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "int" => TokenKind::IntType,
            "bool" => TokenKind::BoolType,
            _ => TokenKind::Ident(text),
        };
        self.make(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_declaration() {
        assert_eq!(
            kinds("var x:int = 1 + 2;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".into()),
                TokenKind::Colon,
                TokenKind::IntType,
                TokenKind::Equal,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn recognizes_compound_operators() {
        assert_eq!(
            kinds("a == b != c && d || e <= f >= g"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::EqualEqual,
                TokenKind::Ident("b".into()),
                TokenKind::BangEqual,
                TokenKind::Ident("c".into()),
                TokenKind::AmpAmp,
                TokenKind::Ident("d".into()),
                TokenKind::PipePipe,
                TokenKind::Ident("e".into()),
                TokenKind::LessEqual,
                TokenKind::Ident("f".into()),
                TokenKind::GreaterEqual,
                TokenKind::Ident("g".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("1 // a comment\n+ 2"),
            vec![TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_unexpected_character() {
        let (_, diags) = Lexer::new("@").tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, error_codes::LEX_UNEXPECTED_CHAR);
    }
}
