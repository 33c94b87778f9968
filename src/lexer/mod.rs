//! Lexer for the Visket language.
//!
//! Token recognition is driven by [`logos`]; this module wraps the raw
//! recognizer with `line:column` bookkeeping and the end-of-input
//! contract the parser relies on: `next_token()` past the last token
//! keeps returning `Eof`, and bytes logos rejects surface as `Illegal`
//! tokens rather than errors.

pub mod token;

use logos::Logos;

use token::{Position, RawToken, Token, TokenKind};

pub struct Lexer<'src> {
    inner: logos::Lexer<'src, RawToken>,
    src: &'src str,
    /// Byte offset up to which `line`/`column` are accurate.
    offset: usize,
    line: u32,
    column: u32,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            inner: RawToken::lexer(src),
            src,
            offset: 0,
            line: 1,
            column: 1,
            done: false,
        }
    }

    /// Produce the next token. Whitespace and `//` comments are skipped.
    pub fn next_token(&mut self) -> Token {
        if self.done {
            return Token::new(TokenKind::Eof, "", self.position_at(self.src.len()));
        }

        match self.inner.next() {
            Some(Ok(RawToken::Tok(kind))) => {
                let span = self.inner.span();
                let pos = self.position_at(span.start);
                Token::new(kind, &self.src[span.start..span.end], pos)
            }
            Some(Err(())) => {
                let span = self.inner.span();
                let pos = self.position_at(span.start);
                Token::new(TokenKind::Illegal, &self.src[span.start..span.end], pos)
            }
            None => {
                self.done = true;
                Token::new(TokenKind::Eof, "", self.position_at(self.src.len()))
            }
        }
    }

    /// Advance the line/column counters to `target` and return the
    /// position there. `target` never moves backwards.
    fn position_at(&mut self, target: usize) -> Position {
        for &b in &self.src.as_bytes()[self.offset..target] {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        Position::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::token::{Position, TokenKind};
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut l = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = l.next_token();
            let kind = tok.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                return out;
            }
        }
    }

    fn literals(src: &str) -> Vec<String> {
        let mut l = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = l.next_token();
            if tok.kind == TokenKind::Eof {
                return out;
            }
            out.push(tok.literal);
        }
    }

    #[test]
    fn punctuation_and_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) { } [ ] , ; : . + - * / % << >> == != < <= > >= = += -= *= /= %= .. !"),
            vec![
                LParen, RParen, LBrace, RBrace, LBracket, RBracket, Comma, Semicolon, Colon,
                Period, Plus, Minus, Asterisk, Slash, Percent, Shl, Shr, Eq, NotEq, Lt, Lte, Gt,
                Gte, Assign, AddAssign, SubAssign, MulAssign, DivAssign, ModAssign, Range, Bang,
                Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("var return func struct if else while for in new foo _bar x1"),
            vec![
                Var, Return, Func, Struct, If, Else, While, For, In, New, Ident, Ident, Ident,
                Eof,
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        use TokenKind::*;
        assert_eq!(kinds("42 3.14 0"), vec![Int, Float, Int, Eof]);
        // A range between integers must not be eaten by the float rule.
        assert_eq!(kinds("0..10"), vec![Int, Range, Int, Eof]);
    }

    #[test]
    fn string_literal_passes_bytes_through() {
        let mut l = Lexer::new(r#""hello \n world""#);
        let tok = l.next_token();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.literal, r#""hello \n world""#);
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(kinds("1 // the rest is gone\n2"), vec![Int, Int, Eof]);
    }

    #[test]
    fn eof_is_idempotent() {
        let mut l = Lexer::new("1");
        assert_eq!(l.next_token().kind, TokenKind::Int);
        for _ in 0..3 {
            assert_eq!(l.next_token().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn illegal_bytes_surface_as_tokens() {
        let mut l = Lexer::new("a @ b");
        assert_eq!(l.next_token().kind, TokenKind::Ident);
        let bad = l.next_token();
        assert_eq!(bad.kind, TokenKind::Illegal);
        assert_eq!(bad.literal, "@");
        assert_eq!(l.next_token().kind, TokenKind::Ident);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let mut l = Lexer::new("var x\n  = 1");
        assert_eq!(l.next_token().pos, Position::new(1, 1));
        assert_eq!(l.next_token().pos, Position::new(1, 5));
        assert_eq!(l.next_token().pos, Position::new(2, 3));
        assert_eq!(l.next_token().pos, Position::new(2, 5));
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(kinds("a+b*c"), kinds("  a +\tb \n\n *  c "));
    }

    #[test]
    fn literals_round_trip() {
        let first = literals("func f ( a : int ) { return a + 2 }");
        let rejoined = first.join(" ");
        assert_eq!(kinds("func f ( a : int ) { return a + 2 }"), kinds(&rejoined));
    }
}
