use std::fmt;

use logos::Logos;

/// A `line:column` pair, both 1-based.
///
/// Column counts bytes from the start of the line, which matches the
/// source as long as it stays ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The raw recognizer. Whitespace and `//` line comments are skipped
/// and never surface; every pattern resolves directly to the public
/// [`TokenKind`] it stands for. Multi-character operators win over
/// their prefixes by longest match (`<=` before `<`, `..` before `.`),
/// and identifiers are checked against the keyword patterns the same
/// way.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub(crate) enum RawToken {
    // ── keywords ────────────────────────────────────────────────
    #[token("var", |_| TokenKind::Var)]
    #[token("return", |_| TokenKind::Return)]
    #[token("func", |_| TokenKind::Func)]
    #[token("struct", |_| TokenKind::Struct)]
    #[token("if", |_| TokenKind::If)]
    #[token("else", |_| TokenKind::Else)]
    #[token("while", |_| TokenKind::While)]
    #[token("for", |_| TokenKind::For)]
    #[token("in", |_| TokenKind::In)]
    #[token("new", |_| TokenKind::New)]
    // ── punctuation ─────────────────────────────────────────────
    #[token("(", |_| TokenKind::LParen)]
    #[token(")", |_| TokenKind::RParen)]
    #[token("{", |_| TokenKind::LBrace)]
    #[token("}", |_| TokenKind::RBrace)]
    #[token("[", |_| TokenKind::LBracket)]
    #[token("]", |_| TokenKind::RBracket)]
    #[token(",", |_| TokenKind::Comma)]
    #[token(";", |_| TokenKind::Semicolon)]
    #[token(":", |_| TokenKind::Colon)]
    #[token(".", |_| TokenKind::Period)]
    // ── operators ───────────────────────────────────────────────
    #[token("+", |_| TokenKind::Plus)]
    #[token("-", |_| TokenKind::Minus)]
    #[token("*", |_| TokenKind::Asterisk)]
    #[token("/", |_| TokenKind::Slash)]
    #[token("%", |_| TokenKind::Percent)]
    #[token("<<", |_| TokenKind::Shl)]
    #[token(">>", |_| TokenKind::Shr)]
    #[token("==", |_| TokenKind::Eq)]
    #[token("!=", |_| TokenKind::NotEq)]
    #[token("!", |_| TokenKind::Bang)]
    #[token("<", |_| TokenKind::Lt)]
    #[token("<=", |_| TokenKind::Lte)]
    #[token(">", |_| TokenKind::Gt)]
    #[token(">=", |_| TokenKind::Gte)]
    #[token("=", |_| TokenKind::Assign)]
    #[token("+=", |_| TokenKind::AddAssign)]
    #[token("-=", |_| TokenKind::SubAssign)]
    #[token("*=", |_| TokenKind::MulAssign)]
    #[token("/=", |_| TokenKind::DivAssign)]
    #[token("%=", |_| TokenKind::ModAssign)]
    #[token("..", |_| TokenKind::Range)]
    // ── literals ────────────────────────────────────────────────
    // Floats require a digit after the dot so `0..10` lexes as
    // `INT RANGE INT`.
    #[regex(r"[0-9]+\.[0-9]+", |_| TokenKind::Float)]
    #[regex(r"[0-9]+", |_| TokenKind::Int)]
    // String bytes pass through unmodified; `\"` does not terminate
    // the literal but no escape decoding happens either.
    #[regex(r#""([^"\\]|\\.)*""#, |_| TokenKind::String)]
    #[regex(r"[A-Za-z_][A-Za-z_0-9]*", |_| TokenKind::Ident)]
    Tok(TokenKind),
}

/// The closed set of token kinds the parser sees.
///
/// `Eof` and `Illegal` are synthesized by the lexer wrapper: the
/// recognizer itself never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // keywords
    Var,
    Return,
    Func,
    Struct,
    If,
    Else,
    While,
    For,
    In,
    New,
    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Period,
    // operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Shl,
    Shr,
    Eq,
    NotEq,
    Bang,
    Lt,
    Lte,
    Gt,
    Gte,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    Range,
    // literal categories
    Float,
    Int,
    String,
    Ident,
    // synthetic
    Eof,
    Illegal,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Var => "var",
            TokenKind::Return => "return",
            TokenKind::Func => "func",
            TokenKind::Struct => "struct",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::New => "new",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Period => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Bang => "!",
            TokenKind::Lt => "<",
            TokenKind::Lte => "<=",
            TokenKind::Gt => ">",
            TokenKind::Gte => ">=",
            TokenKind::Assign => "=",
            TokenKind::AddAssign => "+=",
            TokenKind::SubAssign => "-=",
            TokenKind::MulAssign => "*=",
            TokenKind::DivAssign => "/=",
            TokenKind::ModAssign => "%=",
            TokenKind::Range => "..",
            TokenKind::Float => "FLOAT",
            TokenKind::Int => "INT",
            TokenKind::String => "STRING",
            TokenKind::Ident => "IDENT",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
        };
        f.write_str(s)
    }
}

/// A single token together with the source text it matched and the
/// position of its first byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            pos,
        }
    }
}
