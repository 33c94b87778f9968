//! Visket error reporting — structured diagnostics with coloured output.

use std::fmt;

use crate::lexer::token::Position;

/// The phase of compilation where an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parser,
    Codegen,
    Linker,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parser => write!(f, "parse"),
            Phase::Codegen => write!(f, "codegen"),
            Phase::Linker => write!(f, "link"),
        }
    }
}

/// A structured compiler error.
///
/// `Display` renders the diagnostic body in the `<line>:<col> | <message>`
/// format; the phase and hint only appear in [`report`] output.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub phase: Phase,
    pub pos: Option<Position>,
    pub message: String,
    pub hint: Option<String>,
}

impl CompileError {
    pub fn parse(pos: Position, message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Parser,
            pos: Some(pos),
            message: message.into(),
            hint: None,
        }
    }

    pub fn codegen(pos: Position, message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Codegen,
            pos: Some(pos),
            message: message.into(),
            hint: None,
        }
    }

    pub fn linker(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            phase: Phase::Linker,
            pos: None,
            message: message.into(),
            hint,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{} | {}", pos, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// Builder failures are internal invariants, not user errors; they are
/// still surfaced as codegen diagnostics so nothing panics.
impl From<inkwell::builder::BuilderError> for CompileError {
    fn from(err: inkwell::builder::BuilderError) -> Self {
        Self {
            phase: Phase::Codegen,
            pos: None,
            message: format!("internal builder error: {err}"),
            hint: None,
        }
    }
}

/// Diagnostics accumulated by the parser, in source order.
pub type ErrorList = Vec<CompileError>;

/// Print an error to stderr with red colouring (ANSI).
pub fn report(err: &CompileError) {
    eprintln!("\x1b[1;31merror\x1b[0m\x1b[1m[{}]:\x1b[0m {}", err.phase, err);
    if let Some(hint) = &err.hint {
        eprintln!("  \x1b[1;36mhint:\x1b[0m {hint}");
    }
}

/// Build an error, print it red, and exit. CLI boundary only.
pub fn fatal(phase: Phase, message: impl Into<String>) -> ! {
    report(&CompileError {
        phase,
        pos: None,
        message: message.into(),
        hint: None,
    });
    std::process::exit(1);
}

/// Print a status message with a coloured `[visket]` prefix.
pub fn info(message: impl fmt::Display) {
    eprintln!("\x1b[1;34m[visket]\x1b[0m {message}");
}

/// Print a success message in green.
pub fn success(message: impl fmt::Display) {
    eprintln!("\x1b[1;32m[visket]\x1b[0m {message}");
}
