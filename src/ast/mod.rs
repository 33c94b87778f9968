//! Abstract syntax tree for the Visket language.
//!
//! Two closed sorts, [`Expression`] and [`Statement`]; every node owns
//! its children and the tree is read-only after parsing. The `Display`
//! impls produce a structural form (`Infix(Int(4) + Int(4))`) that the
//! parser tests assert on and diagnostics embed.

use std::fmt;

use crate::lexer::token::Position;

/// A named reference, with the position of its token.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub pos: Position,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({})", self.name)
    }
}

/// Infix operators, in source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Shl => "<<",
            Operator::Shr => ">>",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// Unary `-`.
    Neg,
    /// Unary `!`.
    Not,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOperator::Neg => "-",
            PrefixOperator::Not => "!",
        })
    }
}

/// A type literal: `int`, `float`, `string`, a struct name, or a
/// fixed-length array `[N]T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub name: String,
    pub pos: Position,
    pub is_array: bool,
    pub len: u64,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "[{}]{}", self.len, self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Integer {
        value: i64,
    },
    Float {
        value: f64,
    },
    /// String bytes as they appeared between the quotes.
    Str {
        value: String,
    },
    Ident(Identifier),
    Prefix {
        op: PrefixOperator,
        right: Box<Expression>,
        op_pos: Position,
    },
    Infix {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
        op_pos: Position,
    },
    /// `left = value`. Compound assignments desugar into this with an
    /// `Infix` value re-using the target, so `left` must be a pure path
    /// expression (identifier, index, member) — the parser enforces it.
    Assign {
        left: Box<Expression>,
        value: Box<Expression>,
        op_pos: Position,
    },
    Call {
        function: Identifier,
        args: Vec<Expression>,
        lparen: Position,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        lbrack: Position,
    },
    Member {
        left: Box<Expression>,
        member: Identifier,
        period: Position,
    },
    New {
        ty: Type,
        pos: Position,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer { value } => write!(f, "Int({value})"),
            Expression::Float { value } => write!(f, "Float({value})"),
            Expression::Str { value } => write!(f, "Str(\"{value}\")"),
            Expression::Ident(ident) => ident.fmt(f),
            Expression::Prefix { op, right, .. } => write!(f, "Prefix({op} {right})"),
            Expression::Infix {
                left, op, right, ..
            } => write!(f, "Infix({left} {op} {right})"),
            Expression::Assign { left, value, .. } => write!(f, "{left} = {value}"),
            Expression::Call { function, args, .. } => {
                write!(f, "Call({function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str("))")
            }
            Expression::Index { left, index, .. } => write!(f, "Index({left}[{index}])"),
            Expression::Member { left, member, .. } => write!(f, "Member({left}.{member})"),
            Expression::New { ty, .. } => write!(f, "New({ty})"),
        }
    }
}

impl Expression {
    /// True for expressions that name a storage location.
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            Expression::Ident(_) | Expression::Index { .. } | Expression::Member { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStatement {
    pub ident: Identifier,
    pub ty: Option<Type>,
    pub value: Option<Expression>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ident: Identifier,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub ident: Identifier,
    pub params: Vec<Param>,
    /// `None` means void.
    pub ret: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStatement {
    pub sig: FunctionSignature,
    pub body: BlockStatement,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDecl {
    pub ident: Identifier,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructStatement {
    pub ident: Identifier,
    /// Declaration order fixes the member indices.
    pub members: Vec<MemberDecl>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: BlockStatement,
    pub pos: Position,
}

/// Three-part `for`; the range form desugars into this at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expression>,
    pub post: Option<Box<Statement>>,
    pub body: BlockStatement,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Var(VarStatement),
    Return(ReturnStatement),
    Function(FunctionStatement),
    Struct(StructStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

// ── structural display ──────────────────────────────────────────────

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Var(s) => {
                write!(f, "var {}", s.ident)?;
                if let Some(ty) = &s.ty {
                    write!(f, ": {ty}")?;
                }
                if let Some(value) = &s.value {
                    write!(f, " = {value}")?;
                }
                Ok(())
            }
            Statement::Return(s) => match &s.value {
                Some(value) => write!(f, "return {value}"),
                None => f.write_str("return"),
            },
            Statement::Function(s) => {
                write!(f, "func {}(", s.sig.ident)?;
                for (i, p) in s.sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}: {}", p.ident, p.ty)?;
                }
                f.write_str(")")?;
                if let Some(ret) = &s.sig.ret {
                    write!(f, ": {ret}")?;
                }
                write!(f, " {}", s.body)
            }
            Statement::Struct(s) => {
                write!(f, "struct {} {{", s.ident)?;
                for (i, m) in s.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{} {}", m.ident, m.ty)?;
                }
                f.write_str("}")
            }
            Statement::If(s) => {
                write!(f, "if {} {}", s.condition, s.consequence)?;
                if let Some(alt) = &s.alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Statement::While(s) => write!(f, "while {} {}", s.condition, s.body),
            Statement::For(s) => {
                f.write_str("for ")?;
                if let Some(init) = &s.init {
                    write!(f, "{init}")?;
                }
                f.write_str("; ")?;
                if let Some(cond) = &s.condition {
                    write!(f, "{cond}")?;
                }
                f.write_str("; ")?;
                if let Some(post) = &s.post {
                    write!(f, "{post}")?;
                }
                write!(f, " {}", s.body)
            }
            Statement::Expression(e) => e.fmt(f),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for stmt in &self.statements {
            stmt.fmt(f)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            stmt.fmt(f)?;
        }
        Ok(())
    }
}
