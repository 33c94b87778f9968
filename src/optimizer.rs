//! AST constant folding, behind the `-O` flag.
//!
//! AST in, AST out: literal integer arithmetic and comparisons collapse
//! into literals; everything else is left untouched. Folding sticks to
//! operations whose result is exact at the source type's width, so an
//! optimized program behaves like the unoptimized one — overflowing
//! additions, divisions by zero and out-of-range shifts are left for
//! runtime. Float expressions are not folded: literals are `f64` here
//! but `float` at runtime, and folding at the wider width could change
//! the rounding.

use crate::ast::{Expression, Operator, PrefixOperator, Program, Statement};

pub fn optimize(program: &mut Program) {
    for stmt in &mut program.statements {
        fold_statement(stmt);
    }
}

fn fold_statement(stmt: &mut Statement) {
    match stmt {
        Statement::Var(s) => {
            if let Some(value) = &mut s.value {
                fold_expression(value);
            }
        }
        Statement::Return(s) => {
            if let Some(value) = &mut s.value {
                fold_expression(value);
            }
        }
        Statement::Function(s) => {
            for stmt in &mut s.body.statements {
                fold_statement(stmt);
            }
        }
        Statement::Struct(_) => {}
        Statement::If(s) => {
            fold_expression(&mut s.condition);
            for stmt in &mut s.consequence.statements {
                fold_statement(stmt);
            }
            if let Some(alt) = &mut s.alternative {
                for stmt in &mut alt.statements {
                    fold_statement(stmt);
                }
            }
        }
        Statement::While(s) => {
            fold_expression(&mut s.condition);
            for stmt in &mut s.body.statements {
                fold_statement(stmt);
            }
        }
        Statement::For(s) => {
            if let Some(init) = &mut s.init {
                fold_statement(init);
            }
            if let Some(cond) = &mut s.condition {
                fold_expression(cond);
            }
            if let Some(post) = &mut s.post {
                fold_statement(post);
            }
            for stmt in &mut s.body.statements {
                fold_statement(stmt);
            }
        }
        Statement::Expression(e) => fold_expression(e),
    }
}

fn fold_expression(expr: &mut Expression) {
    match expr {
        Expression::Infix {
            left, op, right, ..
        } => {
            fold_expression(left);
            fold_expression(right);
            if let (Expression::Integer { value: a }, Expression::Integer { value: b }) =
                (left.as_ref(), right.as_ref())
            {
                if let Some(value) = eval_int(*op, *a, *b) {
                    *expr = Expression::Integer { value };
                }
            }
        }
        Expression::Prefix { op, right, .. } => {
            fold_expression(right);
            match (*op, right.as_ref()) {
                (PrefixOperator::Neg, Expression::Integer { value }) => {
                    if let Some(value) = value.checked_neg() {
                        *expr = Expression::Integer { value };
                    }
                }
                (PrefixOperator::Neg, Expression::Float { value }) => {
                    *expr = Expression::Float { value: -value };
                }
                _ => {}
            }
        }
        // The target of an assignment is a path, never foldable.
        Expression::Assign { value, .. } => fold_expression(value),
        Expression::Call { args, .. } => {
            for arg in args {
                fold_expression(arg);
            }
        }
        Expression::Index { left, index, .. } => {
            fold_expression(left);
            fold_expression(index);
        }
        Expression::Member { left, .. } => fold_expression(left),
        Expression::Integer { .. }
        | Expression::Float { .. }
        | Expression::Str { .. }
        | Expression::Ident(_)
        | Expression::New { .. } => {}
    }
}

/// Evaluate an integer operation at the source type's 32-bit width.
/// `None` when the result would overflow, trap, or shift out of range.
fn eval_int(op: Operator, a: i64, b: i64) -> Option<i64> {
    let a = i32::try_from(a).ok()?;
    let b = i32::try_from(b).ok()?;

    let folded = match op {
        Operator::Add => a.checked_add(b)?,
        Operator::Sub => a.checked_sub(b)?,
        Operator::Mul => a.checked_mul(b)?,
        Operator::Div => a.checked_div(b)?,
        Operator::Mod => a.checked_rem(b)?,
        Operator::Shl => {
            if !(0..32).contains(&b) {
                return None;
            }
            a.checked_shl(b as u32)?
        }
        Operator::Shr => {
            if !(0..32).contains(&b) {
                return None;
            }
            a >> b
        }
        Operator::Eq => (a == b) as i32,
        Operator::NotEq => (a != b) as i32,
        Operator::Lt => (a < b) as i32,
        Operator::Lte => (a <= b) as i32,
        Operator::Gt => (a > b) as i32,
        Operator::Gte => (a >= b) as i32,
    };

    Some(i64::from(folded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn optimized(src: &str) -> String {
        let mut parser = Parser::new(Lexer::new(src));
        let mut program = parser.parse_program();
        assert!(parser.errors.is_empty(), "{:?}", parser.errors);
        optimize(&mut program);
        program.to_string()
    }

    #[test]
    fn folds_literal_arithmetic() {
        assert_eq!(
            optimized("func f(): int { return 1 + 2 * 3 }"),
            "func Ident(f)(): int {return Int(7)}",
        );
        assert_eq!(
            optimized("func f(): int { return -(2 + 3) }"),
            "func Ident(f)(): int {return Int(-5)}",
        );
        assert_eq!(
            optimized("func f(): int { return 1 << 4 }"),
            "func Ident(f)(): int {return Int(16)}",
        );
    }

    #[test]
    fn folds_comparisons_to_zero_or_one() {
        assert_eq!(
            optimized("func f(): int { if 1 < 2 { return 1 } return 0 }"),
            "func Ident(f)(): int {if Int(1) {return Int(1)}return Int(0)}",
        );
    }

    #[test]
    fn leaves_non_literal_subtrees_alone() {
        assert_eq!(
            optimized("func f(a: int): int { return a + 2 * 3 }"),
            "func Ident(f)(Ident(a): int): int {return Infix(Ident(a) + Int(6))}",
        );
    }

    #[test]
    fn does_not_fold_traps_or_overflow() {
        assert_eq!(
            optimized("func f(): int { return 1 / 0 }"),
            "func Ident(f)(): int {return Infix(Int(1) / Int(0))}",
        );
        assert_eq!(
            optimized("func f(): int { return 2147483647 + 1 }"),
            "func Ident(f)(): int {return Infix(Int(2147483647) + Int(1))}",
        );
    }

    #[test]
    fn folds_inside_loops_and_calls() {
        assert_eq!(
            optimized("func f() { for i in 0..2 + 3 { g(1 + 1) } }"),
            optimized("func f() { for i in 0..5 { g(2) } }"),
        );
    }
}
