//! Statement lowering.

use crate::ast::{
    BlockStatement, Expression, ForStatement, FunctionStatement, IfStatement, ReturnStatement,
    Statement, VarStatement, WhileStatement,
};
use crate::errors::CompileError;

use super::value::Value;
use super::CodeGen;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    pub(crate) fn gen_statement(&mut self, stmt: &Statement) -> Result<(), CompileError> {
        match stmt {
            Statement::Var(s) => self.gen_var_statement(s),
            Statement::Return(s) => self.gen_return_statement(s),
            Statement::Function(s) => self.gen_function_statement(s),
            // Structs are registered by the pre-pass; no IR beyond the
            // named type.
            Statement::Struct(_) => Ok(()),
            Statement::If(s) => self.gen_if_statement(s),
            Statement::While(s) => self.gen_while_statement(s),
            Statement::For(s) => self.gen_for_statement(s),
            Statement::Expression(e) => self.gen_expression_statement(e),
        }
    }

    /// Allocate a slot in the current block, store the initializer if
    /// present, and bind the name in the innermost scope.
    fn gen_var_statement(&mut self, s: &VarStatement) -> Result<(), CompileError> {
        let name = &s.ident.name;

        let (ty, init) = match (&s.ty, &s.value) {
            (Some(t), Some(v)) => {
                let ty = self.llvm_type(t)?;
                let val = self.gen_expression(v)?.load(self.builder)?;
                let val = self.widen_bool(val)?;
                if val.get_type() != ty {
                    return Err(CompileError::codegen(
                        s.ident.pos,
                        format!(
                            "type mismatch '{}' and '{}'",
                            Self::type_name(ty),
                            Self::type_name(val.get_type()),
                        ),
                    ));
                }
                (ty, Some(val))
            }
            (Some(t), None) => (self.llvm_type(t)?, None),
            (None, Some(v)) => {
                let val = self.gen_expression(v)?.load(self.builder)?;
                let val = self.widen_bool(val)?;
                (val.get_type(), Some(val))
            }
            (None, None) => {
                return Err(CompileError::codegen(
                    s.ident.pos,
                    format!("cannot determine type of variable '{name}'"),
                ));
            }
        };

        let slot = self.builder.build_alloca(ty, name)?;
        if let Some(val) = init {
            self.builder.build_store(slot, val)?;
        }

        self.declare_variable(name, Value::addressable(slot.into(), ty), s.ident.pos)
    }

    fn gen_return_statement(&mut self, s: &ReturnStatement) -> Result<(), CompileError> {
        match &s.value {
            Some(expr) => {
                let val = self.gen_expression(expr)?.load(self.builder)?;
                let val = self.widen_bool(val)?;
                match self.current_ret() {
                    Some(ret_ty) if val.get_type() == ret_ty => {
                        self.builder.build_return(Some(&val))?;
                        Ok(())
                    }
                    Some(ret_ty) => Err(CompileError::codegen(
                        s.pos,
                        format!(
                            "type mismatch '{}' and '{}'",
                            Self::type_name(ret_ty),
                            Self::type_name(val.get_type()),
                        ),
                    )),
                    None => Err(CompileError::codegen(
                        s.pos,
                        "unexpected return value in void function",
                    )),
                }
            }
            None => match self.current_ret() {
                None => {
                    self.builder.build_return(None)?;
                    Ok(())
                }
                Some(ret_ty) => Err(CompileError::codegen(
                    s.pos,
                    format!("missing return value of type '{}'", Self::type_name(ret_ty)),
                )),
            },
        }
    }

    /// Emit a function body. Top-level signatures were declared by the
    /// pre-pass; a nested `func` is declared here, when encountered.
    /// Parameters spill into slots so every identifier load goes
    /// through one code path.
    fn gen_function_statement(&mut self, f: &FunctionStatement) -> Result<(), CompileError> {
        let name = &f.sig.ident.name;

        if self.find_function(name).is_none() {
            self.declare_function(f)?;
        }
        let info = self.mark_function_body(name, f.sig.ident.pos)?;

        let saved_block = self.builder.get_insert_block();
        let saved_ret = self.current_ret();

        let entry = self.context.append_basic_block(info.value, "entry");
        self.builder.position_at_end(entry);
        self.set_current_ret(info.ret);
        self.push_scope();

        for (i, param) in f.sig.params.iter().enumerate() {
            let ty = info.params[i];
            let slot = self.builder.build_alloca(ty, &param.ident.name)?;
            let arg = info
                .value
                .get_nth_param(i as u32)
                .expect("parameter count fixed by the signature");
            self.builder.build_store(slot, arg)?;
            self.declare_variable(
                &param.ident.name,
                Value::addressable(slot.into(), ty),
                param.ident.pos,
            )?;
        }

        for stmt in &f.body.statements {
            if self.block_terminated() {
                break;
            }
            self.gen_statement(stmt)?;
        }

        // Every block must end in a terminator. A void function falls
        // off the end with `ret void`; a value-returning one can only
        // get here through a dead merge block.
        if !self.block_terminated() {
            match info.ret {
                None => {
                    self.builder.build_return(None)?;
                }
                Some(_) => {
                    self.builder.build_unreachable()?;
                }
            }
        }

        self.pop_scope();
        self.set_current_ret(saved_ret);
        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }

        Ok(())
    }

    fn gen_if_statement(&mut self, s: &IfStatement) -> Result<(), CompileError> {
        let cond = self.gen_expression(&s.condition)?.load(self.builder)?;
        let cond = self.to_condition(cond, s.pos)?;

        let function = self.current_function();
        let then_block = self.context.append_basic_block(function, "if.then");
        let else_block = s
            .alternative
            .as_ref()
            .map(|_| self.context.append_basic_block(function, "if.else"));
        let merge_block = self.context.append_basic_block(function, "if.merge");

        self.builder
            .build_conditional_branch(cond, then_block, else_block.unwrap_or(merge_block))?;

        self.builder.position_at_end(then_block);
        self.gen_block_statement(&s.consequence)?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_block)?;
        }

        if let Some(alt) = &s.alternative {
            let else_block = else_block.expect("else block created alongside alternative");
            self.builder.position_at_end(else_block);
            self.gen_block_statement(alt)?;
            if !self.block_terminated() {
                self.builder.build_unconditional_branch(merge_block)?;
            }
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    fn gen_while_statement(&mut self, s: &WhileStatement) -> Result<(), CompileError> {
        let function = self.current_function();
        let cond_block = self.context.append_basic_block(function, "while.cond");
        let body_block = self.context.append_basic_block(function, "while.body");
        let end_block = self.context.append_basic_block(function, "while.end");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let cond = self.gen_expression(&s.condition)?.load(self.builder)?;
        let cond = self.to_condition(cond, s.pos)?;
        self.builder
            .build_conditional_branch(cond, body_block, end_block)?;

        self.builder.position_at_end(body_block);
        self.gen_block_statement(&s.body)?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(end_block);
        Ok(())
    }

    /// Three-part `for`. The init clause lives in a scope wrapped
    /// around the whole loop; the post clause runs after the body,
    /// before the back-edge.
    fn gen_for_statement(&mut self, s: &ForStatement) -> Result<(), CompileError> {
        self.push_scope();

        if let Some(init) = &s.init {
            self.gen_statement(init)?;
        }

        let function = self.current_function();
        let cond_block = self.context.append_basic_block(function, "for.cond");
        let body_block = self.context.append_basic_block(function, "for.body");
        let end_block = self.context.append_basic_block(function, "for.end");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        match &s.condition {
            Some(condition) => {
                let cond = self.gen_expression(condition)?.load(self.builder)?;
                let cond = self.to_condition(cond, s.pos)?;
                self.builder
                    .build_conditional_branch(cond, body_block, end_block)?;
            }
            None => {
                self.builder.build_unconditional_branch(body_block)?;
            }
        }

        self.builder.position_at_end(body_block);
        self.gen_block_statement(&s.body)?;
        if !self.block_terminated() {
            if let Some(post) = &s.post {
                self.gen_statement(post)?;
            }
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(end_block);
        self.pop_scope();
        Ok(())
    }

    fn gen_expression_statement(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            // A call in statement position may be void; its result, if
            // any, is discarded.
            Expression::Call {
                function,
                args,
                lparen,
            } => {
                self.gen_call_expression(function, args, *lparen)?;
                Ok(())
            }
            other => {
                self.gen_expression(other)?;
                Ok(())
            }
        }
    }

    /// Blocks open a fresh scope. Statements after a terminator in the
    /// same block are unreachable and skipped.
    pub(crate) fn gen_block_statement(
        &mut self,
        block: &BlockStatement,
    ) -> Result<(), CompileError> {
        self.push_scope();
        for stmt in &block.statements {
            if self.block_terminated() {
                break;
            }
            self.gen_statement(stmt)?;
        }
        self.pop_scope();
        Ok(())
    }
}
