//! Expression lowering.

use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};

use crate::ast::{Expression, Identifier, Operator, PrefixOperator, Type};
use crate::errors::CompileError;
use crate::lexer::token::Position;

use super::value::Value;
use super::CodeGen;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// Lower one expression to a [`Value`]. Identifiers and other path
    /// expressions come back addressable; the caller decides whether to
    /// load.
    pub(crate) fn gen_expression(
        &mut self,
        expr: &Expression,
    ) -> Result<Value<'ctx>, CompileError> {
        match expr {
            Expression::Integer { value } => Ok(Value::rvalue(
                self.context.i32_type().const_int(*value as u64, true).into(),
            )),
            Expression::Float { value } => Ok(Value::rvalue(
                self.context.f32_type().const_float(*value).into(),
            )),
            Expression::Str { value } => self.gen_string_literal(value),
            Expression::Ident(ident) => self.gen_identifier(ident),
            Expression::Prefix { op, right, op_pos } => self.gen_prefix(*op, right, *op_pos),
            Expression::Infix {
                left,
                op,
                right,
                op_pos,
            } => self.gen_infix(left, *op, right, *op_pos),
            Expression::Assign {
                left,
                value,
                op_pos,
            } => self.gen_assign(left, value, *op_pos),
            Expression::Call {
                function,
                args,
                lparen,
            } => match self.gen_call_expression(function, args, *lparen)? {
                Some(value) => Ok(value),
                None => Err(CompileError::codegen(
                    *lparen,
                    format!("function '{}' has no return value", function.name),
                )),
            },
            Expression::Index {
                left,
                index,
                lbrack,
            } => self.gen_index(left, index, *lbrack),
            Expression::Member {
                left,
                member,
                period,
            } => self.gen_member(left, member, *period),
            Expression::New { ty, .. } => self.gen_new(ty),
        }
    }

    /// A string literal materializes as a `%string` aggregate over a
    /// private global holding the bytes.
    fn gen_string_literal(&mut self, value: &str) -> Result<Value<'ctx>, CompileError> {
        let global = self.builder.build_global_string_ptr(value, "str")?;
        let len = self.context.i64_type().const_int(value.len() as u64, false);
        let aggregate = self
            .string_type()
            .const_named_struct(&[global.as_pointer_value().into(), len.into()]);
        Ok(Value::rvalue(aggregate.into()))
    }

    fn gen_identifier(&mut self, ident: &Identifier) -> Result<Value<'ctx>, CompileError> {
        self.resolve_variable(&ident.name).ok_or_else(|| {
            CompileError::codegen(ident.pos, format!("unresolved variable '{}'", ident.name))
        })
    }

    fn gen_prefix(
        &mut self,
        op: PrefixOperator,
        right: &Expression,
        op_pos: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let val = self.gen_expression(right)?.load(self.builder)?;

        match op {
            PrefixOperator::Neg => match val {
                BasicValueEnum::IntValue(iv) => {
                    Ok(Value::rvalue(self.builder.build_int_neg(iv, "neg")?.into()))
                }
                BasicValueEnum::FloatValue(fv) => Ok(Value::rvalue(
                    self.builder.build_float_neg(fv, "fneg")?.into(),
                )),
                other => Err(CompileError::codegen(
                    op_pos,
                    format!("unexpected operator: -{}", Self::type_name(other.get_type())),
                )),
            },
            PrefixOperator::Not => {
                let cond = self.to_condition(val, op_pos)?;
                Ok(Value::rvalue(self.builder.build_not(cond, "not")?.into()))
            }
        }
    }

    /// Load both operands and dispatch on their types; mixed-type
    /// operands are an error.
    fn gen_infix(
        &mut self,
        left: &Expression,
        op: Operator,
        right: &Expression,
        op_pos: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let lhs = self.gen_expression(left)?.load(self.builder)?;
        let rhs = self.gen_expression(right)?.load(self.builder)?;

        match (lhs, rhs) {
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r))
                if l.get_type() == r.get_type() =>
            {
                self.gen_infix_int(op, l, r)
            }
            (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => {
                self.gen_infix_float(op, l, r, op_pos)
            }
            (l, r) => Err(CompileError::codegen(
                op_pos,
                format!(
                    "unexpected operator: {} {} {}",
                    Self::type_name(l.get_type()),
                    op,
                    Self::type_name(r.get_type()),
                ),
            )),
        }
    }

    fn gen_infix_int(
        &mut self,
        op: Operator,
        lhs: IntValue<'ctx>,
        rhs: IntValue<'ctx>,
    ) -> Result<Value<'ctx>, CompileError> {
        let result: BasicValueEnum<'ctx> = match op {
            Operator::Add => self.builder.build_int_add(lhs, rhs, "add")?.into(),
            Operator::Sub => self.builder.build_int_sub(lhs, rhs, "sub")?.into(),
            Operator::Mul => self.builder.build_int_mul(lhs, rhs, "mul")?.into(),
            Operator::Div => self.builder.build_int_signed_div(lhs, rhs, "div")?.into(),
            Operator::Mod => self.builder.build_int_signed_rem(lhs, rhs, "rem")?.into(),
            Operator::Shl => self.builder.build_left_shift(lhs, rhs, "shl")?.into(),
            Operator::Shr => self.builder.build_right_shift(lhs, rhs, true, "shr")?.into(),
            Operator::Eq
            | Operator::NotEq
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte => {
                let pred = match op {
                    Operator::Eq => IntPredicate::EQ,
                    Operator::NotEq => IntPredicate::NE,
                    Operator::Lt => IntPredicate::SLT,
                    Operator::Lte => IntPredicate::SLE,
                    Operator::Gt => IntPredicate::SGT,
                    Operator::Gte => IntPredicate::SGE,
                    _ => unreachable!(),
                };
                self.builder.build_int_compare(pred, lhs, rhs, "cmp")?.into()
            }
        };
        Ok(Value::rvalue(result))
    }

    fn gen_infix_float(
        &mut self,
        op: Operator,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
        op_pos: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let result: BasicValueEnum<'ctx> = match op {
            Operator::Add => self.builder.build_float_add(lhs, rhs, "fadd")?.into(),
            Operator::Sub => self.builder.build_float_sub(lhs, rhs, "fsub")?.into(),
            Operator::Mul => self.builder.build_float_mul(lhs, rhs, "fmul")?.into(),
            Operator::Div => self.builder.build_float_div(lhs, rhs, "fdiv")?.into(),
            Operator::Eq
            | Operator::NotEq
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte => {
                let pred = match op {
                    Operator::Eq => FloatPredicate::OEQ,
                    Operator::NotEq => FloatPredicate::ONE,
                    Operator::Lt => FloatPredicate::OLT,
                    Operator::Lte => FloatPredicate::OLE,
                    Operator::Gt => FloatPredicate::OGT,
                    Operator::Gte => FloatPredicate::OGE,
                    _ => unreachable!(),
                };
                self.builder
                    .build_float_compare(pred, lhs, rhs, "fcmp")?
                    .into()
            }
            Operator::Mod | Operator::Shl | Operator::Shr => {
                return Err(CompileError::codegen(
                    op_pos,
                    format!("unexpected operator: float {op} float"),
                ));
            }
        };
        Ok(Value::rvalue(result))
    }

    /// Store through the target slot and hand the slot back, so chained
    /// assignments observe the stored value.
    fn gen_assign(
        &mut self,
        left: &Expression,
        value: &Expression,
        op_pos: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let target = self.gen_expression(left)?;
        if !target.addressable {
            return Err(CompileError::codegen(
                op_pos,
                format!("cannot assign to {left}"),
            ));
        }

        let val = self.gen_expression(value)?.load(self.builder)?;
        let val = self.widen_bool(val)?;

        if val.get_type() != target.ty {
            return Err(CompileError::codegen(
                op_pos,
                format!(
                    "type mismatch '{}' and '{}'",
                    Self::type_name(target.ty),
                    Self::type_name(val.get_type()),
                ),
            ));
        }

        self.builder
            .build_store(target.llvm.into_pointer_value(), val)?;

        Ok(Value::addressable(target.llvm, target.ty))
    }

    /// Emit a call. Returns `None` for void callees, which is fine in
    /// statement position and an error in value position.
    pub(crate) fn gen_call_expression(
        &mut self,
        function: &Identifier,
        args: &[Expression],
        lparen: Position,
    ) -> Result<Option<Value<'ctx>>, CompileError> {
        let info = self.find_function(&function.name).cloned().ok_or_else(|| {
            CompileError::codegen(
                lparen,
                format!("undefined function '{}'", function.name),
            )
        })?;

        if args.len() < info.params.len() {
            return Err(CompileError::codegen(
                lparen,
                format!("not enough arguments in call to '{}'", function.name),
            ));
        }
        if args.len() > info.params.len() {
            return Err(CompileError::codegen(
                lparen,
                format!("too many arguments in call to '{}'", function.name),
            ));
        }

        let mut call_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for (arg, param_ty) in args.iter().zip(info.params.iter()) {
            let val = self.gen_expression(arg)?.load(self.builder)?;
            let val = self.widen_bool(val)?;
            if val.get_type() != *param_ty {
                return Err(CompileError::codegen(
                    lparen,
                    format!(
                        "type mismatch '{}' and '{}'",
                        Self::type_name(val.get_type()),
                        Self::type_name(*param_ty),
                    ),
                ));
            }
            call_args.push(val.into());
        }

        let call = self.builder.build_call(info.value, &call_args, "call")?;
        Ok(call.try_as_basic_value().left().map(Value::rvalue))
    }

    /// `lhs[index]` — GEP into an addressable array; the result is an
    /// addressable element slot.
    fn gen_index(
        &mut self,
        left: &Expression,
        index: &Expression,
        lbrack: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let target = self.gen_expression(left)?;

        let array_ty = match target.ty {
            BasicTypeEnum::ArrayType(t) if target.addressable => t,
            other => {
                return Err(CompileError::codegen(
                    lbrack,
                    format!("cannot index '{}'", Self::type_name(other)),
                ));
            }
        };

        let index_val = self.gen_expression(index)?.load(self.builder)?;
        let index_val = match index_val {
            BasicValueEnum::IntValue(iv) => iv,
            other => {
                return Err(CompileError::codegen(
                    lbrack,
                    format!("cannot index with '{}'", Self::type_name(other.get_type())),
                ));
            }
        };
        let index_val = if index_val.get_type().get_bit_width() < 64 {
            self.builder
                .build_int_s_extend(index_val, self.context.i64_type(), "idxext")?
        } else {
            index_val
        };

        let zero = self.context.i64_type().const_zero();
        let ptr = unsafe {
            self.builder.build_in_bounds_gep(
                target.llvm.into_pointer_value(),
                &[zero, index_val],
                "idx",
            )?
        };

        Ok(Value::addressable(ptr.into(), array_ty.get_element_type()))
    }

    /// `lhs.member` — GEP to a struct field; the field name resolves
    /// through the struct registry, its position is the index.
    fn gen_member(
        &mut self,
        left: &Expression,
        member: &Identifier,
        period: Position,
    ) -> Result<Value<'ctx>, CompileError> {
        let target = self.gen_expression(left)?;

        let not_a_struct = |ty: BasicTypeEnum<'ctx>| {
            CompileError::codegen(
                period,
                format!(
                    "unexpected operator: {}.{}",
                    Self::type_name(ty),
                    member.name
                ),
            )
        };

        let struct_ty = match target.ty {
            BasicTypeEnum::StructType(t) if target.addressable => t,
            other => return Err(not_a_struct(other)),
        };
        let struct_name = match struct_ty.get_name().and_then(|n| n.to_str().ok()) {
            Some(name) => name.to_string(),
            None => return Err(not_a_struct(target.ty)),
        };

        let info = match self.find_struct(&struct_name) {
            Some(info) => info,
            None => return Err(not_a_struct(target.ty)),
        };
        let index = match info.member_index(&member.name) {
            Some(index) => index,
            None => {
                return Err(CompileError::codegen(
                    period,
                    format!("unresolved member '{}'", member.name),
                ));
            }
        };
        let member_ty = info.members[index].1;

        let ptr = self.builder.build_struct_gep(
            target.llvm.into_pointer_value(),
            index as u32,
            &member.name,
        )?;

        Ok(Value::addressable(ptr.into(), member_ty))
    }

    /// `new T` — a stack slot zero-initialized with `store`.
    fn gen_new(&mut self, ty: &Type) -> Result<Value<'ctx>, CompileError> {
        let llvm_ty = self.llvm_type(ty)?;
        let ptr = self.builder.build_alloca(llvm_ty, "new")?;
        self.builder.build_store(ptr, self.const_zero(llvm_ty))?;
        Ok(Value::addressable(ptr.into(), llvm_ty))
    }
}
