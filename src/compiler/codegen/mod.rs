//! Code generation — walks the AST and emits LLVM IR.
//!
//! The generator keeps a scope stack (vector of maps), a function
//! registry and a struct registry. Structs and top-level function
//! signatures are declared in a pre-pass so bodies can reference each
//! other in any order; bodies are then emitted in source order.
//!
//! Semantic errors abort generation: the first one propagates out as a
//! [`CompileError`] carrying the offending token's position.

pub mod expr;
pub mod stmt;
pub mod value;

use std::collections::HashMap;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, StructType};
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue};

use crate::ast::{FunctionStatement, Program, Statement, Type};
use crate::errors::CompileError;
use crate::lexer::token::Position;

use value::Value;

/// A registered function: its LLVM handle plus the signature the
/// call-site checks run against.
#[derive(Debug, Clone)]
pub struct FuncInfo<'ctx> {
    pub value: FunctionValue<'ctx>,
    pub params: Vec<BasicTypeEnum<'ctx>>,
    /// `None` means void.
    pub ret: Option<BasicTypeEnum<'ctx>>,
    /// Set once the body has been emitted; a second body for the same
    /// name is a redeclaration.
    has_body: bool,
}

/// A registered struct: the named LLVM type and the members in
/// declaration order (their position is the GEP index).
#[derive(Debug, Clone)]
pub struct StructInfo<'ctx> {
    pub ty: StructType<'ctx>,
    pub members: Vec<(String, BasicTypeEnum<'ctx>)>,
}

impl<'ctx> StructInfo<'ctx> {
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|(n, _)| n == name)
    }
}

pub struct CodeGen<'a, 'ctx> {
    pub(crate) context: &'ctx Context,
    pub(crate) module: &'a Module<'ctx>,
    pub(crate) builder: &'a Builder<'ctx>,

    /// Innermost scope last; lookup walks back to front.
    scopes: Vec<HashMap<String, Value<'ctx>>>,
    functions: HashMap<String, FuncInfo<'ctx>>,
    structs: HashMap<String, StructInfo<'ctx>>,

    /// The module-level `%string = type { ptr, i64 }`.
    string_type: StructType<'ctx>,

    /// Return type of the function currently being emitted.
    current_ret: Option<BasicTypeEnum<'ctx>>,
}

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    pub fn new(context: &'ctx Context, module: &'a Module<'ctx>, builder: &'a Builder<'ctx>) -> Self {
        let string_type = context.opaque_struct_type("string");
        string_type.set_body(
            &[
                context.i8_type().ptr_type(inkwell::AddressSpace::default()).into(),
                context.i64_type().into(),
            ],
            false,
        );

        Self {
            context,
            module,
            builder,
            scopes: Vec::new(),
            functions: HashMap::new(),
            structs: HashMap::new(),
            string_type,
            current_ret: None,
        }
    }

    /// Lower a full [`Program`] into the module.
    pub fn generate(&mut self, program: &Program) -> Result<(), CompileError> {
        self.declare_structs(program)?;
        self.declare_functions(program)?;

        for stmt in &program.statements {
            self.gen_statement(stmt)?;
        }

        Ok(())
    }

    // ── pre-pass declarations ───────────────────────────────────────

    /// Create all struct types. Two passes so members can reference
    /// other structs regardless of declaration order: first the opaque
    /// named types, then the bodies.
    fn declare_structs(&mut self, program: &Program) -> Result<(), CompileError> {
        for stmt in &program.statements {
            if let Statement::Struct(s) = stmt {
                let name = &s.ident.name;
                if self.structs.contains_key(name) {
                    return Err(CompileError::codegen(
                        s.ident.pos,
                        format!("already declared struct '{name}'"),
                    ));
                }
                let ty = self.context.opaque_struct_type(name);
                self.structs.insert(
                    name.clone(),
                    StructInfo {
                        ty,
                        members: Vec::new(),
                    },
                );
            }
        }

        for stmt in &program.statements {
            if let Statement::Struct(s) = stmt {
                let mut members = Vec::new();
                for m in &s.members {
                    let ty = self.llvm_type(&m.ty)?;
                    members.push((m.ident.name.clone(), ty));
                }

                let field_types: Vec<BasicTypeEnum<'ctx>> =
                    members.iter().map(|(_, ty)| *ty).collect();
                let info = self
                    .structs
                    .get_mut(&s.ident.name)
                    .expect("struct registered in first pass");
                info.ty.set_body(&field_types, false);
                info.members = members;
            }
        }

        Ok(())
    }

    /// Declare every top-level function signature so forward references
    /// within the compilation unit resolve.
    fn declare_functions(&mut self, program: &Program) -> Result<(), CompileError> {
        for stmt in &program.statements {
            if let Statement::Function(f) = stmt {
                self.declare_function(f)?;
            }
        }
        Ok(())
    }

    /// Add one function declaration to the module and the registry.
    pub(crate) fn declare_function(&mut self, f: &FunctionStatement) -> Result<(), CompileError> {
        let name = &f.sig.ident.name;
        if self.functions.contains_key(name) {
            return Err(CompileError::codegen(
                f.sig.ident.pos,
                format!("already declared function '{name}'"),
            ));
        }

        let mut params = Vec::new();
        for p in &f.sig.params {
            params.push(self.llvm_type(&p.ty)?);
        }
        let meta_params: Vec<BasicMetadataTypeEnum<'ctx>> =
            params.iter().map(|ty| (*ty).into()).collect();

        let ret = match &f.sig.ret {
            Some(ty) => Some(self.llvm_type(ty)?),
            None => None,
        };
        let fn_type = match ret {
            Some(ty) => ty.fn_type(&meta_params, false),
            None => self.context.void_type().fn_type(&meta_params, false),
        };

        let value = self.module.add_function(name, fn_type, None);
        self.functions.insert(
            name.clone(),
            FuncInfo {
                value,
                params,
                ret,
                has_body: false,
            },
        );

        Ok(())
    }

    pub(crate) fn find_function(&self, name: &str) -> Option<&FuncInfo<'ctx>> {
        self.functions.get(name)
    }

    pub(crate) fn find_struct(&self, name: &str) -> Option<&StructInfo<'ctx>> {
        self.structs.get(name)
    }

    /// Mark a function's body as emitted; errors on the second attempt.
    pub(crate) fn mark_function_body(
        &mut self,
        name: &str,
        pos: Position,
    ) -> Result<FuncInfo<'ctx>, CompileError> {
        let info = self
            .functions
            .get_mut(name)
            .expect("function declared before body emission");
        if info.has_body {
            return Err(CompileError::codegen(
                pos,
                format!("already declared function '{name}'"),
            ));
        }
        info.has_body = true;
        Ok(info.clone())
    }

    // ── scopes ──────────────────────────────────────────────────────

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop().expect("scope stack underflow");
    }

    /// Bind a name in the innermost scope. Shadowing an outer scope is
    /// fine; redeclaring within the same scope is not.
    pub(crate) fn declare_variable(
        &mut self,
        name: &str,
        value: Value<'ctx>,
        pos: Position,
    ) -> Result<(), CompileError> {
        let scope = self.scopes.last_mut().expect("no open scope");
        if scope.contains_key(name) {
            return Err(CompileError::codegen(
                pos,
                format!("already declared variable '{name}'"),
            ));
        }
        scope.insert(name.to_string(), value);
        Ok(())
    }

    pub(crate) fn resolve_variable(&self, name: &str) -> Option<Value<'ctx>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    // ── type helpers ────────────────────────────────────────────────

    /// Map a source type literal to the LLVM type.
    pub(crate) fn llvm_type(&self, ty: &Type) -> Result<BasicTypeEnum<'ctx>, CompileError> {
        let base: BasicTypeEnum<'ctx> = match ty.name.as_str() {
            "int" => self.context.i32_type().into(),
            "float" => self.context.f32_type().into(),
            "string" => self.string_type.into(),
            other => match self.structs.get(other) {
                Some(info) => info.ty.into(),
                None => {
                    return Err(CompileError::codegen(
                        ty.pos,
                        format!("unknown type '{other}'"),
                    ));
                }
            },
        };

        if ty.is_array {
            Ok(base.array_type(ty.len as u32).into())
        } else {
            Ok(base)
        }
    }

    pub(crate) fn string_type(&self) -> StructType<'ctx> {
        self.string_type
    }

    /// Zero value for any type we can declare.
    pub(crate) fn const_zero(&self, ty: BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        match ty {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            other => unreachable!("no zero value for {other:?}"),
        }
    }

    /// Human-readable name of an LLVM type for diagnostics.
    pub(crate) fn type_name(ty: BasicTypeEnum<'ctx>) -> String {
        ty.print_to_string().to_string()
    }

    // ── block state ─────────────────────────────────────────────────

    /// True when the current block already ends in a terminator; no
    /// non-terminator may be appended past this point.
    pub(crate) fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_none_or(|block| block.get_terminator().is_some())
    }

    pub(crate) fn current_function(&self) -> FunctionValue<'ctx> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .expect("builder positioned inside a function")
    }

    pub(crate) fn set_current_ret(&mut self, ret: Option<BasicTypeEnum<'ctx>>) {
        self.current_ret = ret;
    }

    pub(crate) fn current_ret(&self) -> Option<BasicTypeEnum<'ctx>> {
        self.current_ret
    }

    // ── value helpers ───────────────────────────────────────────────

    /// Comparison results are `i1`; they widen to `i32` whenever they
    /// are stored, passed or returned.
    pub(crate) fn widen_bool(
        &self,
        v: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if let BasicValueEnum::IntValue(iv) = v {
            if iv.get_type().get_bit_width() == 1 {
                let widened =
                    self.builder
                        .build_int_z_extend(iv, self.context.i32_type(), "widen")?;
                return Ok(widened.into());
            }
        }
        Ok(v)
    }

    /// Turn a condition value into `i1`: `i1` passes through, wider
    /// integers compare against zero, anything else is an error.
    pub(crate) fn to_condition(
        &self,
        v: BasicValueEnum<'ctx>,
        pos: Position,
    ) -> Result<IntValue<'ctx>, CompileError> {
        match v {
            BasicValueEnum::IntValue(iv) => {
                if iv.get_type().get_bit_width() == 1 {
                    Ok(iv)
                } else {
                    Ok(self.builder.build_int_compare(
                        inkwell::IntPredicate::NE,
                        iv,
                        iv.get_type().const_zero(),
                        "cond",
                    )?)
                }
            }
            other => Err(CompileError::codegen(
                pos,
                format!("cannot use '{}' as condition", Self::type_name(other.get_type())),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use inkwell::context::Context;

    use crate::compiler::Compiler;
    use crate::errors::CompileError;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    /// Parse, generate, verify, and return the textual module.
    fn compile(src: &str) -> Result<String, CompileError> {
        let mut parser = Parser::new(Lexer::new(src));
        let program = parser.parse_program();
        assert!(
            parser.errors.is_empty(),
            "unexpected parse errors: {:?}",
            parser.errors
        );

        let context = Context::create();
        let compiler = Compiler::new(&context, "test");
        compiler.compile(&program)?;
        compiler.verify()?;
        Ok(compiler.ir_string())
    }

    fn compile_err(src: &str) -> String {
        match compile(src) {
            Ok(ir) => panic!("expected an error, got module:\n{ir}"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn return_zero() {
        let ir = compile("func main(): int { return 0 }").unwrap();
        assert!(ir.contains("define i32 @main"), "{ir}");
        assert!(ir.contains("ret i32 0"), "{ir}");
    }

    #[test]
    fn function_call_with_arguments() {
        let ir = compile(
            "func add(a: int, b: int): int { return a + b }
             func main(): int { return add(2, 3) }",
        )
        .unwrap();
        assert!(ir.contains("define i32 @add(i32 %0, i32 %1)"), "{ir}");
        assert!(ir.contains("add i32"), "{ir}");
        assert!(ir.contains("call i32 @add(i32 2, i32 3)"), "{ir}");
    }

    #[test]
    fn forward_reference_between_functions() {
        compile(
            "func main(): int { return helper() }
             func helper(): int { return 1 }",
        )
        .unwrap();
    }

    #[test]
    fn parameters_are_spilled_to_slots() {
        let ir = compile("func id(a: int): int { return a }").unwrap();
        assert!(ir.contains("alloca i32"), "{ir}");
        assert!(ir.contains("store i32 %0"), "{ir}");
    }

    #[test]
    fn for_range_sum() {
        let ir = compile(
            "func main(): int { var s = 0; for i in 1..10 { s = s + i } return s }",
        )
        .unwrap();
        // Signed comparison predicates, per the adopted redesign.
        assert!(ir.contains("icmp sle i32"), "{ir}");
        assert!(ir.contains("for.cond"), "{ir}");
        assert!(ir.contains("for.body"), "{ir}");
    }

    #[test]
    fn while_loop_shape() {
        let ir = compile(
            "func main(): int { var n = 0 while n < 3 { n = n + 1 } return n }",
        )
        .unwrap();
        assert!(ir.contains("while.cond"), "{ir}");
        assert!(ir.contains("icmp slt i32"), "{ir}");
    }

    #[test]
    fn array_index_roundtrip() {
        let ir = compile(
            "func main(): int { var a: [4]int = new [4]int; a[2] = 7; return a[2] }",
        )
        .unwrap();
        assert!(ir.contains("[4 x i32]"), "{ir}");
        assert!(ir.contains("getelementptr inbounds"), "{ir}");
    }

    #[test]
    fn struct_member_access() {
        let ir = compile(
            "struct P { x int y int }
             func main(): int { var p = new P; p.x = 3; p.y = 4; return p.x + p.y }",
        )
        .unwrap();
        assert!(ir.contains("%P = type { i32, i32 }"), "{ir}");
        assert!(ir.contains("getelementptr inbounds"), "{ir}");
    }

    #[test]
    fn string_literals_use_the_string_struct() {
        let ir = compile("func main(): string { return \"hi\" }").unwrap();
        assert!(ir.contains("%string = type { ptr, i64 }"), "{ir}");
        assert!(ir.contains("hi"), "{ir}");
    }

    #[test]
    fn float_arithmetic() {
        let ir = compile(
            "func main(): float { var x = 1.5 var y = 2.5 return x * y }",
        )
        .unwrap();
        assert!(ir.contains("fmul float"), "{ir}");
    }

    #[test]
    fn float_comparison_is_ordered() {
        let ir = compile(
            "func main(): int { var x = 1.5 if x < 2.5 { return 1 } return 0 }",
        )
        .unwrap();
        assert!(ir.contains("fcmp olt float"), "{ir}");
    }

    #[test]
    fn comparison_results_widen_on_store() {
        let ir = compile("func main(): int { var x = 1 var b = x < 2 return b }").unwrap();
        assert!(ir.contains("icmp slt i32"), "{ir}");
        assert!(ir.contains("zext i1"), "{ir}");
    }

    #[test]
    fn if_else_with_both_arms_returning() {
        let ir = compile(
            "func pick(c: int): int { if c { return 1 } else { return 2 } }",
        )
        .unwrap();
        assert!(ir.contains("if.then"), "{ir}");
        assert!(ir.contains("if.else"), "{ir}");
    }

    #[test]
    fn if_without_else_falls_through_to_merge() {
        compile("func f(c: int): int { if c { return 1 } return 0 }").unwrap();
    }

    #[test]
    fn code_after_return_is_not_emitted() {
        let ir = compile("func main(): int { return 1 return 2 }").unwrap();
        assert!(!ir.contains("ret i32 2"), "{ir}");
    }

    #[test]
    fn void_function_gets_implicit_return() {
        let ir = compile("func noop() { } func main(): int { noop() return 0 }").unwrap();
        assert!(ir.contains("ret void"), "{ir}");
    }

    #[test]
    fn nested_functions_are_callable() {
        compile("func main(): int { func inner(): int { return 3 } return inner() }").unwrap();
    }

    #[test]
    fn chained_assignment() {
        compile("func main(): int { var a = 1 var b = 2 a = b = 5 return a }").unwrap();
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        compile(
            "func main(): int { var x = 1 if 1 { var x = 2 x = 3 } return x }",
        )
        .unwrap();
    }

    #[test]
    fn compound_assignment_through_members() {
        compile(
            "struct P { x int }
             func main(): int { var p = new P; p.x += 2; return p.x }",
        )
        .unwrap();
    }

    #[test]
    fn shift_operators_are_arithmetic() {
        let ir = compile("func main(): int { var a = 8 return a >> 1 << 2 }").unwrap();
        assert!(ir.contains("ashr i32"), "{ir}");
        assert!(ir.contains("shl i32"), "{ir}");
    }

    #[test]
    fn division_and_remainder_are_signed() {
        let ir = compile("func main(): int { var a = 7 return a / 2 % 3 }").unwrap();
        assert!(ir.contains("sdiv i32"), "{ir}");
        assert!(ir.contains("srem i32"), "{ir}");
    }

    // ── semantic errors ─────────────────────────────────────────────

    #[test]
    fn unresolved_identifier() {
        let err = compile_err("func main(): int { return x }");
        assert!(err.contains("unresolved variable 'x'"), "{err}");
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let err = compile_err("func main(): int { var a = 1 var a = 2 return a }");
        assert!(err.contains("already declared variable 'a'"), "{err}");
    }

    #[test]
    fn undefined_function() {
        let err = compile_err("func main(): int { return missing() }");
        assert!(err.contains("undefined function 'missing'"), "{err}");
    }

    #[test]
    fn arity_mismatch() {
        let err = compile_err(
            "func add(a: int, b: int): int { return a + b }
             func main(): int { return add(1) }",
        );
        assert!(err.contains("not enough arguments in call to 'add'"), "{err}");

        let err = compile_err(
            "func add(a: int, b: int): int { return a + b }
             func main(): int { return add(1, 2, 3) }",
        );
        assert!(err.contains("too many arguments in call to 'add'"), "{err}");
    }

    #[test]
    fn argument_type_mismatch() {
        let err = compile_err(
            "func f(a: int): int { return a }
             func main(): int { return f(1.5) }",
        );
        assert!(err.contains("type mismatch"), "{err}");
    }

    #[test]
    fn store_type_mismatch() {
        let err = compile_err("func main(): int { var a = 1 a = 1.5 return a }");
        assert!(err.contains("type mismatch"), "{err}");
    }

    #[test]
    fn mixed_infix_operands() {
        let err = compile_err("func main(): int { return 1 + 1.5 }");
        assert!(err.contains("unexpected operator"), "{err}");
    }

    #[test]
    fn indexing_a_non_array() {
        let err = compile_err("func main(): int { var a = 1 return a[0] }");
        assert!(err.contains("cannot index"), "{err}");
    }

    #[test]
    fn member_of_non_struct() {
        let err = compile_err("func main(): int { var a = 1 return a.x }");
        assert!(err.contains("unexpected operator"), "{err}");
    }

    #[test]
    fn unresolved_member() {
        let err = compile_err(
            "struct P { x int }
             func main(): int { var p = new P; return p.z }",
        );
        assert!(err.contains("unresolved member 'z'"), "{err}");
    }

    #[test]
    fn redeclared_function() {
        let err = compile_err("func f(): int { return 1 } func f(): int { return 2 }");
        assert!(err.contains("already declared function 'f'"), "{err}");
    }

    #[test]
    fn unknown_type_in_signature() {
        let err = compile_err("func f(a: Widget): int { return 0 }");
        assert!(err.contains("unknown type 'Widget'"), "{err}");
    }

    #[test]
    fn return_type_mismatch() {
        let err = compile_err("func main(): int { return 1.5 }");
        assert!(err.contains("type mismatch"), "{err}");
    }

    #[test]
    fn var_without_type_or_value() {
        let err = compile_err("func main(): int { var a return 0 }");
        assert!(err.contains("cannot determine type"), "{err}");
    }

    #[test]
    fn errors_carry_positions() {
        let err = compile_err("func main(): int {\n  return x\n}");
        assert!(err.starts_with("2:10 |"), "{err}");
    }
}
