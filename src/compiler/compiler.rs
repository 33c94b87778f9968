//! LLVM-backed compiler for the Visket language.
//!
//! Top-level coordinator; the heavy lifting lives in:
//!
//! - [`codegen`](super::codegen) — AST → LLVM IR lowering
//! - [`linker`](super::linker)   — native binary linking

use std::path::Path;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::OptimizationLevel;

use crate::ast::Program;
use crate::errors::{CompileError, Phase};

use super::codegen::CodeGen;

/// Holds LLVM state for a single compilation unit.
pub struct Compiler<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
}

impl<'ctx> Compiler<'ctx> {
    /// Create a new compiler targeting the given LLVM module name.
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Self {
            context,
            module,
            builder,
        }
    }

    // ── codegen entry point ─────────────────────────────────────

    /// Lower a full [`Program`] into the module. The first semantic
    /// error aborts and propagates out.
    pub fn compile(&self, program: &Program) -> Result<(), CompileError> {
        let mut codegen = CodeGen::new(self.context, &self.module, &self.builder);
        codegen.generate(program)
    }

    /// Run LLVM's module verifier over the finished module.
    pub fn verify(&self) -> Result<(), CompileError> {
        self.module.verify().map_err(|msg| CompileError {
            phase: Phase::Codegen,
            pos: None,
            message: format!("internal error: invalid module: {}", msg.to_string().trim()),
            hint: None,
        })
    }

    // ── output helpers ──────────────────────────────────────────

    /// Return the LLVM IR as a string.
    pub fn ir_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Write a native object file for the host target.
    pub fn write_object_file(&self, path: &Path) -> Result<(), CompileError> {
        let internal = |message: String| CompileError {
            phase: Phase::Codegen,
            pos: None,
            message,
            hint: None,
        };

        Target::initialize_native(&InitializationConfig::default())
            .map_err(|e| internal(format!("failed to initialise native target: {e}")))?;

        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple)
            .map_err(|e| internal(format!("unsupported target triple: {e}")))?;
        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| internal("failed to create target machine".to_string()))?;

        self.module.set_triple(&triple);
        machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| internal(format!("failed to write object file: {e}")))
    }
}
