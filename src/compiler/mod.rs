//! LLVM-backed compiler — lowers the AST to IR and native code via Inkwell.

pub mod codegen;
pub mod compiler;
pub mod linker;

pub use compiler::Compiler;

use inkwell::context::Context;

use crate::errors::ErrorList;
use crate::lexer::Lexer;
use crate::optimizer;
use crate::parser::Parser;

/// Wire lexer → parser → codegen and return the textual module.
///
/// Parse errors are collected and reported together; IR generation only
/// starts when the parse error list is empty, and its first error
/// aborts.
pub fn compile_to_ir(source: &str, optimize: bool) -> Result<String, ErrorList> {
    let mut parser = Parser::new(Lexer::new(source));
    let mut program = parser.parse_program();
    if !parser.errors.is_empty() {
        return Err(parser.errors);
    }

    if optimize {
        optimizer::optimize(&mut program);
    }

    let context = Context::create();
    let compiler = Compiler::new(&context, "main");
    compiler.compile(&program).map_err(|e| vec![e])?;
    compiler.verify().map_err(|e| vec![e])?;
    Ok(compiler.ir_string())
}

#[cfg(test)]
mod tests {
    use super::compile_to_ir;

    #[test]
    fn returns_the_textual_module() {
        let ir = compile_to_ir("func main(): int { return 0 }", false).unwrap();
        assert!(ir.contains("define i32 @main"), "{ir}");
    }

    #[test]
    fn parse_errors_stop_ir_generation() {
        let errs = compile_to_ir("func t() { var = 1 }", false).unwrap_err();
        assert!(!errs.is_empty());
        assert!(errs[0].to_string().contains("expected IDENT"), "{}", errs[0]);
    }

    #[test]
    fn optimized_modules_fold_constants() {
        let ir = compile_to_ir("func main(): int { return 2 * 3 + 1 }", true).unwrap();
        assert!(ir.contains("ret i32 7"), "{ir}");
    }
}
