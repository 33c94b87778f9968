//! Visket compiler driver.
//!
//! Usage:
//!   visket <file.vk>                 # compile to <file> (or <file>.exe)
//!   visket -o out <file.vk>          # explicit output name
//!   visket --emit-llvm <file.vk>     # print LLVM IR (or write with -o)
//!   visket -O <file.vk>              # fold constants before codegen
//!
//! Pipeline: source → Lexer → Parser → AST → LLVM IR → .o → link → binary

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use inkwell::context::Context;

use visket::compiler::{linker, Compiler};
use visket::errors::{self, Phase};
use visket::lexer::Lexer;
use visket::optimizer;
use visket::parser::Parser;

fn main() {
    // ── CLI argument handling ────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();

    let mut optimize = false;
    let mut emit_llvm = false;
    let mut output: Option<PathBuf> = None;
    let mut source_path: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-O" => optimize = true,
            "--emit-llvm" => emit_llvm = true,
            "-o" => match iter.next() {
                Some(path) => output = Some(PathBuf::from(path)),
                None => errors::fatal(Phase::Parser, "expected output path after -o"),
            },
            other if other.starts_with('-') => {
                errors::fatal(Phase::Parser, format!("unknown flag '{other}'"));
            }
            other => source_path = Some(PathBuf::from(other)),
        }
    }

    let Some(source_path) = source_path else {
        eprintln!("Usage: visket [-O] [-o <file>] [--emit-llvm] <source>");
        process::exit(1);
    };

    // ── Read source ─────────────────────────────────────────────
    let source = fs::read_to_string(&source_path).unwrap_or_else(|e| {
        errors::fatal(
            Phase::Parser,
            format!("could not read {}: {e}", source_path.display()),
        );
    });

    // ── Parse ───────────────────────────────────────────────────
    let mut parser = Parser::new(Lexer::new(&source));
    let mut program = parser.parse_program();
    if !parser.errors.is_empty() {
        for err in &parser.errors {
            errors::report(err);
        }
        process::exit(1);
    }

    if optimize {
        optimizer::optimize(&mut program);
    }

    // ── LLVM codegen ────────────────────────────────────────────
    let context = Context::create();
    let compiler = Compiler::new(&context, "main");
    if let Err(err) = compiler.compile(&program).and_then(|_| compiler.verify()) {
        errors::report(&err);
        process::exit(1);
    }

    if emit_llvm {
        match &output {
            Some(path) => {
                if let Err(e) = fs::write(path, compiler.ir_string()) {
                    errors::fatal(
                        Phase::Codegen,
                        format!("could not write {}: {e}", path.display()),
                    );
                }
            }
            None => print!("{}", compiler.ir_string()),
        }
        return;
    }

    // ── Emit object file & link ─────────────────────────────────
    let output_path = output.unwrap_or_else(|| {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "a.out".to_string());
        if cfg!(windows) {
            PathBuf::from(format!("{stem}.exe"))
        } else {
            PathBuf::from(stem)
        }
    });
    let obj_path = output_path.with_extension(if cfg!(windows) { "obj" } else { "o" });

    if let Err(err) = compiler.write_object_file(&obj_path) {
        errors::report(&err);
        process::exit(1);
    }
    errors::info(format!("wrote object → {}", obj_path.display()));

    if let Err(err) = linker::link(&obj_path, &output_path) {
        errors::report(&err);
        process::exit(1);
    }
    errors::success(format!("done → {}", output_path.display()));
}
