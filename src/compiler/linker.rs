//! Linker — invokes the system C compiler to produce a native binary.
//!
//! Tries `cc`, then `gcc`, then `clang` (gcc/clang only on Windows).

use std::path::Path;
use std::process::Command;

use crate::errors::CompileError;

/// Link an object file into a native executable.
pub fn link(object_path: &Path, output_path: &Path) -> Result<(), CompileError> {
    let obj = object_path.to_string_lossy();
    let out = output_path.to_string_lossy();

    let candidates: &[&str] = if cfg!(windows) {
        &["gcc", "clang"]
    } else {
        &["cc", "gcc", "clang"]
    };

    for cmd in candidates {
        let result = Command::new(cmd)
            .args([obj.as_ref(), "-o", out.as_ref()])
            .output();
        match result {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                eprintln!("[{cmd}] link failed:\n{stderr}");
            }
            Err(_) => continue,
        }
    }

    Err(CompileError::linker(
        "no working linker found",
        Some("install gcc or clang and make sure it's on your PATH".into()),
    ))
}
