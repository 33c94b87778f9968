//! Thin typed wrapper around the SSA values the generator moves around.

use inkwell::builder::Builder;
use inkwell::types::BasicTypeEnum;
use inkwell::values::BasicValueEnum;

use crate::errors::CompileError;

/// An SSA value paired with its logical type and an addressability flag.
///
/// Addressable values are pointers into storage (allocas, GEP results);
/// `ty` is then the pointee type, which must ride along because LLVM
/// pointers are opaque. Non-addressable values are plain rvalues and
/// `ty` is their own type.
#[derive(Debug, Clone, Copy)]
pub struct Value<'ctx> {
    pub llvm: BasicValueEnum<'ctx>,
    pub ty: BasicTypeEnum<'ctx>,
    pub addressable: bool,
}

impl<'ctx> Value<'ctx> {
    pub fn rvalue(llvm: BasicValueEnum<'ctx>) -> Self {
        Self {
            llvm,
            ty: llvm.get_type(),
            addressable: false,
        }
    }

    pub fn addressable(llvm: BasicValueEnum<'ctx>, ty: BasicTypeEnum<'ctx>) -> Self {
        Self {
            llvm,
            ty,
            addressable: true,
        }
    }

    /// Emit a `load` when the value is addressable, else return the SSA
    /// value as-is.
    pub fn load(
        &self,
        builder: &Builder<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if self.addressable {
            Ok(builder.build_load(self.llvm.into_pointer_value(), "load")?)
        } else {
            Ok(self.llvm)
        }
    }
}
