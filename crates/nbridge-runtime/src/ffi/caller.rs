//! Native function calls through libffi
//!
//! A signature is turned into a libffi call interface (CIF) once, when its
//! symbol is first resolved against a library. Later calls with the same
//! library and signature reuse the cached resolution.

use crate::error::CallError;
use crate::ffi::loader::LibraryHandle;
use crate::ffi::signature::FunctionSignature;
use crate::ffi::types::{NativeKind, NativeValue};
use crate::log;
use libffi::middle::{Arg, Cif, CodePtr};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

/// Integer returns narrower than a register are widened by libffi to
/// `ffi_arg`, which is pointer-sized on every supported target.
type ReturnSlot = usize;

/// An exported symbol bound to its signature and call interface
pub struct ResolvedFunction {
    /// Keeps the library mapped while this function is reachable
    library: Option<LibraryHandle>,
    signature: FunctionSignature,
    code: *mut c_void,
    cif: Cif,
}

// Safety: the code pointer refers to immutable, mapped text and the CIF is
// only read after construction.
unsafe impl Send for ResolvedFunction {}
unsafe impl Sync for ResolvedFunction {}

impl ResolvedFunction {
    /// Bind a raw code pointer to a signature
    ///
    /// # Safety
    ///
    /// `code` must point to a function with the C calling convention whose
    /// parameters and return match `signature`, valid for the lifetime of the
    /// returned value.
    pub unsafe fn from_raw(code: *const c_void, signature: FunctionSignature) -> Self {
        Self::new(None, signature, code as *mut c_void)
    }

    fn new(
        library: Option<LibraryHandle>,
        signature: FunctionSignature,
        code: *mut c_void,
    ) -> Self {
        let cif = signature.cif();
        Self {
            library,
            signature,
            code,
            cif,
        }
    }

    /// Declared signature
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Library the symbol was resolved in
    pub fn library(&self) -> Option<&LibraryHandle> {
        self.library.as_ref()
    }

    /// Call with argument checking
    ///
    /// # Safety
    ///
    /// The signature must match the native implementation. A mismatch, or a
    /// fault inside the native function, is undefined behaviour.
    pub unsafe fn call(&self, args: &[NativeValue]) -> Result<NativeValue, CallError> {
        self.signature.check_args(args)?;
        Ok(self.call_unchecked(args))
    }

    /// Call without argument checking
    ///
    /// # Safety
    ///
    /// As [`ResolvedFunction::call`], and `args` must already match the
    /// declared parameter kinds.
    pub(crate) unsafe fn call_unchecked(&self, args: &[NativeValue]) -> NativeValue {
        let ffi_args: Vec<Arg> = args.iter().map(NativeValue::as_arg).collect();
        let code = CodePtr::from_ptr(self.code as *const c_void);
        let cif = &self.cif;

        match self.signature.returns() {
            NativeKind::Void => {
                cif.call::<()>(code, &ffi_args);
                NativeValue::Void
            }
            NativeKind::I8 => NativeValue::I8(cif.call::<ReturnSlot>(code, &ffi_args) as i8),
            NativeKind::I16 => NativeValue::I16(cif.call::<ReturnSlot>(code, &ffi_args) as i16),
            NativeKind::I32 => NativeValue::I32(cif.call::<ReturnSlot>(code, &ffi_args) as i32),
            NativeKind::U8 => NativeValue::U8(cif.call::<ReturnSlot>(code, &ffi_args) as u8),
            NativeKind::U16 => NativeValue::U16(cif.call::<ReturnSlot>(code, &ffi_args) as u16),
            NativeKind::U32 => NativeValue::U32(cif.call::<ReturnSlot>(code, &ffi_args) as u32),
            NativeKind::I64 => NativeValue::I64(cif.call::<i64>(code, &ffi_args)),
            NativeKind::U64 => NativeValue::U64(cif.call::<u64>(code, &ffi_args)),
            NativeKind::F32 => NativeValue::F32(cif.call::<f32>(code, &ffi_args)),
            NativeKind::F64 => NativeValue::F64(cif.call::<f64>(code, &ffi_args)),
        }
    }
}

/// Cache key; the mapping identity stays unique because every cached
/// resolution holds a clone of its handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    library: usize,
    signature: FunctionSignature,
}

/// Resolves symbols and performs native calls
///
/// Resolutions are cached per library mapping and signature behind a
/// read-mostly lock, so a bridge can be shared between threads.
#[derive(Default)]
pub struct NativeBridge {
    resolved: RwLock<HashMap<SymbolKey, Arc<ResolvedFunction>>>,
}

impl NativeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `signature`'s symbol in `library`, or return the cached resolution
    pub fn resolve(
        &self,
        library: &LibraryHandle,
        signature: &FunctionSignature,
    ) -> Result<Arc<ResolvedFunction>, CallError> {
        let key = SymbolKey {
            library: library.id(),
            signature: signature.clone(),
        };

        let cached = self.resolved.read().get(&key).cloned();
        if let Some(function) = cached {
            return Ok(function);
        }

        let mut resolved = self.resolved.write();
        if let Some(function) = resolved.get(&key) {
            return Ok(Arc::clone(function));
        }

        let code = library.symbol_ptr(signature.name())?;
        log!(debug, "Resolved `{}` in `{}`", signature, library.name());

        let function = Arc::new(ResolvedFunction::new(
            Some(library.clone()),
            signature.clone(),
            code,
        ));
        resolved.insert(key, Arc::clone(&function));
        Ok(function)
    }

    /// Call a native function
    ///
    /// Checks `args` against the signature, resolves the symbol (cached), and
    /// calls it with the platform C calling convention. The result holds
    /// exactly what the native function returned.
    ///
    /// # Safety
    ///
    /// `signature` must match the native implementation of the symbol. A
    /// mismatch, or a fault inside the native function, is undefined
    /// behaviour and is not reported.
    pub unsafe fn invoke(
        &self,
        library: &LibraryHandle,
        signature: &FunctionSignature,
        args: &[NativeValue],
    ) -> Result<NativeValue, CallError> {
        signature.check_args(args)?;
        let function = self.resolve(library, signature)?;

        log!(trace, "Invoking `{}` with {:?}", signature, args);
        let result = function.call_unchecked(args);
        log!(trace, "`{}` returned {:?}", signature.name(), result);
        Ok(result)
    }

    /// Get the number of cached resolutions
    pub fn resolved_count(&self) -> usize {
        self.resolved.read().len()
    }
}
