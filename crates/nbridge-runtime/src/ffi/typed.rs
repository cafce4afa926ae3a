//! Signatures derived from Rust types
//!
//! `NativeBridge::bind::<(i32, i32), i32>(&lib, "add")` builds the signature
//! `add(i32, i32) -> i32` from the type parameters, resolves it once, and
//! returns a [`NativeFunction`] that can be called without further `unsafe`.

use crate::error::BridgeError;
use crate::ffi::caller::{NativeBridge, ResolvedFunction};
use crate::ffi::loader::LibraryHandle;
use crate::ffi::signature::FunctionSignature;
use crate::ffi::types::{NativeKind, NativeValue};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A Rust primitive that can cross the boundary
pub trait NativeType: Copy + Send + Sync + 'static {
    const KIND: NativeKind;

    fn into_native(self) -> NativeValue;
}

/// A Rust type usable as a native return value
pub trait NativeReturn: Sized {
    const KIND: NativeKind;

    /// Unwrap a value already known to have kind `Self::KIND`
    fn from_native(value: NativeValue) -> Self;
}

/// A tuple of [`NativeType`]s usable as an argument list
pub trait NativeArgs {
    fn kinds() -> Vec<NativeKind>;

    fn into_values(self) -> Vec<NativeValue>;
}

macro_rules! impl_native_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeType for $ty {
                const KIND: NativeKind = NativeKind::$variant;

                fn into_native(self) -> NativeValue {
                    NativeValue::$variant(self)
                }
            }

            impl NativeReturn for $ty {
                const KIND: NativeKind = NativeKind::$variant;

                fn from_native(value: NativeValue) -> Self {
                    match value {
                        NativeValue::$variant(v) => v,
                        other => unreachable!(
                            "native call returned {} where {} was declared",
                            other.kind(),
                            NativeKind::$variant
                        ),
                    }
                }
            }
        )*
    };
}

impl_native_type! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl NativeReturn for () {
    const KIND: NativeKind = NativeKind::Void;

    fn from_native(_value: NativeValue) -> Self {}
}

macro_rules! impl_native_args {
    ($($name:ident),*) => {
        impl<$($name: NativeType),*> NativeArgs for ($($name,)*) {
            fn kinds() -> Vec<NativeKind> {
                vec![$(<$name as NativeType>::KIND),*]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<NativeValue> {
                let ($($name,)*) = self;
                vec![$($name.into_native()),*]
            }
        }
    };
}

impl_native_args!();
impl_native_args!(A);
impl_native_args!(A, B);
impl_native_args!(A, B, C);
impl_native_args!(A, B, C, D);
impl_native_args!(A, B, C, D, E);
impl_native_args!(A, B, C, D, E, F);

/// A native function with a signature fixed by its type parameters
pub struct NativeFunction<Args, Ret> {
    function: Arc<ResolvedFunction>,
    _marker: PhantomData<fn(Args) -> Ret>,
}

impl<Args: NativeArgs, Ret: NativeReturn> NativeFunction<Args, Ret> {
    /// Call the native function
    pub fn call(&self, args: Args) -> Ret {
        let values = args.into_values();
        // SAFETY: the caller of `NativeBridge::bind` vouched that the symbol
        // implements this signature, and `values` matches it by construction.
        let result = unsafe { self.function.call_unchecked(&values) };
        Ret::from_native(result)
    }

    /// Signature derived from `Args` and `Ret`
    pub fn signature(&self) -> &FunctionSignature {
        self.function.signature()
    }
}

impl<Args, Ret> Clone for NativeFunction<Args, Ret> {
    fn clone(&self) -> Self {
        Self {
            function: Arc::clone(&self.function),
            _marker: PhantomData,
        }
    }
}

impl<Args, Ret> fmt::Debug for NativeFunction<Args, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeFunction")
            .field(&self.function.signature().to_string())
            .finish()
    }
}

impl NativeBridge {
    /// Bind an exported function to a statically typed signature
    ///
    /// # Safety
    ///
    /// The symbol `name` in `library` must implement the C signature
    /// described by `Args` and `Ret`. Calls through the returned function
    /// are undefined behaviour otherwise.
    pub unsafe fn bind<Args: NativeArgs, Ret: NativeReturn>(
        &self,
        library: &LibraryHandle,
        name: &str,
    ) -> Result<NativeFunction<Args, Ret>, BridgeError> {
        let signature = FunctionSignature::new(name, Args::kinds(), Ret::KIND)?;
        let function = self.resolve(library, &signature)?;
        Ok(NativeFunction {
            function,
            _marker: PhantomData,
        })
    }

    /// Wrap an in-process C function pointer as a typed function
    ///
    /// # Safety
    ///
    /// `code` must be a C-ABI function implementing `Args -> Ret`, valid for
    /// the lifetime of the returned value.
    pub unsafe fn bind_raw<Args: NativeArgs, Ret: NativeReturn>(
        code: *const std::ffi::c_void,
        name: &str,
    ) -> Result<NativeFunction<Args, Ret>, BridgeError> {
        let signature = FunctionSignature::new(name, Args::kinds(), Ret::KIND)?;
        Ok(NativeFunction {
            function: Arc::new(ResolvedFunction::from_raw(code, signature)),
            _marker: PhantomData,
        })
    }
}
