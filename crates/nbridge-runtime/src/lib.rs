//! nbridge runtime: load a native library and call one of its C functions
//!
//! The runtime has two parts, used in order:
//!
//! 1. [`LibraryLoader`] resolves a logical library name (`"native"`) to a
//!    platform file (`libnative.so`, `libnative.dylib`, `native.dll`), maps it
//!    once, and hands out a [`LibraryHandle`].
//! 2. [`NativeBridge`] resolves an exported symbol described by a
//!    [`FunctionSignature`] and calls it through the platform C calling
//!    convention, returning a [`NativeValue`] of the declared return kind.
//!
//! # Example
//!
//! ```no_run
//! use nbridge_runtime::{FunctionSignature, LibraryLoader, NativeBridge, NativeKind, NativeValue};
//!
//! let loader = LibraryLoader::new();
//! let library = loader.load("native")?;
//!
//! let add = FunctionSignature::new(
//!     "add",
//!     vec![NativeKind::I32, NativeKind::I32],
//!     NativeKind::I32,
//! )?;
//! let bridge = NativeBridge::new();
//!
//! // SAFETY: the `native` library exports `int32_t add(int32_t, int32_t)`.
//! let args = [NativeValue::I32(20), NativeValue::I32(40)];
//! let sum = unsafe { bridge.invoke(&library, &add, &args)? };
//! assert_eq!(sum, NativeValue::I32(60));
//! # Ok::<(), nbridge_runtime::BridgeError>(())
//! ```
//!
//! # Safety
//!
//! Nothing can check that a signature matches what the native side actually
//! implements. The raw call APIs are `unsafe fn`; the typed
//! [`NativeBridge::bind`] moves that obligation to bind time.

pub mod error;
pub mod ffi;

#[doc(hidden)]
pub use ::log as __log;

#[macro_export]
macro_rules! log {
    ($level:tt, $pattern:expr $(, $values:expr)* $(,)?) => {
        $crate::__log::$level!(
            target: "nbridge::runtime",
            $pattern $(, $values)*
        )
    };
}

pub use error::{BridgeError, BridgeResult, CallError, LoadError, SignatureError};
pub use ffi::{
    FunctionSignature, LibraryHandle, LibraryLoader, NativeArgs, NativeBridge, NativeFunction,
    NativeKind, NativeReturn, NativeType, NativeValue, ResolvedFunction,
};
