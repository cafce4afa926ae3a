//! Foreign Function Interface infrastructure
//!
//! - `types`: primitive kinds and values crossing the boundary
//! - `signature`: declared shape of an exported function
//! - `loader`: library resolution, mapping and caching
//! - `caller`: symbol resolution and calls through libffi
//! - `typed`: signatures derived from Rust types
//!
//! # Safety
//!
//! All `unsafe` code of the crate lives in this module. Mapping a library runs
//! its initialisers, and calling a symbol through a wrong signature is
//! undefined behaviour that no check here can catch.

pub mod caller;
pub mod loader;
pub mod signature;
pub mod typed;
pub mod types;

pub use caller::{NativeBridge, ResolvedFunction};
pub use loader::{LibraryHandle, LibraryLoader};
pub use signature::FunctionSignature;
pub use typed::{NativeArgs, NativeFunction, NativeReturn, NativeType};
pub use types::{NativeKind, NativeValue};
