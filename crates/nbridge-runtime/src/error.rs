//! Error types for loading libraries and calling native functions

use crate::ffi::NativeKind;
use std::path::PathBuf;
use thiserror::Error;

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// No file for the logical name in any search location
    #[error("library '{name}' not found (searched {} locations)", .searched.len())]
    NotFound {
        name: String,
        searched: Vec<PathBuf>,
    },

    /// A candidate file exists but could not be mapped
    #[error("failed to load library '{name}' from {}: {reason}", .path.display())]
    LoadFailed {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

/// Native call errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The library does not export the requested symbol
    #[error("symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    /// Arguments do not match the declared parameter kinds
    #[error("signature mismatch calling '{symbol}': {reason}")]
    SignatureMismatch { symbol: String, reason: String },
}

/// Invalid function signatures or argument literals
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("function name cannot be empty")]
    EmptyName,

    #[error("invalid function name '{0}': names cannot contain NUL bytes")]
    InvalidName(String),

    #[error("parameter {index} of '{name}' cannot be void")]
    VoidParameter { name: String, index: usize },

    #[error("unknown native kind '{0}'")]
    UnknownKind(String),

    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("argument {index} ({value}) is out of range for {kind}")]
    ArgumentOutOfRange {
        index: usize,
        kind: NativeKind,
        value: String,
    },

    #[error("argument {index} ({value}) cannot be passed as {kind}")]
    ArgumentKind {
        index: usize,
        kind: NativeKind,
        value: String,
    },
}

/// Any error raised while preparing or performing a native call
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Config(#[from] nbridge_config::ConfigError),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
