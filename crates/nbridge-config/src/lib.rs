//! nbridge Configuration
//!
//! Describes a single native call in `nbridge.toml`:
//! - Which library to load and where to look for it
//! - Which exported symbol to call, with which signature and arguments
//! - How to label the printed result
//!
//! Every field has a default, so `BridgeConfig::default()` is the stock
//! demonstration call: `add(i32, i32) -> i32` from the `native` library with
//! arguments `20` and `40`.
//!
//! # Example
//!
//! ```no_run
//! use nbridge_config::BridgeConfig;
//! use std::path::Path;
//!
//! let config = BridgeConfig::load_from_file(Path::new("nbridge.toml")).unwrap();
//! println!("calling {} from {}", config.call.symbol, config.library.name);
//! ```

pub mod bridge;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use bridge::{ArgLiteral, BridgeConfig, CallConfig, LibraryConfig, OutputConfig};
