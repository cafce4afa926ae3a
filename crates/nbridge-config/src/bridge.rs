//! Call Description (nbridge.toml)
//!
//! A config file names one library, one exported function and the literal
//! arguments to pass to it. Kind names (`"i32"`, `"f64"`, ...) are kept as
//! strings here and parsed by the runtime when the signature is built.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default logical library name
pub const DEFAULT_LIBRARY: &str = "native";

/// Default exported symbol
pub const DEFAULT_SYMBOL: &str = "add";

/// Default label printed before the result
pub const DEFAULT_LABEL: &str = "Addition is : ";

/// Complete call description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Library to load
    #[serde(default)]
    pub library: LibraryConfig,

    /// Function to call
    #[serde(default)]
    pub call: CallConfig,

    /// Result formatting
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[library]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LibraryConfig {
    /// Logical library name, or a path to the library file
    pub name: String,

    /// Extra directories searched before the platform defaults
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,

    /// Let the platform loader resolve the name when no search path has it
    pub system_fallback: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_LIBRARY.to_string(),
            search_paths: Vec::new(),
            system_fallback: true,
        }
    }
}

/// `[call]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CallConfig {
    /// Exported symbol name
    pub symbol: String,

    /// Parameter kind names, in order
    pub params: Vec<String>,

    /// Return kind name
    pub returns: String,

    /// Literal arguments, one per parameter
    pub args: Vec<ArgLiteral>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            params: vec!["i32".to_string(), "i32".to_string()],
            returns: "i32".to_string(),
            args: vec![ArgLiteral::Integer(20), ArgLiteral::Integer(40)],
        }
    }
}

/// `[output]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    /// Text printed immediately before the decimal result
    pub label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// Numeric literal as written in TOML
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgLiteral {
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
}

impl fmt::Display for ArgLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgLiteral::Integer(v) => write!(f, "{}", v),
            ArgLiteral::Float(v) => write!(f, "{}", v),
        }
    }
}

impl BridgeConfig {
    /// Load a call description from a file
    ///
    /// Relative search paths are resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a call description from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: PathBuf::from("<inline>"),
            error: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the call description
    pub fn validate(&self) -> ConfigResult<()> {
        check_identifier("library.name", &self.library.name)?;
        check_identifier("call.symbol", &self.call.symbol)?;

        if self.call.args.len() != self.call.params.len() {
            return Err(ConfigError::InvalidValue {
                field: "call.args".to_string(),
                reason: format!(
                    "expected {} arguments, got {}",
                    self.call.params.len(),
                    self.call.args.len()
                ),
            });
        }

        Ok(())
    }

    /// Prepend extra search directories (command line overrides)
    pub fn prepend_search_paths<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut merged: Vec<PathBuf> = paths.into_iter().collect();
        merged.append(&mut self.library.search_paths);
        self.library.search_paths = merged;
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        for path in &mut self.library.search_paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Reject empty or whitespace-padded library names and symbols
fn check_identifier(field: &str, value: &str) -> ConfigResult<()> {
    let reason = if value.trim().is_empty() {
        "cannot be empty"
    } else if value.trim() != value {
        "cannot have surrounding whitespace"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}
