//! Declared shape of an exported native function

use crate::error::{CallError, SignatureError};
use crate::ffi::types::{NativeKind, NativeValue};
use libffi::middle::Cif;
use nbridge_config::{ArgLiteral, CallConfig};
use std::fmt;

/// Exported symbol name, ordered parameter kinds and return kind
///
/// Immutable once built. Two equal signatures resolved against the same
/// library share one cached symbol resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    name: String,
    params: Vec<NativeKind>,
    returns: NativeKind,
}

impl FunctionSignature {
    /// Build a signature
    ///
    /// Fails for an empty name, a name containing NUL, or a `void` parameter.
    pub fn new(
        name: impl Into<String>,
        params: impl Into<Vec<NativeKind>>,
        returns: NativeKind,
    ) -> Result<Self, SignatureError> {
        let name = name.into();
        let params = params.into();

        if name.is_empty() {
            return Err(SignatureError::EmptyName);
        }
        if name.contains('\0') {
            return Err(SignatureError::InvalidName(name));
        }
        if let Some(index) = params.iter().position(|kind| *kind == NativeKind::Void) {
            return Err(SignatureError::VoidParameter { name, index });
        }

        Ok(Self {
            name,
            params,
            returns,
        })
    }

    /// Build a signature from the `[call]` table of a config file
    pub fn from_config(call: &CallConfig) -> Result<Self, SignatureError> {
        let params = call
            .params
            .iter()
            .map(|p| p.parse::<NativeKind>())
            .collect::<Result<Vec<_>, _>>()?;
        let returns = call.returns.parse::<NativeKind>()?;
        Self::new(call.symbol.as_str(), params, returns)
    }

    /// Exported symbol name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter kinds, in order
    pub fn params(&self) -> &[NativeKind] {
        &self.params
    }

    /// Return kind
    pub fn returns(&self) -> NativeKind {
        self.returns
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Convert config literals into arguments for this signature
    pub fn values_from_literals(
        &self,
        literals: &[ArgLiteral],
    ) -> Result<Vec<NativeValue>, SignatureError> {
        if literals.len() != self.params.len() {
            return Err(SignatureError::ArgumentCount {
                expected: self.params.len(),
                got: literals.len(),
            });
        }

        self.params
            .iter()
            .zip(literals)
            .enumerate()
            .map(|(index, (kind, literal))| {
                NativeValue::from_literal(*kind, literal, index)
            })
            .collect()
    }

    /// Check argument count and kinds against the declared parameters
    pub fn check_args(&self, args: &[NativeValue]) -> Result<(), CallError> {
        if args.len() != self.params.len() {
            return Err(CallError::SignatureMismatch {
                symbol: self.name.clone(),
                reason: format!(
                    "expected {} arguments, got {}",
                    self.params.len(),
                    args.len()
                ),
            });
        }

        for (index, (arg, kind)) in args.iter().zip(&self.params).enumerate() {
            if arg.kind() != *kind {
                return Err(CallError::SignatureMismatch {
                    symbol: self.name.clone(),
                    reason: format!("argument {} is {}, expected {}", index, arg.kind(), kind),
                });
            }
        }

        Ok(())
    }

    /// libffi call interface for the platform C ABI
    pub(crate) fn cif(&self) -> Cif {
        Cif::new(
            self.params.iter().map(NativeKind::ffi_type).collect::<Vec<_>>(),
            self.returns.ffi_type(),
        )
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(NativeKind::name).collect();
        write!(
            f,
            "{}({}) -> {}",
            self.name,
            params.join(", "),
            self.returns
        )
    }
}
