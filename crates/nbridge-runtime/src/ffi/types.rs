//! Primitive kinds and values crossing the native boundary
//!
//! Type mapping (Rust ↔ C ↔ libffi):
//! - NativeKind::I8 .. I64 → int8_t .. int64_t → ffi_type_sint8 .. sint64
//! - NativeKind::U8 .. U64 → uint8_t .. uint64_t → ffi_type_uint8 .. uint64
//! - NativeKind::F32 / F64 → float / double → ffi_type_float / double
//! - NativeKind::Void → void (return only) → ffi_type_void

use crate::error::SignatureError;
use libffi::middle::{arg, Arg, Type};
use nbridge_config::ArgLiteral;
use std::fmt;
use std::str::FromStr;

/// Primitive kind of a parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// No value (return kind only)
    Void,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NativeKind {
    /// Short name as used in config files and signatures
    pub fn name(&self) -> &'static str {
        match self {
            NativeKind::Void => "void",
            NativeKind::I8 => "i8",
            NativeKind::I16 => "i16",
            NativeKind::I32 => "i32",
            NativeKind::I64 => "i64",
            NativeKind::U8 => "u8",
            NativeKind::U16 => "u16",
            NativeKind::U32 => "u32",
            NativeKind::U64 => "u64",
            NativeKind::F32 => "f32",
            NativeKind::F64 => "f64",
        }
    }

    /// Size in bytes of a value of this kind
    pub fn size(&self) -> usize {
        match self {
            NativeKind::Void => 0,
            NativeKind::I8 | NativeKind::U8 => 1,
            NativeKind::I16 | NativeKind::U16 => 2,
            NativeKind::I32 | NativeKind::U32 | NativeKind::F32 => 4,
            NativeKind::I64 | NativeKind::U64 | NativeKind::F64 => 8,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            NativeKind::I8
                | NativeKind::I16
                | NativeKind::I32
                | NativeKind::I64
                | NativeKind::U8
                | NativeKind::U16
                | NativeKind::U32
                | NativeKind::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NativeKind::F32 | NativeKind::F64)
    }

    /// libffi type descriptor for this kind
    pub(crate) fn ffi_type(&self) -> Type {
        match self {
            NativeKind::Void => Type::void(),
            NativeKind::I8 => Type::i8(),
            NativeKind::I16 => Type::i16(),
            NativeKind::I32 => Type::i32(),
            NativeKind::I64 => Type::i64(),
            NativeKind::U8 => Type::u8(),
            NativeKind::U16 => Type::u16(),
            NativeKind::U32 => Type::u32(),
            NativeKind::U64 => Type::u64(),
            NativeKind::F32 => Type::f32(),
            NativeKind::F64 => Type::f64(),
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NativeKind {
    type Err = SignatureError;

    /// Accepts the short names plus the usual C spellings (`int`, `int32_t`, `double`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "void" => Ok(NativeKind::Void),
            "i8" | "int8" | "int8_t" | "char" | "signed char" => Ok(NativeKind::I8),
            "i16" | "int16" | "int16_t" | "short" => Ok(NativeKind::I16),
            "i32" | "int32" | "int32_t" | "int" => Ok(NativeKind::I32),
            "i64" | "int64" | "int64_t" | "long long" => Ok(NativeKind::I64),
            "u8" | "uint8" | "uint8_t" | "unsigned char" => Ok(NativeKind::U8),
            "u16" | "uint16" | "uint16_t" | "unsigned short" => Ok(NativeKind::U16),
            "u32" | "uint32" | "uint32_t" | "unsigned" | "unsigned int" => Ok(NativeKind::U32),
            "u64" | "uint64" | "uint64_t" | "unsigned long long" => Ok(NativeKind::U64),
            "f32" | "float" => Ok(NativeKind::F32),
            "f64" | "double" => Ok(NativeKind::F64),
            _ => Err(SignatureError::UnknownKind(s.to_string())),
        }
    }
}

/// A primitive value tagged with its kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Void,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl NativeValue {
    /// Kind of this value
    pub fn kind(&self) -> NativeKind {
        match self {
            NativeValue::Void => NativeKind::Void,
            NativeValue::I8(_) => NativeKind::I8,
            NativeValue::I16(_) => NativeKind::I16,
            NativeValue::I32(_) => NativeKind::I32,
            NativeValue::I64(_) => NativeKind::I64,
            NativeValue::U8(_) => NativeKind::U8,
            NativeValue::U16(_) => NativeKind::U16,
            NativeValue::U32(_) => NativeKind::U32,
            NativeValue::U64(_) => NativeKind::U64,
            NativeValue::F32(_) => NativeKind::F32,
            NativeValue::F64(_) => NativeKind::F64,
        }
    }

    /// Convert a config literal into a value of `kind`
    ///
    /// Integers must fit the target kind. Integer literals are accepted for
    /// float kinds; float literals are rejected for integer kinds.
    pub fn from_literal(
        kind: NativeKind,
        literal: &ArgLiteral,
        index: usize,
    ) -> Result<Self, SignatureError> {
        let out_of_range = || SignatureError::ArgumentOutOfRange {
            index,
            kind,
            value: literal.to_string(),
        };

        match (*literal, kind) {
            (_, NativeKind::Void) => Err(SignatureError::ArgumentKind {
                index,
                kind,
                value: literal.to_string(),
            }),
            (ArgLiteral::Integer(v), NativeKind::I8) => {
                i8::try_from(v).map(NativeValue::I8).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::I16) => {
                i16::try_from(v).map(NativeValue::I16).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::I32) => {
                i32::try_from(v).map(NativeValue::I32).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::I64) => Ok(NativeValue::I64(v)),
            (ArgLiteral::Integer(v), NativeKind::U8) => {
                u8::try_from(v).map(NativeValue::U8).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::U16) => {
                u16::try_from(v).map(NativeValue::U16).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::U32) => {
                u32::try_from(v).map(NativeValue::U32).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::U64) => {
                u64::try_from(v).map(NativeValue::U64).map_err(|_| out_of_range())
            }
            (ArgLiteral::Integer(v), NativeKind::F32) => Ok(NativeValue::F32(v as f32)),
            (ArgLiteral::Integer(v), NativeKind::F64) => Ok(NativeValue::F64(v as f64)),
            (ArgLiteral::Float(v), NativeKind::F32) => Ok(NativeValue::F32(v as f32)),
            (ArgLiteral::Float(v), NativeKind::F64) => Ok(NativeValue::F64(v)),
            (ArgLiteral::Float(_), _) => Err(SignatureError::ArgumentKind {
                index,
                kind,
                value: literal.to_string(),
            }),
        }
    }

    /// libffi argument pointing at this value
    ///
    /// The returned `Arg` borrows `self` by address; keep the value alive and
    /// unmoved until the call returns.
    pub(crate) fn as_arg(&self) -> Arg {
        match self {
            NativeValue::Void => unreachable!("void is never passed as an argument"),
            NativeValue::I8(v) => arg(v),
            NativeValue::I16(v) => arg(v),
            NativeValue::I32(v) => arg(v),
            NativeValue::I64(v) => arg(v),
            NativeValue::U8(v) => arg(v),
            NativeValue::U16(v) => arg(v),
            NativeValue::U32(v) => arg(v),
            NativeValue::U64(v) => arg(v),
            NativeValue::F32(v) => arg(v),
            NativeValue::F64(v) => arg(v),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Void => Ok(()),
            NativeValue::I8(v) => write!(f, "{}", v),
            NativeValue::I16(v) => write!(f, "{}", v),
            NativeValue::I32(v) => write!(f, "{}", v),
            NativeValue::I64(v) => write!(f, "{}", v),
            NativeValue::U8(v) => write!(f, "{}", v),
            NativeValue::U16(v) => write!(f, "{}", v),
            NativeValue::U32(v) => write!(f, "{}", v),
            NativeValue::U64(v) => write!(f, "{}", v),
            NativeValue::F32(v) => write!(f, "{}", v),
            NativeValue::F64(v) => write!(f, "{}", v),
        }
    }
}
