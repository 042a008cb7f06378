// Dynamic values produced and consumed by field access

use crate::packet::PacketType;
use std::fmt;
use std::sync::Arc;

/// The value of a single packet field.
///
/// Integer fields decode to `Int` and raw byte-string fields to `Bytes`.
/// A nested-packet field yields the referenced packet type itself (`Type`),
/// a marker for "this region is a sub-structure, address it separately"
/// rather than a decode of the buffer.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Int(i64),
    Bytes(Vec<u8>),
    Type(Arc<PacketType>),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Arc<PacketType>> {
        match self {
            FieldValue::Type(ptype) => Some(ptype),
            _ => None,
        }
    }

    /// A short name for the value's variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "integer",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Type(_) => "packet type",
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            // Nested-field values are constant references, so identity is
            // the right notion of equality.
            (FieldValue::Type(a), FieldValue::Type(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{}", value),
            FieldValue::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            FieldValue::Type(ptype) => write!(f, "<{}>", ptype.name()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(u8, i8, u16, i16, u32, i32, i64);

impl From<Vec<u8>> for FieldValue {
    fn from(bytes: Vec<u8>) -> Self {
        FieldValue::Bytes(bytes)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(bytes: &[u8]) -> Self {
        FieldValue::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for FieldValue {
    fn from(bytes: &[u8; N]) -> Self {
        FieldValue::Bytes(bytes.to_vec())
    }
}

impl From<Arc<PacketType>> for FieldValue {
    fn from(ptype: Arc<PacketType>) -> Self {
        FieldValue::Type(ptype)
    }
}
