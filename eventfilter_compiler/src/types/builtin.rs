//! Builtin type tags for literal values
//!
//! Numbering follows the protocol's builtin data type ids so the tags can be
//! carried through to an encoder unchanged.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Builtin scalar and composite types a literal can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    /// Dynamically typed value (JSON literals)
    Variant,
}

impl BuiltinType {
    /// Protocol builtin type id
    pub const fn id(self) -> u8 {
        match self {
            Self::Boolean => 1,
            Self::SByte => 2,
            Self::Byte => 3,
            Self::Int16 => 4,
            Self::UInt16 => 5,
            Self::Int32 => 6,
            Self::UInt32 => 7,
            Self::Int64 => 8,
            Self::UInt64 => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::String => 12,
            Self::DateTime => 13,
            Self::Guid => 14,
            Self::ByteString => 15,
            Self::NodeId => 17,
            Self::ExpandedNodeId => 18,
            Self::StatusCode => 19,
            Self::QualifiedName => 20,
            Self::LocalizedText => 21,
            Self::Variant => 24,
        }
    }

    /// Keyword that introduces a literal of this type in filter text
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::SByte => "SBYTE",
            Self::Byte => "BYTE",
            Self::Int16 => "INT16",
            Self::UInt16 => "UINT16",
            Self::Int32 => "INT32",
            Self::UInt32 => "UINT32",
            Self::Int64 => "INT64",
            Self::UInt64 => "UINT64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::DateTime => "DATETIME",
            Self::Guid => "GUID",
            Self::ByteString => "BYTESTRING",
            Self::NodeId => "NODEID",
            Self::ExpandedNodeId => "EXPANDEDNODEID",
            Self::StatusCode => "STATUSCODE",
            Self::QualifiedName => "QUALIFIEDNAME",
            Self::LocalizedText => "LOCALIZEDTEXT",
            Self::Variant => "JSON",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_protocol_numbering() {
        assert_eq!(BuiltinType::Boolean.id(), 1);
        assert_eq!(BuiltinType::Int32.id(), 6);
        assert_eq!(BuiltinType::LocalizedText.id(), 21);
        assert_eq!(BuiltinType::Variant.id(), 24);
    }

    #[test]
    fn test_classification() {
        assert!(BuiltinType::UInt16.is_integer());
        assert!(!BuiltinType::Double.is_integer());
        assert!(BuiltinType::Float.is_floating_point());
        assert_eq!(BuiltinType::Variant.to_string(), "JSON");
    }
}
