//! Value and address types shared by the converter, the attribute-path
//! parser and the assembled filter

pub mod attribute;
pub mod builtin;
pub mod node_id;
pub mod variant;

pub use attribute::{
    AttributeId, AttributeOperand, BrowsePathElement, NumericRange, PathReference,
    RangeDimension,
};
pub use builtin::BuiltinType;
pub use node_id::{
    ExpandedNodeId, Identifier, LocalizedText, NodeId, NodeIdParseError, QualifiedName,
    StatusCode,
};
pub use variant::Variant;
