//! Attribute operands: node, browse path, attribute and index range
use super::node_id::{NodeId, QualifiedName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node attribute ids, numbered as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttributeId {
    NodeId,
    NodeClass,
    BrowseName,
    DisplayName,
    Description,
    WriteMask,
    UserWriteMask,
    IsAbstract,
    Symmetric,
    InverseName,
    ContainsNoLoops,
    EventNotifier,
    #[default]
    Value,
    DataType,
    ValueRank,
    ArrayDimensions,
    AccessLevel,
    UserAccessLevel,
    MinimumSamplingInterval,
    Historizing,
    Executable,
    UserExecutable,
    DataTypeDefinition,
    RolePermissions,
    UserRolePermissions,
    AccessRestrictions,
    AccessLevelEx,
}

const ALL_ATTRIBUTES: [AttributeId; 27] = [
    AttributeId::NodeId,
    AttributeId::NodeClass,
    AttributeId::BrowseName,
    AttributeId::DisplayName,
    AttributeId::Description,
    AttributeId::WriteMask,
    AttributeId::UserWriteMask,
    AttributeId::IsAbstract,
    AttributeId::Symmetric,
    AttributeId::InverseName,
    AttributeId::ContainsNoLoops,
    AttributeId::EventNotifier,
    AttributeId::Value,
    AttributeId::DataType,
    AttributeId::ValueRank,
    AttributeId::ArrayDimensions,
    AttributeId::AccessLevel,
    AttributeId::UserAccessLevel,
    AttributeId::MinimumSamplingInterval,
    AttributeId::Historizing,
    AttributeId::Executable,
    AttributeId::UserExecutable,
    AttributeId::DataTypeDefinition,
    AttributeId::RolePermissions,
    AttributeId::UserRolePermissions,
    AttributeId::AccessRestrictions,
    AttributeId::AccessLevelEx,
];

impl AttributeId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NodeId => "NodeId",
            Self::NodeClass => "NodeClass",
            Self::BrowseName => "BrowseName",
            Self::DisplayName => "DisplayName",
            Self::Description => "Description",
            Self::WriteMask => "WriteMask",
            Self::UserWriteMask => "UserWriteMask",
            Self::IsAbstract => "IsAbstract",
            Self::Symmetric => "Symmetric",
            Self::InverseName => "InverseName",
            Self::ContainsNoLoops => "ContainsNoLoops",
            Self::EventNotifier => "EventNotifier",
            Self::Value => "Value",
            Self::DataType => "DataType",
            Self::ValueRank => "ValueRank",
            Self::ArrayDimensions => "ArrayDimensions",
            Self::AccessLevel => "AccessLevel",
            Self::UserAccessLevel => "UserAccessLevel",
            Self::MinimumSamplingInterval => "MinimumSamplingInterval",
            Self::Historizing => "Historizing",
            Self::Executable => "Executable",
            Self::UserExecutable => "UserExecutable",
            Self::DataTypeDefinition => "DataTypeDefinition",
            Self::RolePermissions => "RolePermissions",
            Self::UserRolePermissions => "UserRolePermissions",
            Self::AccessRestrictions => "AccessRestrictions",
            Self::AccessLevelEx => "AccessLevelEx",
        }
    }

    /// Numeric id (1-based)
    pub fn id(self) -> u32 {
        ALL_ATTRIBUTES
            .iter()
            .position(|candidate| *candidate == self)
            .map(|index| index as u32 + 1)
            .unwrap_or(0)
    }

    pub fn from_id(id: u32) -> Option<Self> {
        let index = (id as usize).checked_sub(1)?;
        ALL_ATTRIBUTES.get(index).copied()
    }

    /// Look up by exact name, or by numeric id written as text
    pub fn from_name(name: &str) -> Option<Self> {
        if let Ok(id) = name.parse::<u32>() {
            return Self::from_id(id);
        }
        ALL_ATTRIBUTES
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == name)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dimension of an index range: a single index or an inclusive `low:high` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeDimension {
    pub low: u32,
    pub high: Option<u32>,
}

/// Array index range, e.g. `[2]`, `[0:4]`, `[1:2,0:3]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericRange {
    pub dimensions: Vec<RangeDimension>,
}

impl NumericRange {
    /// Parse the text between the brackets. Returns None when malformed:
    /// empty dimension, non-numeric bound, or `low >= high`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut dimensions = Vec::new();
        for part in text.split(',') {
            let dimension = match part.split_once(':') {
                Some((low, high)) => {
                    let low = low.parse::<u32>().ok()?;
                    let high = high.parse::<u32>().ok()?;
                    if low >= high {
                        return None;
                    }
                    RangeDimension {
                        low,
                        high: Some(high),
                    }
                }
                None => RangeDimension {
                    low: part.parse::<u32>().ok()?,
                    high: None,
                },
            };
            dimensions.push(dimension);
        }
        Some(Self { dimensions })
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dimension) in self.dimensions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match dimension.high {
                Some(high) => write!(f, "{}:{}", dimension.low, high)?,
                None => write!(f, "{}", dimension.low)?,
            }
        }
        Ok(())
    }
}

/// How a browse path step follows references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathReference {
    /// `/` any hierarchical reference
    Hierarchical,
    /// `.` aggregates only
    Aggregates,
}

impl PathReference {
    pub const fn delimiter(self) -> char {
        match self {
            Self::Hierarchical => '/',
            Self::Aggregates => '.',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowsePathElement {
    pub reference: PathReference,
    pub target: QualifiedName,
}

/// A reference to an attribute of an event field, relative to an event type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeOperand {
    pub type_definition: NodeId,
    pub browse_path: Vec<BrowsePathElement>,
    pub attribute_id: AttributeId,
    pub index_range: Option<NumericRange>,
}

impl AttributeOperand {
    /// `/Name` style operand on BaseEventType
    pub fn event_field(names: &[&str]) -> Self {
        Self {
            type_definition: NodeId::base_event_type(),
            browse_path: names
                .iter()
                .map(|name| BrowsePathElement {
                    reference: PathReference::Hierarchical,
                    target: QualifiedName::new(0, name),
                })
                .collect(),
            attribute_id: AttributeId::Value,
            index_range: None,
        }
    }
}

impl fmt::Display for AttributeOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.type_definition != NodeId::base_event_type() {
            write!(f, "{}", self.type_definition)?;
        }
        for element in &self.browse_path {
            write!(f, "{}{}", element.reference.delimiter(), element.target)?;
        }
        write!(f, "#{}", self.attribute_id)?;
        if let Some(range) = &self.index_range {
            write!(f, "[{}]", range)?;
        }
        Ok(())
    }
}
