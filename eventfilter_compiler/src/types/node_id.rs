//! Node identifiers and the small composite value types built on them
//!
//! Textual forms follow the protocol's conventional notation:
//! `ns=2;i=1234`, `ns=1;s=Boiler.Temperature`, `svr=1;nsu=urn:x;i=5`,
//! `2:Severity`.
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Failure to read a node id, expanded node id or qualified name from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdParseError {
    #[error("node id is empty")]
    Empty,

    #[error("invalid namespace index '{0}'")]
    InvalidNamespace(String),

    #[error("invalid server index '{0}'")]
    InvalidServerIndex(String),

    #[error("missing identifier type (expected i=, s=, g= or b=) in '{0}'")]
    MissingIdentifierType(String),

    #[error("invalid {kind} identifier '{text}'")]
    InvalidIdentifier { kind: &'static str, text: String },

    #[error("qualified name has an empty name part")]
    EmptyName,
}

/// Identifier part of a node id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(Uuid),
    Opaque(Vec<u8>),
}

/// Namespace-qualified node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    pub fn string(namespace: u16, value: &str) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.to_string()),
        }
    }

    /// BaseEventType, the implicit type definition of attribute operands
    pub fn base_event_type() -> Self {
        Self::numeric(0, 2041)
    }

    /// Parse `[ns=<u16>;](i=|s=|g=|b=)<value>`
    pub fn parse(text: &str) -> Result<Self, NodeIdParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NodeIdParseError::Empty);
        }

        let (namespace, rest) = match text.strip_prefix("ns=") {
            Some(after) => {
                let (ns, rest) = after
                    .split_once(';')
                    .ok_or_else(|| NodeIdParseError::MissingIdentifierType(text.to_string()))?;
                let namespace = ns
                    .parse::<u16>()
                    .map_err(|_| NodeIdParseError::InvalidNamespace(ns.to_string()))?;
                (namespace, rest)
            }
            None => (0, text),
        };

        let identifier = parse_identifier(rest)?;
        Ok(Self {
            namespace,
            identifier,
        })
    }
}

fn parse_identifier(text: &str) -> Result<Identifier, NodeIdParseError> {
    if let Some(value) = text.strip_prefix("i=") {
        let numeric = parse_u32(value).ok_or_else(|| NodeIdParseError::InvalidIdentifier {
            kind: "numeric",
            text: value.to_string(),
        })?;
        return Ok(Identifier::Numeric(numeric));
    }

    if let Some(value) = text.strip_prefix("s=") {
        return Ok(Identifier::String(value.to_string()));
    }

    if let Some(value) = text.strip_prefix("g=") {
        let guid = Uuid::parse_str(value).map_err(|_| NodeIdParseError::InvalidIdentifier {
            kind: "guid",
            text: value.to_string(),
        })?;
        return Ok(Identifier::Guid(guid));
    }

    if let Some(value) = text.strip_prefix("b=") {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(value)
            .map_err(|_| NodeIdParseError::InvalidIdentifier {
                kind: "opaque",
                text: value.to_string(),
            })?;
        return Ok(Identifier::Opaque(bytes));
    }

    Err(NodeIdParseError::MissingIdentifierType(text.to_string()))
}

fn parse_u32(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(value) => write!(f, "i={}", value),
            Identifier::String(value) => write!(f, "s={}", value),
            Identifier::Guid(value) => write!(f, "g={}", value),
            Identifier::Opaque(value) => write!(
                f,
                "b={}",
                base64::engine::general_purpose::STANDARD.encode(value)
            ),
        }
    }
}

/// Node id qualified by namespace URI and server index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: Option<String>,
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// Parse `[svr=<u32>;][nsu=<uri>;]<node id>`
    pub fn parse(text: &str) -> Result<Self, NodeIdParseError> {
        let mut rest = text.trim();
        let mut server_index = 0;
        let mut namespace_uri = None;

        if let Some(after) = rest.strip_prefix("svr=") {
            let (svr, tail) = after
                .split_once(';')
                .ok_or_else(|| NodeIdParseError::MissingIdentifierType(text.to_string()))?;
            server_index = svr
                .parse::<u32>()
                .map_err(|_| NodeIdParseError::InvalidServerIndex(svr.to_string()))?;
            rest = tail;
        }

        if let Some(after) = rest.strip_prefix("nsu=") {
            let (uri, tail) = after
                .split_once(';')
                .ok_or_else(|| NodeIdParseError::MissingIdentifierType(text.to_string()))?;
            namespace_uri = Some(uri.to_string());
            rest = tail;
        }

        Ok(Self {
            node_id: NodeId::parse(rest)?,
            namespace_uri,
            server_index,
        })
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if let Some(uri) = &self.namespace_uri {
            write!(f, "nsu={};", uri)?;
        }
        write!(f, "{}", self.node_id)
    }
}

/// Browse name qualified by a namespace index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace_index: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace_index: u16, name: &str) -> Self {
        Self {
            namespace_index,
            name: name.to_string(),
        }
    }

    /// Parse `[<u16>:]<name>`; a prefix that is not a number is part of the name
    pub fn parse(text: &str) -> Result<Self, NodeIdParseError> {
        let (namespace_index, name) = match text.split_once(':') {
            Some((prefix, name))
                if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                let ns = prefix
                    .parse::<u16>()
                    .map_err(|_| NodeIdParseError::InvalidNamespace(prefix.to_string()))?;
                (ns, name)
            }
            _ => (0, text),
        };

        if name.is_empty() {
            return Err(NodeIdParseError::EmptyName);
        }

        Ok(Self::new(namespace_index, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "{}:", self.namespace_index)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Human readable text with an optional locale
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedText {
    pub locale: Option<String>,
    pub text: String,
}

impl LocalizedText {
    pub fn new(locale: Option<&str>, text: &str) -> Self {
        Self {
            locale: locale.map(str::to_string),
            text: text.to_string(),
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locale {
            Some(locale) => write!(f, "{}:{}", locale, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Protocol status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

/// Symbolic status codes accepted in STATUSCODE literals
const STATUS_CODE_NAMES: &[(&str, u32)] = &[
    ("Good", 0x0000_0000),
    ("Uncertain", 0x4000_0000),
    ("Bad", 0x8000_0000),
    ("BadUnexpectedError", 0x8001_0000),
    ("BadInternalError", 0x8002_0000),
    ("BadOutOfMemory", 0x8003_0000),
    ("BadTimeout", 0x800A_0000),
    ("BadNodeIdUnknown", 0x8034_0000),
    ("BadAttributeIdInvalid", 0x8035_0000),
    ("BadEventFilterInvalid", 0x8047_0000),
    ("BadContentFilterInvalid", 0x8048_0000),
    ("BadFilterOperandInvalid", 0x8049_0000),
    ("BadTypeMismatch", 0x8074_0000),
    ("BadFilterOperatorInvalid", 0x80C1_0000),
    ("BadFilterOperatorUnsupported", 0x80C2_0000),
    ("BadFilterOperandCountMismatch", 0x80C3_0000),
    ("BadFilterElementInvalid", 0x80C4_0000),
    ("BadFilterLiteralInvalid", 0x80C5_0000),
];

impl StatusCode {
    pub const GOOD: Self = Self(0);

    pub fn from_name(name: &str) -> Option<Self> {
        STATUS_CODE_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| Self(*value))
    }

    pub fn name(&self) -> Option<&'static str> {
        STATUS_CODE_NAMES
            .iter()
            .find(|(_, value)| *value == self.0)
            .map(|(name, _)| *name)
    }

    pub fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    pub fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
