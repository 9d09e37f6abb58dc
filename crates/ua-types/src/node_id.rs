use core::fmt;
use core::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Error produced when NodeId or QualifiedName text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    /// Input was empty after trimming.
    #[error("empty node id")]
    Empty,
    /// The `ns=`/`nsu=` prefix was not followed by `;` and an identifier.
    #[error("missing identifier after namespace prefix in '{0}'")]
    MissingIdentifier(String),
    /// The namespace index is not a valid `u16`.
    #[error("invalid namespace index in '{0}'")]
    InvalidNamespace(String),
    /// Identifier prefix was not one of `i=`, `s=`, `g=`, `b=`.
    #[error("unknown identifier type in '{0}'")]
    UnknownKind(String),
    /// Numeric identifier does not fit `u32`.
    #[error("invalid numeric identifier in '{0}'")]
    InvalidNumeric(String),
    /// GUID identifier is not a valid UUID string.
    #[error("invalid guid identifier in '{0}'")]
    InvalidGuid(String),
    /// A `nsu=` form was given where only a namespace index is accepted.
    #[error("namespace uri not allowed here: '{0}'")]
    NamespaceUri(String),
}

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    /// `i=<u32>`
    Numeric(u32),
    /// `s=<text>`
    String(String),
    /// `g=<uuid>`
    Guid(Uuid),
    /// `b=<base64>`; kept in its textual form, identity is textual.
    Opaque(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(value) => write!(f, "i={value}"),
            Identifier::String(value) => write!(f, "s={value}"),
            Identifier::Guid(value) => write!(f, "g={}", value.hyphenated()),
            Identifier::Opaque(value) => write!(f, "b={value}"),
        }
    }
}

impl FromStr for Identifier {
    type Err = NodeIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(value) = text.strip_prefix("i=") {
            value
                .trim()
                .parse()
                .map(Identifier::Numeric)
                .map_err(|_| NodeIdError::InvalidNumeric(text.to_string()))
        } else if let Some(value) = text.strip_prefix("s=") {
            Ok(Identifier::String(value.to_string()))
        } else if let Some(value) = text.strip_prefix("g=") {
            Uuid::parse_str(value.trim())
                .map(Identifier::Guid)
                .map_err(|_| NodeIdError::InvalidGuid(text.to_string()))
        } else if let Some(value) = text.strip_prefix("b=") {
            Ok(Identifier::Opaque(value.trim().to_string()))
        } else {
            Err(NodeIdError::UnknownKind(text.to_string()))
        }
    }
}

/// OPC UA node identity: namespace index plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    /// Create a node id from its parts.
    pub fn new(namespace: u16, identifier: Identifier) -> Self {
        Self {
            namespace,
            identifier,
        }
    }

    /// Numeric node id, the common case for standard nodes.
    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    /// String node id.
    pub fn string<S: Into<String>>(namespace: u16, value: S) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    /// Whether the node lives in the base OPC UA namespace.
    pub fn is_base_namespace(&self) -> bool {
        self.namespace == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        write!(f, "{}", self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parsed: ParsedNodeId = text.parse()?;
        match parsed.namespace {
            NamespaceRef::Index(namespace) => Ok(NodeId::new(namespace, parsed.identifier)),
            NamespaceRef::Uri(_) => Err(NodeIdError::NamespaceUri(text.trim().to_string())),
        }
    }
}

/// Namespace designator as written in a document, before any remapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceRef {
    /// `ns=<index>` or no prefix (index 0).
    Index(u16),
    /// `nsu=<uri>`.
    Uri(String),
}

/// NodeId text split into its document-local parts.
///
/// Document indices are only meaningful relative to the namespace table of
/// the document they come from; callers translate them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNodeId {
    pub namespace: NamespaceRef,
    pub identifier: Identifier,
}

impl FromStr for ParsedNodeId {
    type Err = NodeIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(NodeIdError::Empty);
        }
        let (namespace, rest) = if let Some(rest) = trimmed.strip_prefix("ns=") {
            let (index, rest) = rest
                .split_once(';')
                .ok_or_else(|| NodeIdError::MissingIdentifier(trimmed.to_string()))?;
            let index = index
                .trim()
                .parse()
                .map_err(|_| NodeIdError::InvalidNamespace(trimmed.to_string()))?;
            (NamespaceRef::Index(index), rest)
        } else if let Some(rest) = trimmed.strip_prefix("nsu=") {
            let (uri, rest) = rest
                .split_once(';')
                .ok_or_else(|| NodeIdError::MissingIdentifier(trimmed.to_string()))?;
            (NamespaceRef::Uri(uri.to_string()), rest)
        } else {
            (NamespaceRef::Index(0), trimmed)
        };
        Ok(ParsedNodeId {
            namespace,
            identifier: rest.parse()?,
        })
    }
}

/// Browse name with its namespace index, written `"<ns>:<name>"` in documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new<S: Into<String>>(namespace: u16, name: S) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = NodeIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        // Only a purely numeric prefix is a namespace index; "Foo:Bar" is a plain name.
        if let Some((prefix, name)) = text.split_once(':') {
            if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
                let namespace = prefix
                    .parse()
                    .map_err(|_| NodeIdError::InvalidNamespace(text.to_string()))?;
                return Ok(QualifiedName::new(namespace, name));
            }
        }
        Ok(QualifiedName::new(0, text))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for QualifiedName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
