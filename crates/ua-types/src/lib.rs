#![cfg_attr(docsrs, feature(doc_cfg))]
//! OPC UA identifier types shared by the NodeSet tooling.

use core::fmt;

use bitflags::bitflags;

mod node_id;
pub mod well_known;

pub use node_id::{Identifier, NamespaceRef, NodeIdError, NodeId, ParsedNodeId, QualifiedName};
pub use uuid::Uuid;

/// Node classes that can be declared in a NodeSet document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    ObjectType,
    VariableType,
    ReferenceType,
    DataType,
}

impl NodeClass {
    /// All classes in document vocabulary order.
    pub const ALL: [NodeClass; 7] = [
        NodeClass::Variable,
        NodeClass::Object,
        NodeClass::ObjectType,
        NodeClass::DataType,
        NodeClass::Method,
        NodeClass::ReferenceType,
        NodeClass::VariableType,
    ];

    /// XML element name declaring a node of this class.
    pub const fn element_name(self) -> &'static str {
        match self {
            NodeClass::Object => "UAObject",
            NodeClass::Variable => "UAVariable",
            NodeClass::Method => "UAMethod",
            NodeClass::ObjectType => "UAObjectType",
            NodeClass::VariableType => "UAVariableType",
            NodeClass::ReferenceType => "UAReferenceType",
            NodeClass::DataType => "UADataType",
        }
    }

    /// Map an XML element local name back to a node class.
    pub fn from_element_name(name: &str) -> Option<NodeClass> {
        NodeClass::ALL
            .into_iter()
            .find(|class| class.element_name() == name)
    }

    /// Whether nodes of this class carry a value subtree.
    pub const fn has_value(self) -> bool {
        matches!(self, NodeClass::Variable | NodeClass::VariableType)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeClass::Object => "Object",
            NodeClass::Variable => "Variable",
            NodeClass::Method => "Method",
            NodeClass::ObjectType => "ObjectType",
            NodeClass::VariableType => "VariableType",
            NodeClass::ReferenceType => "ReferenceType",
            NodeClass::DataType => "DataType",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// `AccessLevel` attribute of a Variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessLevel: u8 {
        const CURRENT_READ = 0x01;
        const CURRENT_WRITE = 0x02;
        const HISTORY_READ = 0x04;
        const HISTORY_WRITE = 0x08;
        const SEMANTIC_CHANGE = 0x10;
        const STATUS_WRITE = 0x20;
        const TIMESTAMP_WRITE = 0x40;
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::CURRENT_READ
    }
}

bitflags! {
    /// `EventNotifier` attribute of an Object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventNotifier: u8 {
        const SUBSCRIBE_TO_EVENTS = 0x01;
        const HISTORY_READ = 0x04;
        const HISTORY_WRITE = 0x08;
    }
}
