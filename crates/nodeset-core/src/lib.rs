//! NodeSet graph: nodes, references, aliases and namespaces collected from a
//! document, plus the dependency ordering that turns them into a safe
//! creation sequence.

mod attributes;
mod graph;
mod namespace;
mod sort;

use thiserror::Error;
use ua_types::{NodeId, NodeIdError};

pub use attributes::Attributes;
pub use graph::{AliasDraft, Node, NodeAttributes, Nodeset, Reference, ReferenceDraft};
pub use namespace::{Namespace, NamespaceSlot, NamespaceTable, BASE_NAMESPACE_URI};
pub use sort::{OrderingPolicy, OrderingRule};

/// Error type produced while building or ordering a [`Nodeset`].
#[derive(Debug, Error)]
pub enum NodesetError {
    /// Two node elements declared the same NodeId.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),
    /// A reference-type or data-type designator is neither an alias nor a NodeId.
    #[error("unresolved alias: {0}")]
    UnresolvedAlias(String),
    /// NodeId text could not be parsed.
    #[error("invalid node id '{text}': {source}")]
    InvalidNodeId {
        text: String,
        #[source]
        source: NodeIdError,
    },
    /// A NodeId used a namespace index the document never declared.
    #[error("namespace index {0} is not declared")]
    UnknownNamespace(u16),
    /// A NodeId used a namespace uri the document never declared.
    #[error("namespace uri '{0}' is not declared")]
    UnknownNamespaceUri(String),
    /// A required attribute is absent on an element.
    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// An attribute is present but its value has the wrong form.
    #[error("attribute {attribute}='{value}' is invalid")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },
    /// Ordering-significant references form a cycle.
    #[error("dependency cycle among {} nodes: {}", .0.len(), format_ids(.0))]
    Cycle(Vec<NodeId>),
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
