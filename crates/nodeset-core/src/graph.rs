use std::collections::HashMap;

use tracing::{debug, trace, warn};
use ua_types::{
    well_known, AccessLevel, EventNotifier, NamespaceRef, NodeClass, NodeId, ParsedNodeId,
    QualifiedName,
};

use crate::namespace::{NamespaceSlot, NamespaceTable};
use crate::sort::{self, OrderingPolicy};
use crate::{Attributes, NodesetError};

/// Class specific attributes of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttributes {
    Object {
        event_notifier: EventNotifier,
    },
    Variable {
        data_type: NodeId,
        value_rank: i32,
        array_dimensions: Vec<u32>,
        access_level: AccessLevel,
    },
    VariableType {
        data_type: NodeId,
        value_rank: i32,
        array_dimensions: Vec<u32>,
        is_abstract: bool,
    },
    Method {
        executable: bool,
    },
    ObjectType {
        is_abstract: bool,
    },
    ReferenceType {
        is_abstract: bool,
        symmetric: bool,
    },
    DataType {
        is_abstract: bool,
    },
}

/// Typed edge from the owning node to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub reference_type: NodeId,
    pub target: NodeId,
    pub is_forward: bool,
}

/// Node declared by the document.
///
/// `V` is the value handle produced by the value decoder; only Variable and
/// VariableType nodes ever carry one.
#[derive(Debug, Clone)]
pub struct Node<V> {
    pub id: NodeId,
    pub class: NodeClass,
    pub browse_name: Option<QualifiedName>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<NodeId>,
    pub symbolic_name: Option<String>,
    pub attributes: NodeAttributes,
    pub references: Vec<Reference>,
    pub value: Option<V>,
}

impl<V> Node<V> {
    /// Data type of Variable and VariableType nodes.
    pub fn data_type(&self) -> Option<&NodeId> {
        match &self.attributes {
            NodeAttributes::Variable { data_type, .. }
            | NodeAttributes::VariableType { data_type, .. } => Some(data_type),
            _ => None,
        }
    }

    /// First forward HasTypeDefinition target, if declared.
    pub fn type_definition(&self) -> Option<&NodeId> {
        let has_type_definition = well_known::ns0(well_known::HAS_TYPE_DEFINITION);
        self.references
            .iter()
            .find(|r| r.is_forward && r.reference_type == has_type_definition)
            .map(|r| &r.target)
    }
}

/// Alias element whose target text has not been read yet.
#[derive(Debug)]
#[must_use]
pub struct AliasDraft {
    name: String,
}

impl AliasDraft {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Reference element whose target text has not been read yet.
#[derive(Debug)]
#[must_use]
pub struct ReferenceDraft {
    reference_type: String,
    is_forward: bool,
}

/// Append-only graph built while a document is parsed.
#[derive(Debug)]
pub struct Nodeset<V> {
    nodes: Vec<Node<V>>,
    index: HashMap<NodeId, usize>,
    aliases: HashMap<String, NodeId>,
    namespaces: NamespaceTable,
}

impl<V> Default for Nodeset<V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            namespaces: NamespaceTable::new(),
        }
    }
}

impl<V> Nodeset<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a node of `class` from its element attributes.
    ///
    /// The node is not part of the graph until [`Nodeset::finish_node`].
    pub fn new_node(
        &self,
        class: NodeClass,
        attrs: &Attributes,
    ) -> Result<Node<V>, NodesetError> {
        let element = class.element_name();
        let id_text = attrs
            .get("NodeId")
            .ok_or(NodesetError::MissingAttribute {
                element,
                attribute: "NodeId",
            })?;
        let id = self.resolve_node_id(id_text)?;
        let browse_name = attrs
            .get("BrowseName")
            .map(|text| self.resolve_browse_name(text))
            .transpose()?;
        let parent = attrs
            .get("ParentNodeId")
            .map(|text| self.resolve_node_id(text))
            .transpose()?;

        let attributes = match class {
            NodeClass::Object => NodeAttributes::Object {
                event_notifier: EventNotifier::from_bits_truncate(
                    parse_attr(attrs, "EventNotifier")?.unwrap_or(0),
                ),
            },
            NodeClass::Variable => NodeAttributes::Variable {
                data_type: self.data_type_attr(attrs)?,
                value_rank: parse_attr(attrs, "ValueRank")?.unwrap_or(-1),
                array_dimensions: array_dimensions(attrs)?,
                access_level: parse_attr(attrs, "AccessLevel")?
                    .map(AccessLevel::from_bits_truncate)
                    .unwrap_or_default(),
            },
            NodeClass::VariableType => NodeAttributes::VariableType {
                data_type: self.data_type_attr(attrs)?,
                value_rank: parse_attr(attrs, "ValueRank")?.unwrap_or(-1),
                array_dimensions: array_dimensions(attrs)?,
                is_abstract: bool_attr(attrs, "IsAbstract")?.unwrap_or(false),
            },
            NodeClass::Method => NodeAttributes::Method {
                executable: bool_attr(attrs, "Executable")?.unwrap_or(true),
            },
            NodeClass::ObjectType => NodeAttributes::ObjectType {
                is_abstract: bool_attr(attrs, "IsAbstract")?.unwrap_or(false),
            },
            NodeClass::ReferenceType => NodeAttributes::ReferenceType {
                is_abstract: bool_attr(attrs, "IsAbstract")?.unwrap_or(false),
                symmetric: bool_attr(attrs, "Symmetric")?.unwrap_or(false),
            },
            NodeClass::DataType => NodeAttributes::DataType {
                is_abstract: bool_attr(attrs, "IsAbstract")?.unwrap_or(false),
            },
        };

        Ok(Node {
            id,
            class,
            browse_name,
            display_name: None,
            description: None,
            parent,
            symbolic_name: attrs.get("SymbolicName").map(str::to_string),
            attributes,
            references: Vec::new(),
            value: None,
        })
    }

    /// Intern a finished node.
    pub fn finish_node(&mut self, node: Node<V>) -> Result<(), NodesetError> {
        if self.index.contains_key(&node.id) {
            return Err(NodesetError::DuplicateNode(node.id));
        }
        debug!(
            node = %node.id,
            class = %node.class,
            references = node.references.len(),
            "node interned"
        );
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn new_alias(&self, attrs: &Attributes) -> Result<AliasDraft, NodesetError> {
        let name = attrs.get("Alias").ok_or(NodesetError::MissingAttribute {
            element: "Alias",
            attribute: "Alias",
        })?;
        Ok(AliasDraft {
            name: name.to_string(),
        })
    }

    /// Store the alias with `text` parsed as its target.
    pub fn finish_alias(&mut self, draft: AliasDraft, text: &str) -> Result<(), NodesetError> {
        let target = self.resolve_node_id(text)?;
        debug!(alias = %draft.name, target = %target, "alias declared");
        if let Some(previous) = self.aliases.insert(draft.name.clone(), target) {
            warn!(alias = %draft.name, previous = %previous, "alias redeclared");
        }
        Ok(())
    }

    pub fn new_namespace(&mut self) -> NamespaceSlot {
        self.namespaces.reserve_slot()
    }

    /// Record a declared namespace uri together with the host index `remap` assigns.
    pub fn finish_namespace(
        &mut self,
        slot: NamespaceSlot,
        remap: &mut dyn FnMut(&str) -> u16,
        text: &str,
    ) {
        let uri = text.trim().to_string();
        let index = remap(&uri);
        self.namespaces.fill(slot, uri, index);
    }

    pub fn new_reference(&self, attrs: &Attributes) -> Result<ReferenceDraft, NodesetError> {
        let reference_type = attrs
            .get("ReferenceType")
            .ok_or(NodesetError::MissingAttribute {
                element: "Reference",
                attribute: "ReferenceType",
            })?;
        Ok(ReferenceDraft {
            reference_type: reference_type.to_string(),
            is_forward: bool_attr(attrs, "IsForward")?.unwrap_or(true),
        })
    }

    /// Resolve the reference type, parse `text` as the target and append the
    /// reference to `node`.
    pub fn finish_reference(
        &self,
        draft: ReferenceDraft,
        node: &mut Node<V>,
        text: &str,
    ) -> Result<(), NodesetError> {
        let reference = Reference {
            reference_type: self.resolve_designator(&draft.reference_type)?,
            target: self.resolve_node_id(text)?,
            is_forward: draft.is_forward,
        };
        trace!(
            source = %node.id,
            reference_type = %reference.reference_type,
            target = %reference.target,
            forward = reference.is_forward,
            "reference added"
        );
        node.references.push(reference);
        Ok(())
    }

    /// Resolve an alias name or a literal NodeId.
    pub fn resolve_designator(&self, text: &str) -> Result<NodeId, NodesetError> {
        let text = text.trim();
        if let Some(id) = self.aliases.get(text) {
            return Ok(id.clone());
        }
        match text.parse::<ParsedNodeId>() {
            Ok(parsed) => self.translate(parsed),
            Err(_) => Err(NodesetError::UnresolvedAlias(text.to_string())),
        }
    }

    /// Parse NodeId text and translate its namespace into the host index.
    pub fn resolve_node_id(&self, text: &str) -> Result<NodeId, NodesetError> {
        let parsed: ParsedNodeId =
            text.parse()
                .map_err(|source| NodesetError::InvalidNodeId {
                    text: text.trim().to_string(),
                    source,
                })?;
        self.translate(parsed)
    }

    fn translate(&self, parsed: ParsedNodeId) -> Result<NodeId, NodesetError> {
        let namespace = match parsed.namespace {
            NamespaceRef::Index(index) => self.namespaces.translate(index)?,
            NamespaceRef::Uri(uri) => self.namespaces.index_of(&uri)?,
        };
        Ok(NodeId::new(namespace, parsed.identifier))
    }

    fn resolve_browse_name(&self, text: &str) -> Result<QualifiedName, NodesetError> {
        let mut name: QualifiedName =
            text.parse()
                .map_err(|source| NodesetError::InvalidNodeId {
                    text: text.to_string(),
                    source,
                })?;
        name.namespace = self.namespaces.translate(name.namespace)?;
        Ok(name)
    }

    fn data_type_attr(&self, attrs: &Attributes) -> Result<NodeId, NodesetError> {
        attrs
            .get("DataType")
            .map(|text| self.resolve_designator(text))
            .unwrap_or(Ok(well_known::ns0(well_known::BASE_DATA_TYPE)))
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node<V>] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node<V>> {
        self.position(id).map(|idx| &self.nodes[idx])
    }

    pub(crate) fn position(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn alias(&self, name: &str) -> Option<&NodeId> {
        self.aliases.get(name)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in dependency order without consuming the graph.
    pub fn sorted(&self, policy: &OrderingPolicy) -> Result<Vec<&Node<V>>, NodesetError> {
        let order = sort::dependency_order(self, policy)?;
        Ok(order.into_iter().map(|idx| &self.nodes[idx]).collect())
    }

    /// Consume the graph and return its nodes in dependency order.
    pub fn into_sorted(self, policy: &OrderingPolicy) -> Result<Vec<Node<V>>, NodesetError> {
        let order = sort::dependency_order(&self, policy)?;
        let mut slots: Vec<Option<Node<V>>> = self.nodes.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect())
    }
}

fn parse_attr<T: std::str::FromStr>(
    attrs: &Attributes,
    attribute: &'static str,
) -> Result<Option<T>, NodesetError> {
    attrs
        .get(attribute)
        .map(|value| {
            value.parse().map_err(|_| NodesetError::InvalidAttribute {
                attribute,
                value: value.to_string(),
            })
        })
        .transpose()
}

fn bool_attr(attrs: &Attributes, attribute: &'static str) -> Result<Option<bool>, NodesetError> {
    attrs
        .get(attribute)
        .map(|value| match value {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(NodesetError::InvalidAttribute {
                attribute,
                value: other.to_string(),
            }),
        })
        .transpose()
}

fn array_dimensions(attrs: &Attributes) -> Result<Vec<u32>, NodesetError> {
    let Some(text) = attrs.get("ArrayDimensions") else {
        return Ok(Vec::new());
    };
    text.split(',')
        .map(|dim| {
            dim.trim()
                .parse()
                .map_err(|_| NodesetError::InvalidAttribute {
                    attribute: "ArrayDimensions",
                    value: text.to_string(),
                })
        })
        .collect()
}
