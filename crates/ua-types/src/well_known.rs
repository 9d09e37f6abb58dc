//! Namespace-0 node ids referenced by the NodeSet tooling.

use crate::NodeId;

pub const BASE_DATA_TYPE: u32 = 24;

pub const HIERARCHICAL_REFERENCES: u32 = 33;
pub const HAS_CHILD: u32 = 34;
pub const ORGANIZES: u32 = 35;
pub const HAS_EVENT_SOURCE: u32 = 36;
pub const HAS_MODELLING_RULE: u32 = 37;
pub const HAS_ENCODING: u32 = 38;
pub const HAS_TYPE_DEFINITION: u32 = 40;
pub const AGGREGATES: u32 = 44;
pub const HAS_SUBTYPE: u32 = 45;
pub const HAS_PROPERTY: u32 = 46;
pub const HAS_COMPONENT: u32 = 47;
pub const HAS_NOTIFIER: u32 = 48;
pub const HAS_ORDERED_COMPONENT: u32 = 49;

/// HierarchicalReferences and its standard subtypes.
pub const HIERARCHICAL: &[u32] = &[
    HIERARCHICAL_REFERENCES,
    HAS_CHILD,
    ORGANIZES,
    HAS_EVENT_SOURCE,
    AGGREGATES,
    HAS_SUBTYPE,
    HAS_PROPERTY,
    HAS_COMPONENT,
    HAS_NOTIFIER,
    HAS_ORDERED_COMPONENT,
];

/// References whose target defines the type or modelling rule of the source.
pub const TYPE_DEFINING: &[u32] = &[HAS_TYPE_DEFINITION, HAS_MODELLING_RULE];

/// Namespace-0 node id with a numeric identifier.
pub const fn ns0(id: u32) -> NodeId {
    NodeId::numeric(0, id)
}
