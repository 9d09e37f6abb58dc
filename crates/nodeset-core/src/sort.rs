use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;
use ua_types::{well_known, NodeClass, NodeId};

use crate::{Nodeset, NodesetError};

/// How a reference type constrains creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingRule {
    /// The forward target defines the source (HasTypeDefinition,
    /// HasModellingRule): target before source.
    TypeDefinition,
    /// The forward source is the parent of the target (Organizes,
    /// HasComponent, HasSubtype, ...): source before target. This is the
    /// opposite of `TypeDefinition`, where a forward target comes first;
    /// hierarchical references point from parent to child, so the parent
    /// is the prerequisite.
    Hierarchical,
}

impl OrderingRule {
    /// Whether the referenced target must be created before the owning node.
    fn target_first(self, is_forward: bool) -> bool {
        match self {
            OrderingRule::TypeDefinition => is_forward,
            OrderingRule::Hierarchical => !is_forward,
        }
    }
}

/// Table of ordering-significant reference types.
#[derive(Debug, Clone)]
pub struct OrderingPolicy {
    rules: HashMap<NodeId, OrderingRule>,
    order_base_namespace: bool,
}

impl Default for OrderingPolicy {
    /// Standard namespace-0 hierarchy plus HasTypeDefinition/HasModellingRule.
    fn default() -> Self {
        let mut policy = OrderingPolicy::empty();
        for &id in well_known::HIERARCHICAL {
            policy.rules.insert(well_known::ns0(id), OrderingRule::Hierarchical);
        }
        for &id in well_known::TYPE_DEFINING {
            policy
                .rules
                .insert(well_known::ns0(id), OrderingRule::TypeDefinition);
        }
        policy
    }
}

impl OrderingPolicy {
    /// Policy without any ordering-significant reference type.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            order_base_namespace: false,
        }
    }

    pub fn with_rule(mut self, reference_type: NodeId, rule: OrderingRule) -> Self {
        self.rules.insert(reference_type, rule);
        self
    }

    pub fn without(mut self, reference_type: &NodeId) -> Self {
        self.rules.remove(reference_type);
        self
    }

    /// Also order nodes after prerequisites that live in namespace 0.
    ///
    /// Off by default: namespace-0 nodes are expected to exist already in the
    /// consuming address space.
    pub fn order_base_namespace(mut self, enabled: bool) -> Self {
        self.order_base_namespace = enabled;
        self
    }

    pub fn rule(&self, reference_type: &NodeId) -> Option<OrderingRule> {
        self.rules.get(reference_type).copied()
    }

    /// Classify reference types declared in `nodeset` by inheriting the rule of
    /// their nearest classified supertype.
    pub fn extend_from<V>(&mut self, nodeset: &Nodeset<V>) {
        let has_subtype = well_known::ns0(well_known::HAS_SUBTYPE);
        let mut supertypes: Vec<(NodeId, NodeId)> = Vec::new();
        for node in nodeset.nodes() {
            if node.class != NodeClass::ReferenceType {
                continue;
            }
            for reference in &node.references {
                if reference.reference_type != has_subtype {
                    continue;
                }
                if reference.is_forward {
                    supertypes.push((reference.target.clone(), node.id.clone()));
                } else {
                    supertypes.push((node.id.clone(), reference.target.clone()));
                }
            }
        }

        loop {
            let mut changed = false;
            for (subtype, supertype) in &supertypes {
                if self.rules.contains_key(subtype) {
                    continue;
                }
                if let Some(rule) = self.rule(supertype) {
                    debug!(reference_type = %subtype, supertype = %supertype, ?rule, "classified reference type");
                    self.rules.insert(subtype.clone(), rule);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Declaration indices of `nodeset` in a creation-safe order.
///
/// Kahn's algorithm over "prerequisite before dependent" edges; among ready
/// nodes the earliest declared one is emitted first, so the result is
/// deterministic for a given document.
pub(crate) fn dependency_order<V>(
    nodeset: &Nodeset<V>,
    policy: &OrderingPolicy,
) -> Result<Vec<usize>, NodesetError> {
    let nodes = nodeset.nodes();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    let mut edges = 0usize;

    for (idx, node) in nodes.iter().enumerate() {
        for reference in &node.references {
            let Some(rule) = policy.rule(&reference.reference_type) else {
                continue;
            };
            // Targets outside the document are assumed to exist already.
            let Some(other) = nodeset.position(&reference.target) else {
                continue;
            };
            if other == idx {
                continue;
            }
            let (before, after) = if rule.target_first(reference.is_forward) {
                (other, idx)
            } else {
                (idx, other)
            };
            if !policy.order_base_namespace && nodes[before].id.is_base_namespace() {
                continue;
            }
            dependents[before].push(after);
            in_degree[after] += 1;
            edges += 1;
        }
    }
    debug!(nodes = nodes.len(), edges, "dependency graph built");

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &next in &dependents[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < nodes.len() {
        let stuck = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .map(|(idx, _)| nodes[idx].id.clone())
            .collect();
        return Err(NodesetError::Cycle(stuck));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attributes, Node};

    const ORGANIZES: &str = "i=35";
    const HAS_SUBTYPE: &str = "i=45";
    const HAS_TYPE_DEFINITION: &str = "i=40";
    const HAS_ENCODING: &str = "i=38";

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    struct Builder {
        nodeset: Nodeset<()>,
    }

    impl Builder {
        fn new() -> Self {
            let mut nodeset = Nodeset::new();
            let slot = nodeset.new_namespace();
            nodeset.finish_namespace(slot, &mut |_| 1, "http://example.org/UA/");
            Self { nodeset }
        }

        /// Add `ns=1;i=<id>` with references `(type, target text, forward)`.
        fn node(mut self, class: NodeClass, id: u32, refs: &[(&str, &str, bool)]) -> Self {
            let node_id = format!("ns=1;i={id}");
            let mut node: Node<()> = self
                .nodeset
                .new_node(class, &attrs(&[("NodeId", node_id.as_str())]))
                .unwrap();
            for (ty, target, forward) in refs {
                let forward = forward.to_string();
                let draft = self
                    .nodeset
                    .new_reference(&attrs(&[("ReferenceType", *ty), ("IsForward", forward.as_str())]))
                    .unwrap();
                self.nodeset
                    .finish_reference(draft, &mut node, target)
                    .unwrap();
            }
            self.nodeset.finish_node(node).unwrap();
            self
        }

        fn order(&self, policy: &OrderingPolicy) -> Vec<u32> {
            self.nodeset
                .sorted(policy)
                .expect("sort")
                .into_iter()
                .map(|node| match node.id.identifier {
                    ua_types::Identifier::Numeric(value) => value,
                    _ => unreachable!(),
                })
                .collect()
        }
    }

    #[test]
    fn type_definition_target_precedes_instance() {
        let set = Builder::new()
            .node(
                NodeClass::Variable,
                1001,
                &[(HAS_TYPE_DEFINITION, "ns=1;i=1000", true)],
            )
            .node(NodeClass::VariableType, 1000, &[(HAS_SUBTYPE, "i=63", false)]);
        assert_eq!(set.order(&OrderingPolicy::default()), vec![1000, 1001]);
    }

    #[test]
    fn inverse_subtype_parent_precedes_child() {
        let set = Builder::new()
            .node(
                NodeClass::ObjectType,
                1001,
                &[(HAS_SUBTYPE, "ns=1;i=1000", false)],
            )
            .node(NodeClass::ObjectType, 1000, &[(HAS_SUBTYPE, "i=58", false)]);
        assert_eq!(set.order(&OrderingPolicy::default()), vec![1000, 1001]);
    }

    #[test]
    fn forward_hierarchical_source_precedes_target() {
        let set = Builder::new()
            .node(NodeClass::Object, 2, &[])
            .node(NodeClass::Object, 1, &[(ORGANIZES, "ns=1;i=2", true)]);
        assert_eq!(set.order(&OrderingPolicy::default()), vec![1, 2]);
    }

    #[test]
    fn unclassified_reference_types_do_not_constrain() {
        let set = Builder::new()
            .node(NodeClass::Object, 2, &[(HAS_ENCODING, "ns=1;i=1", true)])
            .node(NodeClass::DataType, 1, &[]);
        assert_eq!(set.order(&OrderingPolicy::default()), vec![2, 1]);

        let policy = OrderingPolicy::default().with_rule(
            well_known::ns0(well_known::HAS_ENCODING),
            OrderingRule::TypeDefinition,
        );
        assert_eq!(set.order(&policy), vec![1, 2]);

        let policy = OrderingPolicy::default().without(&well_known::ns0(well_known::ORGANIZES));
        let set = Builder::new()
            .node(NodeClass::Object, 2, &[])
            .node(NodeClass::Object, 1, &[(ORGANIZES, "ns=1;i=2", true)]);
        assert_eq!(set.order(&policy), vec![2, 1]);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let set = Builder::new()
            .node(NodeClass::Object, 30, &[(ORGANIZES, "ns=1;i=10", false)])
            .node(NodeClass::Object, 20, &[])
            .node(NodeClass::Object, 10, &[])
            .node(NodeClass::Object, 40, &[(ORGANIZES, "ns=1;i=20", false)]);
        assert_eq!(set.order(&OrderingPolicy::default()), vec![20, 10, 30, 40]);
    }

    #[test]
    fn cycle_is_reported_with_members() {
        let set = Builder::new()
            .node(NodeClass::Object, 5, &[])
            .node(NodeClass::Object, 1, &[(ORGANIZES, "ns=1;i=2", false)])
            .node(NodeClass::Object, 2, &[(ORGANIZES, "ns=1;i=1", false)]);
        let err = set.nodeset.sorted(&OrderingPolicy::default()).unwrap_err();
        match err {
            NodesetError::Cycle(ids) => {
                assert_eq!(ids, vec![NodeId::numeric(1, 1), NodeId::numeric(1, 2)])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let set = Builder::new()
            .node(NodeClass::Object, 1, &[(ORGANIZES, "ns=1;i=1", true)])
            .node(NodeClass::Object, 2, &[(ORGANIZES, "ns=1;i=2", false)]);
        let policy = OrderingPolicy::default().order_base_namespace(true);
        assert_eq!(set.order(&policy), vec![1, 2]);
    }

    #[test]
    fn base_namespace_prerequisites_are_ignored_by_default() {
        let mut nodeset: Nodeset<()> = Nodeset::new();
        let base = nodeset
            .new_node(NodeClass::ObjectType, &attrs(&[("NodeId", "i=58")]))
            .unwrap();
        let mut derived = nodeset
            .new_node(NodeClass::ObjectType, &attrs(&[("NodeId", "i=9000")]))
            .unwrap();
        let draft = nodeset
            .new_reference(&attrs(&[("ReferenceType", "i=45"), ("IsForward", "false")]))
            .unwrap();
        nodeset.finish_reference(draft, &mut derived, "i=58").unwrap();
        nodeset.finish_node(derived).unwrap();
        nodeset.finish_node(base).unwrap();

        let ids = |policy: &OrderingPolicy| -> Vec<NodeId> {
            nodeset
                .sorted(policy)
                .unwrap()
                .into_iter()
                .map(|node| node.id.clone())
                .collect()
        };
        assert_eq!(
            ids(&OrderingPolicy::default()),
            vec![NodeId::numeric(0, 9000), NodeId::numeric(0, 58)]
        );
        assert_eq!(
            ids(&OrderingPolicy::default().order_base_namespace(true)),
            vec![NodeId::numeric(0, 58), NodeId::numeric(0, 9000)]
        );
    }

    #[test]
    fn declared_reference_types_inherit_rules() {
        let set = Builder::new()
            // ns=1;i=500 is a subtype of Organizes, ns=1;i=501 a subtype of 500
            .node(NodeClass::ReferenceType, 501, &[(HAS_SUBTYPE, "ns=1;i=500", false)])
            .node(NodeClass::ReferenceType, 500, &[(HAS_SUBTYPE, "i=35", false)])
            .node(NodeClass::Object, 2, &[])
            .node(NodeClass::Object, 1, &[("ns=1;i=501", "ns=1;i=2", true)]);

        let mut policy = OrderingPolicy::default();
        assert_eq!(policy.rule(&NodeId::numeric(1, 501)), None);
        policy.extend_from(&set.nodeset);
        assert_eq!(
            policy.rule(&NodeId::numeric(1, 501)),
            Some(OrderingRule::Hierarchical)
        );
        let order = set.order(&policy);
        let pos = |id| order.iter().position(|&v| v == id).unwrap();
        assert!(pos(1) < pos(2));
        assert!(pos(500) < pos(501));
    }

    #[test]
    fn into_sorted_moves_nodes_out() {
        let set = Builder::new()
            .node(NodeClass::Object, 2, &[(ORGANIZES, "ns=1;i=1", false)])
            .node(NodeClass::Object, 1, &[]);
        let nodes = set
            .nodeset
            .into_sorted(&OrderingPolicy::default())
            .unwrap();
        let ids: Vec<_> = nodes.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId::numeric(1, 1), NodeId::numeric(1, 2)]);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn supertypes_always_precede_subtypes(picks in prop::collection::vec(any::<prop::sample::Index>(), 1..40)) {
            // Type k derives from parent[k] < k; declare them newest first.
            let parents: Vec<usize> = picks
                .iter()
                .enumerate()
                .map(|(k, pick)| if k == 0 { 0 } else { pick.index(k) })
                .collect();
            let mut builder = Builder::new();
            for k in (0..parents.len()).rev() {
                let parent = format!("ns=1;i={}", 100 + parents[k]);
                let refs: Vec<(&str, &str, bool)> = if k == 0 {
                    Vec::new()
                } else {
                    vec![(HAS_SUBTYPE, parent.as_str(), false)]
                };
                builder = builder.node(NodeClass::ObjectType, 100 + k as u32, &refs);
            }
            let order = builder.order(&OrderingPolicy::default());
            prop_assert_eq!(order.len(), parents.len());
            let rank = |id: u32| order.iter().position(|&o| o == id).unwrap();
            for k in 1..parents.len() {
                prop_assert!(rank(100 + parents[k] as u32) < rank(100 + k as u32));
            }
        }
    }
}
