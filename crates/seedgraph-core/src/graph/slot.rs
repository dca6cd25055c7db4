use crate::{
    graph::NodeId,
    value::{MapKey, Value},
};
use std::collections::BTreeMap;

///
/// Slot
///
/// Runtime value of one attribute. The shape must agree with the declared
/// attribute kind; the accessor enforces this on write.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Slot {
    /// Unset scalar, unset reference, or uninitialized container.
    #[default]
    Null,
    /// Basic attribute value.
    Scalar(Value),
    /// Embedded component or to-one association target.
    Node(NodeId),
    /// Set association container: unique node identities.
    Set(Vec<NodeId>),
    /// List association container: insertion order, duplicates allowed.
    List(Vec<NodeId>),
    /// Map association container keyed by derived map keys.
    Map(BTreeMap<MapKey, NodeId>),
    /// Element collection of non-entity values.
    Values(Vec<Value>),
}

impl Slot {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Singular node value, if set.
    #[must_use]
    pub const fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Node elements of a plural slot, in container order. `None` for a
    /// `Null` (uninitialized) container or a non-plural slot.
    #[must_use]
    pub fn plural_nodes(&self) -> Option<Vec<NodeId>> {
        match self {
            Self::Set(nodes) | Self::List(nodes) => Some(nodes.clone()),
            Self::Map(entries) => Some(entries.values().copied().collect()),
            _ => None,
        }
    }

    /// Identity-based membership for set/list containers.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        match self {
            Self::Set(nodes) | Self::List(nodes) => nodes.contains(&node),
            Self::Map(entries) => entries.values().any(|v| *v == node),
            _ => false,
        }
    }
}
