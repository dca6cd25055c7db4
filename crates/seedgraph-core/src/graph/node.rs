use crate::graph::Slot;
use seedgraph_schema::model::TypeId;
use serde::Serialize;
use std::fmt;

///
/// NodeId
///
/// Stable arena index of one node. All visited/cycle tracking in the
/// engines keys on this: node identity, never attribute equality.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// NodeRecord
///
/// One live node: its managed type and one slot per declared attribute,
/// index-aligned with the type's attribute list.
///

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub(crate) ty: TypeId,
    pub(crate) slots: Vec<Slot>,
}
