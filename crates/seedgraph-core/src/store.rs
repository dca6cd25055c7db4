//! Insertion sink for persisted nodes. The persister only needs membership
//! and ordered insert; anything from an in-memory recorder to a real
//! database adapter fits behind the trait.

use crate::{
    error::{EngineError, ErrorClass, ErrorOrigin},
    graph::{Graph, NodeId},
};
use derive_more::Deref;
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("node {node} was already inserted")]
    Duplicate { node: String },
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Access
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Store
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// Store
///

pub trait Store {
    /// Whether the node has already been inserted.
    fn contains(&self, node: NodeId) -> bool;

    /// Insert a node. Inserting the same node twice is an error.
    fn insert(&mut self, graph: &Graph, node: NodeId) -> Result<(), StoreError>;
}

///
/// MemoryStore
/// Records inserts in order. Dereferences to the insertion-order slice so
/// tests can assert on it directly.
///

#[derive(Debug, Default, Deref)]
pub struct MemoryStore {
    #[deref]
    order: Vec<NodeId>,
    seen: BTreeSet<NodeId>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn inserted(&self) -> &[NodeId] {
        &self.order
    }
}

impl Store for MemoryStore {
    fn contains(&self, node: NodeId) -> bool {
        self.seen.contains(&node)
    }

    fn insert(&mut self, graph: &Graph, node: NodeId) -> Result<(), StoreError> {
        if !self.seen.insert(node) {
            return Err(StoreError::Duplicate {
                node: graph.describe(node),
            });
        }
        self.order.push(node);
        Ok(())
    }
}
