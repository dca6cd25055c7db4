//! Node graph: an arena of typed records plus the schema-compiled accessor
//! the engines read and write attributes through. The accessor is the Rust
//! stand-in for reflective attribute access; every misuse surfaces as an
//! `AccessError` instead of being swallowed.

pub mod node;
pub mod slot;

pub use node::{NodeId, NodeRecord};
pub use slot::Slot;

use crate::error::{EngineError, ErrorClass, ErrorOrigin};
use seedgraph_schema::model::{AttrId, AttributeKind, AttributeModel, ContainerKind, SchemaModel, TypeId};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// AccessError
///

#[derive(Debug, ThisError)]
pub enum AccessError {
    #[error("node {node} does not exist in this graph")]
    UnknownNode { node: NodeId },

    #[error("attribute '{attr}' is declared on '{declaring}', not on '{actual}'")]
    ForeignAttribute {
        attr: String,
        declaring: String,
        actual: String,
    },

    #[error("attribute index {index} is out of range for '{ty}'")]
    UnknownAttribute { ty: String, index: usize },

    #[error("slot shape does not match attribute '{attr}' ({expected})")]
    ShapeMismatch { attr: String, expected: &'static str },

    #[error("type '{ty}' is not instantiable")]
    NotInstantiable { ty: String },
}

impl AccessError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Access
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Graph
    }
}

impl From<AccessError> for EngineError {
    fn from(err: AccessError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// Graph
///

#[derive(Clone, Debug)]
pub struct Graph {
    schema: Arc<SchemaModel>,
    nodes: Vec<NodeRecord>,
}

impl Graph {
    #[must_use]
    pub const fn new(schema: Arc<SchemaModel>) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    /// Shared handle to the schema this graph was built against. Engines
    /// hold this while mutating the graph.
    #[must_use]
    pub fn schema_handle(&self) -> Arc<SchemaModel> {
        Arc::clone(&self.schema)
    }

    /// Allocate a node of the given type with all slots unset.
    pub fn add(&mut self, ty: TypeId) -> Result<NodeId, AccessError> {
        let model = self.schema.get(ty);
        if !model.kind.is_instantiable() {
            return Err(AccessError::NotInstantiable {
                ty: model.ident.clone(),
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            ty,
            slots: vec![Slot::Null; model.attributes.len()],
        });
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Managed type of a node.
    pub fn node_type(&self, node: NodeId) -> Result<TypeId, AccessError> {
        self.record(node).map(|rec| rec.ty)
    }

    /// `Ident@id` label used in diagnostics and cycle chains.
    pub fn describe(&self, node: NodeId) -> String {
        match self.record(node) {
            Ok(rec) => format!("{}@{node}", self.schema.get(rec.ty).ident),
            Err(_) => format!("?@{node}"),
        }
    }

    /// Read an attribute slot.
    pub fn read(&self, node: NodeId, attr: AttrId) -> Result<&Slot, AccessError> {
        let rec = self.record(node)?;
        self.check_attr(rec, attr)?;
        Ok(&rec.slots[attr.index])
    }

    /// Write an attribute slot, enforcing the declared shape.
    pub fn write(&mut self, node: NodeId, attr: AttrId, slot: Slot) -> Result<(), AccessError> {
        let rec = self.record(node)?;
        self.check_attr(rec, attr)?;
        check_shape(self.schema.attribute(attr), &slot)?;
        self.nodes[node.index()].slots[attr.index] = slot;
        Ok(())
    }

    /// Mutable slot access for in-place container edits.
    pub fn slot_mut(&mut self, node: NodeId, attr: AttrId) -> Result<&mut Slot, AccessError> {
        let rec = self.record(node)?;
        self.check_attr(rec, attr)?;
        Ok(&mut self.nodes[node.index()].slots[attr.index])
    }

    fn record(&self, node: NodeId) -> Result<&NodeRecord, AccessError> {
        self.nodes
            .get(node.index())
            .ok_or(AccessError::UnknownNode { node })
    }

    fn check_attr(&self, rec: &NodeRecord, attr: AttrId) -> Result<(), AccessError> {
        let declaring = self.schema.get(attr.ty);
        if attr.index >= declaring.attributes.len() {
            return Err(AccessError::UnknownAttribute {
                ty: declaring.ident.clone(),
                index: attr.index,
            });
        }
        if rec.ty == attr.ty {
            Ok(())
        } else {
            Err(AccessError::ForeignAttribute {
                attr: declaring.attributes[attr.index].ident.clone(),
                declaring: declaring.ident.clone(),
                actual: self.schema.get(rec.ty).ident.clone(),
            })
        }
    }
}

// Shape check: `Null` fits everything; otherwise the slot variant must
// match the declared attribute kind (and container kind for to-many).
fn check_shape(model: &AttributeModel, slot: &Slot) -> Result<(), AccessError> {
    let ok = match (&model.kind, slot) {
        (_, Slot::Null) => true,
        (AttributeKind::Basic(_), Slot::Scalar(_)) => true,
        (AttributeKind::Embedded(_) | AttributeKind::ToOne(_), Slot::Node(_)) => true,
        (AttributeKind::ToMany(to_many), Slot::Set(_)) => {
            to_many.container == ContainerKind::Set
        }
        (AttributeKind::ToMany(to_many), Slot::List(_)) => {
            to_many.container == ContainerKind::List
        }
        (AttributeKind::ToMany(to_many), Slot::Map(_)) => {
            to_many.container == ContainerKind::Map
        }
        (AttributeKind::ElementCollection, Slot::Values(_)) => true,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(AccessError::ShapeMismatch {
            attr: model.ident.clone(),
            expected: expected_shape(&model.kind),
        })
    }
}

const fn expected_shape(kind: &AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Basic(_) => "scalar",
        AttributeKind::Embedded(_) | AttributeKind::ToOne(_) => "node",
        AttributeKind::ToMany(to_many) => match to_many.container {
            ContainerKind::Set => "set container",
            ContainerKind::List => "list container",
            ContainerKind::Map => "map container",
        },
        AttributeKind::ElementCollection => "value collection",
    }
}
