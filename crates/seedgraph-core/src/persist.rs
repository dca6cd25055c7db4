//! Dependency-ordered persistence. Owning to-one references are inserted
//! before the node that points at them, mirroring foreign-key order;
//! inverse sides and collections follow after the node itself. A cycle of
//! owning references cannot be ordered and fails with the full chain.

use crate::{
    error::{EngineError, ErrorClass, ErrorOrigin},
    graph::{AccessError, Graph, NodeId},
    store::{Store, StoreError},
};
use seedgraph_schema::model::{AttrId, AttributeKind, SchemaModel, ToOneArity};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// PersistError
///

#[derive(Debug, ThisError)]
pub enum PersistError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("cycle detected: {chain}")]
    CycleDetected { chain: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Access(err) => err.class(),
            Self::CycleDetected { .. } => ErrorClass::Cycle,
            Self::Store(err) => err.class(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Access(err) => err.origin(),
            Self::CycleDetected { .. } => ErrorOrigin::Persist,
            Self::Store(err) => err.origin(),
        }
    }
}

impl From<PersistError> for EngineError {
    fn from(err: PersistError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// GraphPersister
///

#[derive(Debug)]
pub struct GraphPersister<S: Store> {
    store: S,
}

impl<S: Store> GraphPersister<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Insert every node reachable from `root` in dependency order.
    pub fn persist(&mut self, graph: &Graph, root: NodeId) -> Result<(), PersistError> {
        let schema = graph.schema_handle();
        let mut path = Vec::new();
        self.persist_node(graph, &schema, root, &mut path)
    }

    fn persist_node(
        &mut self,
        graph: &Graph,
        schema: &SchemaModel,
        node: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Result<(), PersistError> {
        if self.store.contains(node) {
            return Ok(());
        }
        if path.contains(&node) {
            return Err(PersistError::CycleDetected {
                chain: render_chain(graph, path, node),
            });
        }
        path.push(node);

        let ty = graph.node_type(node)?;
        let attr_count = schema.get(ty).attributes.len();

        // Owning to-one targets carry this node's foreign keys and must
        // exist first.
        for index in 0..attr_count {
            let attr = AttrId::new(ty, index);
            let model = schema.attribute(attr);
            if let AttributeKind::ToOne(to_one) = &model.kind {
                let owning = to_one.arity == ToOneArity::ManyToOne || to_one.mapped_by.is_none();
                if owning && model.is_insertable() {
                    if let Some(child) = graph.read(node, attr)?.as_node() {
                        self.persist_node(graph, schema, child, path)?;
                    }
                }
            }
        }

        self.store.insert(graph, node)?;
        debug!(node = %graph.describe(node), "inserted");

        // Inverse one-to-one partners and collection elements depend on
        // this node and follow it.
        for index in 0..attr_count {
            let attr = AttrId::new(ty, index);
            let model = schema.attribute(attr);
            if !model.is_insertable() {
                continue;
            }
            match &model.kind {
                AttributeKind::ToOne(to_one)
                    if to_one.arity == ToOneArity::OneToOne && to_one.mapped_by.is_some() =>
                {
                    if let Some(child) = graph.read(node, attr)?.as_node() {
                        if !path.contains(&child) {
                            self.persist_node(graph, schema, child, path)?;
                        }
                    }
                }
                AttributeKind::ToMany(_) => {
                    if let Some(children) = graph.read(node, attr)?.plural_nodes() {
                        for child in children {
                            if !path.contains(&child) {
                                self.persist_node(graph, schema, child, path)?;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        path.pop();
        Ok(())
    }
}

fn render_chain(graph: &Graph, path: &[NodeId], tail: NodeId) -> String {
    path.iter()
        .chain(std::iter::once(&tail))
        .map(|&n| graph.describe(n))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::Slot, store::MemoryStore, test_fixtures::orders_graph};
    use seedgraph_schema::{
        build::SchemaBuilder,
        model::{BasicAttribute, ToManyAttribute, ToOneAttribute},
    };
    use std::sync::Arc;

    #[test]
    fn owning_reference_inserted_first() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let item = graph.add(idx.order_item).expect("item");
        graph.write(item, idx.item_order, Slot::Node(order)).expect("write");

        let mut persister = GraphPersister::new(MemoryStore::new());
        persister.persist(&graph, item).expect("persist");
        assert_eq!(persister.store().inserted(), &[order, item]);
    }

    #[test]
    fn collection_elements_follow_their_owner() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let a = graph.add(idx.order_item).expect("item");
        let b = graph.add(idx.order_item).expect("item");
        graph.write(a, idx.item_order, Slot::Node(order)).expect("write");
        graph.write(b, idx.item_order, Slot::Node(order)).expect("write");
        graph.write(order, idx.order_items, Slot::Set(vec![a, b])).expect("write");

        let mut persister = GraphPersister::new(MemoryStore::new());
        persister.persist(&graph, order).expect("persist");
        assert_eq!(persister.store().inserted(), &[order, a, b]);
    }

    #[test]
    fn stored_nodes_are_skipped() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");

        let mut persister = GraphPersister::new(MemoryStore::new());
        persister.persist(&graph, order).expect("persist");
        persister.persist(&graph, order).expect("second pass is a no-op");
        assert_eq!(persister.store().inserted(), &[order]);
    }

    #[test]
    fn owning_one_to_one_precedes_its_holder() {
        let mut builder = SchemaBuilder::new();
        let person = builder.entity("Person");
        let passport = builder.entity("Passport");
        builder.attr(person, "id", BasicAttribute::identity());
        builder.attr(person, "passport", ToOneAttribute::one_to_one(passport));
        builder.attr(passport, "id", BasicAttribute::identity());
        builder.attr(
            passport,
            "holder",
            ToOneAttribute::one_to_one_inverse(person, "passport"),
        );
        let schema = Arc::new(builder.finish().expect("valid schema"));

        let mut graph = Graph::new(schema);
        let p = graph.add(person).expect("person");
        let pass = graph.add(passport).expect("passport");
        graph
            .write(p, seedgraph_schema::model::AttrId::new(person, 1), Slot::Node(pass))
            .expect("write");
        graph
            .write(pass, seedgraph_schema::model::AttrId::new(passport, 1), Slot::Node(p))
            .expect("write");

        let mut persister = GraphPersister::new(MemoryStore::new());
        persister.persist(&graph, p).expect("persist");
        assert_eq!(persister.store().inserted(), &[pass, p]);
    }

    #[test]
    fn owning_cycle_reports_the_chain() {
        let mut builder = SchemaBuilder::new();
        let a = builder.entity("Alpha");
        let b = builder.entity("Beta");
        builder.attr(a, "id", BasicAttribute::identity());
        builder.attr(a, "beta", ToOneAttribute::many_to_one(b));
        builder.attr(b, "id", BasicAttribute::identity());
        builder.attr(b, "alpha", ToOneAttribute::many_to_one(a));
        let schema = Arc::new(builder.finish().expect("valid schema"));

        let mut graph = Graph::new(schema);
        let na = graph.add(a).expect("alpha");
        let nb = graph.add(b).expect("beta");
        graph
            .write(na, seedgraph_schema::model::AttrId::new(a, 1), Slot::Node(nb))
            .expect("write");
        graph
            .write(nb, seedgraph_schema::model::AttrId::new(b, 1), Slot::Node(na))
            .expect("write");

        let mut persister = GraphPersister::new(MemoryStore::new());
        let err = persister.persist(&graph, na).unwrap_err();
        match &err {
            PersistError::CycleDetected { chain } => {
                assert_eq!(chain, "Alpha@0 -> Beta@1 -> Alpha@0");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.class(), ErrorClass::Cycle);
        assert_eq!(err.origin(), ErrorOrigin::Persist);
    }

    #[test]
    fn non_insertable_collection_is_ignored() {
        let mut builder = SchemaBuilder::new();
        let order = builder.entity("Order");
        let item = builder.entity("OrderItem");
        builder.attr(order, "id", BasicAttribute::identity());
        builder.attr(
            order,
            "items",
            ToManyAttribute::one_to_many(item).mapped_by("order").non_insertable(),
        );
        builder.attr(item, "id", BasicAttribute::identity());
        builder.attr(item, "order", ToOneAttribute::many_to_one(order));
        let schema = Arc::new(builder.finish().expect("valid schema"));

        let mut graph = Graph::new(schema);
        let o = graph.add(order).expect("order");
        let i = graph.add(item).expect("item");
        graph
            .write(o, seedgraph_schema::model::AttrId::new(order, 1), Slot::Set(vec![i]))
            .expect("write");

        let mut persister = GraphPersister::new(MemoryStore::new());
        persister.persist(&graph, o).expect("persist");
        assert_eq!(persister.store().inserted(), &[o]);
    }
}
