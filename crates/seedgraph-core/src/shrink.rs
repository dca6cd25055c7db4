//! Bottom-up removal of nodes that can never be persisted. A depth-first
//! pass judges each node after its children; an invalid child is detached
//! from its parent slot, which can in turn invalidate the parent, all the
//! way up to the root.

use crate::{
    error::{EngineError, ErrorClass, ErrorOrigin},
    graph::{AccessError, Graph, NodeId, Slot},
};
use seedgraph_schema::model::{AttrId, AttributeKind, SchemaModel, TypeId};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;
use tracing::debug;

///
/// ShrinkError
///

#[derive(Debug, ThisError)]
pub enum ShrinkError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("collection attribute '{attr}' has non-instantiable element type '{element}'")]
    UninstantiableElement { attr: String, element: String },

    #[error("root node {root} cannot satisfy its mandatory attributes")]
    UnsatisfiableRoot { root: String },
}

impl ShrinkError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Access(err) => err.class(),
            Self::UninstantiableElement { .. } => ErrorClass::SchemaInvariant,
            Self::UnsatisfiableRoot { .. } => ErrorClass::Unsatisfiable,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Access(err) => err.origin(),
            _ => ErrorOrigin::Shrink,
        }
    }
}

impl From<ShrinkError> for EngineError {
    fn from(err: ShrinkError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// GraphShrinker
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GraphShrinker {
    stop_at_depth: Option<u32>,
}

impl GraphShrinker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop_at_depth: None,
        }
    }

    /// Leave nodes at or beyond this depth untouched. Boundary nodes are
    /// kept as-is without judging their validity.
    #[must_use]
    pub const fn stop_at_depth(mut self, depth: u32) -> Self {
        self.stop_at_depth = Some(depth);
        self
    }

    /// Prune every node unreachable-to-validity under `root`. Fails when
    /// the root itself ends up invalid.
    pub fn shrink(&self, graph: &mut Graph, root: NodeId) -> Result<(), ShrinkError> {
        let schema = graph.schema_handle();
        let mut visiting = BTreeSet::new();
        if self.visit(graph, &schema, root, 0, &mut visiting)? {
            Ok(())
        } else {
            Err(ShrinkError::UnsatisfiableRoot {
                root: graph.describe(root),
            })
        }
    }

    fn visit(
        &self,
        graph: &mut Graph,
        schema: &SchemaModel,
        node: NodeId,
        depth: u32,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Result<bool, ShrinkError> {
        if self.stop_at_depth.is_some_and(|limit| depth >= limit) {
            return Ok(true);
        }
        // A node already on the current path is kept; judging it again
        // would recurse forever through the cycle.
        if !visiting.insert(node) {
            return Ok(true);
        }

        let ty = graph.node_type(node)?;
        let attr_count = schema.get(ty).attributes.len();

        for index in 0..attr_count {
            let attr = AttrId::new(ty, index);
            match &schema.attribute(attr).kind {
                AttributeKind::Embedded(_) | AttributeKind::ToOne(_) => {
                    if let Some(child) = graph.read(node, attr)?.as_node() {
                        if !self.visit(graph, schema, child, depth + 1, visiting)? {
                            debug!(
                                parent = %graph.describe(node),
                                attr = %schema.attribute(attr).ident,
                                child = %graph.describe(child),
                                "detaching invalid child"
                            );
                            graph.write(node, attr, Slot::Null)?;
                        }
                    }
                }
                AttributeKind::ToMany(to_many) => {
                    let element = schema.get(to_many.element);
                    if !element.kind.is_instantiable() {
                        return Err(ShrinkError::UninstantiableElement {
                            attr: schema.attribute(attr).ident.clone(),
                            element: element.ident.clone(),
                        });
                    }
                    if let Some(children) = graph.read(node, attr)?.plural_nodes() {
                        let mut pruned = BTreeSet::new();
                        for child in children {
                            if !self.visit(graph, schema, child, depth + 1, visiting)? {
                                debug!(
                                    parent = %graph.describe(node),
                                    attr = %schema.attribute(attr).ident,
                                    child = %graph.describe(child),
                                    "removing invalid element"
                                );
                                pruned.insert(child);
                            }
                        }
                        if !pruned.is_empty() {
                            match graph.slot_mut(node, attr)? {
                                Slot::List(nodes) | Slot::Set(nodes) => {
                                    nodes.retain(|n| !pruned.contains(n));
                                }
                                Slot::Map(map) => map.retain(|_, n| !pruned.contains(n)),
                                _ => {}
                            }
                        }
                    }
                }
                AttributeKind::Basic(_) | AttributeKind::ElementCollection => {}
            }
        }

        visiting.remove(&node);
        Ok(is_satisfied(graph, schema, node, ty)?)
    }
}

/// One-level validity: every attribute is either set or exempt from being
/// set. Child validity is never re-examined here; children were judged and
/// detached during the descent.
fn is_satisfied(
    graph: &Graph,
    schema: &SchemaModel,
    node: NodeId,
    ty: TypeId,
) -> Result<bool, AccessError> {
    for index in 0..schema.get(ty).attributes.len() {
        let attr = AttrId::new(ty, index);
        if !graph.read(node, attr)?.is_null() {
            continue;
        }
        let model = schema.attribute(attr);
        let exempt = model.is_identity()
            || model.is_optional()
            || model.is_tenant()
            || !model.is_insertable();
        if !exempt {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_fixtures::orders_graph, value::Value};
    use proptest::prelude::*;
    use seedgraph_schema::{
        build::SchemaBuilder,
        model::{BasicAttribute, ToManyAttribute, ToOneAttribute},
    };
    use std::sync::Arc;

    #[test]
    fn keeps_complete_graph_intact() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let item = graph.add(idx.order_item).expect("item");
        graph.write(order, idx.order_id, Slot::Scalar(Value::Int(1))).expect("write");
        graph.write(order, idx.order_items, Slot::Set(vec![item])).expect("write");
        graph.write(item, idx.item_id, Slot::Scalar(Value::Int(10))).expect("write");
        graph.write(item, idx.item_order, Slot::Node(order)).expect("write");

        GraphShrinker::new().shrink(&mut graph, order).expect("valid graph");

        assert_eq!(
            graph.read(order, idx.order_items).expect("read"),
            &Slot::Set(vec![item])
        );
    }

    #[test]
    fn prunes_item_missing_mandatory_reference() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let kept = graph.add(idx.order_item).expect("item");
        let orphan = graph.add(idx.order_item).expect("item");
        graph.write(kept, idx.item_order, Slot::Node(order)).expect("write");
        graph
            .write(order, idx.order_items, Slot::Set(vec![kept, orphan]))
            .expect("write");

        GraphShrinker::new().shrink(&mut graph, order).expect("root stays valid");

        assert_eq!(
            graph.read(order, idx.order_items).expect("read"),
            &Slot::Set(vec![kept])
        );
    }

    #[test]
    fn missing_identity_is_exempt() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");

        // No id, no customer, no items: everything unset is exempt.
        GraphShrinker::new().shrink(&mut graph, order).expect("valid");
    }

    #[test]
    fn unsatisfiable_root_fails() {
        let (mut graph, idx) = orders_graph();
        let item = graph.add(idx.order_item).expect("item");

        let err = GraphShrinker::new().shrink(&mut graph, item).unwrap_err();
        assert!(matches!(err, ShrinkError::UnsatisfiableRoot { .. }));
        assert_eq!(err.class(), ErrorClass::Unsatisfiable);
        assert_eq!(err.origin(), ErrorOrigin::Shrink);
    }

    #[test]
    fn invalidity_cascades_to_the_root() {
        let mut builder = SchemaBuilder::new();
        let a = builder.entity("A");
        let b = builder.entity("B");
        let c = builder.entity("C");
        builder.attr(a, "id", BasicAttribute::identity());
        builder.attr(a, "b", ToOneAttribute::many_to_one(b).required());
        builder.attr(b, "id", BasicAttribute::identity());
        builder.attr(b, "c", ToOneAttribute::many_to_one(c).required());
        builder.attr(c, "id", BasicAttribute::identity());
        builder.attr(c, "name", BasicAttribute::required());
        let schema = Arc::new(builder.finish().expect("valid schema"));

        let mut graph = Graph::new(schema);
        let na = graph.add(a).expect("a");
        let nb = graph.add(b).expect("b");
        let nc = graph.add(c).expect("c");
        graph.write(na, AttrId::new(a, 1), Slot::Node(nb)).expect("write");
        graph.write(nb, AttrId::new(b, 1), Slot::Node(nc)).expect("write");
        // nc.name stays unset, so nc is invalid, then nb, then na.

        let err = GraphShrinker::new().shrink(&mut graph, na).unwrap_err();
        assert!(matches!(err, ShrinkError::UnsatisfiableRoot { .. }));
        // The chain was detached on the way up.
        assert!(graph.read(na, AttrId::new(a, 1)).expect("read").is_null());
        assert!(graph.read(nb, AttrId::new(b, 1)).expect("read").is_null());
    }

    #[test]
    fn stop_at_depth_keeps_boundary_nodes_unjudged() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let orphan = graph.add(idx.order_item).expect("item");
        graph
            .write(order, idx.order_items, Slot::Set(vec![orphan]))
            .expect("write");

        GraphShrinker::new()
            .stop_at_depth(1)
            .shrink(&mut graph, order)
            .expect("valid");

        // The orphan sits at the boundary and is kept as-is.
        assert_eq!(
            graph.read(order, idx.order_items).expect("read"),
            &Slot::Set(vec![orphan])
        );
    }

    #[test]
    fn cycles_terminate() {
        let (mut graph, idx) = orders_graph();
        let order = graph.add(idx.order).expect("order");
        let item = graph.add(idx.order_item).expect("item");
        graph.write(order, idx.order_items, Slot::Set(vec![item])).expect("write");
        graph.write(item, idx.item_order, Slot::Node(order)).expect("write");

        GraphShrinker::new().shrink(&mut graph, order).expect("cycle is fine");
        assert_eq!(
            graph.read(order, idx.order_items).expect("read"),
            &Slot::Set(vec![item])
        );
    }

    #[test]
    fn element_collections_never_invalidate_their_owner() {
        let mut builder = SchemaBuilder::new();
        let article = builder.entity("Article");
        builder.attr(article, "id", BasicAttribute::identity());
        builder.attr(article, "title", BasicAttribute::required());
        builder.attr(article, "tags", AttributeKind::ElementCollection);
        let schema = Arc::new(builder.finish().expect("valid schema"));

        let mut graph = Graph::new(schema);
        let tagged = graph.add(article).expect("article");
        let bare = graph.add(article).expect("article");
        graph
            .write(tagged, AttrId::new(article, 1), Slot::Scalar(Value::from("a")))
            .expect("write");
        graph
            .write(tagged, AttrId::new(article, 2), Slot::Values(vec![Value::from("rust")]))
            .expect("write");
        graph
            .write(bare, AttrId::new(article, 1), Slot::Scalar(Value::from("b")))
            .expect("write");

        // A populated value collection is left alone and an unset one is
        // exempt from the mandatory check.
        GraphShrinker::new().shrink(&mut graph, tagged).expect("valid");
        GraphShrinker::new().shrink(&mut graph, bare).expect("valid");
        assert_eq!(
            graph.read(tagged, AttrId::new(article, 2)).expect("read"),
            &Slot::Values(vec![Value::from("rust")])
        );
        assert!(graph.read(bare, AttrId::new(article, 2)).expect("read").is_null());
    }

    #[test]
    fn uninstantiable_element_type_is_fatal() {
        let mut builder = SchemaBuilder::new();
        let owner = builder.entity("Owner");
        let base = builder.mapped_superclass("AuditedBase");
        builder.attr(base, "createdAt", BasicAttribute::new());
        builder.attr(owner, "id", BasicAttribute::identity());
        builder.attr(owner, "audited", ToManyAttribute::one_to_many(base));
        let schema = Arc::new(builder.finish().expect("builder permits this"));

        let mut graph = Graph::new(schema);
        let node = graph.add(owner).expect("owner");

        let err = GraphShrinker::new().shrink(&mut graph, node).unwrap_err();
        assert!(matches!(err, ShrinkError::UninstantiableElement { .. }));
        assert_eq!(err.class(), ErrorClass::SchemaInvariant);
    }

    proptest! {
        // Shrinking is idempotent and keeps exactly the items whose
        // mandatory back-reference is set.
        #[test]
        fn shrink_is_idempotent(backrefs in proptest::collection::vec(any::<bool>(), 0..8)) {
            let (mut graph, idx) = orders_graph();
            let order = graph.add(idx.order).expect("order");
            let mut items = Vec::new();
            let mut expected = Vec::new();
            for has_order in backrefs {
                let item = graph.add(idx.order_item).expect("item");
                if has_order {
                    graph.write(item, idx.item_order, Slot::Node(order)).expect("write");
                    expected.push(item);
                }
                items.push(item);
            }
            graph.write(order, idx.order_items, Slot::Set(items)).expect("write");

            GraphShrinker::new().shrink(&mut graph, order).expect("root valid");
            prop_assert_eq!(
                graph.read(order, idx.order_items).expect("read"),
                &Slot::Set(expected.clone())
            );

            let before = graph.clone();
            GraphShrinker::new().shrink(&mut graph, order).expect("still valid");
            prop_assert_eq!(
                graph.read(order, idx.order_items).expect("read"),
                before.read(order, idx.order_items).expect("read")
            );
        }
    }
}
