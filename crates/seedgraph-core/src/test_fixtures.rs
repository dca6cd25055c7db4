//! Shared schema fixtures for engine tests.

use crate::graph::Graph;
use seedgraph_schema::{
    build::SchemaBuilder,
    model::{AttrId, BasicAttribute, SchemaModel, ToManyAttribute, ToOneAttribute, TypeId},
};
use std::sync::Arc;

///
/// OrdersIdx
///
/// Handles into the bidirectional order schema so tests can address
/// attributes without re-deriving indices.
///

pub struct OrdersIdx {
    pub person: TypeId,
    pub order: TypeId,
    pub order_item: TypeId,
    pub person_id: AttrId,
    pub person_name: AttrId,
    pub order_id: AttrId,
    pub order_customer: AttrId,
    pub order_items: AttrId,
    pub item_id: AttrId,
    pub item_order: AttrId,
}

/// Order owns a set of items via the inverse side of `OrderItem.order`,
/// plus an optional customer. The classic bidirectional shape.
pub fn orders_schema() -> (SchemaModel, OrdersIdx) {
    let mut builder = SchemaBuilder::new();
    let person = builder.entity("Person");
    let order = builder.entity("Order");
    let order_item = builder.entity("OrderItem");

    builder.attr(person, "id", BasicAttribute::identity());
    builder.attr(person, "name", BasicAttribute::new());

    builder.attr(order, "id", BasicAttribute::identity());
    builder.attr(order, "customer", ToOneAttribute::many_to_one(person));
    builder.attr(
        order,
        "items",
        ToManyAttribute::one_to_many(order_item).mapped_by("order"),
    );

    builder.attr(order_item, "id", BasicAttribute::identity());
    builder.attr(order_item, "order", ToOneAttribute::many_to_one(order).required());

    let schema = builder.finish().expect("orders schema is valid");

    let idx = OrdersIdx {
        person,
        order,
        order_item,
        person_id: AttrId::new(person, 0),
        person_name: AttrId::new(person, 1),
        order_id: AttrId::new(order, 0),
        order_customer: AttrId::new(order, 1),
        order_items: AttrId::new(order, 2),
        item_id: AttrId::new(order_item, 0),
        item_order: AttrId::new(order_item, 1),
    };

    (schema, idx)
}

/// Empty graph over the orders schema.
pub fn orders_graph() -> (Graph, OrdersIdx) {
    let (schema, idx) = orders_schema();
    (Graph::new(Arc::new(schema)), idx)
}
