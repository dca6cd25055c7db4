//! Static minimum-depth prediction over the schema alone. A generator that
//! walks the schema shallower than this bound cannot produce a graph that
//! satisfies every mandatory constraint, no matter what values it picks.

use seedgraph_schema::model::{AttributeKind, SchemaModel, TypeId, TypeKind};
use std::collections::BTreeSet;

///
/// DepthPredictor
///

pub struct DepthPredictor<'a> {
    schema: &'a SchemaModel,
}

impl<'a> DepthPredictor<'a> {
    #[must_use]
    pub const fn new(schema: &'a SchemaModel) -> Self {
        Self { schema }
    }

    /// Minimum traversal depth required for a graph rooted at `ty` to have
    /// a chance of satisfying all mandatory constraints. A type with no
    /// mandatory singular attributes needs depth 0.
    #[must_use]
    pub fn predict_required_depth(&self, ty: TypeId) -> u32 {
        let mut visiting = BTreeSet::new();
        self.predict(ty, &mut visiting)
    }

    fn predict(&self, ty: TypeId, visiting: &mut BTreeSet<TypeId>) -> u32 {
        // A type already on the recursion path contributes nothing: a
        // mandatory self-reference would otherwise diverge. Deliberate
        // under-approximation to guarantee termination.
        if !visiting.insert(ty) {
            return 0;
        }

        let model = self.schema.get(ty);
        // With lenient nullability, component types report unreliable
        // optionality, so every singular attribute they declare counts.
        let force_mandatory =
            self.schema.lenient_nullability() && model.kind != TypeKind::Entity;

        let max_depth = model
            .attributes
            .iter()
            .filter(|attr| attr.is_singular() && (force_mandatory || !attr.is_optional()))
            .map(|attr| match &attr.kind {
                AttributeKind::ToOne(to_one) => 1 + self.predict(to_one.target, visiting),
                AttributeKind::Embedded(embedded) => 1 + self.predict(embedded.target, visiting),
                AttributeKind::Basic(_) => 1,
                // Collections satisfy their constraints with zero elements.
                AttributeKind::ToMany(_) | AttributeKind::ElementCollection => 0,
            })
            .max()
            .unwrap_or(0);

        visiting.remove(&ty);
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::orders_schema;
    use seedgraph_schema::{
        build::SchemaBuilder,
        model::{BasicAttribute, EmbeddedAttribute, ToOneAttribute},
    };

    #[test]
    fn flat_entity_needs_one_level() {
        let (schema, idx) = orders_schema();
        let predictor = DepthPredictor::new(&schema);
        // Identity scalar alone forces one level.
        assert_eq!(predictor.predict_required_depth(idx.person), 1);
    }

    #[test]
    fn inverse_collection_adds_nothing() {
        let (schema, idx) = orders_schema();
        let predictor = DepthPredictor::new(&schema);
        assert_eq!(predictor.predict_required_depth(idx.order), 1);
    }

    #[test]
    fn mandatory_many_to_one_descends() {
        let (schema, idx) = orders_schema();
        let predictor = DepthPredictor::new(&schema);
        // OrderItem -> mandatory order -> Order scalars.
        assert_eq!(predictor.predict_required_depth(idx.order_item), 2);
    }

    #[test]
    fn optional_many_to_one_is_skipped() {
        let mut builder = SchemaBuilder::new();
        let order = builder.entity("Order");
        let note = builder.entity("Note");
        builder.attr(order, "id", BasicAttribute::identity());
        builder.attr(note, "id", BasicAttribute::identity());
        builder.attr(note, "order", ToOneAttribute::many_to_one(order));
        let schema = builder.finish().expect("valid schema");

        assert_eq!(DepthPredictor::new(&schema).predict_required_depth(note), 1);
    }

    #[test]
    fn embedded_chain_accumulates() {
        let mut builder = SchemaBuilder::new();
        let parent = builder.entity("Parent");
        let outer = builder.embeddable("Outer");
        let inner = builder.embeddable("Inner");
        builder.attr(parent, "id", BasicAttribute::identity());
        builder.attr(parent, "outer", EmbeddedAttribute::new(outer));
        builder.attr(outer, "inner", EmbeddedAttribute::new(inner));
        builder.attr(inner, "name", BasicAttribute::required());
        let schema = builder.finish().expect("valid schema");

        assert_eq!(DepthPredictor::new(&schema).predict_required_depth(parent), 3);
    }

    #[test]
    fn optional_embedded_component_stops_early() {
        let mut builder = SchemaBuilder::new();
        let parent = builder.entity("Parent");
        let comp = builder.embeddable("Component");
        builder.attr(parent, "id", BasicAttribute::identity());
        builder.attr(parent, "component", EmbeddedAttribute::new(comp));
        builder.attr(comp, "name", BasicAttribute::new());
        let schema = builder.finish().expect("valid schema");

        // Mandatory embedded with nothing mandatory inside: one level for
        // the component itself.
        assert_eq!(DepthPredictor::new(&schema).predict_required_depth(parent), 1);
    }

    #[test]
    fn mandatory_self_reference_terminates() {
        let mut builder = SchemaBuilder::new();
        let node = builder.entity("TreeNode");
        builder.attr(node, "id", BasicAttribute::identity());
        builder.attr(node, "parent", ToOneAttribute::many_to_one(node).required());
        let schema = builder.finish().expect("valid schema");

        // Self-reference contributes 1 + 0, never diverges.
        assert_eq!(DepthPredictor::new(&schema).predict_required_depth(node), 1);
    }

    #[test]
    fn lenient_nullability_treats_embeddable_attributes_as_mandatory() {
        let mut builder = SchemaBuilder::new().lenient_nullability();
        let parent = builder.entity("Parent");
        let comp = builder.embeddable("Component");
        builder.attr(parent, "id", BasicAttribute::identity());
        builder.attr(parent, "component", EmbeddedAttribute::new(comp));
        builder.attr(comp, "name", BasicAttribute::new());
        let schema = builder.finish().expect("valid schema");

        // The optional scalar inside the embeddable now counts.
        assert_eq!(DepthPredictor::new(&schema).predict_required_depth(parent), 2);
    }
}
