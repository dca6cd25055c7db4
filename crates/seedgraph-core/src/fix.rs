//! Bidirectional association repair. A freshly shaped graph is "wild": the
//! owning and inverse sides of its associations rarely agree. This pass
//! walks the graph from a root and makes every association side point back
//! at its counterpart, so the graph reads the same from either end.

use crate::{
    error::{EngineError, ErrorClass, ErrorOrigin},
    graph::{AccessError, Graph, NodeId, Slot},
    value::MapKey,
};
use seedgraph_schema::model::{
    AttrId, AttributeKind, AttributeModel, ContainerKind, MapKeyPolicy, SchemaModel, ToManyArity,
    ToManyAttribute, ToOneArity, TypeId,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;
use tracing::{debug, trace};

///
/// FixError
///

#[derive(Debug, ThisError)]
pub enum FixError {
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl FixError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Access(err) => err.class(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Access(err) => err.origin(),
        }
    }
}

impl From<FixError> for EngineError {
    fn from(err: FixError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// AssociationFixer
///

#[derive(Clone, Copy, Debug, Default)]
pub struct AssociationFixer;

impl AssociationFixer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Repair every association reachable from `root` so both sides agree.
    pub fn fix(&self, graph: &mut Graph, root: NodeId) -> Result<(), FixError> {
        let schema = graph.schema_handle();
        let mut visiting = BTreeSet::new();
        self.visit(graph, &schema, root, &mut visiting)
    }

    fn visit(
        &self,
        graph: &mut Graph,
        schema: &SchemaModel,
        node: NodeId,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Result<(), FixError> {
        if !visiting.insert(node) {
            return Ok(());
        }

        let ty = graph.node_type(node)?;
        for index in 0..schema.get(ty).attributes.len() {
            let attr = AttrId::new(ty, index);
            let model = schema.attribute(attr);
            if !model.is_association() {
                continue;
            }
            trace!(node = %graph.describe(node), attr = %model.ident, "fixing attribute");

            match &model.kind {
                AttributeKind::ToOne(to_one) => {
                    let Some(child) = graph.read(node, attr)?.as_node() else {
                        continue;
                    };
                    match (to_one.arity, &to_one.mapped_by) {
                        // The child's matching inverse collections must
                        // contain this node.
                        (ToOneArity::ManyToOne, _) => {
                            let ends = collections_mapped_by(
                                schema,
                                to_one.target,
                                &model.ident,
                                ToManyArity::OneToMany,
                                Some(ty),
                            );
                            for end in ends {
                                self.populate(graph, schema, child, end, node)?;
                            }
                        }
                        // Inverse side: point the named owning attribute
                        // on the child back at this node.
                        (ToOneArity::OneToOne, Some(owning)) => {
                            let end = schema
                                .get(to_one.target)
                                .attribute(owning)
                                .filter(|(_, m)| is_one_to_one(m))
                                .map(|(i, _)| AttrId::new(to_one.target, i));
                            if let Some(end) = end {
                                graph.write(child, end, Slot::Node(node))?;
                            }
                        }
                        // Owning side: point every inverse one-to-one on
                        // the child back at this node.
                        (ToOneArity::OneToOne, None) => {
                            let ends = one_to_one_mapped_by(schema, to_one.target, &model.ident);
                            for end in ends {
                                graph.write(child, end, Slot::Node(node))?;
                            }
                        }
                    }
                    self.visit(graph, schema, child, visiting)?;
                }
                AttributeKind::ToMany(to_many) => {
                    let Some(children) = graph.read(node, attr)?.plural_nodes() else {
                        continue;
                    };
                    match (to_many.arity, &to_many.mapped_by) {
                        // Point the owning many-to-one on every element
                        // back at this node.
                        (ToManyArity::OneToMany, Some(owning)) => {
                            let end = schema
                                .get(to_many.element)
                                .attribute(owning)
                                .filter(|(_, m)| is_many_to_one(m))
                                .map(|(i, _)| AttrId::new(to_many.element, i));
                            if let Some(end) = end {
                                for &child in &children {
                                    graph.write(child, end, Slot::Node(node))?;
                                }
                            }
                        }
                        // Unidirectional one-to-many has no other side.
                        (ToManyArity::OneToMany, None) => {}
                        (ToManyArity::ManyToMany, Some(owning)) => {
                            let end = schema
                                .get(to_many.element)
                                .attribute(owning)
                                .filter(|(_, m)| is_many_to_many(m))
                                .map(|(i, _)| AttrId::new(to_many.element, i));
                            if let Some(end) = end {
                                for &child in &children {
                                    self.populate(graph, schema, child, end, node)?;
                                }
                            }
                        }
                        (ToManyArity::ManyToMany, None) => {
                            let ends = collections_mapped_by(
                                schema,
                                to_many.element,
                                &model.ident,
                                ToManyArity::ManyToMany,
                                None,
                            );
                            for end in ends {
                                for &child in &children {
                                    self.populate(graph, schema, child, end, node)?;
                                }
                            }
                        }
                    }
                    for child in children {
                        self.visit(graph, schema, child, visiting)?;
                    }
                }
                AttributeKind::Basic(_)
                | AttributeKind::Embedded(_)
                | AttributeKind::ElementCollection => {}
            }
        }

        visiting.remove(&node);
        Ok(())
    }

    /// Add `element` to the collection attribute `attr` on `owner`,
    /// initializing the container when the slot is still unset. Set and
    /// list additions deduplicate by node identity; map additions derive
    /// the key from the element and skip it when the key resolves to null.
    fn populate(
        &self,
        graph: &mut Graph,
        schema: &SchemaModel,
        owner: NodeId,
        attr: AttrId,
        element: NodeId,
    ) -> Result<(), FixError> {
        let AttributeKind::ToMany(to_many) = &schema.attribute(attr).kind else {
            return Ok(());
        };

        if to_many.container == ContainerKind::Map {
            let attr_ident = &schema.attribute(attr).ident;
            let Some(key) = self.derive_map_key(graph, schema, to_many, attr_ident, element)? else {
                debug!(value = %graph.describe(element), "map key resolved to null");
                return Ok(());
            };
            debug!(
                owner = %graph.describe(owner),
                attr = %schema.attribute(attr).ident,
                key = %key,
                value = %graph.describe(element),
                "putting map entry"
            );
            let slot = graph.slot_mut(owner, attr)?;
            if slot.is_null() {
                *slot = Slot::Map(BTreeMap::new());
            }
            if let Slot::Map(entries) = slot {
                entries.insert(key, element);
            }
            return Ok(());
        }

        let contains = graph.read(owner, attr)?.contains_node(element);
        if contains {
            return Ok(());
        }
        debug!(
            owner = %graph.describe(owner),
            attr = %schema.attribute(attr).ident,
            element = %graph.describe(element),
            "adding collection element"
        );
        let slot = graph.slot_mut(owner, attr)?;
        if slot.is_null() {
            *slot = match to_many.container {
                ContainerKind::List => Slot::List(Vec::new()),
                _ => Slot::Set(Vec::new()),
            };
        }
        if let Slot::List(nodes) | Slot::Set(nodes) = slot {
            nodes.push(element);
        }
        Ok(())
    }

    /// Key for `value` under the attribute's map-key policy. `None` stands
    /// for a null key and the entry is skipped.
    fn derive_map_key(
        &self,
        graph: &Graph,
        schema: &SchemaModel,
        to_many: &ToManyAttribute,
        attr_ident: &str,
        value: NodeId,
    ) -> Result<Option<MapKey>, FixError> {
        let value_ty = graph.node_type(value)?;
        let model = schema.get(value_ty);

        match &to_many.map_key {
            MapKeyPolicy::JoinColumn { column, key_type } => {
                // An undeclared key column falls back to the conventional
                // `<attribute>_KEY` name; the element's to-one must declare
                // exactly that column.
                let key_column = match column {
                    Some(name) => name.clone(),
                    None => format!("{attr_ident}_KEY"),
                };
                let source = model
                    .attributes
                    .iter()
                    .enumerate()
                    .find(|(_, a)| join_column_matches(a, &key_column, *key_type));
                let Some((i, _)) = source else {
                    return Ok(None);
                };
                let key = graph
                    .read(value, AttrId::new(value_ty, i))?
                    .as_node()
                    .map(MapKey::Node);
                Ok(key)
            }
            MapKeyPolicy::Attribute(name) => {
                let Some((i, _)) = model.attribute(name) else {
                    return Ok(None);
                };
                Ok(slot_key(graph.read(value, AttrId::new(value_ty, i))?))
            }
            MapKeyPolicy::ElementIdentity => {
                if let Some((i, _)) = model.single_identity_attribute() {
                    return Ok(slot_key(graph.read(value, AttrId::new(value_ty, i))?));
                }
                // Composite identity: assemble every component, present
                // or not. A composite key is never considered null.
                let mut components = Vec::new();
                for (i, id_attr) in model.identity_attributes() {
                    let component = match graph.read(value, AttrId::new(value_ty, i))? {
                        Slot::Scalar(v) => Some(v.clone()),
                        _ => None,
                    };
                    components.push((id_attr.ident.clone(), component));
                }
                Ok(Some(MapKey::Composite(components)))
            }
        }
    }
}

fn slot_key(slot: &Slot) -> Option<MapKey> {
    match slot {
        Slot::Scalar(v) => Some(MapKey::Scalar(v.clone())),
        Slot::Node(id) => Some(MapKey::Node(*id)),
        _ => None,
    }
}

fn join_column_matches(model: &AttributeModel, key_column: &str, key_type: TypeId) -> bool {
    match &model.kind {
        AttributeKind::ToOne(to_one) => {
            to_one.target == key_type && to_one.join_column.as_deref() == Some(key_column)
        }
        _ => false,
    }
}

fn is_one_to_one(model: &AttributeModel) -> bool {
    matches!(&model.kind, AttributeKind::ToOne(t) if t.arity == ToOneArity::OneToOne)
}

fn is_many_to_one(model: &AttributeModel) -> bool {
    matches!(&model.kind, AttributeKind::ToOne(t) if t.arity == ToOneArity::ManyToOne)
}

fn is_many_to_many(model: &AttributeModel) -> bool {
    matches!(&model.kind, AttributeKind::ToMany(t) if t.arity == ToManyArity::ManyToMany)
}

/// Collection attributes on `ty` of the given arity whose `mapped_by`
/// names `owning_ident`, optionally constrained to a specific element type.
fn collections_mapped_by(
    schema: &SchemaModel,
    ty: TypeId,
    owning_ident: &str,
    arity: ToManyArity,
    element: Option<TypeId>,
) -> Vec<AttrId> {
    schema
        .get(ty)
        .attributes
        .iter()
        .enumerate()
        .filter(|(_, a)| match &a.kind {
            AttributeKind::ToMany(t) => {
                t.arity == arity
                    && t.mapped_by.as_deref() == Some(owning_ident)
                    && element.is_none_or(|e| t.element == e)
            }
            _ => false,
        })
        .map(|(i, _)| AttrId::new(ty, i))
        .collect()
}

fn one_to_one_mapped_by(schema: &SchemaModel, ty: TypeId, owning_ident: &str) -> Vec<AttrId> {
    schema
        .get(ty)
        .attributes
        .iter()
        .enumerate()
        .filter(|(_, a)| match &a.kind {
            AttributeKind::ToOne(t) => {
                t.arity == ToOneArity::OneToOne && t.mapped_by.as_deref() == Some(owning_ident)
            }
            _ => false,
        })
        .map(|(i, _)| AttrId::new(ty, i))
        .collect()
}
