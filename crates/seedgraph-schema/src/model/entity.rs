use crate::model::AttributeModel;
use serde::Serialize;

///
/// TypeKind
///

#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum TypeKind {
    Embeddable,
    Entity,
    MappedSuperclass,
}

impl TypeKind {
    /// Whether instances of this kind can exist in a graph. Mapped
    /// superclasses are schema-only and never materialize as nodes.
    #[must_use]
    pub const fn is_instantiable(self) -> bool {
        !matches!(self, Self::MappedSuperclass)
    }
}

///
/// ManagedTypeModel
///
/// One named type in the schema: an entity, an embeddable component, or a
/// mapped superclass. Attribute order is authoritative; graph nodes allocate
/// one slot per attribute in this order.
///

#[derive(Clone, Debug, Serialize)]
pub struct ManagedTypeModel {
    pub ident: String,
    pub kind: TypeKind,
    pub attributes: Vec<AttributeModel>,
}

impl ManagedTypeModel {
    /// Attribute by identifier, with its slot index.
    #[must_use]
    pub fn attribute(&self, ident: &str) -> Option<(usize, &AttributeModel)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, attr)| attr.ident == ident)
    }

    /// All identity attributes, in declaration order.
    pub fn identity_attributes(&self) -> impl Iterator<Item = (usize, &AttributeModel)> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, attr)| attr.is_identity())
    }

    /// The identity attribute, if the type declares exactly one. A type with
    /// a composite identity returns `None` here and callers fall back to the
    /// full `identity_attributes` list.
    #[must_use]
    pub fn single_identity_attribute(&self) -> Option<(usize, &AttributeModel)> {
        let mut ids = self.identity_attributes();
        let first = ids.next()?;
        match ids.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}
