pub mod attribute;
pub mod entity;

pub use attribute::*;
pub use entity::*;

use serde::Serialize;
use std::collections::BTreeMap;

///
/// TypeId
///
/// Dense index into a schema's type table. Ids are minted by the builder and
/// are only meaningful for the schema that produced them.
///

#[derive(
    Clone, Copy, Debug, derive_more::Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// SchemaModel
///
/// Read-only registry of managed types. Construct via `SchemaBuilder`; the
/// builder guarantees every `TypeId` stored inside attributes resolves.
///

#[derive(Clone, Debug, Serialize)]
pub struct SchemaModel {
    pub(crate) types: Vec<ManagedTypeModel>,
    pub(crate) idents: BTreeMap<String, TypeId>,
    pub(crate) lenient_nullability: bool,
}

impl SchemaModel {
    /// Managed type for an id minted by this schema's builder.
    #[must_use]
    pub fn get(&self, id: TypeId) -> &ManagedTypeModel {
        &self.types[id.index()]
    }

    /// Resolve a type id by identifier.
    #[must_use]
    pub fn lookup(&self, ident: &str) -> Option<TypeId> {
        self.idents.get(ident).copied()
    }

    /// Attribute by id, paired with its model.
    #[must_use]
    pub fn attribute(&self, id: AttrId) -> &AttributeModel {
        &self.get(id.ty).attributes[id.index]
    }

    /// Iterate all types with their ids.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &ManagedTypeModel)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId(i as u32), ty))
    }

    /// Number of managed types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether the provider that produced this schema reports nullability
    /// unreliably for embeddable and mapped-superclass declared attributes.
    /// The depth predictor treats every singular attribute of such types as
    /// mandatory when this is set.
    #[must_use]
    pub const fn lenient_nullability(&self) -> bool {
        self.lenient_nullability
    }
}
