//! Schema model for seedgraph: managed types, attributes, association
//! metadata, and the builder that validates a whole schema before use.
//!
//! The model is built at runtime by a generator front-end and is read-only
//! afterwards; the engines in `seedgraph-core` never mutate it.

pub mod build;
pub mod model;

/// Maximum length for type and attribute identifiers.
pub const MAX_IDENT_LEN: usize = 64;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        build::SchemaBuilder,
        model::{
            AttrId, AttributeKind, AttributeModel, BasicAttribute, ContainerKind,
            EmbeddedAttribute, ManagedTypeModel, MapKeyPolicy, SchemaModel, ToManyArity,
            ToManyAttribute, ToOneArity, ToOneAttribute, TypeId, TypeKind,
        },
    };
}
