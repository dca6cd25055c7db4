//! ## Crate layout
//! - `core`: node graph, shaping engines, persistence ordering, and depth
//!   prediction.
//! - `schema`: managed-type metamodel, builder, and validation.
//!
//! The `prelude` module mirrors the surface a test-data pipeline touches:
//! build a schema, shape a graph, persist it.

pub use seedgraph_core as core;
pub use seedgraph_schema as schema;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::error::EngineError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        depth::DepthPredictor,
        fix::AssociationFixer,
        graph::{Graph, NodeId, Slot},
        persist::GraphPersister,
        shrink::GraphShrinker,
        store::{MemoryStore, Store},
        value::{MapKey, Value},
    };
    pub use crate::schema::{
        build::SchemaBuilder,
        model::{
            AttrId, BasicAttribute, EmbeddedAttribute, SchemaModel, ToManyAttribute,
            ToOneAttribute, TypeId,
        },
    };
}
