//! Core engines for seedgraph: the node graph, the shaping passes that
//! shrink and repair it, persistence ordering, and depth prediction, plus
//! the vocabulary exported via the `prelude`.
#![warn(unreachable_pub)]

pub mod depth;
pub mod error;
pub mod fix;
pub mod graph;
pub mod persist;
pub mod shrink;
pub mod store;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors or stores are re-exported here.
///

pub mod prelude {
    pub use crate::{
        depth::DepthPredictor,
        fix::AssociationFixer,
        graph::{Graph, NodeId, Slot},
        persist::GraphPersister,
        shrink::GraphShrinker,
        value::{MapKey, Value},
    };
}
