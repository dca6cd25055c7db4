use std::fmt;
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Structured runtime error with a stable internal classification. Every
/// module-level error converts into this for callers that want a single
/// error surface; the typed module errors remain available for matching.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct EngineError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl EngineError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    /// Attribute access contradicted the schema (wrong declaring type or
    /// slot shape). Indicates a caller bug; never swallowed.
    Access,
    /// Dependency cycle that ownership direction cannot linearize.
    Cycle,
    /// Schema/metadata combination the engines do not support.
    SchemaInvariant,
    /// Root still violates mandatory constraints after maximal pruning.
    Unsatisfiable,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Access => "access",
            Self::Cycle => "cycle",
            Self::SchemaInvariant => "schema_invariant",
            Self::Unsatisfiable => "unsatisfiable",
        };
        f.write_str(s)
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Fix,
    Graph,
    Persist,
    Shrink,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fix => "fix",
            Self::Graph => "graph",
            Self::Persist => "persist",
            Self::Shrink => "shrink",
            Self::Store => "store",
        };
        f.write_str(s)
    }
}
