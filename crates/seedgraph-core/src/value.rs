use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Value
///
/// Scalar attribute values. Deliberately small: this core shapes and orders
/// graphs, it does not generate field values. Total order so values can key
/// map associations directly.
///

#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[remain::sorted]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    Int(i64),
    Text(String),
    Uint(u64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "bytes[{}]", v.len()),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

///
/// MapKey
///
/// Derived key for a map association entry. `Node` keys the entry by the
/// referenced node's identity (join-column keys); `Composite` is a
/// synthesized identity-class instance, one component per identity
/// attribute, null components preserved.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum MapKey {
    Scalar(Value),
    Node(NodeId),
    Composite(Vec<(String, Option<Value>)>),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Node(node) => write!(f, "{node}"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, (ident, value)) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match value {
                        Some(value) => write!(f, "{ident}={value}")?,
                        None => write!(f, "{ident}=null")?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}
