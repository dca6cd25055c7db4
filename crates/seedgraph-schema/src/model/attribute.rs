use crate::model::TypeId;
use serde::Serialize;

///
/// AttrId
///
/// Identifies one attribute as (declaring type, slot index). Engines pass
/// these to the graph accessor, which rejects ids whose declaring type does
/// not match the node.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct AttrId {
    pub ty: TypeId,
    pub index: usize,
}

impl AttrId {
    #[must_use]
    pub const fn new(ty: TypeId, index: usize) -> Self {
        Self { ty, index }
    }
}

///
/// AttributeModel
///

#[derive(Clone, Debug, Serialize)]
pub struct AttributeModel {
    pub ident: String,
    pub kind: AttributeKind,
}

impl AttributeModel {
    /// Singular attributes hold at most one value: basic scalars, embedded
    /// components, and to-one associations.
    #[must_use]
    pub const fn is_singular(&self) -> bool {
        matches!(
            self.kind,
            AttributeKind::Basic(_) | AttributeKind::Embedded(_) | AttributeKind::ToOne(_)
        )
    }

    #[must_use]
    pub const fn is_basic(&self) -> bool {
        matches!(self.kind, AttributeKind::Basic(_))
    }

    /// Associations are the attributes the fixer and persister act on.
    /// Embedded components and element collections are not associations.
    #[must_use]
    pub const fn is_association(&self) -> bool {
        matches!(self.kind, AttributeKind::ToOne(_) | AttributeKind::ToMany(_))
    }

    /// Plural attributes never make their owner invalid, so they report
    /// optional here.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        match &self.kind {
            AttributeKind::Basic(basic) => basic.optional,
            AttributeKind::Embedded(embedded) => embedded.optional,
            AttributeKind::ToOne(to_one) => to_one.optional,
            AttributeKind::ToMany(_) | AttributeKind::ElementCollection => true,
        }
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        match &self.kind {
            AttributeKind::Basic(basic) => basic.identity,
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_tenant(&self) -> bool {
        match &self.kind {
            AttributeKind::Basic(basic) => basic.tenant,
            _ => false,
        }
    }

    /// Non-insertable attributes can never be supplied by the caller, so
    /// both the shrinker (validity exemption) and the persister (dependency
    /// selection) consult this.
    #[must_use]
    pub const fn is_insertable(&self) -> bool {
        match &self.kind {
            AttributeKind::Basic(basic) => basic.insertable,
            AttributeKind::ToOne(to_one) => to_one.insertable,
            AttributeKind::ToMany(to_many) => to_many.insertable,
            AttributeKind::Embedded(_) | AttributeKind::ElementCollection => true,
        }
    }

    /// Inverse-side marker: the name of the owning attribute on the target
    /// type, or `None` when this side is owning.
    #[must_use]
    pub fn mapped_by(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::ToOne(to_one) => to_one.mapped_by.as_deref(),
            AttributeKind::ToMany(to_many) => to_many.mapped_by.as_deref(),
            _ => None,
        }
    }

    /// Referenced type: the embedded component type, the to-one target, or
    /// the to-many element type.
    #[must_use]
    pub const fn target(&self) -> Option<TypeId> {
        match &self.kind {
            AttributeKind::Embedded(embedded) => Some(embedded.target),
            AttributeKind::ToOne(to_one) => Some(to_one.target),
            AttributeKind::ToMany(to_many) => Some(to_many.element),
            AttributeKind::Basic(_) | AttributeKind::ElementCollection => None,
        }
    }
}

///
/// AttributeKind
///
/// Closed kind surface; every engine decision point matches exhaustively on
/// this, with no catch-all arm.
///

#[derive(Clone, Debug, Serialize)]
pub enum AttributeKind {
    Basic(BasicAttribute),
    Embedded(EmbeddedAttribute),
    ToOne(ToOneAttribute),
    ToMany(ToManyAttribute),
    ElementCollection,
}

///
/// BasicAttribute
///

#[derive(Clone, Debug, Serialize)]
pub struct BasicAttribute {
    pub optional: bool,
    pub identity: bool,
    pub generated: bool,
    pub tenant: bool,
    pub insertable: bool,
}

impl BasicAttribute {
    /// Nullable scalar, the default mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            optional: true,
            identity: false,
            generated: false,
            tenant: false,
            insertable: true,
        }
    }

    /// Mandatory scalar.
    #[must_use]
    pub const fn required() -> Self {
        Self {
            optional: false,
            ..Self::new()
        }
    }

    /// Identity scalar. Identity attributes are never optional but are
    /// exempt from the shrinker's mandatory check.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            optional: false,
            identity: true,
            ..Self::new()
        }
    }

    /// Generated identity scalar.
    #[must_use]
    pub const fn generated_identity() -> Self {
        Self {
            generated: true,
            ..Self::identity()
        }
    }

    /// Tenant discriminator: pseudo-mandatory, populated by the backing
    /// store rather than the caller.
    #[must_use]
    pub const fn tenant() -> Self {
        Self {
            optional: false,
            tenant: true,
            ..Self::new()
        }
    }
}

impl Default for BasicAttribute {
    fn default() -> Self {
        Self::new()
    }
}

///
/// EmbeddedAttribute
///

#[derive(Clone, Debug, Serialize)]
pub struct EmbeddedAttribute {
    pub target: TypeId,
    pub optional: bool,
}

impl EmbeddedAttribute {
    #[must_use]
    pub const fn new(target: TypeId) -> Self {
        Self {
            target,
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(target: TypeId) -> Self {
        Self {
            target,
            optional: true,
        }
    }
}

///
/// ToOneAttribute
///

#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ToOneArity {
    ManyToOne,
    OneToOne,
}

#[derive(Clone, Debug, Serialize)]
pub struct ToOneAttribute {
    pub arity: ToOneArity,
    pub target: TypeId,
    /// Inverse side when set; only one-to-one may be inverse.
    pub mapped_by: Option<String>,
    pub optional: bool,
    pub insertable: bool,
    /// Declared foreign-key column, matched by join-column map keys.
    pub join_column: Option<String>,
}

impl ToOneAttribute {
    /// Owning many-to-one, nullable by default.
    #[must_use]
    pub const fn many_to_one(target: TypeId) -> Self {
        Self {
            arity: ToOneArity::ManyToOne,
            target,
            mapped_by: None,
            optional: true,
            insertable: true,
            join_column: None,
        }
    }

    /// Owning one-to-one.
    #[must_use]
    pub fn one_to_one(target: TypeId) -> Self {
        Self {
            arity: ToOneArity::OneToOne,
            ..Self::many_to_one(target)
        }
    }

    /// Inverse one-to-one, mapped by the named owning attribute on the
    /// target type.
    #[must_use]
    pub fn one_to_one_inverse(target: TypeId, mapped_by: impl Into<String>) -> Self {
        Self {
            mapped_by: Some(mapped_by.into()),
            ..Self::one_to_one(target)
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    #[must_use]
    pub const fn non_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }

    #[must_use]
    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }
}

///
/// ToManyAttribute
///

#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ToManyArity {
    ManyToMany,
    OneToMany,
}

#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ContainerKind {
    List,
    Map,
    Set,
}

///
/// MapKeyPolicy
/// How the fixer derives the key when putting an element into a map
/// association.
///

#[derive(Clone, Debug, Default, Serialize)]
pub enum MapKeyPolicy {
    /// Key by the element's identity: its single identity attribute value,
    /// or a composite of all identity components.
    #[default]
    ElementIdentity,
    /// Key by the named attribute on the element type.
    Attribute(String),
    /// Key by the element's to-one reference whose declared join column
    /// matches `column` (default `<attribute>_KEY`) and whose target is
    /// `key_type`.
    JoinColumn {
        column: Option<String>,
        key_type: TypeId,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ToManyAttribute {
    pub arity: ToManyArity,
    pub element: TypeId,
    pub container: ContainerKind,
    /// Inverse side when set.
    pub mapped_by: Option<String>,
    pub insertable: bool,
    /// Only meaningful for `ContainerKind::Map`.
    pub map_key: MapKeyPolicy,
}

impl ToManyAttribute {
    /// Owning one-to-many set (no inverse side).
    #[must_use]
    pub const fn one_to_many(element: TypeId) -> Self {
        Self {
            arity: ToManyArity::OneToMany,
            element,
            container: ContainerKind::Set,
            mapped_by: None,
            insertable: true,
            map_key: MapKeyPolicy::ElementIdentity,
        }
    }

    /// Owning many-to-many set.
    #[must_use]
    pub fn many_to_many(element: TypeId) -> Self {
        Self {
            arity: ToManyArity::ManyToMany,
            ..Self::one_to_many(element)
        }
    }

    /// Mark this side inverse, mapped by the named owning attribute on the
    /// element type.
    #[must_use]
    pub fn mapped_by(mut self, owning: impl Into<String>) -> Self {
        self.mapped_by = Some(owning.into());
        self
    }

    #[must_use]
    pub const fn as_list(mut self) -> Self {
        self.container = ContainerKind::List;
        self
    }

    #[must_use]
    pub const fn as_map(mut self) -> Self {
        self.container = ContainerKind::Map;
        self
    }

    #[must_use]
    pub fn keyed_by_attribute(mut self, ident: impl Into<String>) -> Self {
        self.container = ContainerKind::Map;
        self.map_key = MapKeyPolicy::Attribute(ident.into());
        self
    }

    #[must_use]
    pub fn keyed_by_join_column(mut self, column: Option<String>, key_type: TypeId) -> Self {
        self.container = ContainerKind::Map;
        self.map_key = MapKeyPolicy::JoinColumn { column, key_type };
        self
    }

    #[must_use]
    pub const fn non_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }
}
