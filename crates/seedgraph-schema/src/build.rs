//! Programmatic schema construction. `SchemaBuilder` mints type ids up
//! front so types can reference each other in any declaration order;
//! `finish` validates the whole schema and reports every issue at once.

use crate::{
    MAX_IDENT_LEN,
    model::{
        AttributeKind, AttributeModel, ContainerKind, ManagedTypeModel, MapKeyPolicy, SchemaModel,
        ToManyArity, ToOneArity, TypeId, TypeKind,
    },
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// SchemaBuildError
///

#[derive(Debug, ThisError)]
pub enum SchemaBuildError {
    #[error("schema validation failed: {}", render_issues(.0))]
    Validation(Vec<SchemaIssue>),
}

fn render_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

///
/// SchemaIssue
/// One validation finding, located by type and (optionally) attribute.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaIssue {
    pub ty: String,
    pub attribute: Option<String>,
    pub message: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{}.{}: {}", self.ty, attr, self.message),
            None => write!(f, "{}: {}", self.ty, self.message),
        }
    }
}

///
/// SchemaBuilder
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: Vec<ManagedTypeModel>,
    lenient_nullability: bool,
    issues: Vec<SchemaIssue>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag the schema as coming from a provider with unreliable nullability
    /// metadata for embeddable/mapped-superclass declared attributes.
    #[must_use]
    pub const fn lenient_nullability(mut self) -> Self {
        self.lenient_nullability = true;
        self
    }

    /// Declare an entity type and mint its id.
    pub fn entity(&mut self, ident: impl Into<String>) -> TypeId {
        self.declare(ident.into(), TypeKind::Entity)
    }

    /// Declare an embeddable component type.
    pub fn embeddable(&mut self, ident: impl Into<String>) -> TypeId {
        self.declare(ident.into(), TypeKind::Embeddable)
    }

    /// Declare a mapped superclass. Never instantiable; present so schemas
    /// can model the provider metadata the engines must reject at runtime.
    pub fn mapped_superclass(&mut self, ident: impl Into<String>) -> TypeId {
        self.declare(ident.into(), TypeKind::MappedSuperclass)
    }

    fn declare(&mut self, ident: String, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ManagedTypeModel {
            ident,
            kind,
            attributes: Vec::new(),
        });
        id
    }

    /// Append an attribute to a previously declared type. An id this
    /// builder never minted is reported as an issue by `finish`.
    pub fn attr(&mut self, ty: TypeId, ident: impl Into<String>, kind: impl Into<AttributeKind>) {
        let ident = ident.into();
        let Some(model) = self.types.get_mut(ty.index()) else {
            self.issues.push(SchemaIssue {
                ty: ty.to_string(),
                attribute: Some(ident),
                message: "attribute declared on an unknown type id".to_string(),
            });
            return;
        };
        model.attributes.push(AttributeModel {
            ident,
            kind: kind.into(),
        });
    }

    /// Validate and seal the schema.
    pub fn finish(self) -> Result<SchemaModel, SchemaBuildError> {
        let Self {
            types,
            lenient_nullability,
            mut issues,
        } = self;
        validate(&types, &mut issues);
        if !issues.is_empty() {
            return Err(SchemaBuildError::Validation(issues));
        }

        let idents = types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.ident.clone(), TypeId(i as u32)))
            .collect::<BTreeMap<_, _>>();

        Ok(SchemaModel {
            types,
            idents,
            lenient_nullability,
        })
    }
}

// Conversions so builder call sites can pass kind structs directly.
impl From<crate::model::BasicAttribute> for AttributeKind {
    fn from(basic: crate::model::BasicAttribute) -> Self {
        Self::Basic(basic)
    }
}
impl From<crate::model::EmbeddedAttribute> for AttributeKind {
    fn from(embedded: crate::model::EmbeddedAttribute) -> Self {
        Self::Embedded(embedded)
    }
}
impl From<crate::model::ToOneAttribute> for AttributeKind {
    fn from(to_one: crate::model::ToOneAttribute) -> Self {
        Self::ToOne(to_one)
    }
}
impl From<crate::model::ToManyAttribute> for AttributeKind {
    fn from(to_many: crate::model::ToManyAttribute) -> Self {
        Self::ToMany(to_many)
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate(types: &[ManagedTypeModel], issues: &mut Vec<SchemaIssue>) {
    validate_idents(types, issues);
    for ty in types {
        validate_type(types, ty, issues);
    }
}

fn issue(
    issues: &mut Vec<SchemaIssue>,
    ty: &ManagedTypeModel,
    attribute: Option<&str>,
    message: impl Into<String>,
) {
    issues.push(SchemaIssue {
        ty: ty.ident.clone(),
        attribute: attribute.map(ToOwned::to_owned),
        message: message.into(),
    });
}

fn validate_idents(types: &[ManagedTypeModel], issues: &mut Vec<SchemaIssue>) {
    let mut seen = BTreeMap::new();
    for ty in types {
        if ty.ident.is_empty() || ty.ident.len() > MAX_IDENT_LEN {
            issue(issues, ty, None, "type identifier is empty or too long");
        }
        if seen.insert(ty.ident.as_str(), ()).is_some() {
            issue(issues, ty, None, "duplicate type identifier");
        }

        let mut attrs = BTreeMap::new();
        for attr in &ty.attributes {
            if attr.ident.is_empty() || attr.ident.len() > MAX_IDENT_LEN {
                issue(
                    issues,
                    ty,
                    Some(&attr.ident),
                    "attribute identifier is empty or too long",
                );
            }
            if attrs.insert(attr.ident.as_str(), ()).is_some() {
                issue(issues, ty, Some(&attr.ident), "duplicate attribute identifier");
            }
        }
    }
}

fn validate_type(types: &[ManagedTypeModel], ty: &ManagedTypeModel, issues: &mut Vec<SchemaIssue>) {
    if ty.kind == TypeKind::Entity && ty.identity_attributes().next().is_none() {
        issue(issues, ty, None, "entity declares no identity attribute");
    }

    for attr in &ty.attributes {
        match &attr.kind {
            AttributeKind::Basic(_) | AttributeKind::ElementCollection => {}
            AttributeKind::Embedded(embedded) => {
                let Some(target) = types.get(embedded.target.index()) else {
                    issue(issues, ty, Some(&attr.ident), "embedded target is not a declared type");
                    continue;
                };
                if target.kind != TypeKind::Embeddable {
                    issue(
                        issues,
                        ty,
                        Some(&attr.ident),
                        format!("embedded target '{}' is not an embeddable type", target.ident),
                    );
                }
            }
            AttributeKind::ToOne(to_one) => {
                let Some(target) = types.get(to_one.target.index()) else {
                    issue(issues, ty, Some(&attr.ident), "association target is not a declared type");
                    continue;
                };
                if target.kind != TypeKind::Entity {
                    issue(
                        issues,
                        ty,
                        Some(&attr.ident),
                        format!("association target '{}' is not an entity type", target.ident),
                    );
                }
                match (&to_one.arity, &to_one.mapped_by) {
                    (ToOneArity::ManyToOne, Some(_)) => {
                        issue(
                            issues,
                            ty,
                            Some(&attr.ident),
                            "many-to-one is always owning and must not declare mapped_by",
                        );
                    }
                    (ToOneArity::OneToOne, Some(mapped_by)) => {
                        validate_mapped_by(target, mapped_by, ty, attr, issues, |owning| {
                            matches!(
                                &owning.kind,
                                AttributeKind::ToOne(inner)
                                    if inner.arity == ToOneArity::OneToOne
                                        && inner.mapped_by.is_none()
                            )
                        });
                    }
                    (_, None) => {}
                }
            }
            AttributeKind::ToMany(to_many) => {
                let Some(element) = types.get(to_many.element.index()) else {
                    issue(issues, ty, Some(&attr.ident), "association element is not a declared type");
                    continue;
                };
                // Mapped-superclass elements are representable (providers
                // report them) and rejected at shrink time, not here.
                if element.kind == TypeKind::Embeddable {
                    issue(
                        issues,
                        ty,
                        Some(&attr.ident),
                        format!("association element '{}' is an embeddable type", element.ident),
                    );
                }
                if let Some(mapped_by) = &to_many.mapped_by {
                    match to_many.arity {
                        ToManyArity::OneToMany => {
                            validate_mapped_by(element, mapped_by, ty, attr, issues, |owning| {
                                matches!(
                                    &owning.kind,
                                    AttributeKind::ToOne(inner)
                                        if inner.arity == ToOneArity::ManyToOne
                                )
                            });
                        }
                        ToManyArity::ManyToMany => {
                            validate_mapped_by(element, mapped_by, ty, attr, issues, |owning| {
                                matches!(
                                    &owning.kind,
                                    AttributeKind::ToMany(inner)
                                        if inner.arity == ToManyArity::ManyToMany
                                            && inner.mapped_by.is_none()
                                )
                            });
                        }
                    }
                }
                validate_map_key(types, ty, attr, to_many, element, issues);
            }
        }
    }
}

fn validate_mapped_by(
    target: &ManagedTypeModel,
    mapped_by: &str,
    ty: &ManagedTypeModel,
    attr: &AttributeModel,
    issues: &mut Vec<SchemaIssue>,
    owning_matches: impl Fn(&AttributeModel) -> bool,
) {
    match target.attribute(mapped_by) {
        None => issue(
            issues,
            ty,
            Some(&attr.ident),
            format!("mapped_by '{}' does not exist on '{}'", mapped_by, target.ident),
        ),
        Some((_, owning)) if !owning_matches(owning) => issue(
            issues,
            ty,
            Some(&attr.ident),
            format!(
                "mapped_by '{}' on '{}' is not an owning attribute of the matching kind",
                mapped_by, target.ident
            ),
        ),
        Some(_) => {}
    }
}

fn validate_map_key(
    types: &[ManagedTypeModel],
    ty: &ManagedTypeModel,
    attr: &AttributeModel,
    to_many: &crate::model::ToManyAttribute,
    element: &ManagedTypeModel,
    issues: &mut Vec<SchemaIssue>,
) {
    match &to_many.map_key {
        MapKeyPolicy::ElementIdentity => {}
        MapKeyPolicy::Attribute(ident) => {
            if to_many.container != ContainerKind::Map {
                issue(issues, ty, Some(&attr.ident), "map key declared on a non-map container");
            } else if element.attribute(ident).is_none() {
                issue(
                    issues,
                    ty,
                    Some(&attr.ident),
                    format!("map key attribute '{}' does not exist on '{}'", ident, element.ident),
                );
            }
        }
        MapKeyPolicy::JoinColumn { key_type, .. } => {
            if to_many.container != ContainerKind::Map {
                issue(issues, ty, Some(&attr.ident), "map key declared on a non-map container");
            } else if !types.get(key_type.index()).is_some_and(|t| t.kind == TypeKind::Entity) {
                issue(
                    issues,
                    ty,
                    Some(&attr.ident),
                    "join-column map key type is not an entity type",
                );
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
