//! Type resolution from specification signatures to generated types
//!
//! Maps a [`TypeSignature`] onto the [`TargetType`] used for the generated
//! Go definitions, and applies identifier/ARN reference folding to property
//! names.

use crate::model::{
    AttributeDescriptor, PrimitiveKind, PropertyDescriptor, TypeSignature, TAG_TYPE_NAME,
};
use serde::{Deserialize, Serialize};

/// Target-language representation of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    String,
    Integer,
    Boolean,
    /// Cross-resource reference resolved through a lookup client at runtime
    Reference,
    /// Built-in tag type
    Tag,
    /// Owner-namespaced nested type (e.g., "Bucket_LifecycleConfiguration")
    Named(String),
    List(Box<TargetType>),
    /// Map keyed by string
    Map(Box<TargetType>),
}

impl TargetType {
    /// Human-readable name used in generated documentation
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Reference => "reference".to_string(),
            Self::Tag => "tag".to_string(),
            Self::Named(name) => name.clone(),
            Self::List(item) => format!("list of {}", item.describe()),
            Self::Map(item) => format!("map of {}", item.describe()),
        }
    }
}

/// Reference folding applied to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Folding {
    None,
    /// `FooId`/`FooArn` became `FooRef`
    Single,
    /// `FooIds`/`FooArns` became `FooRefs`
    Plural,
}

/// A property with its field name and target type resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    /// Field name on the generated spec type (after folding)
    pub name: String,
    /// Property name as declared in the specification
    pub original_name: String,
    pub target: TargetType,
    pub folding: Folding,
}

impl ResolvedField {
    pub fn is_reference(&self) -> bool {
        self.folding != Folding::None
    }
}

/// Resolves specification signatures to target types
pub struct TypeResolver;

impl TypeResolver {
    /// Map a primitive kind onto its target type
    ///
    /// Doubles are narrowed to integers and Json is carried as opaque text.
    ///
    /// # Examples
    /// ```
    /// use cfn_controller_gen_common::{PrimitiveKind, TargetType, TypeResolver};
    ///
    /// assert_eq!(TypeResolver::primitive(PrimitiveKind::Integer), TargetType::Integer);
    /// assert_eq!(TypeResolver::primitive(PrimitiveKind::Double), TargetType::Integer);
    /// assert_eq!(TypeResolver::primitive(PrimitiveKind::Json), TargetType::String);
    /// ```
    pub fn primitive(kind: PrimitiveKind) -> TargetType {
        match kind {
            PrimitiveKind::String | PrimitiveKind::Json => TargetType::String,
            PrimitiveKind::Integer | PrimitiveKind::Double => TargetType::Integer,
            PrimitiveKind::Boolean => TargetType::Boolean,
        }
    }

    /// Resolve a signature owned by `owner_kind`
    ///
    /// With `plural` unset, lists and maps resolve to their element type.
    pub fn resolve_field_type(
        signature: &TypeSignature,
        owner_kind: &str,
        plural: bool,
    ) -> TargetType {
        match signature {
            TypeSignature::Primitive(kind) => Self::primitive(*kind),
            TypeSignature::Nested(name) if name == TAG_TYPE_NAME => TargetType::Tag,
            TypeSignature::Nested(name) => {
                TargetType::Named(Self::nested_type_name(owner_kind, name))
            },
            TypeSignature::List(item) => {
                let item = Self::resolve_field_type(item, owner_kind, true);
                if plural {
                    TargetType::List(Box::new(item))
                } else {
                    item
                }
            },
            TypeSignature::Map(item) => {
                let item = Self::resolve_field_type(item, owner_kind, true);
                if plural {
                    TargetType::Map(Box::new(item))
                } else {
                    item
                }
            },
        }
    }

    /// Resolve a property, applying identifier/ARN reference folding
    pub fn resolve_property(
        name: &str,
        property: &PropertyDescriptor,
        owner_kind: &str,
    ) -> ResolvedField {
        let signature = &property.signature;

        if signature.is_primitive(PrimitiveKind::String) {
            if let Some(stem) = Self::strip_id_or_arn(name) {
                return ResolvedField {
                    name: format!("{}Ref", stem),
                    original_name: name.to_string(),
                    target: TargetType::Reference,
                    folding: Folding::Single,
                };
            }
        }

        if let TypeSignature::List(item) = signature {
            if item.is_primitive(PrimitiveKind::String) {
                if let Some(stem) = Self::strip_ids_or_arns(name) {
                    return ResolvedField {
                        name: format!("{}Refs", stem),
                        original_name: name.to_string(),
                        target: TargetType::List(Box::new(TargetType::Reference)),
                        folding: Folding::Plural,
                    };
                }
            }
        }

        ResolvedField {
            name: name.to_string(),
            original_name: name.to_string(),
            target: Self::resolve_field_type(signature, owner_kind, true),
            folding: Folding::None,
        }
    }

    /// Resolve an attribute; attributes are never folded
    pub fn resolve_attribute(attribute: &AttributeDescriptor) -> TargetType {
        // Attributes are never nested, so the owner is irrelevant
        Self::resolve_field_type(&attribute.signature, "", true)
    }

    /// Owner-namespaced name for a nested type
    pub fn nested_type_name(owner_kind: &str, type_name: &str) -> String {
        format!("{}_{}", owner_kind, type_name)
    }

    /// Identifier for an exported attribute, usable as a Go field name and
    /// as a stack output logical ID
    ///
    /// Attribute names may address sub-values (`Endpoint.Address`); everything
    /// but ASCII letters and digits is dropped.
    ///
    /// ```
    /// use cfn_controller_gen_common::TypeResolver;
    ///
    /// assert_eq!(TypeResolver::output_name("Endpoint.Address"), "EndpointAddress");
    /// ```
    pub fn output_name(attribute: &str) -> String {
        attribute
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    fn strip_id_or_arn(name: &str) -> Option<&str> {
        name.strip_suffix("Id")
            .or_else(|| name.strip_suffix("Arn"))
            .filter(|stem| !stem.is_empty())
    }

    fn strip_ids_or_arns(name: &str) -> Option<&str> {
        name.strip_suffix("Ids")
            .or_else(|| name.strip_suffix("Arns"))
            .filter(|stem| !stem.is_empty())
    }
}
