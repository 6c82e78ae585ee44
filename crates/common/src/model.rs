//! Normalized specification model
//!
//! The parser turns the raw CloudFormation resource specification into these
//! types. Once built, a [`ResourceSet`] is never mutated again and is shared
//! read-only between the per-resource generation passes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// API version assigned to every generated resource kind
pub const DEFAULT_API_VERSION: &str = "v1alpha1";

/// Name of the property type handled as a built-in well-known type
pub const TAG_TYPE_NAME: &str = "Tag";

/// Primitive value kinds of the specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    Integer,
    Double,
    Boolean,
    Json,
}

impl PrimitiveKind {
    /// Parse a raw `PrimitiveType`/`PrimitiveItemType` value
    ///
    /// `Long` is carried as an integer and `Timestamp` as a string.
    pub fn from_spec_name(name: &str) -> Option<Self> {
        match name {
            "String" | "Timestamp" => Some(Self::String),
            "Integer" | "Long" => Some(Self::Integer),
            "Double" => Some(Self::Double),
            "Boolean" => Some(Self::Boolean),
            "Json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved shape of a property or attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSignature {
    Primitive(PrimitiveKind),
    List(Box<TypeSignature>),
    Map(Box<TypeSignature>),
    Nested(String),
}

impl TypeSignature {
    /// Name of the nested type this signature refers to, looking through
    /// one level of list or map
    pub fn nested_type_name(&self) -> Option<&str> {
        match self {
            Self::Nested(name) => Some(name),
            Self::List(item) | Self::Map(item) => item.nested_type_name(),
            Self::Primitive(_) => None,
        }
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        matches!(self, Self::Primitive(p) if *p == kind)
    }
}

/// Whether changing a property forces replacement of the resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    #[default]
    Mutable,
    Immutable,
    Conditional,
}

impl UpdateType {
    pub fn from_spec_name(name: &str) -> Self {
        match name {
            "Immutable" => Self::Immutable,
            "Conditional" => Self::Conditional,
            _ => Self::Mutable,
        }
    }
}

/// A declared property of a resource or nested type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub documentation: String,
    pub required: bool,
    pub update_type: UpdateType,
    pub duplicates_allowed: bool,
    pub signature: TypeSignature,
}

/// A read-only attribute available once the resource exists
///
/// The signature is always `Primitive` or `List(Primitive)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub signature: TypeSignature,
}

impl AttributeDescriptor {
    pub fn is_list(&self) -> bool {
        matches!(self.signature, TypeSignature::List(_))
    }
}

/// A named bag of properties and attributes
///
/// Map iteration order carries no meaning; use [`TypeNode::sorted_properties`]
/// and [`TypeNode::sorted_attributes`] whenever order matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    pub name: String,
    pub documentation: String,
    pub properties: HashMap<String, PropertyDescriptor>,
    pub attributes: HashMap<String, AttributeDescriptor>,
}

impl TypeNode {
    pub fn new(name: impl Into<String>, documentation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documentation: documentation.into(),
            ..Default::default()
        }
    }

    /// Properties in lexical order of their names
    pub fn sorted_properties(&self) -> Vec<(&str, &PropertyDescriptor)> {
        let mut props: Vec<_> = self
            .properties
            .iter()
            .map(|(name, prop)| (name.as_str(), prop))
            .collect();
        props.sort_by(|a, b| a.0.cmp(b.0));
        props
    }

    /// Attributes in lexical order of their names
    pub fn sorted_attributes(&self) -> Vec<(&str, &AttributeDescriptor)> {
        let mut attrs: Vec<_> = self
            .attributes
            .iter()
            .map(|(name, attr)| (name.as_str(), attr))
            .collect();
        attrs.sort_by(|a, b| a.0.cmp(b.0));
        attrs
    }
}

/// A generatable resource kind (group/version/kind) and its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    /// Lowercase API group (e.g., "apigateway")
    pub group: String,
    /// API version (e.g., "v1alpha1")
    pub version: String,
    /// Kind name (e.g., "Deployment")
    pub kind: String,
    /// Fully-qualified specification name (e.g., "AWS::ApiGateway::Deployment")
    pub resource_name: String,
    /// Directly declared properties and attributes
    pub root: TypeNode,
    /// Every property type of this resource, keyed by short name
    pub property_types: HashMap<String, TypeNode>,
}

impl ResourceKind {
    pub fn nested_type(&self, name: &str) -> Option<&TypeNode> {
        self.property_types.get(name)
    }

    /// Nested type names reachable from the root that have no definition
    ///
    /// Returns an empty set when the resource is complete. The built-in tag
    /// type is never reported.
    pub fn missing_nested_types(&self) -> BTreeSet<String> {
        let mut missing = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending = vec![&self.root];

        while let Some(node) = pending.pop() {
            for prop in node.properties.values() {
                let Some(name) = prop.signature.nested_type_name() else {
                    continue;
                };
                if name == TAG_TYPE_NAME || !visited.insert(name.to_string()) {
                    continue;
                }
                match self.property_types.get(name) {
                    Some(nested) => pending.push(nested),
                    None => {
                        missing.insert(name.to_string());
                    },
                }
            }
        }

        missing
    }

    /// Lowercase `group:kind` pair used by resource include filters
    pub fn pair(&self) -> String {
        format!("{}:{}", self.group, self.kind).to_lowercase()
    }
}

/// Every normalized resource kind plus the include filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub specification_version: String,
    resources: Vec<ResourceKind>,
    include_groups: Vec<String>,
    include_resources: Vec<String>,
}

impl ResourceSet {
    /// Build a set from normalized resources
    ///
    /// Resources are ordered by (group, kind); filters are compared
    /// case-insensitively.
    pub fn new(
        specification_version: impl Into<String>,
        mut resources: Vec<ResourceKind>,
        include_groups: &[String],
        include_resources: &[String],
    ) -> Self {
        resources.sort_by(|a, b| (&a.group, &a.kind).cmp(&(&b.group, &b.kind)));

        Self {
            specification_version: specification_version.into(),
            resources,
            include_groups: include_groups.iter().map(|g| g.to_lowercase()).collect(),
            include_resources: include_resources.iter().map(|r| r.to_lowercase()).collect(),
        }
    }

    /// Resources selected by the include filters
    pub fn resources(&self) -> Vec<&ResourceKind> {
        self.resources
            .iter()
            .filter(|r| self.is_included(r))
            .collect()
    }

    /// Every normalized resource regardless of filters
    pub fn all_resources(&self) -> &[ResourceKind] {
        &self.resources
    }

    pub fn is_included(&self, resource: &ResourceKind) -> bool {
        self.include_groups.contains(&resource.group)
            || self.include_resources.contains(&resource.pair())
    }

    pub fn find(&self, group: &str, kind: &str) -> Option<&ResourceKind> {
        self.resources
            .iter()
            .find(|r| r.group.eq_ignore_ascii_case(group) && r.kind == kind)
    }

    pub fn include_groups(&self) -> &[String] {
        &self.include_groups
    }

    pub fn include_resources(&self) -> &[String] {
        &self.include_resources
    }
}
