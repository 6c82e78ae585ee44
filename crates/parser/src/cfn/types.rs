//! CloudFormation resource specification document types
//!
//! These types mirror the raw JSON layout; they are converted into the
//! normalized model before any code is generated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root of the CloudFormation resource specification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudFormationResourceSpecification {
    /// Shared property types keyed by `Vendor::Group::Kind.PropertyName`
    #[serde(default)]
    pub property_types: HashMap<String, CloudFormationResource>,

    /// Resource types keyed by `Vendor::Group::Kind`
    #[serde(default)]
    pub resource_types: HashMap<String, CloudFormationResource>,

    /// Specification version (e.g., "9.1.1")
    #[serde(default)]
    pub resource_specification_version: String,
}

/// A resource type or property type declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudFormationResource {
    #[serde(default)]
    pub documentation: String,

    #[serde(default)]
    pub properties: HashMap<String, Property>,

    #[serde(default)]
    pub attributes: HashMap<String, Attribute>,
}

/// A read-only attribute declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attribute {
    #[serde(default)]
    pub primitive_type: String,

    #[serde(default, rename = "Type")]
    pub type_name: String,

    #[serde(default)]
    pub primitive_item_type: String,
}

/// A property declaration
///
/// Exactly one of `primitive_type` and `type_name` is expected to be set; for
/// `List` and `Map` types, one of `item_type` and `primitive_item_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub documentation: String,

    #[serde(default)]
    pub duplicates_allowed: bool,

    #[serde(default)]
    pub update_type: String,

    #[serde(default)]
    pub item_type: String,

    #[serde(default)]
    pub primitive_type: String,

    #[serde(default)]
    pub primitive_item_type: String,

    #[serde(default, rename = "Type")]
    pub type_name: String,
}

/// Components of a `Vendor::Group::Kind` resource type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeName<'a> {
    /// Group segment as written (e.g., "ApiGateway")
    pub group: &'a str,
    /// Last segment (e.g., "Deployment")
    pub kind: &'a str,
}

impl<'a> ResourceTypeName<'a> {
    /// Split a resource type name
    ///
    /// Returns `None` when the name has fewer than three `::` segments.
    pub fn split(name: &'a str) -> Option<Self> {
        let segments: Vec<&str> = name.split("::").collect();
        if segments.len() < 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        Some(Self {
            group: segments[1],
            kind: segments[segments.len() - 1],
        })
    }
}

/// Split a property type name into its host resource name and short name
///
/// e.g., "AWS::ApiGateway::Deployment.StageDescription" ->
/// ("AWS::ApiGateway::Deployment", "StageDescription")
pub fn split_property_type_name(name: &str) -> Option<(&str, &str)> {
    let (resource, property) = name.split_once('.')?;
    if resource.is_empty() || property.is_empty() {
        return None;
    }
    Some((resource, property))
}
