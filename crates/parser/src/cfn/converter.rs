//! Converts the CloudFormation specification into the normalized model

use super::types::{
    split_property_type_name, Attribute, CloudFormationResource,
    CloudFormationResourceSpecification, Property, ResourceTypeName,
};
use cfn_controller_gen_common::{
    AttributeDescriptor, GeneratorError, PrimitiveKind, PropertyDescriptor, ResourceKind,
    ResourceSet, Result, TypeNode, TypeSignature, UpdateType, DEFAULT_API_VERSION,
    TAG_TYPE_NAME,
};
use std::collections::HashMap;

/// Convert a specification into a [`ResourceSet`]
///
/// Resource types are built first so that every property type can be
/// attached to its host resource afterwards.
pub fn convert_specification(
    spec: &CloudFormationResourceSpecification,
    include_groups: &[String],
    include_resources: &[String],
) -> Result<ResourceSet> {
    let mut resources = build_resources(spec)?;
    attach_property_types(spec, &mut resources)?;

    tracing::debug!(
        version = %spec.resource_specification_version,
        resources = resources.len(),
        property_types = spec.property_types.len(),
        "normalized resource specification"
    );

    Ok(ResourceSet::new(
        spec.resource_specification_version.clone(),
        resources.into_values().collect(),
        include_groups,
        include_resources,
    ))
}

/// Build every resource kind, keyed by (lowercase group, kind)
fn build_resources(
    spec: &CloudFormationResourceSpecification,
) -> Result<HashMap<(String, String), ResourceKind>> {
    let mut resources = HashMap::with_capacity(spec.resource_types.len());

    for (resource_name, declaration) in &spec.resource_types {
        let type_name = ResourceTypeName::split(resource_name).ok_or_else(|| {
            GeneratorError::Parse(format!("Malformed resource type name: {}", resource_name))
        })?;

        let resource = ResourceKind {
            group: type_name.group.to_lowercase(),
            version: DEFAULT_API_VERSION.to_string(),
            kind: type_name.kind.to_string(),
            resource_name: resource_name.clone(),
            root: convert_type_node(type_name.kind, declaration)?,
            property_types: HashMap::new(),
        };

        resources.insert((resource.group.clone(), resource.kind.clone()), resource);
    }

    Ok(resources)
}

/// Attach each shared property type to its host resource
fn attach_property_types(
    spec: &CloudFormationResourceSpecification,
    resources: &mut HashMap<(String, String), ResourceKind>,
) -> Result<()> {
    for (full_name, declaration) in &spec.property_types {
        if full_name == TAG_TYPE_NAME {
            continue;
        }

        let (host_name, property_name) = split_property_type_name(full_name).ok_or_else(|| {
            GeneratorError::Parse(format!("Malformed property type name: {}", full_name))
        })?;
        let host = ResourceTypeName::split(host_name).ok_or_else(|| {
            GeneratorError::Parse(format!("Malformed property type name: {}", full_name))
        })?;

        let key = (host.group.to_lowercase(), host.kind.to_string());
        let resource = resources.get_mut(&key).ok_or_else(|| {
            GeneratorError::UnresolvedHostResource {
                name: full_name.clone(),
            }
        })?;

        let node = convert_type_node(property_name, declaration)?;
        resource
            .property_types
            .insert(property_name.to_string(), node);
    }

    Ok(())
}

fn convert_type_node(name: &str, declaration: &CloudFormationResource) -> Result<TypeNode> {
    let mut node = TypeNode::new(name, declaration.documentation.clone());

    for (prop_name, property) in &declaration.properties {
        let descriptor = convert_property(prop_name, property)
            .map_err(|e| with_context(e, name, prop_name))?;
        node.properties.insert(prop_name.clone(), descriptor);
    }

    for (attr_name, attribute) in &declaration.attributes {
        match convert_attribute(attribute).map_err(|e| with_context(e, name, attr_name))? {
            Some(descriptor) => {
                node.attributes.insert(attr_name.clone(), descriptor);
            },
            None => tracing::warn!(
                owner = name,
                attribute = %attr_name,
                "skipping attribute that is not a primitive or list of primitives"
            ),
        }
    }

    Ok(node)
}

fn with_context(err: GeneratorError, owner: &str, name: &str) -> GeneratorError {
    match err {
        GeneratorError::Parse(msg) => GeneratorError::Parse(format!("{}.{}: {}", owner, name, msg)),
        other => other,
    }
}

/// Convert a property declaration
pub(crate) fn convert_property(name: &str, property: &Property) -> Result<PropertyDescriptor> {
    Ok(PropertyDescriptor {
        documentation: property.documentation.clone(),
        required: property.required,
        update_type: UpdateType::from_spec_name(&property.update_type),
        duplicates_allowed: property.duplicates_allowed,
        signature: property_signature(name, property)?,
    })
}

/// Derive a signature from the four raw type fields
///
/// `PrimitiveType` wins over `Type`; `List`/`Map` wrap the item signature.
pub(crate) fn property_signature(name: &str, property: &Property) -> Result<TypeSignature> {
    if !property.primitive_type.is_empty() {
        return primitive(&property.primitive_type).map(TypeSignature::Primitive);
    }

    match property.type_name.as_str() {
        "" => Err(GeneratorError::Parse(format!(
            "property {} declares no type",
            name
        ))),
        "List" => Ok(TypeSignature::List(Box::new(item_signature(name, property)?))),
        "Map" => Ok(TypeSignature::Map(Box::new(item_signature(name, property)?))),
        other => Ok(TypeSignature::Nested(other.to_string())),
    }
}

fn item_signature(name: &str, property: &Property) -> Result<TypeSignature> {
    if !property.primitive_item_type.is_empty() {
        return primitive(&property.primitive_item_type).map(TypeSignature::Primitive);
    }
    if !property.item_type.is_empty() {
        return Ok(TypeSignature::Nested(property.item_type.clone()));
    }

    Err(GeneratorError::Parse(format!(
        "{} property {} declares no item type",
        property.type_name, name
    )))
}

/// Convert an attribute declaration
///
/// Only primitives and lists of primitives are modelled; any other shape
/// yields `None`.
pub(crate) fn convert_attribute(attribute: &Attribute) -> Result<Option<AttributeDescriptor>> {
    let signature = if !attribute.primitive_type.is_empty() {
        TypeSignature::Primitive(primitive(&attribute.primitive_type)?)
    } else if attribute.type_name == "List" && !attribute.primitive_item_type.is_empty() {
        TypeSignature::List(Box::new(TypeSignature::Primitive(primitive(
            &attribute.primitive_item_type,
        )?)))
    } else {
        return Ok(None);
    };

    Ok(Some(AttributeDescriptor { signature }))
}

fn primitive(name: &str) -> Result<PrimitiveKind> {
    PrimitiveKind::from_spec_name(name)
        .ok_or_else(|| GeneratorError::Parse(format!("unsupported primitive type {}", name)))
}
