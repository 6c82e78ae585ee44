//! Recursive construction emission
//!
//! Walks a resource's property tree in lexical order and emits the
//! [`Fragment`]s that copy a user-facing spec object (`in.Spec`) into the
//! CloudFormation resource object. Emission is a pure function of the
//! [`ResourceKind`]; the same input always yields the same fragments.

use crate::exceptions::AttributeExceptions;
use crate::fragment::{Condition, Expr, Fragment, ScalarShape, Shape};
use cfn_controller_gen_common::{
    AttributeDescriptor, Folding, GeneratorError, PrimitiveKind, PropertyDescriptor,
    ResolvedField, ResourceKind, Result, TargetType, TypeNode, TypeResolver, TypeSignature,
    UpdateType, TAG_TYPE_NAME,
};
use serde::Serialize;

/// Expression holding the user-facing spec object
pub const SPEC_SOURCE: &str = "in.Spec";

/// A field of a generated object definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    /// Field name after reference folding
    pub name: String,
    /// Property name in the CloudFormation template
    pub cfn_name: String,
    pub target: TargetType,
    pub required: bool,
    pub documentation: String,
    pub update_type: UpdateType,
    pub reference: bool,
}

/// A generated object definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    pub documentation: String,
    pub fields: Vec<FieldDefinition>,
}

/// A read-only attribute exported from the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputField {
    /// Field name on the status type, with separators removed
    pub name: String,
    /// Attribute name as declared (e.g., "Endpoint.Address")
    pub attribute: String,
    pub target: TargetType,
}

/// Everything the object-definition artifact needs for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionSet {
    /// The `{Kind}Spec` definition
    pub spec: TypeDefinition,
    /// One definition per nested type, sorted by name
    pub nested: Vec<TypeDefinition>,
    pub outputs: Vec<OutputField>,
}

/// Emits construction fragments and definitions for one resource kind
pub struct Emitter<'a> {
    resource: &'a ResourceKind,
    exceptions: &'a AttributeExceptions,
}

impl<'a> Emitter<'a> {
    pub fn new(resource: &'a ResourceKind, exceptions: &'a AttributeExceptions) -> Self {
        Self {
            resource,
            exceptions,
        }
    }

    /// Variable holding the constructed resource (e.g., "apigatewayDeployment")
    pub fn root_target(&self) -> String {
        format!("{}{}", self.resource.group, self.resource.kind)
    }

    /// Emit construction of the whole resource from [`SPEC_SOURCE`]
    pub fn emit_construction(&self) -> Result<Vec<Fragment>> {
        let target = self.root_target();

        let mut fragments = vec![Fragment::Allocate {
            var: target.clone(),
            shape: Shape::Struct(self.resource.kind.clone()),
        }];
        fragments.extend(self.emit_node(&self.resource.root, &target, SPEC_SOURCE)?);

        tracing::debug!(
            resource = %self.resource.resource_name,
            fragments = fragments.len(),
            "emitted construction"
        );

        Ok(fragments)
    }

    /// Emit construction of `node` into `target`, reading from `source`
    pub fn emit_node(&self, node: &TypeNode, target: &str, source: &str) -> Result<Vec<Fragment>> {
        self.walk_node(node, target, source, &mut Vec::new())
    }

    /// Stack outputs for every exported attribute
    pub fn emit_outputs(&self) -> Vec<Fragment> {
        self.exported_attributes()
            .into_iter()
            .map(|(name, _)| Fragment::Output {
                name: TypeResolver::output_name(name),
                attribute: name.to_string(),
                logical_id: self.resource.kind.clone(),
            })
            .collect()
    }

    /// Object definitions for the spec, nested types and status outputs
    pub fn emit_definitions(&self) -> Result<DefinitionSet> {
        self.check_complete()?;

        let kind = &self.resource.kind;
        let spec = self.type_definition(format!("{}Spec", kind), &self.resource.root);

        let mut nested: Vec<TypeDefinition> = self
            .resource
            .property_types
            .iter()
            .map(|(name, node)| {
                self.type_definition(TypeResolver::nested_type_name(kind, name), node)
            })
            .collect();
        nested.sort_by(|a, b| a.name.cmp(&b.name));

        let outputs = self
            .exported_attributes()
            .into_iter()
            .map(|(name, attribute)| OutputField {
                name: TypeResolver::output_name(name),
                attribute: name.to_string(),
                target: TypeResolver::resolve_attribute(attribute),
            })
            .collect();

        Ok(DefinitionSet {
            spec,
            nested,
            outputs,
        })
    }

    fn exported_attributes(&self) -> Vec<(&'a str, &'a AttributeDescriptor)> {
        let resource = self.resource;
        resource
            .root
            .sorted_attributes()
            .into_iter()
            .filter(|(name, attribute)| {
                !attribute.is_list()
                    && !self
                        .exceptions
                        .contains(&resource.group, &resource.kind, name)
            })
            .collect()
    }

    fn type_definition(&self, name: String, node: &TypeNode) -> TypeDefinition {
        let fields = node
            .sorted_properties()
            .into_iter()
            .map(|(prop_name, property)| {
                let field = TypeResolver::resolve_property(prop_name, property, &self.resource.kind);
                FieldDefinition {
                    reference: field.is_reference(),
                    name: field.name,
                    cfn_name: field.original_name,
                    target: field.target,
                    required: property.required,
                    documentation: property.documentation.clone(),
                    update_type: property.update_type,
                }
            })
            .collect();

        TypeDefinition {
            name,
            documentation: node.documentation.clone(),
            fields,
        }
    }

    /// Fail on the first nested type referenced but not defined
    fn check_complete(&self) -> Result<()> {
        let mut nodes = vec![&self.resource.root];
        let mut names: Vec<&String> = self.resource.property_types.keys().collect();
        names.sort();
        nodes.extend(names.into_iter().filter_map(|n| self.resource.nested_type(n)));

        for node in nodes {
            for (name, property) in node.sorted_properties() {
                match property.signature.nested_type_name() {
                    Some(type_name) if type_name != TAG_TYPE_NAME => {
                        self.lookup(name, type_name)?;
                    },
                    _ => {},
                }
            }
        }

        Ok(())
    }

    fn walk_node(
        &self,
        node: &TypeNode,
        target: &str,
        source: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        let mut fragments = Vec::new();
        for (name, property) in node.sorted_properties() {
            fragments.extend(self.emit_property(name, property, target, source, chain)?);
        }
        Ok(fragments)
    }

    fn emit_property(
        &self,
        name: &str,
        property: &PropertyDescriptor,
        target: &str,
        source: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        let field = TypeResolver::resolve_property(name, property, &self.resource.kind);
        let src = format!("{}.{}", source, field.name);
        let dst = format!("{}.{}", target, field.original_name);

        match &property.signature {
            TypeSignature::Primitive(kind) => Ok(self.emit_parameter(&field, *kind, target, &src, &dst)),
            TypeSignature::Map(item) => self.emit_map(&field, item, target, &src, &dst, chain),
            TypeSignature::Nested(type_name) => {
                self.emit_nested(&field, type_name, target, &src, &dst, chain)
            },
            TypeSignature::List(item) => self.emit_list(&field, item, target, &src, &dst, chain),
        }
    }

    fn emit_parameter(
        &self,
        field: &ResolvedField,
        kind: PrimitiveKind,
        target: &str,
        src: &str,
        dst: &str,
    ) -> Vec<Fragment> {
        if field.folding == Folding::Single {
            let scoped = format!("{}{}Item", target, field.name);
            let value = format!("{}{}", target, field.original_name);
            return vec![
                Fragment::DefaultScope {
                    var: scoped.clone(),
                    source: src.to_string(),
                    scope: Expr::ObjectNamespace,
                },
                Fragment::ResolveReference {
                    var: value.clone(),
                    reference: scoped,
                },
                guard(
                    Condition::NotEmpty(value.clone()),
                    vec![assign(dst, Expr::Path(value))],
                ),
            ];
        }

        match kind {
            PrimitiveKind::Json => {
                let var = format!("{}{}JSON", target, field.name);
                vec![guard(
                    Condition::NotEmpty(src.to_string()),
                    vec![
                        Fragment::Unmarshal {
                            var: var.clone(),
                            source: src.to_string(),
                        },
                        assign(dst, Expr::Path(var)),
                    ],
                )]
            },
            PrimitiveKind::String => {
                let mut fragments = Vec::new();
                if field.original_name == format!("{}Name", self.resource.kind) {
                    fragments.push(guard(
                        Condition::IsEmpty(src.to_string()),
                        vec![assign(dst, Expr::ObjectName)],
                    ));
                }
                fragments.push(guard(
                    Condition::NotEmpty(src.to_string()),
                    vec![assign(dst, Expr::Path(src.to_string()))],
                ));
                fragments
            },
            PrimitiveKind::Integer => vec![guard(
                Condition::NonZero(src.to_string()),
                vec![assign(dst, Expr::Path(src.to_string()))],
            )],
            PrimitiveKind::Double => vec![guard(
                Condition::NonZero(src.to_string()),
                vec![assign(dst, Expr::Float(src.to_string()))],
            )],
            // false is a meaningful value, so booleans are always copied
            PrimitiveKind::Boolean => vec![assign(dst, Expr::Path(src.to_string()))],
        }
    }

    fn emit_map(
        &self,
        field: &ResolvedField,
        item: &TypeSignature,
        target: &str,
        src: &str,
        dst: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        let map = format!("{}{}", target, field.name);
        let key = format!("{}Key", map);
        let value = format!("{}Value", map);

        let body = match item {
            TypeSignature::Primitive(PrimitiveKind::Double) => vec![
                Fragment::Allocate {
                    var: map.clone(),
                    shape: Shape::Map(Box::new(Shape::Scalar(ScalarShape::Float))),
                },
                Fragment::Iterate {
                    source: src.to_string(),
                    key: Some(key.clone()),
                    item: value.clone(),
                    body: vec![Fragment::Insert {
                        map: map.clone(),
                        key,
                        value: Expr::Float(value),
                    }],
                },
                assign(dst, Expr::Path(map)),
            ],
            TypeSignature::Primitive(_) => vec![assign(dst, Expr::Path(src.to_string()))],
            TypeSignature::Nested(type_name) => {
                let elem = format!("{}Item", map);
                let shape = self.element_shape(type_name);

                let mut inner = vec![Fragment::Allocate {
                    var: elem.clone(),
                    shape: shape.clone(),
                }];
                inner.extend(self.emit_element(&field.original_name, type_name, &elem, &value, chain)?);
                inner.push(Fragment::Insert {
                    map: map.clone(),
                    key: key.clone(),
                    value: Expr::Path(elem),
                });

                vec![
                    Fragment::Allocate {
                        var: map.clone(),
                        shape: Shape::Map(Box::new(shape)),
                    },
                    Fragment::Iterate {
                        source: src.to_string(),
                        key: Some(key),
                        item: value,
                        body: inner,
                    },
                    assign(dst, Expr::Path(map)),
                ]
            },
            TypeSignature::List(_) | TypeSignature::Map(_) => {
                return Err(self.nested_collection(&field.original_name, "map"));
            },
        };

        Ok(vec![guard(
            Condition::NotDefault {
                expr: src.to_string(),
                ty: field.target.clone(),
            },
            body,
        )])
    }

    fn emit_nested(
        &self,
        field: &ResolvedField,
        type_name: &str,
        target: &str,
        src: &str,
        dst: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        let var = format!("{}{}", target, field.name);

        let mut body = vec![Fragment::Allocate {
            var: var.clone(),
            shape: self.element_shape(type_name),
        }];
        body.extend(self.emit_element(&field.original_name, type_name, &var, src, chain)?);
        body.push(assign(dst, Expr::Address(var)));

        Ok(vec![guard(
            Condition::NotDefault {
                expr: src.to_string(),
                ty: field.target.clone(),
            },
            body,
        )])
    }

    fn emit_list(
        &self,
        field: &ResolvedField,
        item: &TypeSignature,
        target: &str,
        src: &str,
        dst: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        let list = format!("{}{}", target, field.name);
        let item_var = format!("{}Item", list);

        if field.folding == Folding::Plural {
            let scoped = format!("{}Ref", list);
            let value = format!("{}Value", list);
            return Ok(vec![guard(
                Condition::NonEmptyCollection(src.to_string()),
                vec![
                    Fragment::Allocate {
                        var: list.clone(),
                        shape: Shape::List(Box::new(Shape::Scalar(ScalarShape::String))),
                    },
                    Fragment::Iterate {
                        source: src.to_string(),
                        key: None,
                        item: item_var.clone(),
                        body: vec![
                            Fragment::DefaultScope {
                                var: scoped.clone(),
                                source: item_var,
                                scope: Expr::ObjectNamespace,
                            },
                            Fragment::ResolveReference {
                                var: value.clone(),
                                reference: scoped,
                            },
                            guard(
                                Condition::NotEmpty(value.clone()),
                                vec![Fragment::Append {
                                    list: list.clone(),
                                    value: Expr::Path(value),
                                }],
                            ),
                        ],
                    },
                    assign(dst, Expr::Path(list)),
                ],
            )]);
        }

        match item {
            TypeSignature::Primitive(PrimitiveKind::Double) => Ok(vec![guard(
                Condition::NonEmptyCollection(src.to_string()),
                vec![
                    Fragment::Allocate {
                        var: list.clone(),
                        shape: Shape::List(Box::new(Shape::Scalar(ScalarShape::Float))),
                    },
                    Fragment::Iterate {
                        source: src.to_string(),
                        key: None,
                        item: item_var.clone(),
                        body: vec![Fragment::Append {
                            list: list.clone(),
                            value: Expr::Float(item_var),
                        }],
                    },
                    assign(dst, Expr::Path(list)),
                ],
            )]),
            TypeSignature::Primitive(_) => Ok(vec![guard(
                Condition::NonEmptyCollection(src.to_string()),
                vec![assign(dst, Expr::Path(src.to_string()))],
            )]),
            TypeSignature::Nested(type_name) => {
                let elem = format!("{}Elem", list);
                let shape = self.element_shape(type_name);

                let mut inner = vec![Fragment::Allocate {
                    var: elem.clone(),
                    shape: shape.clone(),
                }];
                inner.extend(self.emit_element(&field.original_name, type_name, &elem, &item_var, chain)?);
                inner.push(Fragment::Append {
                    list: list.clone(),
                    value: Expr::Path(elem),
                });

                Ok(vec![
                    Fragment::Allocate {
                        var: list.clone(),
                        shape: Shape::List(Box::new(shape)),
                    },
                    Fragment::Iterate {
                        source: src.to_string(),
                        key: None,
                        item: item_var,
                        body: inner,
                    },
                    guard(
                        Condition::NonEmptyCollection(list.clone()),
                        vec![assign(dst, Expr::Path(list))],
                    ),
                ])
            },
            TypeSignature::List(_) | TypeSignature::Map(_) => {
                Err(self.nested_collection(&field.original_name, "list"))
            },
        }
    }

    /// Fill `var` from the nested value at `source`
    fn emit_element(
        &self,
        property: &str,
        type_name: &str,
        var: &str,
        source: &str,
        chain: &mut Vec<String>,
    ) -> Result<Vec<Fragment>> {
        if type_name == TAG_TYPE_NAME {
            return Ok(["Key", "Value"]
                .iter()
                .map(|part| {
                    let from = format!("{}.{}", source, part);
                    guard(
                        Condition::NotEmpty(from.clone()),
                        vec![assign(&format!("{}.{}", var, part), Expr::Path(from))],
                    )
                })
                .collect());
        }

        let node = self.lookup(property, type_name)?;
        if chain.iter().any(|seen| seen == type_name) {
            return Err(GeneratorError::Generation(format!(
                "{}: nested type {} refers back to itself through {}",
                self.resource.resource_name,
                type_name,
                chain.join(" -> ")
            )));
        }

        chain.push(type_name.to_string());
        let fragments = self.walk_node(node, var, source, chain);
        chain.pop();
        fragments
    }

    fn element_shape(&self, type_name: &str) -> Shape {
        if type_name == TAG_TYPE_NAME {
            Shape::Tag
        } else {
            Shape::Struct(TypeResolver::nested_type_name(&self.resource.kind, type_name))
        }
    }

    fn lookup(&self, property: &str, type_name: &str) -> Result<&'a TypeNode> {
        self.resource.nested_type(type_name).ok_or_else(|| {
            tracing::error!(
                resource = %self.resource.resource_name,
                property,
                missing_type = type_name,
                "nested type definition not found"
            );
            GeneratorError::MissingNestedType {
                resource: self.resource.resource_name.clone(),
                property: property.to_string(),
                type_name: type_name.to_string(),
            }
        })
    }

    fn nested_collection(&self, property: &str, container: &str) -> GeneratorError {
        GeneratorError::Generation(format!(
            "{}: property {} nests a collection inside a {}",
            self.resource.resource_name, property, container
        ))
    }
}

fn guard(condition: Condition, body: Vec<Fragment>) -> Fragment {
    Fragment::Guard { condition, body }
}

fn assign(target: &str, value: Expr) -> Fragment {
    Fragment::Assign {
        target: target.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_controller_gen_parser::normalize;

    fn resource_from(spec: &str) -> ResourceKind {
        let set = normalize(spec, &[], &[]).unwrap();
        set.all_resources()[0].clone()
    }

    fn path(p: &str) -> Expr {
        Expr::Path(p.to_string())
    }

    const WIDGET: &str = r#"{
        "ResourceTypes": {
            "AWS::Example::Widget": {
                "Properties": {
                    "Name": { "PrimitiveType": "String", "Required": true },
                    "BucketArn": { "PrimitiveType": "String" },
                    "Tags": { "Type": "List", "ItemType": "Tag" }
                },
                "Attributes": {
                    "Arn": { "PrimitiveType": "String" }
                }
            }
        }
    }"#;

    #[test]
    fn test_widget_construction() {
        let widget = resource_from(WIDGET);
        let exceptions = AttributeExceptions::default();
        let fragments = Emitter::new(&widget, &exceptions).emit_construction().unwrap();

        assert_eq!(fragments.len(), 8);
        assert_eq!(
            fragments[0],
            Fragment::Allocate {
                var: "exampleWidget".to_string(),
                shape: Shape::Struct("Widget".to_string()),
            }
        );

        // BucketArn is folded into a reference on the spec side only
        assert_eq!(
            fragments[1],
            Fragment::DefaultScope {
                var: "exampleWidgetBucketRefItem".to_string(),
                source: "in.Spec.BucketRef".to_string(),
                scope: Expr::ObjectNamespace,
            }
        );
        assert_eq!(
            fragments[2],
            Fragment::ResolveReference {
                var: "exampleWidgetBucketArn".to_string(),
                reference: "exampleWidgetBucketRefItem".to_string(),
            }
        );
        assert_eq!(
            fragments[3],
            guard(
                Condition::NotEmpty("exampleWidgetBucketArn".to_string()),
                vec![assign("exampleWidget.BucketArn", path("exampleWidgetBucketArn"))],
            )
        );

        assert_eq!(
            fragments[4],
            guard(
                Condition::NotEmpty("in.Spec.Name".to_string()),
                vec![assign("exampleWidget.Name", path("in.Spec.Name"))],
            )
        );

        assert_eq!(
            fragments[5],
            Fragment::Allocate {
                var: "exampleWidgetTags".to_string(),
                shape: Shape::List(Box::new(Shape::Tag)),
            }
        );
        match &fragments[6] {
            Fragment::Iterate { source, item, body, .. } => {
                assert_eq!(source, "in.Spec.Tags");
                assert_eq!(item, "exampleWidgetTagsItem");
                assert_eq!(body.len(), 4);
                assert_eq!(
                    body[1],
                    guard(
                        Condition::NotEmpty("exampleWidgetTagsItem.Key".to_string()),
                        vec![assign("exampleWidgetTagsElem.Key", path("exampleWidgetTagsItem.Key"))],
                    )
                );
            },
            other => panic!("Expected Iterate, got {:?}", other),
        }
        assert_eq!(
            fragments[7],
            guard(
                Condition::NonEmptyCollection("exampleWidgetTags".to_string()),
                vec![assign("exampleWidget.Tags", path("exampleWidgetTags"))],
            )
        );
    }

    #[test]
    fn test_widget_definitions() {
        let widget = resource_from(WIDGET);
        let exceptions = AttributeExceptions::default();
        let definitions = Emitter::new(&widget, &exceptions).emit_definitions().unwrap();

        assert_eq!(definitions.spec.name, "WidgetSpec");
        let names: Vec<&str> = definitions.spec.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["BucketRef", "Name", "Tags"]);

        let bucket = &definitions.spec.fields[0];
        assert!(bucket.reference);
        assert_eq!(bucket.cfn_name, "BucketArn");
        assert_eq!(bucket.target, TargetType::Reference);

        let name = &definitions.spec.fields[1];
        assert!(name.required);
        assert!(!name.reference);

        assert_eq!(
            definitions.spec.fields[2].target,
            TargetType::List(Box::new(TargetType::Tag))
        );

        assert!(definitions.nested.is_empty());
        assert_eq!(
            definitions.outputs,
            vec![OutputField {
                name: "Arn".to_string(),
                attribute: "Arn".to_string(),
                target: TargetType::String,
            }]
        );
    }

    #[test]
    fn test_parameter_rules() {
        let gadget = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::Example::Gadget": {
                    "Properties": {
                        "Count": { "PrimitiveType": "Integer" },
                        "Enabled": { "PrimitiveType": "Boolean" },
                        "GadgetName": { "PrimitiveType": "String" },
                        "Policy": { "PrimitiveType": "Json" },
                        "Ratio": { "PrimitiveType": "Double" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let fragments = Emitter::new(&gadget, &exceptions).emit_construction().unwrap();

        assert_eq!(
            fragments[1],
            guard(
                Condition::NonZero("in.Spec.Count".to_string()),
                vec![assign("exampleGadget.Count", path("in.Spec.Count"))],
            )
        );
        assert_eq!(fragments[2], assign("exampleGadget.Enabled", path("in.Spec.Enabled")));

        // The kind's own name defaults to the object name
        assert_eq!(
            fragments[3],
            guard(
                Condition::IsEmpty("in.Spec.GadgetName".to_string()),
                vec![assign("exampleGadget.GadgetName", Expr::ObjectName)],
            )
        );
        assert_eq!(
            fragments[4],
            guard(
                Condition::NotEmpty("in.Spec.GadgetName".to_string()),
                vec![assign("exampleGadget.GadgetName", path("in.Spec.GadgetName"))],
            )
        );

        assert_eq!(
            fragments[5],
            guard(
                Condition::NotEmpty("in.Spec.Policy".to_string()),
                vec![
                    Fragment::Unmarshal {
                        var: "exampleGadgetPolicyJSON".to_string(),
                        source: "in.Spec.Policy".to_string(),
                    },
                    assign("exampleGadget.Policy", path("exampleGadgetPolicyJSON")),
                ],
            )
        );
        assert_eq!(
            fragments[6],
            guard(
                Condition::NonZero("in.Spec.Ratio".to_string()),
                vec![assign("exampleGadget.Ratio", Expr::Float("in.Spec.Ratio".to_string()))],
            )
        );
        assert_eq!(fragments.len(), 7);
    }

    #[test]
    fn test_plural_reference_list() {
        let cluster = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::Example::Cluster": {
                    "Properties": {
                        "SubnetIds": { "Type": "List", "PrimitiveItemType": "String" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let fragments = Emitter::new(&cluster, &exceptions).emit_construction().unwrap();

        let Fragment::Guard { condition, body } = &fragments[1] else {
            panic!("Expected Guard, got {:?}", fragments[1]);
        };
        assert_eq!(
            condition,
            &Condition::NonEmptyCollection("in.Spec.SubnetRefs".to_string())
        );
        assert_eq!(
            body[0],
            Fragment::Allocate {
                var: "exampleClusterSubnetRefs".to_string(),
                shape: Shape::List(Box::new(Shape::Scalar(ScalarShape::String))),
            }
        );
        let Fragment::Iterate { body: loop_body, .. } = &body[1] else {
            panic!("Expected Iterate, got {:?}", body[1]);
        };
        assert!(matches!(loop_body[0], Fragment::DefaultScope { .. }));
        assert!(matches!(loop_body[1], Fragment::ResolveReference { .. }));
        assert_eq!(
            body[2],
            assign("exampleCluster.SubnetIds", path("exampleClusterSubnetRefs"))
        );
    }

    #[test]
    fn test_primitive_lists() {
        let rule = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::Example::Rule": {
                    "Properties": {
                        "Names": { "Type": "List", "PrimitiveItemType": "String" },
                        "Weights": { "Type": "List", "PrimitiveItemType": "Double" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let fragments = Emitter::new(&rule, &exceptions).emit_construction().unwrap();

        assert_eq!(
            fragments[1],
            guard(
                Condition::NonEmptyCollection("in.Spec.Names".to_string()),
                vec![assign("exampleRule.Names", path("in.Spec.Names"))],
            )
        );

        let Fragment::Guard { body, .. } = &fragments[2] else {
            panic!("Expected Guard, got {:?}", fragments[2]);
        };
        assert_eq!(
            body[0],
            Fragment::Allocate {
                var: "exampleRuleWeights".to_string(),
                shape: Shape::List(Box::new(Shape::Scalar(ScalarShape::Float))),
            }
        );
        assert_eq!(
            body[1].children(),
            &[Fragment::Append {
                list: "exampleRuleWeights".to_string(),
                value: Expr::Float("exampleRuleWeightsItem".to_string()),
            }]
        );
    }

    #[test]
    fn test_maps() {
        let api = resource_from(
            r#"{
            "PropertyTypes": {
                "AWS::Example::Api.Model": {
                    "Properties": {
                        "Schema": { "PrimitiveType": "String" }
                    }
                }
            },
            "ResourceTypes": {
                "AWS::Example::Api": {
                    "Properties": {
                        "Labels": { "Type": "Map", "PrimitiveItemType": "String" },
                        "Models": { "Type": "Map", "ItemType": "Model" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let fragments = Emitter::new(&api, &exceptions).emit_construction().unwrap();

        assert_eq!(
            fragments[1],
            guard(
                Condition::NotDefault {
                    expr: "in.Spec.Labels".to_string(),
                    ty: TargetType::Map(Box::new(TargetType::String)),
                },
                vec![assign("exampleApi.Labels", path("in.Spec.Labels"))],
            )
        );

        let Fragment::Guard { body, .. } = &fragments[2] else {
            panic!("Expected Guard, got {:?}", fragments[2]);
        };
        assert_eq!(
            body[0],
            Fragment::Allocate {
                var: "exampleApiModels".to_string(),
                shape: Shape::Map(Box::new(Shape::Struct("Api_Model".to_string()))),
            }
        );
        let Fragment::Iterate { key, item, body: inner, .. } = &body[1] else {
            panic!("Expected Iterate, got {:?}", body[1]);
        };
        assert_eq!(key.as_deref(), Some("exampleApiModelsKey"));
        assert_eq!(item, "exampleApiModelsValue");
        assert_eq!(
            inner[1],
            guard(
                Condition::NotEmpty("exampleApiModelsValue.Schema".to_string()),
                vec![assign("exampleApiModelsItem.Schema", path("exampleApiModelsValue.Schema"))],
            )
        );
        assert_eq!(
            inner[2],
            Fragment::Insert {
                map: "exampleApiModels".to_string(),
                key: "exampleApiModelsKey".to_string(),
                value: path("exampleApiModelsItem"),
            }
        );
        assert_eq!(body[2], assign("exampleApi.Models", path("exampleApiModels")));
    }

    #[test]
    fn test_nested_attached_by_address() {
        let trail = resource_from(
            r#"{
            "PropertyTypes": {
                "AWS::Example::Trail.Logging": {
                    "Properties": {
                        "Level": { "PrimitiveType": "Integer" }
                    }
                }
            },
            "ResourceTypes": {
                "AWS::Example::Trail": {
                    "Properties": {
                        "Logging": { "Type": "Logging" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let fragments = Emitter::new(&trail, &exceptions).emit_construction().unwrap();

        assert_eq!(
            fragments[1],
            guard(
                Condition::NotDefault {
                    expr: "in.Spec.Logging".to_string(),
                    ty: TargetType::Named("Trail_Logging".to_string()),
                },
                vec![
                    Fragment::Allocate {
                        var: "exampleTrailLogging".to_string(),
                        shape: Shape::Struct("Trail_Logging".to_string()),
                    },
                    guard(
                        Condition::NonZero("in.Spec.Logging.Level".to_string()),
                        vec![assign("exampleTrailLogging.Level", path("in.Spec.Logging.Level"))],
                    ),
                    assign("exampleTrail.Logging", Expr::Address("exampleTrailLogging".to_string())),
                ],
            )
        );
    }

    #[test]
    fn test_missing_nested_type() {
        let trail = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::Example::Trail": {
                    "Properties": {
                        "Selectors": { "Type": "List", "ItemType": "Selector" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let emitter = Emitter::new(&trail, &exceptions);

        match emitter.emit_construction() {
            Err(GeneratorError::MissingNestedType {
                resource,
                property,
                type_name,
            }) => {
                assert_eq!(resource, "AWS::Example::Trail");
                assert_eq!(property, "Selectors");
                assert_eq!(type_name, "Selector");
            },
            other => panic!("Expected MissingNestedType, got {:?}", other),
        }
        assert!(matches!(
            emitter.emit_definitions(),
            Err(GeneratorError::MissingNestedType { .. })
        ));
    }

    #[test]
    fn test_self_referencing_type_is_rejected() {
        let rule_group = resource_from(
            r#"{
            "PropertyTypes": {
                "AWS::Example::RuleGroup.Statement": {
                    "Properties": {
                        "Statements": { "Type": "List", "ItemType": "Statement" }
                    }
                }
            },
            "ResourceTypes": {
                "AWS::Example::RuleGroup": {
                    "Properties": {
                        "Statement": { "Type": "Statement" }
                    }
                }
            }
        }"#,
        );
        let exceptions = AttributeExceptions::empty();
        let result = Emitter::new(&rule_group, &exceptions).emit_construction();
        assert!(matches!(result, Err(GeneratorError::Generation(_))));
    }

    #[test]
    fn test_nested_collections_are_rejected() {
        let mut matrix = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::Example::Matrix": { "Properties": {} }
            }
        }"#,
        );
        matrix.root.properties.insert(
            "Rows".to_string(),
            PropertyDescriptor {
                documentation: String::new(),
                required: false,
                update_type: UpdateType::Mutable,
                duplicates_allowed: false,
                signature: TypeSignature::List(Box::new(TypeSignature::List(Box::new(
                    TypeSignature::Primitive(PrimitiveKind::Integer),
                )))),
            },
        );

        let exceptions = AttributeExceptions::empty();
        let result = Emitter::new(&matrix, &exceptions).emit_construction();
        assert!(matches!(result, Err(GeneratorError::Generation(_))));
    }

    #[test]
    fn test_outputs_skip_lists_and_exceptions() {
        let domain = resource_from(
            r#"{
            "ResourceTypes": {
                "AWS::ApiGateway::DomainName": {
                    "Properties": {},
                    "Attributes": {
                        "DistributionDomainName": { "PrimitiveType": "String" },
                        "DistributionHostedZoneId": { "PrimitiveType": "String" },
                        "Endpoints": { "Type": "List", "PrimitiveItemType": "String" },
                        "RegionalDomainName": { "PrimitiveType": "String" }
                    }
                }
            }
        }"#,
        );

        let exceptions = AttributeExceptions::default();
        let outputs = Emitter::new(&domain, &exceptions).emit_outputs();
        assert_eq!(
            outputs,
            vec![Fragment::Output {
                name: "RegionalDomainName".to_string(),
                attribute: "RegionalDomainName".to_string(),
                logical_id: "DomainName".to_string(),
            }]
        );

        // Without the exception table only the list is skipped
        let none = AttributeExceptions::empty();
        assert_eq!(Emitter::new(&domain, &none).emit_outputs().len(), 3);
    }

    #[test]
    fn test_map_of_doubles_is_widened() {
        let meter = resource_from(
            r#"{
                "ResourceTypes": {
                    "AWS::Example::Meter": {
                        "Properties": {
                            "Weights": { "Type": "Map", "PrimitiveItemType": "Double" }
                        }
                    }
                }
            }"#,
        );
        let exceptions = AttributeExceptions::default();
        let fragments = Emitter::new(&meter, &exceptions).emit_construction().unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(
            fragments[1],
            guard(
                Condition::NotDefault {
                    expr: "in.Spec.Weights".to_string(),
                    ty: TargetType::Map(Box::new(TargetType::Integer)),
                },
                vec![
                    Fragment::Allocate {
                        var: "exampleMeterWeights".to_string(),
                        shape: Shape::Map(Box::new(Shape::Scalar(ScalarShape::Float))),
                    },
                    Fragment::Iterate {
                        source: "in.Spec.Weights".to_string(),
                        key: Some("exampleMeterWeightsKey".to_string()),
                        item: "exampleMeterWeightsValue".to_string(),
                        body: vec![Fragment::Insert {
                            map: "exampleMeterWeights".to_string(),
                            key: "exampleMeterWeightsKey".to_string(),
                            value: Expr::Float("exampleMeterWeightsValue".to_string()),
                        }],
                    },
                    assign("exampleMeter.Weights", path("exampleMeterWeights")),
                ],
            )
        );
    }

    #[test]
    fn test_single_tag_property() {
        let badge = resource_from(
            r#"{
                "ResourceTypes": {
                    "AWS::Example::Badge": {
                        "Properties": {
                            "Owner": { "Type": "Tag" }
                        }
                    }
                }
            }"#,
        );
        let exceptions = AttributeExceptions::default();
        let emitter = Emitter::new(&badge, &exceptions);
        let fragments = emitter.emit_construction().unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(
            fragments[1],
            guard(
                Condition::NotDefault {
                    expr: "in.Spec.Owner".to_string(),
                    ty: TargetType::Tag,
                },
                vec![
                    Fragment::Allocate {
                        var: "exampleBadgeOwner".to_string(),
                        shape: Shape::Tag,
                    },
                    guard(
                        Condition::NotEmpty("in.Spec.Owner.Key".to_string()),
                        vec![assign("exampleBadgeOwner.Key", path("in.Spec.Owner.Key"))],
                    ),
                    guard(
                        Condition::NotEmpty("in.Spec.Owner.Value".to_string()),
                        vec![assign("exampleBadgeOwner.Value", path("in.Spec.Owner.Value"))],
                    ),
                    assign("exampleBadge.Owner", Expr::Address("exampleBadgeOwner".to_string())),
                ],
            )
        );

        // The built-in tag never becomes a nested definition
        let definitions = emitter.emit_definitions().unwrap();
        assert!(definitions.nested.is_empty());
        assert_eq!(definitions.spec.fields[0].target, TargetType::Tag);
    }

    #[test]
    fn test_reference_inside_nested_list_element() {
        let router = resource_from(
            r#"{
                "PropertyTypes": {
                    "AWS::Example::Router.Route": {
                        "Properties": {
                            "GatewayId": { "PrimitiveType": "String" }
                        }
                    }
                },
                "ResourceTypes": {
                    "AWS::Example::Router": {
                        "Properties": {
                            "Routes": { "Type": "List", "ItemType": "Route" }
                        }
                    }
                }
            }"#,
        );
        let exceptions = AttributeExceptions::default();
        let fragments = Emitter::new(&router, &exceptions).emit_construction().unwrap();

        assert_eq!(
            fragments[1..],
            [
                Fragment::Allocate {
                    var: "exampleRouterRoutes".to_string(),
                    shape: Shape::List(Box::new(Shape::Struct("Router_Route".to_string()))),
                },
                Fragment::Iterate {
                    source: "in.Spec.Routes".to_string(),
                    key: None,
                    item: "exampleRouterRoutesItem".to_string(),
                    body: vec![
                        Fragment::Allocate {
                            var: "exampleRouterRoutesElem".to_string(),
                            shape: Shape::Struct("Router_Route".to_string()),
                        },
                        // Scope and resolution are keyed off the element, not the root
                        Fragment::DefaultScope {
                            var: "exampleRouterRoutesElemGatewayRefItem".to_string(),
                            source: "exampleRouterRoutesItem.GatewayRef".to_string(),
                            scope: Expr::ObjectNamespace,
                        },
                        Fragment::ResolveReference {
                            var: "exampleRouterRoutesElemGatewayId".to_string(),
                            reference: "exampleRouterRoutesElemGatewayRefItem".to_string(),
                        },
                        guard(
                            Condition::NotEmpty("exampleRouterRoutesElemGatewayId".to_string()),
                            vec![assign(
                                "exampleRouterRoutesElem.GatewayId",
                                path("exampleRouterRoutesElemGatewayId"),
                            )],
                        ),
                        Fragment::Append {
                            list: "exampleRouterRoutes".to_string(),
                            value: path("exampleRouterRoutesElem"),
                        },
                    ],
                },
                guard(
                    Condition::NonEmptyCollection("exampleRouterRoutes".to_string()),
                    vec![assign("exampleRouter.Routes", path("exampleRouterRoutes"))],
                ),
            ]
        );
    }
}
