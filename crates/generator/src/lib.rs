//! Go artifact generation for CloudFormation-backed controllers
//!
//! This crate turns a normalized [`ResourceSet`] into the Go sources of a
//! Kubernetes controller API: object definitions, stack object construction
//! logic and group/version registration.
//!
//! Construction logic is emitted as structured [`Fragment`]s by the
//! [`Emitter`] and rendered to Go by the [`GoRenderer`] before being embedded
//! into the Tera templates.

mod emitter;
mod exceptions;
pub mod fragment;
mod render;
mod templates;

pub use emitter::{
    DefinitionSet, Emitter, FieldDefinition, OutputField, TypeDefinition, SPEC_SOURCE,
};
pub use exceptions::AttributeExceptions;
pub use fragment::{Condition, Expr, Fragment, ScalarShape, Shape};
pub use render::{GoRenderer, ImportSet};

use cfn_controller_gen_common::{
    GeneratorError, ResourceKind, ResourceSet, Result, UpdateType,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;

/// Domain suffix of every generated API group
pub const API_DOMAIN: &str = "awsctrl.io";

/// Kinds of generated files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArtifactKind {
    /// `{kind}_types.go`: object definitions
    Types,
    /// `zz_generated.{kind}.stackobject.go`: template construction
    StackObject,
    /// `groupversion_info.go`: scheme registration for the group
    GroupVersion,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Types, Self::StackObject, Self::GroupVersion];

    /// Whether an existing file is replaced on regeneration
    ///
    /// Only the fully generated stack object is rewritten; the other files
    /// are scaffolds that may be edited by hand.
    pub fn overwrite(&self) -> bool {
        matches!(self, Self::StackObject)
    }

    /// Output path relative to the project root, always lowercase
    pub fn path(&self, resource: &ResourceKind) -> PathBuf {
        let file = match self {
            Self::Types => format!("{}_types.go", resource.kind),
            Self::StackObject => format!("zz_generated.{}.stackobject.go", resource.kind),
            Self::GroupVersion => "groupversion_info.go".to_string(),
        };

        PathBuf::from(
            format!("apis/{}/{}/{}", resource.group, resource.version, file).to_lowercase(),
        )
    }

    fn template(&self) -> &'static str {
        match self {
            Self::Types => templates::TYPES_TEMPLATE,
            Self::StackObject => templates::STACK_OBJECT_TEMPLATE,
            Self::GroupVersion => templates::GROUP_VERSION_TEMPLATE,
        }
    }
}

/// A rendered file and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub contents: String,
    pub overwrite: bool,
}

/// Generation result for one resource kind
#[derive(Debug)]
pub struct ResourceOutcome {
    /// Fully-qualified resource name (e.g., "AWS::ApiGateway::Deployment")
    pub resource: String,
    pub result: Result<Vec<Artifact>>,
}

#[derive(Debug)]
pub struct ResourceFailure {
    pub resource: String,
    pub error: GeneratorError,
}

/// Summary of a [`ControllerGenerator::generate_to_directory`] run
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Paths written, relative to the output directory
    pub written: Vec<PathBuf>,
    /// Existing files left untouched by the override policy
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<ResourceFailure>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct FieldView {
    name: String,
    cfn_name: String,
    go_type: String,
    required: bool,
    documentation: String,
    immutable: bool,
}

#[derive(Serialize)]
struct TypeView {
    name: String,
    documentation: String,
    fields: Vec<FieldView>,
}

#[derive(Serialize)]
struct StatusFieldView {
    name: String,
    go_type: String,
}

impl From<&TypeDefinition> for TypeView {
    fn from(definition: &TypeDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            documentation: definition.documentation.clone(),
            fields: definition
                .fields
                .iter()
                .map(|field| FieldView {
                    name: field.name.clone(),
                    cfn_name: field.cfn_name.clone(),
                    go_type: GoRenderer::spec_type(&field.target),
                    required: field.required,
                    documentation: field.documentation.clone(),
                    immutable: field.update_type == UpdateType::Immutable,
                })
                .collect(),
        }
    }
}

/// Controller API generator
///
/// Produces, for every included resource kind:
/// - apis/{group}/{version}/{kind}_types.go
/// - apis/{group}/{version}/zz_generated.{kind}.stackobject.go
/// - apis/{group}/{version}/groupversion_info.go
pub struct ControllerGenerator {
    resources: ResourceSet,
    tera: Tera,
    boilerplate: String,
    exceptions: AttributeExceptions,
}

impl ControllerGenerator {
    /// Create a new generator over a normalized resource set
    pub fn new(resources: ResourceSet) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            resources,
            tera,
            boilerplate: String::new(),
            exceptions: AttributeExceptions::default(),
        })
    }

    /// Header prepended to every generated file
    pub fn with_boilerplate(mut self, boilerplate: impl Into<String>) -> Self {
        self.boilerplate = boilerplate.into();
        self
    }

    pub fn resource_set(&self) -> &ResourceSet {
        &self.resources
    }

    /// Render every artifact of one resource kind
    pub fn generate_resource(&self, resource: &ResourceKind) -> Result<Vec<Artifact>> {
        let emitter = Emitter::new(resource, &self.exceptions);
        let construction = emitter.emit_construction()?;
        let definitions = emitter.emit_definitions()?;
        let outputs = emitter.emit_outputs();
        let renderer = GoRenderer::new(&resource.group);

        let mut context = self.create_context(resource);

        context.insert("spec", &TypeView::from(&definitions.spec));
        context.insert(
            "nested",
            &definitions.nested.iter().map(TypeView::from).collect::<Vec<_>>(),
        );
        context.insert(
            "status_fields",
            &definitions
                .outputs
                .iter()
                .map(|output| StatusFieldView {
                    name: output.name.clone(),
                    go_type: GoRenderer::spec_type(&output.target),
                })
                .collect::<Vec<_>>(),
        );

        context.insert("root_var", &emitter.root_target());
        context.insert("imports", &ImportSet::from_fragments(&construction));
        context.insert("construction", &renderer.render(&construction, 1));
        context.insert("outputs", &renderer.render(&outputs, 2));

        let artifacts = ArtifactKind::ALL
            .iter()
            .map(|kind| self.render(*kind, resource, &context))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            resource = %resource.resource_name,
            artifacts = artifacts.len(),
            "generated resource"
        );

        Ok(artifacts)
    }

    /// Generate every included resource in parallel
    ///
    /// A failing resource does not stop its siblings; outcomes are returned
    /// in (group, kind) order.
    pub fn generate_all(&self) -> Vec<ResourceOutcome> {
        self.resources
            .resources()
            .par_iter()
            .map(|resource| ResourceOutcome {
                resource: resource.resource_name.clone(),
                result: self.generate_resource(resource),
            })
            .collect()
    }

    /// Generate every included resource and write the artifacts
    ///
    /// Existing files are only replaced when their artifact kind allows it.
    /// Per-resource failures are collected in the report; I/O failures abort.
    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<GenerationReport> {
        fs::create_dir_all(output_dir).map_err(|e| {
            GeneratorError::Generation(format!("Failed to create output directory: {}", e))
        })?;

        let mut report = GenerationReport::default();
        let mut seen = HashSet::new();

        for outcome in self.generate_all() {
            match outcome.result {
                Ok(artifacts) => {
                    for artifact in artifacts {
                        // Resources of one group share a groupversion_info.go
                        if !seen.insert(artifact.path.clone()) {
                            continue;
                        }

                        if write_artifact(output_dir, &artifact)? {
                            report.written.push(artifact.path);
                        } else {
                            report.skipped.push(artifact.path);
                        }
                    }
                },
                Err(error) => {
                    tracing::error!(
                        resource = %outcome.resource,
                        error = %error,
                        "resource generation failed"
                    );
                    report.failures.push(ResourceFailure {
                        resource: outcome.resource,
                        error,
                    });
                },
            }
        }

        Ok(report)
    }

    fn render(
        &self,
        kind: ArtifactKind,
        resource: &ResourceKind,
        context: &tera::Context,
    ) -> Result<Artifact> {
        let contents = self.tera.render(kind.template(), context).map_err(|e| {
            GeneratorError::Generation(format!(
                "Template error in {} for {}: {:?}",
                kind.template(),
                resource.resource_name,
                e
            ))
        })?;

        Ok(Artifact {
            kind,
            path: kind.path(resource),
            contents,
            overwrite: kind.overwrite(),
        })
    }

    /// Create template context shared by all artifacts of a resource
    fn create_context(&self, resource: &ResourceKind) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("boilerplate", self.boilerplate.trim_end());
        context.insert("group", &resource.group);
        context.insert("version", &resource.version);
        context.insert("kind", &resource.kind);
        context.insert("resource_name", &resource.resource_name);
        context.insert("domain", API_DOMAIN);
        context
    }
}

/// Write one artifact below `output_dir`; returns false when skipped
fn write_artifact(output_dir: &Path, artifact: &Artifact) -> Result<bool> {
    let path = output_dir.join(&artifact.path);

    if path.exists() && !artifact.overwrite {
        tracing::info!(path = %path.display(), "file exists, skipping");
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    fs::write(&path, &artifact.contents).map_err(|e| {
        GeneratorError::Generation(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(true)
}
