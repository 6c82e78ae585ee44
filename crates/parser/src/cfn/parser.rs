//! CloudFormation specification file parser

use super::types::CloudFormationResourceSpecification;
use crate::source::SpecSource;
use cfn_controller_gen_common::{GeneratorError, ResourceSet, Result};
use std::fs;
use std::path::Path;

/// CloudFormation resource specification parser
///
/// Holds the raw specification and the include filters used when the
/// normalized [`ResourceSet`] is read.
pub struct CfnSpecParser {
    /// Loaded specification document
    spec: CloudFormationResourceSpecification,

    /// API groups to include (e.g., "apigateway")
    group_includes: Vec<String>,

    /// Individual resources to include as `group:kind` pairs
    resource_includes: Vec<String>,
}

impl CfnSpecParser {
    /// Load the specification from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read specification file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Load the specification from a [`SpecSource`]
    pub fn from_source(source: &dyn SpecSource) -> Result<Self> {
        let body = source.load()?;
        Self::from_slice(&body)
    }

    /// Parse the specification from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Parse the specification from raw JSON bytes
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let spec: CloudFormationResourceSpecification = serde_json::from_slice(body)
            .map_err(|e| {
                GeneratorError::Parse(format!("Failed to parse specification JSON: {}", e))
            })?;

        Ok(Self {
            spec,
            group_includes: Vec::new(),
            resource_includes: Vec::new(),
        })
    }

    /// Set the include filters applied by [`ResourceSet::resources`]
    pub fn with_includes(mut self, groups: &[String], resources: &[String]) -> Self {
        self.group_includes = groups.to_vec();
        self.resource_includes = resources.to_vec();
        self
    }

    /// Normalize the specification into a [`ResourceSet`]
    pub fn parse(&self) -> Result<ResourceSet> {
        super::converter::convert_specification(
            &self.spec,
            &self.group_includes,
            &self.resource_includes,
        )
    }

    /// Get a reference to the raw specification
    pub fn specification(&self) -> &CloudFormationResourceSpecification {
        &self.spec
    }
}
