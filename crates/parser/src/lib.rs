//! Specification loading for the CloudFormation controller generator
//!
//! This crate fetches the CloudFormation resource specification and
//! normalizes it into the [`ResourceSet`] model.
//!
//! ## Normalization
//!
//! - `ResourceTypes` become resource kinds (`AWS::ApiGateway::Deployment` ->
//!   group `apigateway`, kind `Deployment`)
//! - `PropertyTypes` are attached to their host resource under their short
//!   name (`AWS::ApiGateway::Deployment.StageDescription` -> `StageDescription`)
//! - The shared `Tag` property type is skipped; tags are a built-in type

pub mod cfn;
mod source;

pub use cfn::CfnSpecParser;
pub use source::{FileSpecSource, HttpSpecSource, SpecSource, DEFAULT_SPEC_URL, FETCH_TIMEOUT};

use cfn_controller_gen_common::{ResourceSet, Result};

/// Normalize a raw specification document
///
/// # Arguments
/// * `raw` - The specification JSON
/// * `include_groups` - API groups selected for generation
/// * `include_resources` - Individual `group:kind` pairs selected for generation
pub fn normalize(
    raw: &str,
    include_groups: &[String],
    include_resources: &[String],
) -> Result<ResourceSet> {
    CfnSpecParser::from_json(raw)?
        .with_includes(include_groups, include_resources)
        .parse()
}

/// Load and normalize the specification from a source
pub fn load_resource_set(
    source: &dyn SpecSource,
    include_groups: &[String],
    include_resources: &[String],
) -> Result<ResourceSet> {
    CfnSpecParser::from_source(source)?
        .with_includes(include_groups, include_resources)
        .parse()
}
