//! Common types and utilities for the CloudFormation controller generator
//!
//! This crate contains the normalized specification model, the type resolver
//! that maps property signatures onto generated Go types, the generator
//! configuration and the shared error type used by the parser, generator and
//! CLI components.

pub mod config;
pub mod model;
pub mod type_resolver;

pub use config::{ConfigSpec, GeneratorConfig};
pub use model::{
    AttributeDescriptor, PrimitiveKind, PropertyDescriptor, ResourceKind, ResourceSet,
    TypeNode, TypeSignature, UpdateType, DEFAULT_API_VERSION, TAG_TYPE_NAME,
};
pub use type_resolver::{Folding, ResolvedField, TargetType, TypeResolver};

use thiserror::Error;

/// Errors that can occur while loading a specification or generating code
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Property type {name} references a resource type that does not exist")]
    UnresolvedHostResource { name: String },

    #[error(
        "Missing nested type {type_name} for property {property} of resource {resource}"
    )]
    MissingNestedType {
        resource: String,
        property: String,
        type_name: String,
    },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
