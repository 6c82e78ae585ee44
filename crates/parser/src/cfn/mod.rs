//! CloudFormation resource specification parser
//!
//! Parses the CloudFormation resource specification JSON into the
//! normalized [`ResourceSet`](cfn_controller_gen_common::ResourceSet).
//!
//! The latest specification is published at:
//! https://d1uauaxba7bl26.cloudfront.net/latest/gzip/CloudFormationResourceSpecification.json
//!
//! ## Format
//! The document contains two maps:
//! - `ResourceTypes`: resource kinds keyed by `Vendor::Group::Kind`
//! - `PropertyTypes`: shared property types keyed by `Vendor::Group::Kind.Name`
//!
//! ## Usage
//! ```rust,ignore
//! use cfn_controller_gen_parser::cfn::CfnSpecParser;
//!
//! let parser = CfnSpecParser::from_file("CloudFormationResourceSpecification.json")?
//!     .with_includes(&["apigateway".into()], &[]);
//! let resources = parser.parse()?;
//! ```

mod converter;
mod parser;
mod types;

pub use parser::CfnSpecParser;
pub use types::*;
