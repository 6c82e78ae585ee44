//! Generator configuration loading from YAML files
//!
//! The configuration selects which API groups and individual resources are
//! generated, and may override where the specification is fetched from.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root structure of the generator configuration file
///
/// ```yaml
/// apiVersion: generator.awsctrl.io/v1alpha1
/// kind: Config
/// spec:
///   groups:
///     - apigateway
///   resources:
///     - ecr:repository
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: ConfigSpec,
}

/// Resource selection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    /// Individual resources as `group:kind` pairs
    #[serde(default)]
    pub resources: Vec<String>,
    /// Whole API groups to include
    #[serde(default)]
    pub groups: Vec<String>,
    /// Optional override of the specification URL
    #[serde(default)]
    pub spec_url: Option<String>,
}

impl GeneratorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Parse(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            GeneratorError::Parse(msg) => {
                GeneratorError::Parse(format!("{} (in {:?})", msg, path))
            },
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse config YAML: {}", e)))
    }
}
