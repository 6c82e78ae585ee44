//! Attributes that are never exported as stack outputs
//!
//! Some resource kinds declare attributes that CloudFormation cannot export
//! from a stack. They are listed here per (group, kind, attribute) and
//! skipped regardless of their type.

use std::collections::BTreeSet;

/// Exception table of unexported attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeExceptions {
    entries: BTreeSet<(String, String, String)>,
}

impl AttributeExceptions {
    /// Table with no entries
    pub fn empty() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }

    /// Add an entry; `group` is compared case-insensitively
    pub fn with_entry(mut self, group: &str, kind: &str, attribute: &str) -> Self {
        self.entries.insert((
            group.to_lowercase(),
            kind.to_string(),
            attribute.to_string(),
        ));
        self
    }

    pub fn contains(&self, group: &str, kind: &str, attribute: &str) -> bool {
        self.entries.contains(&(
            group.to_lowercase(),
            kind.to_string(),
            attribute.to_string(),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AttributeExceptions {
    fn default() -> Self {
        Self::empty()
            .with_entry("apigateway", "DomainName", "DistributionHostedZoneId")
            .with_entry("apigateway", "DomainName", "DistributionDomainName")
    }
}
