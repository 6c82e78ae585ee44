//! Specification sources
//!
//! The specification is fetched once per run. There are no retries and no
//! caching between runs.

use cfn_controller_gen_common::{GeneratorError, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Public location of the latest CloudFormation resource specification
pub const DEFAULT_SPEC_URL: &str =
    "https://d1uauaxba7bl26.cloudfront.net/latest/gzip/CloudFormationResourceSpecification.json";

/// Timeout for the specification fetch
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Somewhere the raw specification document can be loaded from
#[cfg_attr(test, mockall::automock)]
pub trait SpecSource {
    /// Load the raw specification bytes
    fn load(&self) -> Result<Vec<u8>>;

    /// Human-readable description of the source
    fn describe(&self) -> String;
}

/// Fetches the specification with a single HTTP GET
#[derive(Debug, Clone)]
pub struct HttpSpecSource {
    url: String,
    timeout: Duration,
}

impl HttpSpecSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpSpecSource {
    fn default() -> Self {
        Self::new(DEFAULT_SPEC_URL)
    }
}

impl SpecSource for HttpSpecSource {
    fn load(&self) -> Result<Vec<u8>> {
        tracing::debug!(url = %self.url, timeout = ?self.timeout, "fetching specification");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GeneratorError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        let response = client
            .get(&self.url)
            .send()
            .and_then(|res| res.error_for_status())
            .map_err(|e| GeneratorError::Fetch(format!("Failed to fetch {}: {}", self.url, e)))?;

        let body = response.bytes().map_err(|e| {
            GeneratorError::Fetch(format!("Failed to read body from {}: {}", self.url, e))
        })?;

        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the specification from a local file
#[derive(Debug, Clone)]
pub struct FileSpecSource {
    path: PathBuf,
}

impl FileSpecSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpecSource for FileSpecSource {
    fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            GeneratorError::Fetch(format!(
                "Failed to read specification file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_http_source_defaults() {
        let source = HttpSpecSource::default();
        assert_eq!(source.describe(), DEFAULT_SPEC_URL);
        assert_eq!(source.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_http_source_unreachable() {
        // Nothing listens on port 9 of the loopback interface
        let source =
            HttpSpecSource::new("http://127.0.0.1:9/spec.json").with_timeout(Duration::from_secs(2));
        assert!(matches!(source.load(), Err(GeneratorError::Fetch(_))));
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let source = FileSpecSource::new(file.path());
        assert_eq!(source.load().unwrap(), b"{}".to_vec());
    }

    #[test]
    fn test_file_source_missing() {
        let source = FileSpecSource::new("/nonexistent/spec.json");
        assert!(matches!(source.load(), Err(GeneratorError::Fetch(_))));
    }
}
