use crate::context::TEST_CASES_NAMESPACE;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// The input document of a test run and the assertion its extraction must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFixture {
    pub content: Vec<u8>,
    pub assertion: String,
    pub uri: String,
}

/// Source of fixtures for (version, host language, test number) triples.
pub trait FixtureStore {
    fn fixture(&self, version: &str, host_language: &str, num: &str) -> Result<TestFixture>;
}

/// File extension of the documents written in `host_language`.
pub fn extension_for(host_language: &str) -> &str {
    match host_language {
        "xhtml1" | "xhtml5" => "xhtml",
        "html4" | "html5" => "html",
        other => other,
    }
}

/// Reads fixtures from a directory laid out like the canonical test-case URIs:
/// `<root>/<version>/<host language>/<num>.<ext>` next to `<num>.sparql`.
#[derive(Debug, Clone)]
pub struct DirectoryFixtureStore {
    root: PathBuf,
    base_uri: String,
}

impl DirectoryFixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_uri: TEST_CASES_NAMESPACE.to_owned(),
        }
    }

    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        if !self.base_uri.ends_with('/') {
            self.base_uri.push('/');
        }
        self
    }
}

impl FixtureStore for DirectoryFixtureStore {
    fn fixture(&self, version: &str, host_language: &str, num: &str) -> Result<TestFixture> {
        let extension = extension_for(host_language);
        let directory = self.root.join(version).join(host_language);
        let document = directory.join(format!("{num}.{extension}"));
        let query = directory.join(format!("{num}.sparql"));
        Ok(TestFixture {
            content: fs::read(&document)
                .with_context(|| format!("Failed to read {}", document.display()))?,
            assertion: fs::read_to_string(&query)
                .with_context(|| format!("Failed to read {}", query.display()))?,
            uri: format!(
                "{}{version}/{host_language}/{num}.{extension}",
                self.base_uri
            ),
        })
    }
}
