use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// The RDFa version excluded from runs unless explicitly requested.
pub const LEGACY_VERSION: &str = "rdfa1.0";
/// The host language excluded from runs unless explicitly requested.
pub const LEGACY_HOST_LANGUAGE: &str = "xhtml1";
/// The only host language variant versions (e.g. `rdfa1.1-vocab`) run against by default.
pub const VARIANT_HOST_LANGUAGE: &str = "html5";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub num: String,
    #[serde(default)]
    pub description: Option<String>,
    pub versions: Vec<String>,
    pub host_languages: Vec<String>,
    #[serde(default = "default_expected_results")]
    pub expected_results: bool,
    #[serde(default)]
    pub query_param: Option<String>,
}

fn default_expected_results() -> bool {
    true
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test {}", self.num)?;
        if let Some(description) = &self.description {
            write!(f, " \"{description}\"")?;
        }
        if !self.expected_results {
            write!(f, " (negative)")?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Graph {
        #[serde(rename = "@graph")]
        graph: Vec<TestCase>,
    },
    List(Vec<TestCase>),
}

/// The list of test cases of the suite, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct TestManifest {
    cases: Vec<TestCase>,
}

impl TestManifest {
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    /// Reads a manifest: either a JSON array of test cases or a JSON-LD document with an `@graph` array.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let document: ManifestDocument =
            serde_json::from_slice(data).context("Invalid test manifest")?;
        Ok(Self::new(match document {
            ManifestDocument::Graph { graph } => graph,
            ManifestDocument::List(cases) => cases,
        }))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

/// A single execution of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRun<'a> {
    pub case: &'a TestCase,
    pub version: &'a str,
    pub host_language: &'a str,
}

/// Version, host language and test number filters.
#[derive(Debug, Clone, Default)]
pub struct TestSelection {
    pub version: Option<String>,
    pub host_language: Option<String>,
    pub num: Option<String>,
}

impl TestSelection {
    /// The (version, host language) pairs `case` must run with.
    pub fn runs_for<'a>(&'a self, case: &'a TestCase) -> Vec<TestRun<'a>> {
        if self.num.as_ref().is_some_and(|num| *num != case.num) {
            return Vec::new();
        }
        let mut runs = Vec::new();
        for version in &case.versions {
            if !self.accepts_version(version) {
                continue;
            }
            for host_language in &case.host_languages {
                if self.accepts_host_language(version, host_language) {
                    runs.push(TestRun {
                        case,
                        version,
                        host_language,
                    });
                }
            }
        }
        runs
    }

    /// All runs of the manifest, in manifest order.
    pub fn runs<'a>(&'a self, manifest: &'a TestManifest) -> impl Iterator<Item = TestRun<'a>> {
        manifest
            .cases()
            .iter()
            .flat_map(move |case| self.runs_for(case))
    }

    fn accepts_version(&self, version: &str) -> bool {
        match &self.version {
            Some(requested) => requested == version,
            None => version != LEGACY_VERSION,
        }
    }

    fn accepts_host_language(&self, version: &str, host_language: &str) -> bool {
        match &self.host_language {
            Some(requested) => requested == host_language,
            None if version.contains('-') => host_language == VARIANT_HOST_LANGUAGE,
            None => host_language != LEGACY_HOST_LANGUAGE,
        }
    }
}
