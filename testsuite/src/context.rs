use anyhow::{Context, Result};
use oxigraph::model::NamedNode;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// IRI of the test suite itself, used as the default assertor.
pub const TEST_SUITE_IRI: &str = "http://rdfa.info/test-suite/";
/// Namespace of the per-test IRIs of the conformance report.
pub const TEST_CASES_NAMESPACE: &str = "http://rdfa.info/test-suite/test-cases/";

/// State shared by every component of a single run.
///
/// Built once at startup: the run timestamp is captured here and reused by every report entry.
#[derive(Debug, Clone)]
pub struct HarnessContext {
    run_timestamp: OffsetDateTime,
    identity: Option<NamedNode>,
    assertor: NamedNode,
    verbose: bool,
}

impl HarnessContext {
    pub fn new() -> Self {
        Self::at(OffsetDateTime::now_utc())
    }

    /// Context whose run started at the given instant.
    pub fn at(run_timestamp: OffsetDateTime) -> Self {
        Self {
            run_timestamp,
            identity: None,
            assertor: NamedNode::new_unchecked(TEST_SUITE_IRI),
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Option<NamedNode>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_assertor(mut self, assertor: NamedNode) -> Self {
        self.assertor = assertor;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The run timestamp as an `xsd:dateTime` lexical form.
    pub fn run_timestamp_lexical(&self) -> Result<String> {
        self.run_timestamp
            .format(&Rfc3339)
            .context("Unable to format the run timestamp")
    }

    /// The processor identity IRI used as subject of the conformance report.
    pub fn identity(&self) -> Option<&NamedNode> {
        self.identity.as_ref()
    }

    pub fn assertor(&self) -> &NamedNode {
        &self.assertor
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for HarnessContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_captured_once() -> Result<()> {
        let context = HarnessContext::at(OffsetDateTime::from_unix_timestamp(1_700_000_000)?);
        assert_eq!(context.run_timestamp_lexical()?, "2023-11-14T22:13:20Z");
        assert_eq!(
            context.run_timestamp_lexical()?,
            context.clone().with_verbose(true).run_timestamp_lexical()?
        );
        Ok(())
    }

    #[test]
    fn defaults() {
        let context = HarnessContext::default();
        assert_eq!(context.assertor().as_str(), TEST_SUITE_IRI);
        assert!(context.identity().is_none());
        assert!(!context.is_verbose());
    }
}
