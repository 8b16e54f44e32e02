use crate::error::ExecutionFault;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a single test run.
#[derive(Debug)]
pub enum Verdict {
    Passed,
    Failed,
    /// The run could not be completed. Counts as a failure.
    Fault(ExecutionFault),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn fault(&self) -> Option<&ExecutionFault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Passed | Self::Failed => None,
        }
    }
}

impl From<Result<bool, ExecutionFault>> for Verdict {
    fn from(result: Result<bool, ExecutionFault>) -> Self {
        match result {
            Ok(true) => Self::Passed,
            Ok(false) => Self::Failed,
            Err(fault) => Self::Fault(fault),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.passed() { "PASS" } else { "FAIL" })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultKey {
    pub version: String,
    pub host_language: String,
    pub num: String,
}

impl ResultKey {
    pub fn new(
        version: impl Into<String>,
        host_language: impl Into<String>,
        num: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            host_language: host_language.into(),
            num: num.into(),
        }
    }
}

/// Verdicts of a run, keyed by (version, host language, test number).
///
/// Iteration follows the key order so anything rendered from the table is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsTable {
    results: BTreeMap<ResultKey, bool>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the verdict of a run and returns the one it replaces, if any.
    pub fn record(
        &mut self,
        version: &str,
        host_language: &str,
        num: &str,
        passed: bool,
    ) -> Option<bool> {
        self.results
            .insert(ResultKey::new(version, host_language, num), passed)
    }

    pub fn get(&self, version: &str, host_language: &str, num: &str) -> Option<bool> {
        self.results
            .get(&ResultKey::new(version, host_language, num))
            .copied()
    }

    /// `(passed, total)` over the runs of the given version and host language.
    pub fn summary_for(&self, version: &str, host_language: &str) -> (usize, usize) {
        self.results
            .iter()
            .filter(|(key, _)| key.version == version && key.host_language == host_language)
            .fold((0, 0), |(passed, total), (_, result)| {
                (passed + usize::from(*result), total + 1)
            })
    }

    /// The distinct `(host language, version)` pairs that have results, sorted.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = self
            .results
            .keys()
            .map(|key| (key.host_language.as_str(), key.version.as_str()))
            .collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ResultKey, bool)> {
        self.results.iter().map(|(key, result)| (key, *result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn verdicts() {
        assert!(Verdict::from(Ok(true)).passed());
        assert!(!Verdict::from(Ok(false)).passed());
        let fault = Verdict::from(Err(ExecutionFault::Io(io::Error::other("broken pipe"))));
        assert!(!fault.passed());
        assert!(fault.fault().is_some());
        assert_eq!(fault.to_string(), "FAIL");
    }

    #[test]
    fn summary() {
        let mut table = ResultsTable::new();
        table.record("rdfa1.1", "html5", "0001", true);
        table.record("rdfa1.1", "html5", "0002", false);
        table.record("rdfa1.1", "xhtml1", "0001", true);
        table.record("rdfa1.1-vocab", "html5", "0240", true);
        assert_eq!(table.summary_for("rdfa1.1", "html5"), (1, 2));
        assert_eq!(table.summary_for("rdfa1.1", "xhtml1"), (1, 1));
        assert_eq!(table.summary_for("rdfa1.1", "svg"), (0, 0));
        assert_eq!(
            table.pairs(),
            vec![
                ("html5", "rdfa1.1"),
                ("html5", "rdfa1.1-vocab"),
                ("xhtml1", "rdfa1.1")
            ]
        );
    }

    #[test]
    fn record_overwrites() {
        let mut table = ResultsTable::new();
        assert!(table.is_empty());
        assert_eq!(table.record("rdfa1.1", "html5", "0001", false), None);
        assert!(!table.is_empty());
        assert_eq!(table.record("rdfa1.1", "html5", "0001", true), Some(false));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("rdfa1.1", "html5", "0001"), Some(true));
    }
}
