use crate::error::ConfigurationError;
use crate::registry::ProcessorRegistry;
use oxigraph::model::NamedNode;
use std::fs;
use std::path::{Path, PathBuf};

/// How the processor under test is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationTarget {
    /// An executable on the local file system, with the extra arguments given after it in the runner string.
    LocalExecutable { program: PathBuf, args: Vec<String> },
    /// A processor listed in the registry.
    NamedProcessor {
        name: String,
        endpoint: String,
        identity: NamedNode,
    },
    /// Any other runner string, used as an HTTP endpoint.
    RawEndpoint { url: String },
}

/// The outcome of runner resolution: the strategy and the IRI to report results against.
#[derive(Debug, Clone)]
pub struct ResolvedRunner {
    pub target: InvocationTarget,
    pub identity: Option<NamedNode>,
}

/// Decides how to invoke `runner`.
///
/// Fails if a conformance report is requested and no identity IRI can be found
/// in the registry or in `external_identity`.
pub fn select_target(
    runner: &str,
    registry: &ProcessorRegistry,
    report_requested: bool,
    external_identity: Option<&str>,
) -> Result<ResolvedRunner, ConfigurationError> {
    let external_identity = external_identity.map(NamedNode::new).transpose()?;
    let runner = runner.trim();

    let target = if let Some((program, args)) = local_command(runner) {
        InvocationTarget::LocalExecutable { program, args }
    } else if let Some((name, entry)) = registry.lookup(runner) {
        match entry.identity_iri() {
            Ok(identity) => InvocationTarget::NamedProcessor {
                name: name.to_owned(),
                endpoint: entry.endpoint.clone(),
                identity,
            },
            Err(e) if report_requested && external_identity.is_none() => return Err(e),
            Err(e) => {
                tracing::warn!(processor = name, "ignoring invalid registry identity: {e}");
                InvocationTarget::RawEndpoint {
                    url: entry.endpoint.clone(),
                }
            }
        }
    } else {
        if looks_like_path(runner) {
            tracing::warn!(
                runner,
                "not an executable nor a registered processor, using it as an HTTP endpoint"
            );
        }
        InvocationTarget::RawEndpoint {
            url: runner.to_owned(),
        }
    };

    let identity = external_identity.or_else(|| match &target {
        InvocationTarget::NamedProcessor { identity, .. } => Some(identity.clone()),
        _ => None,
    });
    if report_requested && identity.is_none() {
        return Err(ConfigurationError::MissingIdentity {
            runner: runner.to_owned(),
        });
    }
    tracing::debug!(?target, "selected invocation strategy");
    Ok(ResolvedRunner { target, identity })
}

/// The whole runner if it is an executable path, else its first whitespace-separated token
/// followed by the other tokens as arguments.
fn local_command(runner: &str) -> Option<(PathBuf, Vec<String>)> {
    if is_executable(Path::new(runner)) {
        return Some((PathBuf::from(runner), Vec::new()));
    }
    let mut tokens = runner.split_whitespace();
    let program = tokens.next()?;
    is_executable(Path::new(program))
        .then(|| (PathBuf::from(program), tokens.map(ToOwned::to_owned).collect()))
}

fn looks_like_path(runner: &str) -> bool {
    !runner.contains("://") && (runner.starts_with(['/', '.', '~']) || runner.contains('/'))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessorEntry;

    fn registry() -> ProcessorRegistry {
        let mut registry = ProcessorRegistry::default();
        registry.insert(
            "pyRdfa",
            ProcessorEntry {
                endpoint: "http://www.w3.org/2012/pyRdfa/extract?uri=".into(),
                identity: "http://www.w3.org/2012/pyRdfa".into(),
            },
        );
        registry.insert(
            "broken",
            ProcessorEntry {
                endpoint: "http://example.com/broken?uri=".into(),
                identity: "not an iri".into(),
            },
        );
        registry
    }

    #[cfg(unix)]
    #[test]
    fn local_executable_with_args() -> Result<(), ConfigurationError> {
        let resolved = select_target("/bin/sh -e script.sh", &registry(), false, None)?;
        assert_eq!(
            resolved.target,
            InvocationTarget::LocalExecutable {
                program: PathBuf::from("/bin/sh"),
                args: vec!["-e".into(), "script.sh".into()],
            }
        );
        assert!(resolved.identity.is_none());
        Ok(())
    }

    #[test]
    fn named_processor() -> Result<(), ConfigurationError> {
        let resolved = select_target("pyRdfa", &registry(), true, None)?;
        assert!(matches!(
            resolved.target,
            InvocationTarget::NamedProcessor { ref name, .. } if name == "pyRdfa"
        ));
        assert_eq!(
            resolved.identity.map(NamedNode::into_string).as_deref(),
            Some("http://www.w3.org/2012/pyRdfa")
        );
        Ok(())
    }

    #[test]
    fn raw_endpoint() -> Result<(), ConfigurationError> {
        let resolved = select_target("http://example.com/extract?uri=", &registry(), false, None)?;
        assert_eq!(
            resolved.target,
            InvocationTarget::RawEndpoint {
                url: "http://example.com/extract?uri=".into()
            }
        );
        Ok(())
    }

    #[test]
    fn report_without_identity_is_fatal() {
        let result = select_target("http://example.com/extract?uri=", &registry(), true, None);
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingIdentity { .. })
        ));
    }

    #[test]
    fn external_identity() -> Result<(), ConfigurationError> {
        let resolved = select_target(
            "http://example.com/extract?uri=",
            &registry(),
            true,
            Some("http://example.com/processor"),
        )?;
        assert_eq!(
            resolved.identity.map(NamedNode::into_string).as_deref(),
            Some("http://example.com/processor")
        );
        assert!(select_target("pyRdfa", &registry(), true, Some("not an iri")).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn executable_path_with_spaces() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let program = dir.path().join("rdfa processor");
        fs::copy("/bin/sh", &program)?;
        let runner = program.display().to_string();
        let resolved = select_target(&runner, &registry(), false, None)?;
        assert_eq!(
            resolved.target,
            InvocationTarget::LocalExecutable {
                program,
                args: Vec::new(),
            }
        );
        Ok(())
    }

    #[test]
    fn missing_executable_is_an_endpoint() -> Result<(), ConfigurationError> {
        let resolved = select_target("/nonexistent/rdfa-processor --verbose", &registry(), false, None)?;
        assert_eq!(
            resolved.target,
            InvocationTarget::RawEndpoint {
                url: "/nonexistent/rdfa-processor --verbose".into()
            }
        );
        Ok(())
    }

    #[test]
    fn invalid_registry_identity_with_report() {
        assert!(matches!(
            select_target("broken", &registry(), true, None),
            Err(ConfigurationError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn invalid_registry_identity_without_report() -> Result<(), ConfigurationError> {
        let resolved = select_target("broken", &registry(), false, None)?;
        assert_eq!(
            resolved.target,
            InvocationTarget::RawEndpoint {
                url: "http://example.com/broken?uri=".into()
            }
        );
        assert!(resolved.identity.is_none());

        let resolved = select_target(
            "broken",
            &registry(),
            true,
            Some("http://example.com/processor"),
        )?;
        assert_eq!(
            resolved.target,
            InvocationTarget::RawEndpoint {
                url: "http://example.com/broken?uri=".into()
            }
        );
        assert_eq!(
            resolved.identity.map(NamedNode::into_string).as_deref(),
            Some("http://example.com/processor")
        );
        Ok(())
    }

    #[test]
    fn path_detection() {
        assert!(looks_like_path("./processor"));
        assert!(looks_like_path("bin/processor"));
        assert!(!looks_like_path("http://example.com/extract?uri="));
        assert!(!looks_like_path("pyRdfa"));
    }
}
