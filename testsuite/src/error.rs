use oxigraph::model::IriParseError;
use std::io;
use std::string::FromUtf8Error;

/// A problem detected before any test case runs. The run is aborted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A conformance report was requested but the processor has no identity IRI.
    #[error(
        "no processor identity IRI is known for runner {runner}, register it or pass --processor-iri"
    )]
    MissingIdentity { runner: String },
    #[error("invalid processor identity IRI: {0}")]
    InvalidIdentity(#[from] IriParseError),
    #[error("unable to read the processor registry {path}: {source}")]
    Registry {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid processor registry {path}: {source}")]
    RegistrySyntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A failure while running a single test case.
///
/// It is recorded as a failed verdict and the run goes on with the next test case.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionFault {
    #[error("failed to spawn processor {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while talking to the processor: {0}")]
    Io(#[from] io::Error),
    #[error("processor output is not valid UTF-8: {0}")]
    Decode(#[from] FromUtf8Error),
    #[error("unable to parse the processor output: {0}")]
    Parse(String),
    #[error("unable to evaluate the test assertion: {0}")]
    Evaluation(String),
    #[error("remote processor error: {0}")]
    Remote(String),
    #[error("fixture not available: {0}")]
    Fixture(String),
}
