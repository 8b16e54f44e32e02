use crate::context::HarnessContext;
use crate::endpoint::{EndpointInvoker, HttpRemoteProcessor, RemoteProcessor};
use crate::error::ExecutionFault;
use crate::files::{FixtureStore, TestFixture};
use crate::manifest::{TestManifest, TestRun, TestSelection};
use crate::process::ProcessInvoker;
use crate::results::{ResultsTable, Verdict};
use crate::target::InvocationTarget;
use crate::verifier::ResultVerifier;
use anyhow::Result;
use std::io::Write;

/// The strategy used to run each test.
#[derive(Debug)]
pub enum Invoker {
    /// Local executable, its output is checked by the harness.
    Process(ProcessInvoker),
    /// HTTP endpoint, the remote processor returns the verdict.
    Endpoint(EndpointInvoker),
}

impl Invoker {
    /// Builds the invoker for a resolved target, using HTTP for endpoints.
    pub fn for_target(target: InvocationTarget) -> Result<Self, ExecutionFault> {
        Ok(match target {
            InvocationTarget::LocalExecutable { program, args } => {
                Self::Process(ProcessInvoker::new(program, args))
            }
            InvocationTarget::NamedProcessor { endpoint, .. }
            | InvocationTarget::RawEndpoint { url: endpoint } => {
                Self::endpoint(endpoint, Box::new(HttpRemoteProcessor::new()?))
            }
        })
    }

    pub fn endpoint(endpoint: impl Into<String>, remote: Box<dyn RemoteProcessor>) -> Self {
        Self::Endpoint(EndpointInvoker::new(endpoint, remote))
    }
}

/// Runs the selected test cases one after the other.
pub struct TestEvaluator<'a> {
    context: &'a HarnessContext,
    fixtures: &'a dyn FixtureStore,
    invoker: Invoker,
    verifier: ResultVerifier,
}

impl<'a> TestEvaluator<'a> {
    pub fn new(context: &'a HarnessContext, fixtures: &'a dyn FixtureStore, invoker: Invoker) -> Self {
        Self {
            context,
            fixtures,
            invoker,
            verifier: ResultVerifier::new(),
        }
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: ResultVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Runs every selected test and records its verdict.
    ///
    /// A line is written to `output` for each test. Failures of a test never stop the run,
    /// only failures to write to `output` do.
    pub fn evaluate(
        &self,
        manifest: &TestManifest,
        selection: &TestSelection,
        output: &mut impl Write,
    ) -> Result<ResultsTable> {
        let mut results = ResultsTable::new();
        for run in selection.runs(manifest) {
            let verdict = self.evaluate_run(&run, output)?;
            writeln!(
                output,
                "test {} {}+{}: {verdict}",
                run.case.num, run.host_language, run.version
            )?;
            if results
                .record(run.version, run.host_language, &run.case.num, verdict.passed())
                .is_some()
            {
                tracing::warn!(
                    num = %run.case.num,
                    version = run.version,
                    host_language = run.host_language,
                    "test run recorded twice, keeping the last verdict"
                );
            }
        }
        Ok(results)
    }

    fn evaluate_run(&self, run: &TestRun<'_>, output: &mut impl Write) -> Result<Verdict> {
        let verbose = self.context.is_verbose();
        if verbose {
            writeln!(output, "{}:", run.case)?;
        }
        let result = match self
            .fixtures
            .fixture(run.version, run.host_language, &run.case.num)
        {
            Ok(fixture) => {
                if verbose {
                    writeln!(output, "source:\n{}", String::from_utf8_lossy(&fixture.content))?;
                    writeln!(output, "query:\n{}", fixture.assertion)?;
                }
                self.invoke(run, &fixture, output)?
            }
            Err(e) => Err(ExecutionFault::Fixture(format!("{e:#}"))),
        };
        let verdict = Verdict::from(result);
        if let Some(fault) = verdict.fault() {
            tracing::debug!(num = %run.case.num, "{fault}");
            if verbose {
                writeln!(output, "error: {fault}")?;
            }
        }
        Ok(verdict)
    }

    fn invoke(
        &self,
        run: &TestRun<'_>,
        fixture: &TestFixture,
        output: &mut impl Write,
    ) -> Result<Result<bool, ExecutionFault>> {
        let query_param = run.case.query_param.as_deref();
        Ok(match &self.invoker {
            Invoker::Process(process) => {
                match process.invoke(fixture, run.version, run.host_language, query_param) {
                    Ok(graph) => {
                        if self.context.is_verbose() {
                            writeln!(output, "extracted:\n{graph}")?;
                        }
                        self.verifier.verify(
                            graph.as_bytes(),
                            &fixture.uri,
                            &fixture.assertion,
                            run.case.expected_results,
                        )
                    }
                    Err(fault) => Err(fault),
                }
            }
            Invoker::Endpoint(endpoint) => {
                endpoint.invoke(fixture, query_param, run.case.expected_results)
            }
        })
    }
}
