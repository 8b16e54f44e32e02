use crate::error::ExecutionFault;
use crate::files::TestFixture;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

/// Runs a local processor executable.
///
/// The fixture is written to the processor standard input and the extracted graph is read
/// from its standard output. The exit code is ignored and no timeout is applied.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The command line arguments passed to the processor for a test run.
    pub fn arguments(
        &self,
        version: &str,
        host_language: &str,
        uri: &str,
        query_param: Option<&str>,
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "--host-language".to_owned(),
            host_language.to_owned(),
            "--version".to_owned(),
            version.to_owned(),
            "--uri".to_owned(),
            uri.to_owned(),
        ]);
        if let Some(query_param) = query_param {
            args.extend(query_param_flag(query_param));
        }
        args
    }

    /// Runs the processor on the fixture and returns everything it printed on its standard output.
    pub fn invoke(
        &self,
        fixture: &TestFixture,
        version: &str,
        host_language: &str,
        query_param: Option<&str>,
    ) -> Result<String, ExecutionFault> {
        let args = self.arguments(version, host_language, &fixture.uri, query_param);
        tracing::debug!(program = %self.program.display(), ?args, "spawning processor");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionFault::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // stdin is written while stdout is drained
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let mut output = Vec::new();
        let (write_result, read_result) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                // dropping stdin closes the pipe
                Some(mut stdin) => stdin.write_all(&fixture.content),
                None => Ok(()),
            });
            let read_result = match stdout {
                Some(mut stdout) => stdout.read_to_end(&mut output).map(|_| ()),
                None => Ok(()),
            };
            let write_result = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (write_result, read_result)
        });
        // reap the child even when the pipes failed
        let wait_result = child.wait();
        write_result?;
        read_result?;
        let status = wait_result?;
        if !status.success() {
            tracing::debug!(%status, "processor exited with a failure status");
        }
        Ok(String::from_utf8(output)?)
    }
}

/// Converts a `name=value` (or bare `name`) test query parameter into processor flags.
pub fn query_param_flag(query_param: &str) -> Vec<String> {
    match query_param.split_once('=') {
        Some((name, value)) if !value.is_empty() => vec![format!("--{name}"), value.to_owned()],
        Some((name, _)) => vec![format!("--{name}")],
        None => vec![format!("--{query_param}")],
    }
}
