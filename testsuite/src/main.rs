use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueHint};
use oxigraph::io::RdfFormat;
use oxigraph::model::NamedNode;
use rdfa_testsuite::context::{HarnessContext, TEST_CASES_NAMESPACE};
use rdfa_testsuite::evaluator::{Invoker, TestEvaluator};
use rdfa_testsuite::files::DirectoryFixtureStore;
use rdfa_testsuite::manifest::{TestManifest, TestSelection};
use rdfa_testsuite::registry::ProcessorRegistry;
use rdfa_testsuite::report::{build_conformance_report, build_summary};
use rdfa_testsuite::target::select_target;
use rdfa_testsuite::verifier::ResultVerifier;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_REGISTRY: &str = "processors.json";

#[derive(Parser)]
#[command(about, name = "rdfa-testsuite", disable_version_flag = true)]
/// RDFa processor conformance test runner
struct Args {
    /// Processor to test
    ///
    /// Either the path to an executable followed by its extra arguments,
    /// the name of a processor from the registry, or the URL of a processor HTTP endpoint.
    /// Arguments are split on whitespace without quoting support: a path containing spaces
    /// is only recognized when it is given alone.
    runner: Option<String>,
    /// Write an EARL conformance report
    #[arg(short, long)]
    earl: bool,
    /// Format of the conformance report
    ///
    /// It can be an extension like "ttl" or a MIME type like "application/n-triples".
    #[arg(long, default_value = "ttl")]
    format: String,
    /// Format of the graphs printed by a local processor
    ///
    /// It can be an extension like "nt" or a MIME type like "application/rdf+xml".
    #[arg(long, default_value = "ttl")]
    processor_format: String,
    /// Only run the tests of this host language
    #[arg(long)]
    host_language: Option<String>,
    /// Only run the test with this number
    #[arg(long)]
    num: Option<String>,
    /// File to write the conformance report to
    ///
    /// By default, stdout is used.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
    /// Echo test sources, queries, extracted graphs and errors
    #[arg(short, long)]
    verbose: bool,
    /// Only run the tests of this RDFa version
    #[arg(long = "version")]
    rdfa_version: Option<String>,
    /// Test manifest
    #[arg(long, default_value = "manifest.json", value_hint = ValueHint::FilePath)]
    manifest: PathBuf,
    /// Directory containing the test documents and queries
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    fixtures: PathBuf,
    /// Processor registry
    ///
    /// By default, processors.json is read from the working directory if it exists.
    #[arg(long, value_hint = ValueHint::FilePath)]
    processors: Option<PathBuf>,
    /// IRI identifying the processor in the conformance report
    #[arg(long, value_hint = ValueHint::Url)]
    processor_iri: Option<String>,
    /// IRI of the agent asserting the results
    #[arg(long, value_hint = ValueHint::Url)]
    assertor: Option<String>,
    /// Base of the test documents URIs
    #[arg(long, default_value = TEST_CASES_NAMESPACE, value_hint = ValueHint::Url)]
    base_uri: String,
}

fn main() -> Result<()> {
    let context = HarnessContext::new();
    let args = Args::parse();
    let Some(runner) = args.runner.as_deref() else {
        Args::command().print_help()?;
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if args.verbose { "debug" } else { "warn" })
        }))
        .with_writer(io::stderr)
        .init();

    let format = parse_format(&args.format)
        .with_context(|| format!("The report format {} is unknown", args.format))?;
    let processor_format = parse_format(&args.processor_format).with_context(|| {
        format!("The processor output format {} is unknown", args.processor_format)
    })?;
    let registry = match &args.processors {
        Some(path) => ProcessorRegistry::load(path)?,
        None if Path::new(DEFAULT_REGISTRY).is_file() => {
            ProcessorRegistry::load(Path::new(DEFAULT_REGISTRY))?
        }
        None => ProcessorRegistry::default(),
    };
    if registry.is_empty() {
        tracing::debug!("no registered processor");
    }
    let resolved = select_target(runner, &registry, args.earl, args.processor_iri.as_deref())?;
    let mut context = context
        .with_identity(resolved.identity)
        .with_verbose(args.verbose);
    if let Some(assertor) = &args.assertor {
        context = context.with_assertor(
            NamedNode::new(assertor).with_context(|| format!("Invalid assertor IRI {assertor}"))?,
        );
    }

    let manifest = TestManifest::load(&args.manifest)?;
    let fixtures = DirectoryFixtureStore::new(&args.fixtures).with_base_uri(&args.base_uri);
    let selection = TestSelection {
        version: args.rdfa_version.clone(),
        host_language: args.host_language.clone(),
        num: args.num.clone(),
    };
    let evaluator = TestEvaluator::new(&context, &fixtures, Invoker::for_target(resolved.target)?)
        .with_verifier(ResultVerifier::new().with_format(processor_format));

    // the report owns stdout when it is not written to a file
    let mut progress: Box<dyn Write> = if args.earl && args.output.is_none() {
        Box::new(io::stderr().lock())
    } else {
        Box::new(io::stdout().lock())
    };
    let results = evaluator.evaluate(&manifest, &selection, &mut progress)?;
    if results.is_empty() {
        tracing::warn!("no test case matches the selection");
    }
    write!(progress, "{}", build_summary(&results))?;
    progress.flush()?;
    drop(progress);

    if args.earl {
        let report = build_conformance_report(&context, &results, format)?;
        if let Some(output) = &args.output {
            let mut file = BufWriter::new(
                File::create(output)
                    .with_context(|| format!("Failed to create {}", output.display()))?,
            );
            file.write_all(&report)?;
            file.flush()?;
        } else {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&report)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn parse_format(format: &str) -> Option<RdfFormat> {
    RdfFormat::from_extension(format).or_else(|| RdfFormat::from_media_type(format))
}
