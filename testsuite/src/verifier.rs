use crate::error::ExecutionFault;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;

/// Checks the output of a locally executed processor against the test `ASK` assertion.
#[derive(Debug, Clone, Copy)]
pub struct ResultVerifier {
    format: RdfFormat,
}

impl ResultVerifier {
    /// A verifier reading processor output as Turtle, which N-Triples output also is.
    pub fn new() -> Self {
        Self {
            format: RdfFormat::Turtle,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: RdfFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns whether the assertion result over `output` is the `expected` one.
    pub fn verify(
        &self,
        output: &[u8],
        base_uri: &str,
        assertion: &str,
        expected: bool,
    ) -> Result<bool, ExecutionFault> {
        let store = load_graph(output, self.format, base_uri)?;
        Ok(ask(&store, assertion, base_uri)? == expected)
    }
}

impl Default for ResultVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a serialized graph into a fresh in-memory store.
pub(crate) fn load_graph(
    data: &[u8],
    format: RdfFormat,
    base_uri: &str,
) -> Result<Store, ExecutionFault> {
    let store = Store::new().map_err(|e| ExecutionFault::Evaluation(e.to_string()))?;
    let parser = RdfParser::from_format(format)
        .with_base_iri(base_uri)
        .map_err(|e| ExecutionFault::Parse(e.to_string()))?;
    store
        .load_from_reader(parser, data)
        .map_err(|e| ExecutionFault::Parse(e.to_string()))?;
    Ok(store)
}

/// Evaluates an `ASK` query against the store content.
pub(crate) fn ask(store: &Store, query: &str, base_uri: &str) -> Result<bool, ExecutionFault> {
    let prepared = SparqlEvaluator::new()
        .with_base_iri(base_uri)
        .map_err(|e| ExecutionFault::Evaluation(e.to_string()))?
        .parse_query(query)
        .map_err(|e| ExecutionFault::Evaluation(e.to_string()))?;
    match prepared
        .on_store(store)
        .execute()
        .map_err(|e| ExecutionFault::Evaluation(e.to_string()))?
    {
        QueryResults::Boolean(result) => Ok(result),
        _ => Err(ExecutionFault::Evaluation(
            "the test assertion is not an ASK query".into(),
        )),
    }
}
