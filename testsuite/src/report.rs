use crate::context::{HarnessContext, TEST_CASES_NAMESPACE, TEST_SUITE_IRI};
use crate::results::{ResultKey, ResultsTable};
use crate::vocab::{dc, doap, earl, xsd};
use anyhow::{Context, Result};
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::vocab::{rdf, xsd as xsd_types};
use oxigraph::model::{BlankNode, Literal, NamedNode, NamedNodeRef, TripleRef};

/// One `<host language>+<version>: <passed>/<total>` line per pair with results.
pub fn build_summary(results: &ResultsTable) -> String {
    results
        .pairs()
        .into_iter()
        .map(|(host_language, version)| {
            let (passed, total) = results.summary_for(version, host_language);
            format!("{host_language}+{version}: {passed}/{total}\n")
        })
        .collect()
}

/// IRI of the test run `key` in the conformance report.
pub fn test_iri(key: &ResultKey) -> Result<NamedNode> {
    let iri = format!(
        "{TEST_CASES_NAMESPACE}{}/{}/{}",
        key.version, key.host_language, key.num
    );
    NamedNode::new(&iri).with_context(|| format!("Invalid test IRI {iri}"))
}

/// Serializes the results as an [EARL](https://www.w3.org/TR/EARL10-Schema/) report.
///
/// The output only depends on the context and on the table content.
pub fn build_conformance_report(
    context: &HarnessContext,
    results: &ResultsTable,
    format: RdfFormat,
) -> Result<Vec<u8>> {
    let subject = context
        .identity()
        .context("The conformance report requires a processor identity IRI")?;
    let date = Literal::new_typed_literal(context.run_timestamp_lexical()?, xsd_types::DATE_TIME);
    let suite = NamedNodeRef::new_unchecked(TEST_SUITE_IRI);

    let mut serializer = RdfSerializer::from_format(format)
        .with_prefix("dc", dc::NAMESPACE)?
        .with_prefix("doap", doap::NAMESPACE)?
        .with_prefix("earl", earl::NAMESPACE)?
        .with_prefix("xsd", xsd::NAMESPACE)?
        .for_writer(Vec::new());

    let suite_name = Literal::new_simple_literal("RDFa Test Suite");
    for triple in [
        TripleRef::new(suite, rdf::TYPE, earl::SOFTWARE),
        TripleRef::new(suite, rdf::TYPE, doap::PROJECT),
        TripleRef::new(suite, doap::NAME, &suite_name),
        TripleRef::new(suite, doap::HOMEPAGE, suite),
        TripleRef::new(subject, rdf::TYPE, doap::PROJECT),
        TripleRef::new(subject, rdf::TYPE, earl::TEST_SUBJECT),
        TripleRef::new(subject, rdf::TYPE, earl::SOFTWARE),
    ] {
        serializer.serialize_triple(triple)?;
    }

    for (i, (key, passed)) in results.entries().enumerate() {
        let test = test_iri(key)?;
        let assertion = BlankNode::new_unchecked(format!("assertion{i}"));
        let result = BlankNode::new_unchecked(format!("result{i}"));
        let outcome = if passed { earl::PASSED } else { earl::FAILED };
        for triple in [
            TripleRef::new(&assertion, rdf::TYPE, earl::ASSERTION),
            TripleRef::new(&assertion, earl::ASSERTED_BY, context.assertor()),
            TripleRef::new(&assertion, earl::SUBJECT, subject),
            TripleRef::new(&assertion, earl::TEST, &test),
            TripleRef::new(&assertion, earl::MODE, earl::AUTOMATIC),
            TripleRef::new(&assertion, earl::RESULT, &result),
            TripleRef::new(&result, rdf::TYPE, earl::TEST_RESULT),
            TripleRef::new(&result, earl::OUTCOME, outcome),
            TripleRef::new(&result, dc::DATE, &date),
        ] {
            serializer.serialize_triple(triple)?;
        }
    }
    Ok(serializer.finish()?)
}
