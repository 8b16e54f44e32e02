use crate::error::ExecutionFault;
use crate::files::TestFixture;
use crate::verifier::{ask, load_graph};
use oxhttp::model::header::{ACCEPT, CONTENT_TYPE};
use oxhttp::model::Request;
use oxigraph::io::RdfFormat;
use regex::{Captures, Regex};
use std::fmt;
use std::io::Read;

/// The query parameter processor endpoints expect last, followed by the test document URI.
pub const TRAILING_PARAMETER: &str = "uri=";

const ACCEPT_GRAPH: &str = "text/turtle, application/n-triples;q=0.9, application/rdf+xml;q=0.8";

/// Extracts and checks a test document through a remote processor.
///
/// Implementations own the whole verification: the returned boolean is the verdict.
pub trait RemoteProcessor {
    fn check(
        &self,
        url: &str,
        fixture: &TestFixture,
        expected: bool,
    ) -> Result<bool, ExecutionFault>;
}

/// Runs tests against a processor reachable over HTTP.
pub struct EndpointInvoker {
    endpoint: String,
    remote: Box<dyn RemoteProcessor>,
}

impl EndpointInvoker {
    pub fn new(endpoint: impl Into<String>, remote: Box<dyn RemoteProcessor>) -> Self {
        Self {
            endpoint: endpoint.into(),
            remote,
        }
    }

    /// The endpoint URL for a test run, with the test query parameter if any.
    pub fn url_for(&self, query_param: Option<&str>) -> String {
        match query_param {
            Some(query_param) => splice_query_param(&self.endpoint, query_param),
            None => self.endpoint.clone(),
        }
    }

    pub fn invoke(
        &self,
        fixture: &TestFixture,
        query_param: Option<&str>,
        expected: bool,
    ) -> Result<bool, ExecutionFault> {
        self.remote.check(&self.url_for(query_param), fixture, expected)
    }
}

/// Inserts `query_param` into the query string of `url` just before its trailing `uri=` parameter.
///
/// If there is no such parameter, `query_param` is appended to the query string.
pub fn splice_query_param(url: &str, query_param: &str) -> String {
    let pattern = format!("([?&])({})", regex::escape(TRAILING_PARAMETER));
    match Regex::new(&pattern) {
        Ok(regex) if regex.is_match(url) => regex
            .replacen(url, 1, |captures: &Captures<'_>| {
                format!("{}{query_param}&{}", &captures[1], &captures[2])
            })
            .into_owned(),
        _ if url.contains('?') => format!("{url}&{query_param}"),
        _ => format!("{url}?{query_param}"),
    }
}

/// [`RemoteProcessor`] fetching `<endpoint><document URI>` over HTTP.
///
/// The processor retrieves the test document itself from its canonical URI.
/// The response is parsed according to its `Content-Type` (Turtle if unknown) and the test
/// assertion is evaluated on it.
pub struct HttpRemoteProcessor {
    client: oxhttp::Client,
}

impl HttpRemoteProcessor {
    pub fn new() -> Result<Self, ExecutionFault> {
        let client = oxhttp::Client::new()
            .with_redirection_limit(5)
            .with_user_agent(concat!("rdfa-testsuite/", env!("CARGO_PKG_VERSION")))
            .map_err(|e| ExecutionFault::Remote(e.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<(Option<String>, Vec<u8>), ExecutionFault> {
        let request = Request::builder()
            .uri(url)
            .header(ACCEPT, ACCEPT_GRAPH)
            .body(())
            .map_err(|e| ExecutionFault::Remote(e.to_string()))?;
        tracing::debug!(url, "querying remote processor");
        let response = self.client.request(request)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let mut body = Vec::new();
        response.into_body().read_to_end(&mut body)?;
        if !status.is_success() {
            return Err(ExecutionFault::Remote(format!(
                "Error {status} returned by {url} with payload:\n{}",
                String::from_utf8_lossy(&body)
            )));
        }
        Ok((content_type, body))
    }
}

impl RemoteProcessor for HttpRemoteProcessor {
    fn check(
        &self,
        url: &str,
        fixture: &TestFixture,
        expected: bool,
    ) -> Result<bool, ExecutionFault> {
        let (content_type, body) = self.get(&format!("{url}{}", fixture.uri))?;
        let format = content_type
            .as_deref()
            .and_then(RdfFormat::from_media_type)
            .unwrap_or(RdfFormat::Turtle);
        let store = load_graph(&body, format, &fixture.uri)?;
        Ok(ask(&store, &fixture.assertion, &fixture.uri)? == expected)
    }
}

impl fmt::Debug for EndpointInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointInvoker")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn splice_before_trailing_parameter() {
        assert_eq!(
            splice_query_param("http://example.com/extract?uri=", "rdfagraph=processor"),
            "http://example.com/extract?rdfagraph=processor&uri="
        );
        assert_eq!(
            splice_query_param(
                "http://example.com/distiller?raw=true&uri=",
                "vocab_expansion=true"
            ),
            "http://example.com/distiller?raw=true&vocab_expansion=true&uri="
        );
        assert_eq!(
            splice_query_param("http://example.com/x?fmt=nt&uri=&debug", "a=$1"),
            "http://example.com/x?fmt=nt&a=$1&uri=&debug"
        );
    }

    #[test]
    fn splice_without_trailing_parameter() {
        assert_eq!(
            splice_query_param("http://example.com/extract", "rdfagraph=processor"),
            "http://example.com/extract?rdfagraph=processor"
        );
        assert_eq!(
            splice_query_param("http://example.com/extract?in=rdfa", "rdfagraph=processor"),
            "http://example.com/extract?in=rdfa&rdfagraph=processor"
        );
    }

    struct RecordingProcessor {
        urls: Rc<RefCell<Vec<String>>>,
        verdict: bool,
    }

    impl RemoteProcessor for RecordingProcessor {
        fn check(
            &self,
            url: &str,
            _fixture: &TestFixture,
            expected: bool,
        ) -> Result<bool, ExecutionFault> {
            self.urls.borrow_mut().push(url.to_owned());
            Ok(self.verdict == expected)
        }
    }

    #[test]
    fn delegates_verdict() -> Result<(), ExecutionFault> {
        let urls = Rc::new(RefCell::new(Vec::new()));
        let invoker = EndpointInvoker::new(
            "http://example.com/extract?uri=",
            Box::new(RecordingProcessor {
                urls: Rc::clone(&urls),
                verdict: true,
            }),
        );
        let fixture = TestFixture {
            content: Vec::new(),
            assertion: String::new(),
            uri: "http://example.com/0001.html".into(),
        };
        assert!(invoker.invoke(&fixture, None, true)?);
        assert!(!invoker.invoke(&fixture, Some("rdfagraph=processor"), false)?);
        assert_eq!(
            *urls.borrow(),
            vec![
                "http://example.com/extract?uri=".to_owned(),
                "http://example.com/extract?rdfagraph=processor&uri=".to_owned()
            ]
        );
        Ok(())
    }
}
