//! Conformance test harness for [RDFa](https://rdfa.info/) processors.
//!
//! Runs the test cases of the [RDFa test suite](https://rdfa.info/test-suite/) against a
//! local executable or an HTTP endpoint, and reports the results as a summary and as an
//! [EARL](https://www.w3.org/TR/EARL10-Schema/) conformance report.

pub mod context;
pub mod endpoint;
pub mod error;
pub mod evaluator;
pub mod files;
pub mod manifest;
pub mod process;
pub mod registry;
pub mod report;
pub mod results;
pub mod target;
pub mod verifier;
mod vocab;
