//! Registry of known RDFa processors.
//!
//! The registry file maps a display name to the processor HTTP endpoint and to the IRI
//! identifying the processor in conformance reports:
//!
//! ```json
//! {
//!   "pyRdfa": {
//!     "endpoint": "http://www.w3.org/2012/pyRdfa/extract?uri=",
//!     "doap": "http://www.w3.org/2012/pyRdfa"
//!   }
//! }
//! ```

use crate::error::ConfigurationError;
use oxigraph::model::NamedNode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessorEntry {
    pub endpoint: String,
    #[serde(rename = "doap")]
    pub identity: String,
}

#[derive(Debug, Default, Clone)]
pub struct ProcessorRegistry {
    entries: BTreeMap<String, ProcessorEntry>,
}

impl ProcessorRegistry {
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_slice(data)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let data = fs::read(path).map_err(|source| ConfigurationError::Registry {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| ConfigurationError::RegistrySyntax {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: ProcessorEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Finds the processor named by `token`.
    ///
    /// An exact (case-insensitive) name match wins, otherwise the single entry whose
    /// name starts with the token is returned. Ambiguous prefixes match nothing.
    pub fn lookup(&self, token: &str) -> Option<(&str, &ProcessorEntry)> {
        if token.is_empty() {
            return None;
        }
        let token = token.to_lowercase();
        if let Some((name, entry)) = self
            .entries
            .iter()
            .find(|(name, _)| name.to_lowercase() == token)
        {
            return Some((name, entry));
        }
        let mut candidates = self
            .entries
            .iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(&token));
        let (name, entry) = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        Some((name, entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProcessorEntry {
    pub fn identity_iri(&self) -> Result<NamedNode, ConfigurationError> {
        Ok(NamedNode::new(&self.identity)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "pyRdfa": {"endpoint": "http://www.w3.org/2012/pyRdfa/extract?uri=", "doap": "http://www.w3.org/2012/pyRdfa"},
        "RDF::RDFa": {"endpoint": "http://rdf.greggkellogg.net/distiller?raw=true&uri=", "doap": "http://rubygems.org/gems/rdf-rdfa"},
        "RDF::RDFa-beta": {"endpoint": "http://example.org/beta?uri=", "doap": "http://example.org/beta"}
    }"#;

    #[test]
    fn exact_lookup() -> Result<(), serde_json::Error> {
        let registry = ProcessorRegistry::from_json(REGISTRY.as_bytes())?;
        let (name, entry) = registry.lookup("pyrdfa").unwrap();
        assert_eq!(name, "pyRdfa");
        assert_eq!(entry.identity, "http://www.w3.org/2012/pyRdfa");
        let (name, _) = registry.lookup("RDF::RDFa").unwrap();
        assert_eq!(name, "RDF::RDFa");
        Ok(())
    }

    #[test]
    fn prefix_lookup() -> Result<(), serde_json::Error> {
        let registry = ProcessorRegistry::from_json(REGISTRY.as_bytes())?;
        assert_eq!(registry.lookup("py").map(|(name, _)| name), Some("pyRdfa"));
        assert_eq!(
            registry.lookup("RDF::RDFa-b").map(|(name, _)| name),
            Some("RDF::RDFa-beta")
        );
        // "RDF" is a prefix of two entries
        assert!(registry.lookup("RDF").is_none());
        assert!(registry.lookup("").is_none());
        // no substring matching
        assert!(registry.lookup("Rdfa").is_none());
        Ok(())
    }

    #[test]
    fn invalid_registry() {
        assert!(ProcessorRegistry::default().is_empty());
        assert!(ProcessorRegistry::from_json(b"{}").is_ok_and(|r| r.is_empty()));
        assert!(ProcessorRegistry::from_json(b"[1, 2]").is_err());
    }
}
