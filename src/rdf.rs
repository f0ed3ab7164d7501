//! RDF serialization format identifiers and line-based triple helpers.

use serde::{Deserialize, Serialize};

/// RDF serialization format identifier.
///
/// Only the MIME type and the quad-capability flag matter to the ingest
/// routing logic; parsing and serialization happen elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RdfFormat {
    NTriples,
    NQuads,
    Turtle,
    TriG,
    RdfXml,
    JsonLd,
}

impl RdfFormat {
    /// Default MIME type used as the document Content-Type
    pub fn mime_type(&self) -> &'static str {
        match self {
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::NQuads => "application/n-quads",
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::TriG => "application/trig",
            RdfFormat::RdfXml => "application/rdf+xml",
            RdfFormat::JsonLd => "application/ld+json",
        }
    }

    /// Whether the serialization encodes its own graph per statement.
    ///
    /// Quad-carrying documents are merged whole; their embedded graph
    /// assignments take precedence over any caller-supplied context list.
    pub fn carries_quads(&self) -> bool {
        matches!(self, RdfFormat::NQuads | RdfFormat::TriG)
    }
}

/// Extracts the subject from an RDF line (N-Triples/N-Quads).
///
/// Assumes the triple starts with `<subject>` (IRI) or `_:` (blank node).
pub fn extract_subject(triple: &str) -> Option<&str> {
    let triple = triple.trim();
    if triple.starts_with('<') {
        triple.find('>').map(|end| &triple[..=end])
    } else {
        triple.split_whitespace().next()
    }
}

/// Extracts the first quoted string from an RDF line, typically a literal
/// object.
pub fn extract_quoted_string(triple: &str) -> Option<&str> {
    let start = triple.find('"')? + 1;
    let end = triple[start..].find('"')? + start;
    Some(&triple[start..end])
}
