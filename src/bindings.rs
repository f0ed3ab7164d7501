//! Variable binding collections and their wire encoding.

use crate::{
    error::{Result, StoreClientError},
    term::Term,
};

/// One variable-to-value assignment, encoded for wire transmission.
///
/// `value` is the lexical string form of the original typed value; no type
/// information survives encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: String,
}

/// An ordered collection of named, typed variable bindings for a query.
///
/// Entries are kept in insertion order. Duplicate names pass through as
/// given; whether the last one wins is decided by the remote engine, not by
/// this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparqlBindings {
    entries: Vec<(String, Term)>,
}

impl SparqlBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding for `name`
    pub fn bind(&mut self, name: impl Into<String>, value: Term) -> &mut Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(name, term)| (name.as_str(), term))
    }

    /// Encode all entries into wire bindings, preserving order and
    /// duplicates. Each value becomes `Term::lexical()`.
    pub(crate) fn encode(&self) -> Result<Vec<Binding>> {
        self.entries
            .iter()
            .map(|(name, term)| {
                validate_variable_name(name)?;
                Ok(Binding {
                    name: name.clone(),
                    value: term.lexical().to_string(),
                })
            })
            .collect()
    }
}

fn validate_variable_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreClientError::MalformedRequest {
            reason: "binding name is empty".to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreClientError::MalformedRequest {
            reason: format!("binding name '{name}' is not a valid SPARQL variable name"),
        });
    }
    Ok(())
}
