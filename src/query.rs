//! Query descriptions and wire request assembly.

use crate::{
    bindings::{Binding, SparqlBindings},
    error::{Result, StoreClientError},
    term::Term,
};

/// An opaque set of inference ruleset identifiers applied by the remote
/// engine during query evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    names: Vec<String>,
}

impl Ruleset {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A pre-filter narrowing the documents a SPARQL query is evaluated
/// against, independent of the query's own pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstrainingQuery {
    /// Full-text criteria
    Text(String),
    /// A serialized structured query definition
    Structured(String),
}

/// Connection-scoped query defaults attached to every request while present.
///
/// Stored as an immutable snapshot and replaced whole on update; absence of
/// either field is a distinct state, never coerced to an empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDefaults {
    pub ruleset: Option<Ruleset>,
    pub constraining_query: Option<ConstrainingQuery>,
}

/// Server-side pagination window for SELECT results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Offset of the first row, counting from 1
    pub start: u64,
    /// Maximum number of rows per page
    pub length: u64,
}

impl Page {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }
}

/// A caller-supplied SPARQL query: text, optional base IRI, variable
/// bindings, and the inference flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    text: String,
    base_iri: Option<String>,
    include_inferred: bool,
    bindings: SparqlBindings,
}

impl SparqlQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            base_iri: None,
            include_inferred: true,
            bindings: SparqlBindings::new(),
        }
    }

    /// Set the base IRI prepended as a `BASE` prologue
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    /// Append one variable binding
    pub fn with_binding(mut self, name: impl Into<String>, value: Term) -> Self {
        self.bindings.bind(name, value);
        self
    }

    /// Control whether the remote engine applies its default inference
    /// rulesets; independent of any connection-level ruleset.
    pub fn include_inferred(mut self, include: bool) -> Self {
        self.include_inferred = include;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bindings(&self) -> &SparqlBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut SparqlBindings {
        &mut self.bindings
    }
}

/// A complete wire-ready query request.
///
/// Built fresh per call from a [`SparqlQuery`] and the connection's current
/// [`QueryDefaults`], and discarded after the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    text: String,
    ruleset: Option<Ruleset>,
    constraining_query: Option<ConstrainingQuery>,
    include_inferred: bool,
    bindings: Vec<Binding>,
}

impl QueryRequest {
    /// Assemble the request: compose the `BASE` prologue exactly once,
    /// attach ruleset and constraining query only when the defaults hold
    /// one, set the inference flag explicitly, and encode the bindings.
    ///
    /// Fails with [`StoreClientError::MalformedRequest`] before any network
    /// call when the composed text or a binding cannot be serialized.
    pub(crate) fn build(query: &SparqlQuery, defaults: &QueryDefaults) -> Result<Self> {
        if query.text.trim().is_empty() {
            return Err(StoreClientError::MalformedRequest {
                reason: "query text is empty".to_string(),
            });
        }

        let text = match &query.base_iri {
            Some(base_iri) => format!("BASE <{base_iri}>\n{}", query.text),
            None => query.text.clone(),
        };
        if text.contains('\0') {
            return Err(StoreClientError::MalformedRequest {
                reason: "query text contains an interior NUL byte".to_string(),
            });
        }

        let bindings = query.bindings.encode()?;

        tracing::trace!(
            query_len = text.len(),
            bindings = bindings.len(),
            has_ruleset = defaults.ruleset.is_some(),
            has_constraining_query = defaults.constraining_query.is_some(),
            "Built SPARQL request"
        );

        Ok(Self {
            text,
            ruleset: defaults.ruleset.clone(),
            constraining_query: defaults.constraining_query.clone(),
            include_inferred: query.include_inferred,
            bindings,
        })
    }

    /// The composed query text sent over the wire
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ruleset(&self) -> Option<&Ruleset> {
        self.ruleset.as_ref()
    }

    pub fn constraining_query(&self) -> Option<&ConstrainingQuery> {
        self.constraining_query.as_ref()
    }

    pub fn include_inferred(&self) -> bool {
        self.include_inferred
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}
