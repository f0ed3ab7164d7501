//! RDF terms and statements as seen by the connection API.

use std::fmt;

/// A typed RDF value: IRI, blank node, or literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// An IRI reference
    Iri(String),
    /// A blank node identifier (without the `_:` prefix)
    BlankNode(String),
    /// A literal with optional datatype IRI or language tag
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    /// Create an IRI term
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    /// Create a blank node term
    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    /// Create a plain string literal
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Create a literal with a datatype IRI
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Create a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// The bare lexical form of the term: the IRI string, the blank node id,
    /// or the literal label without quoting or annotations.
    ///
    /// This is the form the binding codec puts on the wire; datatype and
    /// language information does not survive encoding.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::BlankNode(id) => id,
            Term::Literal { value, .. } => value,
        }
    }
}

/// The annotated form: quoted literal with `^^<datatype>` or `@lang`,
/// `_:` prefix for blank nodes, bare IRI string.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{iri}"),
            Term::BlankNode(id) => write!(f, "_:{id}"),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{value}\"")?;
                if let Some(lang) = language {
                    write!(f, "@{lang}")?;
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{dt}>")?;
                }
                Ok(())
            }
        }
    }
}

/// One subject-predicate-object statement, optionally scoped to named graphs.
///
/// `contexts` may be empty (default graph), singular, or multiple (the same
/// statement replicated across named graphs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub contexts: Vec<String>,
}

impl Statement {
    /// Create a statement targeting the default graph
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            contexts: Vec::new(),
        }
    }

    /// Add a named graph the statement applies to
    pub fn in_graph(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }
}
