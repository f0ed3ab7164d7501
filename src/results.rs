//! Lazy result sequences for SELECT and graph queries.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;

use crate::{
    StoreConnection,
    backend::Transaction,
    error::{Result, StoreClientError},
    query::{Page, QueryRequest},
};

/// One value in a SELECT result row, parsed from SPARQL JSON results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BindingValue {
    /// An IRI
    Uri { value: String },
    /// A literal with optional datatype or language tag
    Literal {
        value: String,
        #[serde(default)]
        datatype: Option<String>,
        #[serde(default, rename = "xml:lang")]
        language: Option<String>,
    },
    /// A blank node
    Bnode { value: String },
}

impl BindingValue {
    /// The bare string value regardless of kind
    pub fn as_str(&self) -> &str {
        match self {
            BindingValue::Uri { value }
            | BindingValue::Literal { value, .. }
            | BindingValue::Bnode { value } => value,
        }
    }
}

/// One row of a SELECT result
#[derive(Debug, Clone)]
pub struct ResultRow {
    values: HashMap<String, BindingValue>,
}

impl ResultRow {
    pub fn get(&self, var: &str) -> Option<&BindingValue> {
        self.values.get(var)
    }

    pub fn get_str(&self, var: &str) -> Option<&str> {
        self.values.get(var).map(BindingValue::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Deserialize)]
struct SelectResponse {
    #[serde(default)]
    head: SelectHead,
    results: SelectRows,
}

#[derive(Deserialize, Default)]
struct SelectHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct SelectRows {
    bindings: Vec<HashMap<String, BindingValue>>,
}

fn parse_select_page(json: &str) -> Result<(Vec<String>, Vec<ResultRow>)> {
    let response: SelectResponse =
        serde_json::from_str(json).map_err(|e| StoreClientError::Parse {
            reason: format!("Failed to parse SELECT response: {e}"),
        })?;
    let rows = response
        .results
        .bindings
        .into_iter()
        .map(|values| ResultRow { values })
        .collect();
    Ok((response.head.vars, rows))
}

/// A lazy, forward-only, non-restartable SELECT row stream bound to
/// server-side pagination.
///
/// The first page is fetched when the stream is created; consuming rows may
/// issue further backend reads when a page fills up and empties. The stream
/// borrows the connection and the transaction handle, so the transaction
/// must outlive consumption.
pub struct SelectResults<'a> {
    conn: &'a StoreConnection,
    request: QueryRequest,
    tx: Option<&'a Transaction>,
    page: Page,
    vars: Vec<String>,
    buffer: VecDeque<ResultRow>,
    last_page_full: bool,
}

impl<'a> SelectResults<'a> {
    pub(crate) fn new(
        conn: &'a StoreConnection,
        request: QueryRequest,
        tx: Option<&'a Transaction>,
        page: Page,
        first_page_body: &str,
    ) -> Result<Self> {
        let (vars, rows) = parse_select_page(first_page_body)?;
        let last_page_full = rows.len() as u64 >= page.length;
        Ok(Self {
            conn,
            request,
            tx,
            page,
            vars,
            buffer: rows.into(),
            last_page_full,
        })
    }

    /// Variable names from the result head
    pub fn variables(&self) -> &[String] {
        &self.vars
    }

    /// Yield the next row, fetching the next page through the connection
    /// when the buffer is exhausted and the previous page was full.
    pub async fn next_row(&mut self) -> Result<Option<ResultRow>> {
        if let Some(row) = self.buffer.pop_front() {
            return Ok(Some(row));
        }
        if !self.last_page_full {
            return Ok(None);
        }

        self.page.start += self.page.length;
        let body = self
            .conn
            .backend_select(&self.request, self.page, self.tx)
            .await?;
        let (_, rows) = parse_select_page(&body)?;
        self.last_page_full = rows.len() as u64 >= self.page.length;
        self.buffer = rows.into();
        Ok(self.buffer.pop_front())
    }

    /// Drain the remaining rows into a vector
    pub async fn collect_rows(mut self) -> Result<Vec<ResultRow>> {
        let mut rows = Vec::with_capacity(self.buffer.len());
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// RDF lines produced by a graph query, yielded lazily from one response
/// body.
pub struct GraphResults {
    body: String,
}

impl GraphResults {
    pub(crate) fn new(body: String) -> Self {
        Self { body }
    }

    /// Trimmed, non-empty RDF lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines().map(str::to_string).collect()
    }

    /// Subject term of each yielded line, in order
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.lines().filter_map(crate::rdf::extract_subject)
    }

    /// Quoted literal of each yielded line that has one, in order
    pub fn quoted_literals(&self) -> impl Iterator<Item = &str> {
        self.lines().filter_map(crate::rdf::extract_quoted_string)
    }
}
