//! Query submission: SELECT, graph, ASK, UPDATE, and statement-existence
//! checks.

use crate::{
    StoreConnection,
    backend::Transaction,
    error::Result,
    query::{Page, QueryRequest, SparqlQuery},
    results::{GraphResults, SelectResults},
    term::Term,
};

impl StoreConnection {
    pub(crate) async fn build_request(&self, query: &SparqlQuery) -> Result<QueryRequest> {
        let defaults = self.query_defaults().await;
        QueryRequest::build(query, &defaults)
    }

    /// Execute a SELECT query, returning a lazy row stream bound to
    /// server-side pagination.
    ///
    /// The stream is forward-only and non-restartable; consuming it may
    /// issue further remote reads. A page length of zero is clamped to one.
    pub async fn select<'a>(
        &'a self,
        query: &SparqlQuery,
        page: Page,
        tx: Option<&'a Transaction>,
    ) -> Result<SelectResults<'a>> {
        let mut page = page;
        if page.length == 0 {
            tracing::warn!("SELECT page length of zero clamped to one");
            page.length = 1;
        }

        let request = self.build_request(query).await?;
        let body = self.backend_select(&request, page, tx).await?;
        SelectResults::new(self, request, tx, page, &body)
    }

    /// Execute a graph-construction query, returning lazily-yielded RDF
    /// lines from a single remote call.
    pub async fn graph(
        &self,
        query: &SparqlQuery,
        tx: Option<&Transaction>,
    ) -> Result<GraphResults> {
        let request = self.build_request(query).await?;
        let body = self.backend_graph(&request, tx).await?;
        Ok(GraphResults::new(body))
    }

    /// Execute a boolean (ASK) query
    pub async fn ask(&self, query: &SparqlQuery, tx: Option<&Transaction>) -> Result<bool> {
        let request = self.build_request(query).await?;
        self.backend_ask(&request, tx).await
    }

    /// Execute a SPARQL UPDATE. Success is signalled only by the absence of
    /// an error.
    pub async fn update(&self, query: &SparqlQuery, tx: Option<&Transaction>) -> Result<()> {
        let request = self.build_request(query).await?;
        self.backend_update(&request, tx).await
    }

    /// Check whether a statement pattern exists, optionally scoped to named
    /// graphs. `None` leaves the corresponding position as a wildcard.
    pub async fn has_statement(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        contexts: &[String],
        tx: Option<&Transaction>,
    ) -> Result<bool> {
        let mut text = String::from("ASK WHERE { ");
        for context in contexts {
            text.push_str(&format!("GRAPH <{context}> {{ ?s ?p ?o . }} "));
        }
        if contexts.is_empty() {
            text.push_str("?s ?p ?o . ");
        }
        text.push('}');

        let mut query = SparqlQuery::new(text);
        if let Some(subject) = subject {
            query = query.with_binding("s", subject.clone());
        }
        if let Some(predicate) = predicate {
            query = query.with_binding("p", predicate.clone());
        }
        if let Some(object) = object {
            query = query.with_binding("o", Term::literal(object.to_string()));
        }

        self.ask(&query, tx).await
    }
}
