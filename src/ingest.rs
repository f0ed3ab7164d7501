//! Graph mutation routing: bulk document ingestion, statement-level
//! add/remove, and graph clearing.

use std::path::Path;

use crate::{
    StoreConnection,
    backend::Transaction,
    error::{Result, StoreClientError},
    query::{QueryDefaults, QueryRequest, SparqlQuery},
    rdf::RdfFormat,
    term::{Statement, Term},
};

impl StoreConnection {
    /// Bulk-add an RDF document.
    ///
    /// Quad-carrying formats are merged whole in a single call; the
    /// caller-supplied context list is ignored because the document's
    /// embedded graph assignments take precedence. Triple-only formats are
    /// merged once per supplied context (or once into the default graph
    /// when no context is given).
    ///
    /// The per-context loop is NOT atomic: a mid-loop failure aborts the
    /// remaining contexts and surfaces as
    /// [`StoreClientError::PartialMutation`] naming the failing graph and
    /// the number of completed merges. Wrap the call in a transaction if
    /// all-or-nothing behavior is required.
    pub async fn add_document(
        &self,
        content: &[u8],
        format: RdfFormat,
        contexts: &[String],
        tx: Option<&Transaction>,
    ) -> Result<()> {
        if format.carries_quads() {
            if !contexts.is_empty() {
                tracing::debug!(
                    format = ?format,
                    contexts = contexts.len(),
                    "Quad-carrying document merged whole; supplied contexts ignored"
                );
            }
            return self.backend_merge_whole(content, format.mime_type()).await;
        }

        if contexts.is_empty() {
            return self
                .backend_merge_graph(None, content, format.mime_type(), tx)
                .await;
        }

        let mut completed = 0;
        for context in contexts {
            self.backend_merge_graph(Some(context), content, format.mime_type(), tx)
                .await
                .map_err(|source| StoreClientError::PartialMutation {
                    graph: context.clone(),
                    completed,
                    source: Box::new(source),
                })?;
            completed += 1;
        }
        Ok(())
    }

    /// Bulk-add an RDF document from a file. Routing is identical to
    /// [`add_document`](Self::add_document).
    pub async fn add_file(
        &self,
        path: &Path,
        format: RdfFormat,
        contexts: &[String],
        tx: Option<&Transaction>,
    ) -> Result<()> {
        let content = tokio::fs::read(path).await?;
        self.add_document(&content, format, contexts, tx).await
    }

    /// Add one statement via `INSERT DATA`.
    ///
    /// All supplied contexts land in a single update request (one `GRAPH`
    /// clause per context), so the multi-graph add is atomic under the
    /// remote engine's update semantics. Without contexts the unscoped
    /// pattern targets the default graph.
    pub async fn add_statement(
        &self,
        statement: &Statement,
        base_iri: Option<&str>,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        self.statement_update("INSERT DATA", statement, base_iri, tx)
            .await
    }

    /// Remove one statement via `DELETE WHERE`, with the same multi-graph
    /// semantics as [`add_statement`](Self::add_statement).
    pub async fn remove_statement(
        &self,
        statement: &Statement,
        base_iri: Option<&str>,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        self.statement_update("DELETE WHERE", statement, base_iri, tx)
            .await
    }

    async fn statement_update(
        &self,
        keyword: &str,
        statement: &Statement,
        base_iri: Option<&str>,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        let mut text = format!("{keyword} {{ ");
        for context in &statement.contexts {
            text.push_str(&format!("GRAPH <{context}> {{ ?s ?p ?o . }} "));
        }
        if statement.contexts.is_empty() {
            text.push_str("?s ?p ?o . ");
        }
        text.push('}');

        let mut query = SparqlQuery::new(text)
            .with_binding("s", statement.subject.clone())
            .with_binding("p", statement.predicate.clone())
            // The object is bound in its annotated form so typed literals
            // keep their datatype on the wire.
            .with_binding("o", Term::literal(statement.object.to_string()));
        if let Some(base_iri) = base_iri {
            query = query.with_base_iri(base_iri);
        }

        // Statement-level updates never carry the connection's ruleset or
        // constraining query.
        let request = QueryRequest::build(&query, &QueryDefaults::default())?;
        self.backend_update(&request, tx).await
    }

    /// Delete a specific set of named graphs, one remote call per graph.
    ///
    /// Not atomic across the set: a failure aborts the remaining graphs and
    /// surfaces as [`StoreClientError::PartialMutation`].
    pub async fn clear(&self, contexts: &[String], tx: Option<&Transaction>) -> Result<()> {
        let mut completed = 0;
        for context in contexts {
            self.backend_delete_graph(context, tx)
                .await
                .map_err(|source| StoreClientError::PartialMutation {
                    graph: context.clone(),
                    completed,
                    source: Box::new(source),
                })?;
            completed += 1;
        }
        Ok(())
    }

    /// Delete every graph in the store with a single remote call, never
    /// iterated per graph.
    pub async fn clear_all(&self) -> Result<()> {
        self.backend_delete_all().await
    }
}
