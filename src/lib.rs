//! Client-side adapter exposing a generic triple-store connection (query,
//! update, add, remove, clear) over a remote semantic-graph database's
//! SPARQL/graph-management protocol.
//!
//! The [`StoreConnection`] facade owns the connection configuration and the
//! query defaults (ruleset, constraining query); every operation builds a
//! fresh wire request and performs a single remote call through a
//! [`StoreBackend`] implementation. Nothing is retried or cached locally.

mod backend;
mod bindings;
mod config;
pub mod error;
mod ingest;
mod metrics;
mod queries;
mod query;
pub mod rdf;
mod results;
mod term;

use std::{future::Future, sync::Arc, time::Instant};

pub use backend::{HttpBackend, StoreBackend, Transaction};
pub use bindings::{Binding, SparqlBindings};
pub use config::{ConnectionConfig, TimeoutConfig};
use error::{Result, StoreClientError};
pub use query::{ConstrainingQuery, Page, QueryDefaults, QueryRequest, Ruleset, SparqlQuery};
pub use rdf::RdfFormat;
pub use results::{BindingValue, GraphResults, ResultRow, SelectResults};
pub use term::{Statement, Term};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

#[cfg(test)]
mod tests;

/// A connection to a remote triple store.
///
/// Stateless per call except for the query-defaults snapshot, which is an
/// immutable value replaced whole on every setter call. Concurrent remote
/// operations are bounded by a per-connection semaphore.
pub struct StoreConnection {
    pub(crate) backend: Box<dyn StoreBackend>,
    pub(crate) config: ConnectionConfig,
    defaults: RwLock<Arc<QueryDefaults>>,
    /// Semaphore for limiting concurrent operations
    concurrency_limiter: Arc<Semaphore>,
}

impl StoreConnection {
    /// Connect over HTTP and verify reachability.
    ///
    /// Retries the initial health check up to `connect_max_retries` times;
    /// individual operations are never retried.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let backend = Box::new(HttpBackend::new(config.clone())?);
        let conn = Self::with_backend(backend, config.clone());
        conn.connect_with_retry().await?;
        Ok(conn)
    }

    /// Build a connection around an injected backend (mocks in tests,
    /// alternative transports). No health check is performed.
    pub fn with_backend(backend: Box<dyn StoreBackend>, config: ConnectionConfig) -> Self {
        let max_concurrent = config.max_concurrent_operations.max(1);
        if max_concurrent != config.max_concurrent_operations {
            tracing::warn!(
                configured = config.max_concurrent_operations,
                effective = max_concurrent,
                "Store connection max_concurrent_operations too low; clamped"
            );
        }
        let concurrency_limiter = Arc::new(Semaphore::new(max_concurrent));

        Self {
            backend,
            config,
            defaults: RwLock::new(Arc::new(QueryDefaults::default())),
            concurrency_limiter,
        }
    }

    /// Connect to the store with retry logic
    async fn connect_with_retry(&self) -> Result<()> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.backend.health_check().await {
                Ok(true) => {
                    tracing::info!(
                        backend = %self.backend.name(),
                        url = %self.config.url,
                        "Connected to triple store"
                    );
                    return Ok(());
                }
                Ok(false) => {
                    tracing::warn!(
                        backend = %self.backend.name(),
                        attempt = attempts,
                        "Triple store health check returned false"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        backend = %self.backend.name(),
                        attempt = attempts,
                        error = %e,
                        "Failed to connect to triple store"
                    );
                }
            }

            if attempts >= self.config.connect_max_retries {
                return Err(StoreClientError::ConnectionFailed { attempts });
            }

            tokio::time::sleep(self.config.connect_retry_frequency()).await;
        }
    }

    /// Backend name for logging/debugging
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // ========== Query defaults (ruleset, constraining query) ==========

    /// Current inference ruleset, absent by default
    pub async fn ruleset(&self) -> Option<Ruleset> {
        self.defaults.read().await.ruleset.clone()
    }

    /// Replace the inference ruleset attached to subsequent queries.
    /// `None` detaches it.
    pub async fn set_ruleset(&self, ruleset: Option<Ruleset>) {
        let mut guard = self.defaults.write().await;
        let mut next = QueryDefaults::clone(&guard);
        next.ruleset = ruleset;
        *guard = Arc::new(next);
    }

    /// Current constraining query, absent by default
    pub async fn constraining_query(&self) -> Option<ConstrainingQuery> {
        self.defaults.read().await.constraining_query.clone()
    }

    /// Replace the constraining query attached to subsequent queries.
    /// `None` detaches it.
    pub async fn set_constraining_query(&self, constraining_query: Option<ConstrainingQuery>) {
        let mut guard = self.defaults.write().await;
        let mut next = QueryDefaults::clone(&guard);
        next.constraining_query = constraining_query;
        *guard = Arc::new(next);
    }

    /// Snapshot of the current query defaults
    pub(crate) async fn query_defaults(&self) -> Arc<QueryDefaults> {
        self.defaults.read().await.clone()
    }

    // ========== Transaction lifecycle (owned by the backend) ==========

    /// Begin a remote transaction on the backend
    pub async fn begin_transaction(&self) -> Result<Transaction> {
        self.backend.begin_transaction().await
    }

    /// Commit a remote transaction
    pub async fn commit_transaction(&self, tx: &Transaction) -> Result<()> {
        self.backend.commit_transaction(tx).await
    }

    /// Roll back a remote transaction
    pub async fn rollback_transaction(&self, tx: &Transaction) -> Result<()> {
        self.backend.rollback_transaction(tx).await
    }

    // ========== Internal backend wrappers (with concurrency limiting) ==========

    /// Effective concurrency limit used by the internal semaphore.
    pub fn max_concurrent_operations(&self) -> usize {
        self.config.max_concurrent_operations.max(1)
    }

    fn record_permit_snapshot(&self, backend: &str) {
        metrics::record_backend_permit_snapshot(
            backend,
            self.max_concurrent_operations(),
            self.concurrency_limiter.available_permits(),
        );
    }

    async fn acquire_permit(&self, backend: &str, op: &str) -> Result<OwnedSemaphorePermit> {
        let wait_started = Instant::now();
        let permit = self
            .concurrency_limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreClientError::SemaphoreClosed)?;
        metrics::record_backend_permit_wait(backend, op, wait_started.elapsed());
        self.record_permit_snapshot(backend);
        Ok(permit)
    }

    /// Run one backend call under the concurrency limiter, recording
    /// operation metrics. The future must come from `self.backend` so it
    /// does not start until awaited here.
    async fn run_op<T, Fut>(&self, op: &'static str, sent_bytes: Option<usize>, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let backend = self.backend.name();
        let started = Instant::now();
        if let Some(bytes) = sent_bytes {
            metrics::record_backend_query_bytes_total(backend, op, bytes);
        }

        let permit = match self.acquire_permit(backend, op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = fut.await;
        drop(permit);
        self.record_permit_snapshot(backend);
        metrics::record_backend_operation(backend, op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Execute one SELECT page with concurrency limiting
    pub(crate) async fn backend_select(
        &self,
        request: &QueryRequest,
        page: Page,
        tx: Option<&Transaction>,
    ) -> Result<String> {
        let timeout = self.config.timeouts.query_timeout();
        let result = self
            .run_op(
                "select",
                Some(request.text().len()),
                self.backend.execute_select(request, page, tx, timeout),
            )
            .await;
        if let Ok(body) = &result {
            metrics::record_backend_result_bytes_total(self.backend.name(), "select", body.len());
        }
        result
    }

    /// Execute a graph query with concurrency limiting
    pub(crate) async fn backend_graph(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
    ) -> Result<String> {
        let timeout = self.config.timeouts.query_timeout();
        let result = self
            .run_op(
                "graph",
                Some(request.text().len()),
                self.backend.execute_graph(request, tx, timeout),
            )
            .await;
        if let Ok(body) = &result {
            metrics::record_backend_result_bytes_total(self.backend.name(), "graph", body.len());
        }
        result
    }

    /// Execute an ASK query with concurrency limiting
    pub(crate) async fn backend_ask(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
    ) -> Result<bool> {
        let timeout = self.config.timeouts.ask_timeout();
        self.run_op(
            "ask",
            Some(request.text().len()),
            self.backend.execute_ask(request, tx, timeout),
        )
        .await
    }

    /// Execute a SPARQL UPDATE with concurrency limiting
    pub(crate) async fn backend_update(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        let timeout = self.config.timeouts.update_timeout();
        self.run_op(
            "update",
            Some(request.text().len()),
            self.backend.execute_update(request, tx, timeout),
        )
        .await
    }

    /// Merge a quad-carrying document whole, with concurrency limiting
    pub(crate) async fn backend_merge_whole(&self, content: &[u8], mime_type: &str) -> Result<()> {
        let timeout = self.config.timeouts.ingest_timeout();
        self.run_op(
            "merge_whole",
            Some(content.len()),
            self.backend.merge_whole_document(content, mime_type, timeout),
        )
        .await
    }

    /// Merge document content into one graph, with concurrency limiting
    pub(crate) async fn backend_merge_graph(
        &self,
        graph: Option<&str>,
        content: &[u8],
        mime_type: &str,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        let timeout = self.config.timeouts.ingest_timeout();
        self.run_op(
            "merge_graph",
            Some(content.len()),
            self.backend
                .merge_into_graph(graph, content, mime_type, tx, timeout),
        )
        .await
    }

    /// Delete one named graph, with concurrency limiting
    pub(crate) async fn backend_delete_graph(
        &self,
        graph: &str,
        tx: Option<&Transaction>,
    ) -> Result<()> {
        let timeout = self.config.timeouts.ingest_timeout();
        self.run_op("delete_graph", None, self.backend.delete_graph(graph, tx, timeout))
            .await
    }

    /// Delete every graph, with concurrency limiting
    pub(crate) async fn backend_delete_all(&self) -> Result<()> {
        let timeout = self.config.timeouts.ingest_timeout();
        self.run_op("delete_all", None, self.backend.delete_all_graphs(timeout))
            .await
    }
}
