mod http;

use std::time::Duration;

use async_trait::async_trait;
pub use http::HttpBackend;

use crate::{
    error::{Result, StoreClientError},
    query::{Page, QueryRequest},
};

/// An opaque handle scoping operations to an active remote transaction.
///
/// The lifecycle (begin/commit/rollback) is owned by the backend; the
/// connection only forwards the handle. A caller must keep the transaction
/// open for the duration of any call it passes the handle to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: String,
}

impl Transaction {
    /// Wrap an externally obtained transaction id
    pub fn from_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Trait for triple store backends
///
/// Implementations provide the low-level protocol against a specific remote
/// store. Query methods receive a fully composed [`QueryRequest`]; graph
/// management methods receive raw document content plus its MIME type.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Backend name for logging/debugging
    fn name(&self) -> &'static str;

    /// Health check - verify the remote store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Execute a SPARQL SELECT for one pagination window
    ///
    /// Returns SPARQL results JSON as a string
    async fn execute_select(
        &self,
        request: &QueryRequest,
        page: Page,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<String>;

    /// Execute a SPARQL CONSTRUCT/DESCRIBE query
    ///
    /// Returns RDF lines (N-Quads)
    async fn execute_graph(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<String>;

    /// Execute a SPARQL ASK query
    async fn execute_ask(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<bool>;

    /// Execute a SPARQL UPDATE (INSERT/DELETE)
    async fn execute_update(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()>;

    /// Merge a quad-carrying document whole; graph assignments come from
    /// the document itself. Not transaction-scoped in the protocol.
    async fn merge_whole_document(
        &self,
        content: &[u8],
        mime_type: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Merge document content into one named graph (`None` targets the
    /// default/unnamed graph)
    async fn merge_into_graph(
        &self,
        graph: Option<&str>,
        content: &[u8],
        mime_type: &str,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()>;

    /// Delete one named graph
    async fn delete_graph(
        &self,
        graph: &str,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()>;

    /// Delete every graph in the store. Not transaction-scoped in the
    /// protocol.
    async fn delete_all_graphs(&self, timeout: Duration) -> Result<()>;

    /// Begin a remote transaction
    async fn begin_transaction(&self) -> Result<Transaction> {
        Err(StoreClientError::NotSupported {
            operation: "begin_transaction",
        })
    }

    /// Commit a remote transaction
    async fn commit_transaction(&self, _tx: &Transaction) -> Result<()> {
        Err(StoreClientError::NotSupported {
            operation: "commit_transaction",
        })
    }

    /// Roll back a remote transaction
    async fn rollback_transaction(&self, _tx: &Transaction) -> Result<()> {
        Err(StoreClientError::NotSupported {
            operation: "rollback_transaction",
        })
    }
}
