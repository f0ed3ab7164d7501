use serde::{Deserialize, Serialize};

/// Configuration for a store connection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Base URL of the triple store service (e.g., "http://localhost:8000")
    pub url: String,

    /// Optional username for HTTP basic authentication
    pub username: Option<String>,

    /// Optional password for HTTP basic authentication
    pub password: Option<String>,

    /// Maximum number of connection retries on startup
    pub connect_max_retries: u32,

    /// Delay between connection retry attempts in milliseconds
    pub connect_retry_frequency_ms: u64,

    /// Timeout configuration for different operation types
    pub timeouts: TimeoutConfig,

    /// Maximum concurrent operations.
    /// Limits how many remote operations can run simultaneously on one
    /// connection, to avoid overwhelming the store with parallel requests.
    pub max_concurrent_operations: usize,
}

/// Timeout configuration for different remote operations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Timeout for SELECT/graph queries in milliseconds
    pub query_ms: u64,

    /// Timeout for SPARQL UPDATE operations in milliseconds
    pub update_ms: u64,

    /// Timeout for ASK queries in milliseconds
    pub ask_ms: u64,

    /// Timeout for document merge / graph delete operations in milliseconds
    pub ingest_ms: u64,
}

impl TimeoutConfig {
    /// Get query timeout as Duration
    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.query_ms)
    }

    /// Get update timeout as Duration
    pub fn update_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.update_ms)
    }

    /// Get ask timeout as Duration
    pub fn ask_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ask_ms)
    }

    /// Get ingest timeout as Duration
    pub fn ingest_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ingest_ms)
    }
}

impl ConnectionConfig {
    /// Get connect retry frequency as Duration
    pub fn connect_retry_frequency(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.connect_retry_frequency_ms)
    }

    /// SPARQL query/update endpoint URL
    pub fn sparql_endpoint(&self) -> String {
        format!("{}/v1/graphs/sparql", self.url.trim_end_matches('/'))
    }

    /// Graph management endpoint URL (merge/delete)
    pub fn graph_endpoint(&self) -> String {
        format!("{}/v1/graphs", self.url.trim_end_matches('/'))
    }

    /// Transaction lifecycle endpoint URL
    pub fn transaction_endpoint(&self) -> String {
        format!("{}/v1/transactions", self.url.trim_end_matches('/'))
    }
}
