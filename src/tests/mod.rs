mod connection;

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    ConnectionConfig, Page, QueryRequest, StoreBackend, StoreConnection, TimeoutConfig,
    Transaction,
    error::{Result, StoreClientError},
};

/// One backend call observed by the recording backend, with everything the
/// connection attached to it.
#[derive(Debug, Clone)]
pub(super) enum RecordedCall {
    Select {
        request: QueryRequest,
        page: Page,
        txid: Option<String>,
    },
    Graph {
        request: QueryRequest,
        txid: Option<String>,
    },
    Ask {
        request: QueryRequest,
        txid: Option<String>,
    },
    Update {
        request: QueryRequest,
        txid: Option<String>,
    },
    MergeWhole {
        content: Vec<u8>,
        mime_type: String,
    },
    MergeGraph {
        graph: Option<String>,
        content: Vec<u8>,
        mime_type: String,
        txid: Option<String>,
    },
    DeleteGraph {
        graph: String,
        txid: Option<String>,
    },
    DeleteAll,
}

#[derive(Default)]
pub(super) struct BackendState {
    pub(super) calls: Mutex<Vec<RecordedCall>>,
    /// Scripted SELECT page bodies, consumed front to back
    pub(super) select_pages: Mutex<VecDeque<String>>,
    pub(super) ask_result: Mutex<bool>,
    pub(super) graph_body: Mutex<String>,
    /// Merge/delete calls targeting this graph fail with a 500
    pub(super) fail_graph: Mutex<Option<String>>,
    /// Delay injected into update calls, for concurrency tests
    pub(super) update_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub(super) max_in_flight: AtomicUsize,
}

impl BackendState {
    pub(super) fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_fail_graph(&self, graph: Option<&str>) -> Result<()> {
        let fail = self.fail_graph.lock().unwrap().clone();
        if fail.is_some() && fail.as_deref() == graph {
            return Err(StoreClientError::Backend {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

pub(super) struct RecordingBackend {
    state: Arc<BackendState>,
}

impl RecordingBackend {
    pub(super) fn new(state: Arc<BackendState>) -> Self {
        Self { state }
    }
}

const EMPTY_PAGE: &str = r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#;

#[async_trait]
impl StoreBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn execute_select(
        &self,
        request: &QueryRequest,
        page: Page,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<String> {
        self.state.record(RecordedCall::Select {
            request: request.clone(),
            page,
            txid: tx.map(|tx| tx.id().to_string()),
        });
        let body = self.state.select_pages.lock().unwrap().pop_front();
        Ok(body.unwrap_or_else(|| EMPTY_PAGE.to_string()))
    }

    async fn execute_graph(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<String> {
        self.state.record(RecordedCall::Graph {
            request: request.clone(),
            txid: tx.map(|tx| tx.id().to_string()),
        });
        Ok(self.state.graph_body.lock().unwrap().clone())
    }

    async fn execute_ask(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<bool> {
        self.state.record(RecordedCall::Ask {
            request: request.clone(),
            txid: tx.map(|tx| tx.id().to_string()),
        });
        Ok(*self.state.ask_result.lock().unwrap())
    }

    async fn execute_update(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<()> {
        self.state.record(RecordedCall::Update {
            request: request.clone(),
            txid: tx.map(|tx| tx.id().to_string()),
        });

        let in_flight = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        let delay = *self.state.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn merge_whole_document(
        &self,
        content: &[u8],
        mime_type: &str,
        _timeout: Duration,
    ) -> Result<()> {
        self.state.record(RecordedCall::MergeWhole {
            content: content.to_vec(),
            mime_type: mime_type.to_string(),
        });
        Ok(())
    }

    async fn merge_into_graph(
        &self,
        graph: Option<&str>,
        content: &[u8],
        mime_type: &str,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<()> {
        self.state.check_fail_graph(graph)?;
        self.state.record(RecordedCall::MergeGraph {
            graph: graph.map(str::to_string),
            content: content.to_vec(),
            mime_type: mime_type.to_string(),
            txid: tx.map(|tx| tx.id().to_string()),
        });
        Ok(())
    }

    async fn delete_graph(
        &self,
        graph: &str,
        tx: Option<&Transaction>,
        _timeout: Duration,
    ) -> Result<()> {
        self.state.check_fail_graph(Some(graph))?;
        self.state.record(RecordedCall::DeleteGraph {
            graph: graph.to_string(),
            txid: tx.map(|tx| tx.id().to_string()),
        });
        Ok(())
    }

    async fn delete_all_graphs(&self, _timeout: Duration) -> Result<()> {
        self.state.record(RecordedCall::DeleteAll);
        Ok(())
    }
}

pub(super) fn test_config(max_concurrent_operations: usize) -> ConnectionConfig {
    ConnectionConfig {
        url: "http://localhost:8000".to_string(),
        username: None,
        password: None,
        connect_max_retries: 1,
        connect_retry_frequency_ms: 10,
        timeouts: TimeoutConfig {
            query_ms: 1_000,
            update_ms: 1_000,
            ask_ms: 1_000,
            ingest_ms: 1_000,
        },
        max_concurrent_operations,
    }
}

pub(super) fn recording_connection() -> (StoreConnection, Arc<BackendState>) {
    recording_connection_with_limit(4)
}

pub(super) fn recording_connection_with_limit(
    max_concurrent_operations: usize,
) -> (StoreConnection, Arc<BackendState>) {
    let state = Arc::new(BackendState::default());
    let conn = StoreConnection::with_backend(
        Box::new(RecordingBackend::new(state.clone())),
        test_config(max_concurrent_operations),
    );
    (conn, state)
}

/// Build a SPARQL JSON results page binding `var` to the given IRI values
pub(super) fn select_page(var: &str, values: &[&str]) -> String {
    let bindings: Vec<serde_json::Value> = values
        .iter()
        .map(|value| serde_json::json!({ var: { "type": "uri", "value": value } }))
        .collect();
    serde_json::json!({
        "head": { "vars": [var] },
        "results": { "bindings": bindings }
    })
    .to_string()
}
