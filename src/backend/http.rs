use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use super::{StoreBackend, Transaction};
use crate::{
    config::ConnectionConfig,
    error::{Result, StoreClientError},
    query::{ConstrainingQuery, Page, QueryRequest},
};

/// HTTP backend speaking the remote store's SPARQL/graph-management REST
/// protocol.
///
/// SPARQL text travels as the request body; ruleset names, the constraining
/// query, the inference flag, bindings, pagination and the transaction id
/// travel as query parameters.
pub struct HttpBackend {
    client: Client,
    config: ConnectionConfig,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            // Connection pooling: keep up to 10 idle connections per host
            .pool_max_idle_per_host(10)
            // Close idle connections after 30 seconds
            .pool_idle_timeout(Duration::from_secs(30))
            // TCP keepalive to detect dead connections
            .tcp_keepalive(Duration::from_secs(60))
            // Timeout for establishing new connections
            .connect_timeout(Duration::from_secs(10))
            // Default request timeout (overridden per-request)
            .timeout(Duration::from_millis(config.timeouts.query_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build request with optional authentication
    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => builder.basic_auth(user, Some(pass)),
            _ => builder,
        }
    }

    /// Query parameters carrying everything the request attaches besides
    /// the SPARQL text itself.
    fn request_params(request: &QueryRequest, tx: Option<&Transaction>) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(ruleset) = request.ruleset() {
            for name in ruleset.names() {
                params.push(("ruleset".to_string(), name.clone()));
            }
        }
        match request.constraining_query() {
            Some(ConstrainingQuery::Text(text)) => {
                params.push(("qtext".to_string(), text.clone()));
            }
            Some(ConstrainingQuery::Structured(query)) => {
                params.push(("structuredQuery".to_string(), query.clone()));
            }
            None => {}
        }
        params.push((
            "default-rulesets".to_string(),
            if request.include_inferred() {
                "include".to_string()
            } else {
                "exclude".to_string()
            },
        ));
        for binding in request.bindings() {
            params.push((format!("bind:{}", binding.name), binding.value.clone()));
        }
        if let Some(tx) = tx {
            params.push(("txid".to_string(), tx.id().to_string()));
        }

        params
    }

    async fn error_response(response: Response) -> StoreClientError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        StoreClientError::Backend { status, message }
    }
}

#[async_trait]
impl StoreBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.config.sparql_endpoint();

        let response = self
            .auth(self.client.get(&url))
            .query(&[("query", "ASK WHERE {}")])
            .header("Accept", "application/sparql-results+json")
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    async fn execute_select(
        &self,
        request: &QueryRequest,
        page: Page,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<String> {
        let url = self.config.sparql_endpoint();
        let mut params = Self::request_params(request, tx);
        params.push(("start".to_string(), page.start.to_string()));
        params.push(("pageLength".to_string(), page.length.to_string()));

        let response = self
            .auth(self.client.post(&url))
            .query(&params)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .timeout(timeout + Duration::from_secs(5))
            .body(request.text().to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn execute_graph(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<String> {
        let url = self.config.sparql_endpoint();
        let params = Self::request_params(request, tx);

        let response = self
            .auth(self.client.post(&url))
            .query(&params)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/n-quads")
            .timeout(timeout + Duration::from_secs(5))
            .body(request.text().to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn execute_ask(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<bool> {
        let url = self.config.sparql_endpoint();
        let params = Self::request_params(request, tx);

        let response = self
            .auth(self.client.post(&url))
            .query(&params)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .timeout(timeout + Duration::from_secs(5))
            .body(request.text().to_string())
            .send()
            .await?;

        if response.status().is_success() {
            let body = response.text().await?;
            parse_ask_json(&body)
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn execute_update(
        &self,
        request: &QueryRequest,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()> {
        let url = self.config.sparql_endpoint();
        let params = Self::request_params(request, tx);

        let response = self
            .auth(self.client.post(&url))
            .query(&params)
            .header("Content-Type", "application/sparql-update")
            .timeout(timeout + Duration::from_secs(5))
            .body(request.text().to_string())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn merge_whole_document(
        &self,
        content: &[u8],
        mime_type: &str,
        timeout: Duration,
    ) -> Result<()> {
        let url = self.config.graph_endpoint();

        let response = self
            .auth(self.client.post(&url))
            .header("Content-Type", mime_type.to_string())
            .timeout(timeout + Duration::from_secs(5))
            .body(content.to_vec())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn merge_into_graph(
        &self,
        graph: Option<&str>,
        content: &[u8],
        mime_type: &str,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()> {
        let url = self.config.graph_endpoint();
        let mut params: Vec<(String, String)> = Vec::new();
        match graph {
            Some(graph) => params.push(("graph".to_string(), graph.to_string())),
            None => params.push(("default".to_string(), String::new())),
        }
        if let Some(tx) = tx {
            params.push(("txid".to_string(), tx.id().to_string()));
        }

        let response = self
            .auth(self.client.post(&url))
            .query(&params)
            .header("Content-Type", mime_type.to_string())
            .timeout(timeout + Duration::from_secs(5))
            .body(content.to_vec())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn delete_graph(
        &self,
        graph: &str,
        tx: Option<&Transaction>,
        timeout: Duration,
    ) -> Result<()> {
        let url = self.config.graph_endpoint();
        let mut params = vec![("graph".to_string(), graph.to_string())];
        if let Some(tx) = tx {
            params.push(("txid".to_string(), tx.id().to_string()));
        }

        let response = self
            .auth(self.client.delete(&url))
            .query(&params)
            .timeout(timeout + Duration::from_secs(5))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn delete_all_graphs(&self, timeout: Duration) -> Result<()> {
        let url = self.config.graph_endpoint();

        let response = self
            .auth(self.client.delete(&url))
            .timeout(timeout + Duration::from_secs(5))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }

    async fn begin_transaction(&self) -> Result<Transaction> {
        let url = self.config.transaction_endpoint();

        let response = self
            .auth(self.client.post(&url))
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_response(response).await);
        }

        // The transaction id comes back in the Location header:
        // /v1/transactions/{txid}
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| StoreClientError::Parse {
                reason: "transaction response is missing a Location header".to_string(),
            })?;
        let id = location
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreClientError::Parse {
                reason: format!("cannot extract transaction id from location '{location}'"),
            })?;

        Ok(Transaction::from_id(id))
    }

    async fn commit_transaction(&self, tx: &Transaction) -> Result<()> {
        self.finish_transaction(tx, "commit").await
    }

    async fn rollback_transaction(&self, tx: &Transaction) -> Result<()> {
        self.finish_transaction(tx, "rollback").await
    }
}

impl HttpBackend {
    async fn finish_transaction(&self, tx: &Transaction, result: &str) -> Result<()> {
        let url = format!("{}/{}", self.config.transaction_endpoint(), tx.id());

        let response = self
            .auth(self.client.post(&url))
            .query(&[("result", result)])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_response(response).await)
        }
    }
}

#[derive(Deserialize)]
struct SparqlAskResponse {
    boolean: bool,
}

fn parse_ask_json(json: &str) -> Result<bool> {
    let response: SparqlAskResponse =
        serde_json::from_str(json).map_err(|e| StoreClientError::Parse {
            reason: format!("Failed to parse ASK response: {e}"),
        })?;

    Ok(response.boolean)
}
