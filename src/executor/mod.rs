//! Banking tool executor
//!
//! The external banking service is reached through a single
//! "invoke tool by name" call. Only `get_transactions` is used here.

use crate::error::AgentError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub user_id: String,
    pub tool: String,
    pub input: Value,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error: Option<String>,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Invokes a named tool on the banking service.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResponse>;
}

/// HTTP-backed executor with a pooled client. Request deadlines belong to
/// the caller; the client only bounds connection setup.
#[derive(Clone)]
pub struct HttpToolExecutor {
    client: Client,
    base_url: String,
}

impl HttpToolExecutor {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ToolExecutor for HttpToolExecutor {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResponse> {
        let url = format!("{}/tools/{}", self.base_url, request.tool);
        debug!(tool = %request.tool, request_id = %request.request_id, "Calling banking tool");

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AgentError::Upstream(format!("banking request failed for {}: {}", request.tool, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Upstream(format!(
                "banking API returned {} for {}: {}",
                status, request.tool, body
            )));
        }

        response
            .json::<ExecuteResponse>()
            .await
            .map_err(|e| AgentError::Upstream(format!("invalid JSON response: {}", e)))
    }
}
