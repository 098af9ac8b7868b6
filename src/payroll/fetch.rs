//! Recent-transaction fetch from the banking executor
//!
//! Either the whole list comes back or the call fails. Cancellation and the
//! deadline both abort without a partial result.

use crate::error::AgentError;
use crate::executor::{ExecuteRequest, ToolExecutor};
use crate::Result;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const GET_TRANSACTIONS_TOOL: &str = "get_transactions";

pub async fn fetch_transactions(
    executor: &dyn ToolExecutor,
    user_id: &str,
    request_id: &str,
    limit: u32,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Value>> {
    let request = ExecuteRequest {
        user_id: user_id.to_string(),
        tool: GET_TRANSACTIONS_TOOL.to_string(),
        input: json!({ "limit": limit }),
        request_id: request_id.to_string(),
    };

    let response = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            warn!(request_id, "Transaction fetch cancelled");
            return Err(AgentError::Cancelled("transaction fetch".to_string()));
        }
        outcome = tokio::time::timeout(timeout, executor.execute(request)) => match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(AgentError::Upstream(format!("failed to fetch transactions: {}", e)));
            }
            Err(_) => {
                return Err(AgentError::Upstream(format!(
                    "failed to fetch transactions: timed out after {}s",
                    timeout.as_secs()
                )));
            }
        },
    };

    if !response.success {
        return Err(AgentError::Upstream(format!(
            "transaction fetch failed: {}",
            response.error.unwrap_or_default()
        )));
    }

    let transactions = extract_transactions(response.data)?;
    debug!(request_id, count = transactions.len(), "Fetched transactions");
    Ok(transactions)
}

/// Pulls the `transactions` array out of the payload. The payload may also
/// arrive as a JSON document encoded in a string.
fn extract_transactions(data: Value) -> Result<Vec<Value>> {
    let data = match data {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| AgentError::Upstream(format!("transaction payload is not JSON: {}", e)))?,
        other => other,
    };

    match data {
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(items)) => Ok(items.into_iter().filter(Value::is_object).collect()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(AgentError::Upstream(
                "transaction payload has a non-array 'transactions' field".to_string(),
            )),
        },
        _ => Err(AgentError::Upstream(
            "transaction payload is not an object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecuteResponse;
    use std::sync::Mutex;

    struct StubExecutor {
        response: Mutex<Option<Result<ExecuteResponse>>>,
        delay: Duration,
        seen: Mutex<Vec<ExecuteRequest>>,
    }

    impl StubExecutor {
        fn new(response: Result<ExecuteResponse>, delay: Duration) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                delay,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ToolExecutor for StubExecutor {
        async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResponse> {
            self.seen.lock().unwrap().push(request);
            tokio::time::sleep(self.delay).await;
            self.response.lock().unwrap().take().unwrap()
        }
    }

    fn ok(data: Value) -> Result<ExecuteResponse> {
        Ok(ExecuteResponse {
            success: true,
            data,
            error: None,
        })
    }

    async fn run(stub: &StubExecutor, cancel: &CancellationToken) -> Result<Vec<Value>> {
        fetch_transactions(stub, "u1", "r1", 100, Duration::from_secs(1), cancel).await
    }

    #[tokio::test]
    async fn test_fetch_sends_limit_and_keeps_objects() {
        let stub = StubExecutor::new(
            ok(json!({"transactions": [{"note": "@a payroll"}, 5, {"note": "x"}]})),
            Duration::ZERO,
        );
        let txs = run(&stub, &CancellationToken::new()).await.unwrap();
        assert_eq!(txs.len(), 2);

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen[0].tool, "get_transactions");
        assert_eq!(seen[0].input, json!({"limit": 100}));
        assert_eq!(seen[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_string_encoded_payload() {
        let stub = StubExecutor::new(
            ok(Value::String(r#"{"transactions":[{"note":"@a payroll"}]}"#.to_string())),
            Duration::ZERO,
        );
        assert_eq!(run(&stub, &CancellationToken::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsuccessful_response_is_total_failure() {
        let stub = StubExecutor::new(
            Ok(ExecuteResponse {
                success: false,
                data: Value::Null,
                error: Some("token expired".to_string()),
            }),
            Duration::ZERO,
        );
        let err = run(&stub, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "transaction fetch failed: token expired");
    }

    #[tokio::test]
    async fn test_executor_error_is_wrapped() {
        let stub = StubExecutor::new(
            Err(AgentError::Upstream("connection refused".to_string())),
            Duration::ZERO,
        );
        let err = run(&stub, &CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to fetch transactions"));
    }

    #[tokio::test]
    async fn test_cancellation_aborts() {
        let stub = StubExecutor::new(ok(json!({"transactions": []})), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = run(&stub, &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_deadline_aborts() {
        let stub = StubExecutor::new(ok(json!({"transactions": []})), Duration::from_millis(200));
        let err = fetch_transactions(
            &stub,
            "u1",
            "r1",
            100,
            Duration::from_millis(20),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_payload_shapes() {
        assert!(extract_transactions(json!({})).unwrap().is_empty());
        assert!(extract_transactions(json!([1, 2])).is_err());
        assert!(extract_transactions(json!({"transactions": "nope"})).is_err());
    }
}
