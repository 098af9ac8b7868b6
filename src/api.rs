//! REST API server for the payroll and cash-flow tools
//!
//! Every registered tool is reachable at `POST /api/tools/:name`; the
//! employee directory is also served as plain REST under `/api/employees`.
//! Errors always come back as `{ success: false, error }`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::EmployeeDirectory;
use crate::error::AgentError;
use crate::models::{ensure_valid_id, EmployeeDraft, ToolInput, ToolOutput};
use crate::payroll::CallContext;
use crate::tools::{ToolDescriptor, ToolRegistry};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Default, Deserialize)]
pub struct InvokeRequest {
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    #[serde(default)]
    pub input: Value,
}

/// Decodes a JSON body; an empty body reads as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> crate::Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AgentError::InvalidInput(format!("malformed request body: {}", e)))
}

/// =============================
/// Response Helpers
/// =============================

type ApiReply = (StatusCode, Json<Value>);

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AgentError::NotFound(_) | AgentError::ToolNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: AgentError) -> ApiReply {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(error = %err, "Request failed");
    }
    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
}

fn reply<T: Serialize>(status: StatusCode, result: crate::Result<T>) -> ApiReply {
    match result.and_then(|data| serde_json::to_value(data).map_err(AgentError::from)) {
        Ok(data) => (status, Json(data)),
        Err(e) => failure(e),
    }
}

fn parse_id(raw: &str) -> crate::Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AgentError::InvalidInput("invalid employee id".to_string()))
        .and_then(ensure_valid_id)
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<ToolRegistry>,
    pub directory: Arc<dyn EmployeeDirectory>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Tool Endpoints
/// =============================

async fn list_tools(State(state): State<ApiState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.registry.describe())
}

async fn invoke_tool(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<ToolOutput>) {
    let req: InvokeRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(tool = %name, error = %e, "Rejected tool request");
            return (StatusCode::BAD_REQUEST, Json(ToolOutput::failure(e.to_string())));
        }
    };

    let request_id = req
        .request_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let user_id = req.user_id.unwrap_or_default();

    info!(tool = %name, user_id = %user_id, request_id = %request_id, "Received tool request");

    let status = if state.registry.get(&name).is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    let ctx = CallContext {
        user_id,
        request_id,
        ..CallContext::default()
    };
    let input = ToolInput {
        tool_name: name,
        parameters: req.input,
    };

    // Client disconnects drop this future; the guard cancels upstream work.
    let _guard = ctx.cancel.clone().drop_guard();
    let output = state.registry.invoke(&ctx, &input).await;

    (status, Json(output))
}

/// =============================
/// Employee Endpoints
/// =============================

async fn list_employees(State(state): State<ApiState>) -> ApiReply {
    let result = state
        .directory
        .list()
        .await
        .map(|employees| json!({ "count": employees.len(), "employees": employees }));
    reply(StatusCode::OK, result)
}

async fn create_employee(State(state): State<ApiState>, body: Bytes) -> ApiReply {
    let draft: EmployeeDraft = match parse_body(&body) {
        Ok(draft) => draft,
        Err(e) => return failure(e),
    };

    let result = state.directory.create(draft).await;
    if let Ok(employee) = &result {
        info!(id = employee.id, recipient = %employee.recipient, "Employee created");
    }
    reply(StatusCode::CREATED, result)
}

async fn get_employee(State(state): State<ApiState>, Path(raw_id): Path<String>) -> ApiReply {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(e) => return failure(e),
    };
    reply(StatusCode::OK, state.directory.get(id).await)
}

async fn update_employee(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiReply {
    let parsed = parse_id(&raw_id).and_then(|id| Ok((id, parse_body::<EmployeeDraft>(&body)?)));
    let (id, draft) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return failure(e),
    };

    let result = state.directory.update(id, draft).await;
    if result.is_ok() {
        info!(id, "Employee updated");
    }
    reply(StatusCode::OK, result)
}

async fn delete_employee(State(state): State<ApiState>, Path(raw_id): Path<String>) -> ApiReply {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(e) => return failure(e),
    };

    let result = state.directory.delete(id).await;
    if result.is_ok() {
        info!(id, "Employee deleted");
    }
    reply(StatusCode::OK, result.map(|()| json!({ "deleted": true, "id": id })))
}

async fn employees_by_department(
    State(state): State<ApiState>,
    Path(department): Path<String>,
) -> ApiReply {
    if department.trim().is_empty() {
        return failure(AgentError::InvalidInput("department name required".to_string()));
    }

    let result = state.directory.list_by_department(&department).await.map(|employees| {
        json!({
            "count": employees.len(),
            "department": department,
            "employees": employees,
        })
    });
    reply(StatusCode::OK, result)
}

/// =============================
/// Router
/// =============================

pub fn create_router(registry: Arc<ToolRegistry>, directory: Arc<dyn EmployeeDirectory>) -> Router {
    let state = ApiState {
        registry,
        directory,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(invoke_tool))
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/api/employees/department/:department", get(employees_by_department))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    registry: Arc<ToolRegistry>,
    directory: Arc<dyn EmployeeDirectory>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(registry, directory);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fixture, LedgerExecutor};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn router() -> Router {
        let (directory, registry) = fixture(Arc::new(LedgerExecutor(json!({
            "transactions": [
                {"createdAt": "2024-06-14T08:00:00Z", "amount": 100, "note": "@a payroll"}
            ]
        }))))
        .await;
        create_router(Arc::new(registry), directory)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_lists_tools() {
        let response = router()
            .await
            .oneshot(Request::builder().uri("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let tools = body_json(response).await;
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert!(names.contains(&"payroll_check"));
        assert!(names.contains(&"analyze_cash_flow"));
    }

    #[tokio::test]
    async fn test_invokes_payroll_check() {
        let response = router()
            .await
            .oneshot(post_json(
                "/api/tools/payroll_check",
                json!({"user_id": "u-1", "request_id": "r-1", "input": {}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "data": {"unpaid": ["@b"]}})
        );
    }

    #[tokio::test]
    async fn test_tool_failure_is_structured() {
        let response = router()
            .await
            .oneshot(post_json("/api/tools/get_employee", json!({"input": {"id": 42}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "employee not found"})
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_404() {
        let response = router()
            .await
            .oneshot(post_json("/api/tools/transfer_funds", json!({"input": {}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("tool not found: transfer_funds"));
    }

    #[tokio::test]
    async fn test_tool_listing_includes_input_schema() {
        let response = router()
            .await
            .oneshot(request("GET", "/api/tools", None))
            .await
            .unwrap();
        let tools = body_json(response).await;
        let get_employee = tools
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == json!("get_employee"))
            .unwrap();
        assert_eq!(get_employee["input_schema"]["required"], json!(["id"]));
    }

    #[tokio::test]
    async fn test_malformed_tool_body_is_structured_400() {
        let response = router()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tools/count_employees")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid input: malformed request body"));
    }

    #[tokio::test]
    async fn test_empty_tool_body_means_empty_input() {
        let response = router()
            .await
            .oneshot(request("POST", "/api/tools/count_employees", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "data": {"employee_count": 2}})
        );
    }

    #[tokio::test]
    async fn test_rest_list_and_department() {
        let app = router().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/api/employees", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], json!(2));
        assert_eq!(body["employees"][0]["recipient"], json!("@a"));

        let response = app
            .oneshot(request("GET", "/api/employees/department/Ops", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["department"], json!("Ops"));
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["employees"][0]["recipient"], json!("@b"));
    }

    #[tokio::test]
    async fn test_rest_create_update_delete() {
        let app = router().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/employees",
                Some(json!({
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "recipient": "@ada",
                    "wage": 4200.0,
                    "department": "Research"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["recipient"], json!("@ada"));

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/employees/{}", id),
                Some(json!({
                    "first_name": "Ada",
                    "last_name": "King",
                    "recipient": "@ada",
                    "wage": 4500.0,
                    "department": "Research"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["lastName"], json!("King"));

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/api/employees/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"deleted": true, "id": id}));

        let response = app
            .oneshot(request("GET", &format!("/api/employees/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "employee not found"})
        );
    }

    #[tokio::test]
    async fn test_rest_rejects_bad_requests() {
        let app = router().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/api/employees/abc", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], json!("invalid input: invalid employee id"));

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/employees",
                Some(json!({"first_name": "A", "last_name": "B", "recipient": "@c", "wage": -1.0, "department": "D"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], json!("invalid input: wage cannot be negative"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/employees/1")
                    .body(Body::from("{\"first_name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], json!(false));

        let response = app
            .oneshot(request("DELETE", "/api/employees/77", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
