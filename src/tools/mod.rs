//! Tool trait and registry
//!
//! Every capability the conversational host can call is a named tool taking
//! a JSON blob. Failures never escape `ToolRegistry::invoke`: they come back
//! as `{ success: false, error }`.

use crate::directory::EmployeeDirectory;
use crate::error::AgentError;
use crate::models::{ToolInput, ToolOutput};
use crate::payroll::{CallContext, PayrollService};
use crate::Result;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod cash_flow;
pub mod employees;
pub mod payroll;

pub use cash_flow::{AnalyzeCashFlowTool, ProjectCashFlowTool};
pub use employees::{
    CreateEmployeeTool, DeleteEmployeeTool, GetEmployeeTool, ListEmployeesByDepartmentTool,
    ListEmployeesTool, UpdateEmployeeTool,
};
pub use payroll::{CountEmployeesTool, FulfillRemainingPayrollTool, PayrollCheckTool};

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// JSON Schema of the `parameters` object. Parameterless by default.
    fn input_schema(&self) -> Value {
        object_schema(&[], &[])
    }

    async fn execute(&self, ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput>;
}

/// What a host needs to call a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn describe(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Runs a tool and folds any error into a structured failure result.
    pub async fn invoke(&self, ctx: &CallContext, input: &ToolInput) -> ToolOutput {
        let Some(tool) = self.get(&input.tool_name) else {
            warn!(tool = %input.tool_name, "Tool not registered");
            return ToolOutput::failure(AgentError::ToolNotFound(input.tool_name.clone()).to_string());
        };

        let start = Instant::now();
        debug!(
            tool = %input.tool_name,
            user_id = %ctx.user_id,
            request_id = %ctx.request_id,
            "Invoking tool"
        );

        let output = match tool.execute(ctx, input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %input.tool_name, error = %e, "Tool execution failed");
                ToolOutput::failure(e.to_string())
            }
        };

        info!(
            tool = %input.tool_name,
            request_id = %ctx.request_id,
            success = output.success,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool completed"
        );
        output
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes tool parameters; a missing/null payload reads as `{}`.
pub(crate) fn parse_params<T: DeserializeOwned>(input: &ToolInput) -> Result<T> {
    let params = match &input.parameters {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };

    if !params.is_object() {
        return Err(AgentError::InvalidInput(
            "tool input must be a JSON object".to_string(),
        ));
    }

    serde_json::from_value(params).map_err(|e| AgentError::InvalidInput(e.to_string()))
}

/// Builds an object schema from `(name, json type, description)` triples.
pub fn object_schema(properties: &[(&str, &str, &str)], required: &[&str]) -> Value {
    let properties: Map<String, Value> = properties
        .iter()
        .map(|(name, kind, description)| {
            (
                name.to_string(),
                json!({ "type": kind, "description": description }),
            )
        })
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Whole-number parameter that tolerates `3.0` and treats `null` as 0.
pub(crate) fn whole_number<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(de::Error::custom(format!("expected a whole number, got {}", n))),
            }
        }
        Some(other) => Err(de::Error::custom(format!("expected a whole number, got {}", other))),
    }
}

/// Registry with every tool wired to the given directory and payroll service.
pub fn create_default_registry(
    directory: Arc<dyn EmployeeDirectory>,
    payroll: Arc<PayrollService>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Payroll workflow
    registry.register(Arc::new(CountEmployeesTool::new(directory.clone())));
    registry.register(Arc::new(PayrollCheckTool::new(payroll.clone())));
    registry.register(Arc::new(FulfillRemainingPayrollTool::new(payroll)));

    // Cash-flow analytics
    registry.register(Arc::new(AnalyzeCashFlowTool));
    registry.register(Arc::new(ProjectCashFlowTool));

    // Employee directory
    registry.register(Arc::new(CreateEmployeeTool::new(directory.clone())));
    registry.register(Arc::new(GetEmployeeTool::new(directory.clone())));
    registry.register(Arc::new(ListEmployeesTool::new(directory.clone())));
    registry.register(Arc::new(UpdateEmployeeTool::new(directory.clone())));
    registry.register(Arc::new(DeleteEmployeeTool::new(directory.clone())));
    registry.register(Arc::new(ListEmployeesByDepartmentTool::new(directory)));

    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::PayrollSettings;
    use crate::directory::InMemoryDirectory;
    use crate::executor::{ExecuteRequest, ExecuteResponse, ToolExecutor};
    use crate::models::EmployeeDraft;
    use crate::payroll::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};

    pub struct LedgerExecutor(pub Value);

    #[async_trait::async_trait]
    impl ToolExecutor for LedgerExecutor {
        async fn execute(&self, _request: ExecuteRequest) -> Result<ExecuteResponse> {
            Ok(ExecuteResponse {
                success: true,
                data: self.0.clone(),
                error: None,
            })
        }
    }

    pub struct DownExecutor;

    #[async_trait::async_trait]
    impl ToolExecutor for DownExecutor {
        async fn execute(&self, _request: ExecuteRequest) -> Result<ExecuteResponse> {
            Ok(ExecuteResponse {
                success: false,
                data: Value::Null,
                error: Some("service unavailable".to_string()),
            })
        }
    }

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    pub fn draft(recipient: &str, wage: f64, department: &str) -> EmployeeDraft {
        EmployeeDraft {
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            recipient: recipient.to_string(),
            wage,
            department: department.to_string(),
        }
    }

    /// Two-person directory (`@a` 100, `@b` 200) and a registry over it
    /// backed by the given banking executor.
    pub async fn fixture(
        executor: Arc<dyn ToolExecutor>,
    ) -> (Arc<dyn EmployeeDirectory>, ToolRegistry) {
        let directory: Arc<dyn EmployeeDirectory> = Arc::new(
            InMemoryDirectory::with_employees(vec![draft("@a", 100.0, "Eng"), draft("@b", 200.0, "Ops")])
                .await
                .unwrap(),
        );
        let payroll = Arc::new(PayrollService::new(
            directory.clone(),
            executor,
            Arc::new(FixedClock(now())),
            PayrollSettings::default(),
        ));
        let registry = create_default_registry(directory.clone(), payroll);
        (directory, registry)
    }

    pub async fn registry_with(executor: Arc<dyn ToolExecutor>) -> ToolRegistry {
        fixture(executor).await.1
    }

    pub fn input(tool: &str, parameters: Value) -> ToolInput {
        ToolInput {
            tool_name: tool.to_string(),
            parameters,
        }
    }
}
