//! Cash-flow analytics tools
//!
//! Both tools are pure over their input. A fit that cannot be produced is
//! reported in-band as `data: { error }` with `success: true`; only
//! malformed tool input fails the call.

use super::{object_schema, parse_params, whole_number, Tool};
use crate::analytics::{analyze_values, project_values};
use crate::error::AgentError;
use crate::models::{ToolInput, ToolOutput};
use crate::payroll::CallContext;
use crate::Result;
use serde::Deserialize;
use serde_json::Value;

/// Upper bound on requested forecast horizons.
pub const MAX_PREDICTION_DAYS: i64 = 3650;

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    transactions: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "whole_number")]
    days: i64,
}

#[derive(Debug, Deserialize)]
struct ProjectParams {
    transactions: Option<Vec<Value>>,
    #[serde(default)]
    weighted: bool,
    #[serde(default, deserialize_with = "whole_number")]
    days: i64,
}

fn cash_flow_schema(weighted: bool) -> Value {
    let mut properties = vec![
        ("transactions", "array", "Transactions with `date` and numeric `amount`"),
        ("days", "integer", "Days to forecast (default 7, at most 3650)"),
    ];
    if weighted {
        properties.push(("weighted", "boolean", "Weight recent 30-day segments more heavily"));
    }
    object_schema(&properties, &["transactions"])
}

fn require_transactions(transactions: Option<Vec<Value>>) -> Result<Vec<Value>> {
    transactions.ok_or_else(|| AgentError::InvalidInput("transactions is required".to_string()))
}

fn check_days(days: i64) -> Result<i64> {
    if days > MAX_PREDICTION_DAYS {
        return Err(AgentError::InvalidInput(format!(
            "days must be at most {}",
            MAX_PREDICTION_DAYS
        )));
    }
    Ok(days)
}

pub struct AnalyzeCashFlowTool;

#[async_trait::async_trait]
impl Tool for AnalyzeCashFlowTool {
    fn name(&self) -> &'static str {
        "analyze_cash_flow"
    }

    fn description(&self) -> &'static str {
        "Fit a linear trend to daily cash flow and forecast the next days"
    }

    fn input_schema(&self) -> Value {
        cash_flow_schema(false)
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: AnalyzeParams = parse_params(input)?;
        let transactions = require_transactions(params.transactions)?;
        let days = check_days(params.days)?;

        let outcome = analyze_values(transactions, days);
        Ok(ToolOutput::ok(serde_json::to_value(outcome)?))
    }
}

pub struct ProjectCashFlowTool;

#[async_trait::async_trait]
impl Tool for ProjectCashFlowTool {
    fn name(&self) -> &'static str {
        "project_cash_flow"
    }

    fn description(&self) -> &'static str {
        "Project cash flow from 30-day segment fits, optionally weighting recent segments"
    }

    fn input_schema(&self) -> Value {
        cash_flow_schema(true)
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: ProjectParams = parse_params(input)?;
        let transactions = require_transactions(params.transactions)?;
        let days = check_days(params.days)?;

        let outcome = project_values(transactions, params.weighted, days);
        Ok(ToolOutput::ok(serde_json::to_value(outcome)?))
    }
}
