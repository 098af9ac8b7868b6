//! Payroll workflow tools

use super::Tool;
use crate::directory::EmployeeDirectory;
use crate::models::{ToolInput, ToolOutput};
use crate::payroll::{CallContext, PayrollService};
use crate::Result;
use serde_json::json;
use std::sync::Arc;

pub struct CountEmployeesTool {
    directory: Arc<dyn EmployeeDirectory>,
}

impl CountEmployeesTool {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl Tool for CountEmployeesTool {
    fn name(&self) -> &'static str {
        "count_employees"
    }

    fn description(&self) -> &'static str {
        "Number of employees in the directory"
    }

    async fn execute(&self, _ctx: &CallContext, _input: &ToolInput) -> Result<ToolOutput> {
        let employees = self.directory.list().await?;
        Ok(ToolOutput::ok(json!({ "employee_count": employees.len() })))
    }
}

/// Lists recipients with no payroll payment inside the window.
pub struct PayrollCheckTool {
    payroll: Arc<PayrollService>,
}

impl PayrollCheckTool {
    pub fn new(payroll: Arc<PayrollService>) -> Self {
        Self { payroll }
    }
}

#[async_trait::async_trait]
impl Tool for PayrollCheckTool {
    fn name(&self) -> &'static str {
        "payroll_check"
    }

    fn description(&self) -> &'static str {
        "Recipients who have not received a payroll payment in the current window"
    }

    async fn execute(&self, ctx: &CallContext, _input: &ToolInput) -> Result<ToolOutput> {
        let unpaid = self.payroll.unpaid(ctx).await?;
        Ok(ToolOutput::ok(json!({ "unpaid": unpaid })))
    }
}

/// Builds (never sends) payment requests for everyone still unpaid.
pub struct FulfillRemainingPayrollTool {
    payroll: Arc<PayrollService>,
}

impl FulfillRemainingPayrollTool {
    pub fn new(payroll: Arc<PayrollService>) -> Self {
        Self { payroll }
    }
}

#[async_trait::async_trait]
impl Tool for FulfillRemainingPayrollTool {
    fn name(&self) -> &'static str {
        "fulfill_remaining_payroll"
    }

    fn description(&self) -> &'static str {
        "Prepare payment requests for unpaid employees; each still needs confirmation"
    }

    async fn execute(&self, ctx: &CallContext, _input: &ToolInput) -> Result<ToolOutput> {
        let requests = self.payroll.remaining_payroll(ctx).await?;
        Ok(ToolOutput::ok(json!({ "payment_requests": requests })))
    }
}
