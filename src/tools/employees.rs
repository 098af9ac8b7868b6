//! Employee directory tools

use super::{object_schema, parse_params, Tool};
use crate::directory::EmployeeDirectory;
use crate::error::AgentError;
use crate::models::{ensure_valid_id, EmployeeDraft, ToolInput, ToolOutput};
use crate::payroll::CallContext;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct IdParams {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    id: i64,
    #[serde(flatten)]
    draft: EmployeeDraft,
}

#[derive(Debug, Deserialize)]
struct DepartmentParams {
    #[serde(default)]
    department: String,
}

const EMPLOYEE_FIELDS: [(&str, &str, &str); 5] = [
    ("first_name", "string", "Employee first name"),
    ("last_name", "string", "Employee last name"),
    ("recipient", "string", "Recipient handle, e.g. @ada"),
    ("wage", "number", "Wage per pay period (non-negative)"),
    ("department", "string", "Employee department"),
];

const ID_FIELD: (&str, &str, &str) = ("id", "integer", "Employee id");

fn id_schema() -> Value {
    object_schema(&[ID_FIELD], &["id"])
}

macro_rules! directory_tool {
    ($ty:ident) => {
        pub struct $ty {
            directory: Arc<dyn EmployeeDirectory>,
        }

        impl $ty {
            pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
                Self { directory }
            }
        }
    };
}

directory_tool!(CreateEmployeeTool);
directory_tool!(GetEmployeeTool);
directory_tool!(ListEmployeesTool);
directory_tool!(UpdateEmployeeTool);
directory_tool!(DeleteEmployeeTool);
directory_tool!(ListEmployeesByDepartmentTool);

#[async_trait::async_trait]
impl Tool for CreateEmployeeTool {
    fn name(&self) -> &'static str {
        "create_employee"
    }

    fn description(&self) -> &'static str {
        "Add an employee with first_name, last_name, recipient, wage and department"
    }

    fn input_schema(&self) -> Value {
        let required: Vec<&str> = EMPLOYEE_FIELDS.iter().map(|f| f.0).collect();
        object_schema(&EMPLOYEE_FIELDS, &required)
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let draft: EmployeeDraft = parse_params(input)?;
        let employee = self.directory.create(draft).await?;
        info!(id = employee.id, recipient = %employee.recipient, "Employee created");
        Ok(ToolOutput::ok(serde_json::to_value(employee)?))
    }
}

#[async_trait::async_trait]
impl Tool for GetEmployeeTool {
    fn name(&self) -> &'static str {
        "get_employee"
    }

    fn description(&self) -> &'static str {
        "Fetch one employee by id"
    }

    fn input_schema(&self) -> Value {
        id_schema()
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: IdParams = parse_params(input)?;
        let employee = self.directory.get(ensure_valid_id(params.id)?).await?;
        Ok(ToolOutput::ok(serde_json::to_value(employee)?))
    }
}

#[async_trait::async_trait]
impl Tool for ListEmployeesTool {
    fn name(&self) -> &'static str {
        "list_employees"
    }

    fn description(&self) -> &'static str {
        "List every employee in the directory"
    }

    async fn execute(&self, _ctx: &CallContext, _input: &ToolInput) -> Result<ToolOutput> {
        let employees = self.directory.list().await?;
        Ok(ToolOutput::ok(json!({
            "count": employees.len(),
            "employees": employees,
        })))
    }
}

#[async_trait::async_trait]
impl Tool for UpdateEmployeeTool {
    fn name(&self) -> &'static str {
        "update_employee"
    }

    fn description(&self) -> &'static str {
        "Replace every field of an existing employee"
    }

    fn input_schema(&self) -> Value {
        let mut fields = vec![ID_FIELD];
        fields.extend(EMPLOYEE_FIELDS);
        let required: Vec<&str> = fields.iter().map(|f| f.0).collect();
        object_schema(&fields, &required)
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: UpdateParams = parse_params(input)?;
        let id = ensure_valid_id(params.id)?;
        let employee = self.directory.update(id, params.draft).await?;
        info!(id, "Employee updated");
        Ok(ToolOutput::ok(serde_json::to_value(employee)?))
    }
}

#[async_trait::async_trait]
impl Tool for DeleteEmployeeTool {
    fn name(&self) -> &'static str {
        "delete_employee"
    }

    fn description(&self) -> &'static str {
        "Remove an employee by id"
    }

    fn input_schema(&self) -> Value {
        id_schema()
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: IdParams = parse_params(input)?;
        let id = ensure_valid_id(params.id)?;
        self.directory.delete(id).await?;
        info!(id, "Employee deleted");
        Ok(ToolOutput::ok(json!({ "deleted": true, "id": id })))
    }
}

#[async_trait::async_trait]
impl Tool for ListEmployeesByDepartmentTool {
    fn name(&self) -> &'static str {
        "list_employees_by_department"
    }

    fn description(&self) -> &'static str {
        "List employees in one department"
    }

    fn input_schema(&self) -> Value {
        object_schema(&[("department", "string", "Department name")], &["department"])
    }

    async fn execute(&self, _ctx: &CallContext, input: &ToolInput) -> Result<ToolOutput> {
        let params: DepartmentParams = parse_params(input)?;
        if params.department.trim().is_empty() {
            return Err(AgentError::InvalidInput("department cannot be empty".to_string()));
        }
        let employees = self.directory.list_by_department(&params.department).await?;
        Ok(ToolOutput::ok(json!({
            "count": employees.len(),
            "department": params.department,
            "employees": employees,
        })))
    }
}
