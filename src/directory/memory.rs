//! In-memory directory for tests and offline runs

use super::EmployeeDirectory;
use crate::error::AgentError;
use crate::models::{ensure_valid_id, Employee, EmployeeDraft};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemoryDirectory {
    employees: Arc<RwLock<BTreeMap<i64, Employee>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            employees: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Seeds the directory, assigning ids in iteration order.
    pub async fn with_employees<I>(drafts: I) -> Result<Self>
    where
        I: IntoIterator<Item = EmployeeDraft>,
    {
        let directory = Self::new();
        for draft in drafts {
            directory.create(draft).await?;
        }
        Ok(directory)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn recipient_taken(
    employees: &BTreeMap<i64, Employee>,
    recipient: &str,
    except: Option<i64>,
) -> bool {
    employees
        .values()
        .any(|e| e.recipient == recipient && Some(e.id) != except)
}

#[async_trait::async_trait]
impl EmployeeDirectory for InMemoryDirectory {
    async fn list(&self) -> Result<Vec<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Employee> {
        let id = ensure_valid_id(id)?;
        let employees = self.employees.read().await;
        employees
            .get(&id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound("employee".to_string()))
    }

    async fn create(&self, draft: EmployeeDraft) -> Result<Employee> {
        draft.validate()?;

        let mut employees = self.employees.write().await;
        if recipient_taken(&employees, &draft.recipient, None) {
            return Err(AgentError::InvalidInput(format!(
                "recipient {} already exists",
                draft.recipient
            )));
        }

        let id = {
            let mut next_id = self.next_id.write().await;
            let id = *next_id;
            *next_id += 1;
            id
        };

        let employee = draft.into_employee(id);
        employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: i64, draft: EmployeeDraft) -> Result<Employee> {
        let id = ensure_valid_id(id)?;
        draft.validate()?;

        let mut employees = self.employees.write().await;
        if !employees.contains_key(&id) {
            return Err(AgentError::NotFound("employee".to_string()));
        }
        if recipient_taken(&employees, &draft.recipient, Some(id)) {
            return Err(AgentError::InvalidInput(format!(
                "recipient {} already exists",
                draft.recipient
            )));
        }

        let employee = draft.into_employee(id);
        employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let id = ensure_valid_id(id)?;
        let mut employees = self.employees.write().await;
        employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AgentError::NotFound("employee".to_string()))
    }

    async fn list_by_department(&self, department: &str) -> Result<Vec<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees
            .values()
            .filter(|e| e.department == department)
            .cloned()
            .collect())
    }
}
