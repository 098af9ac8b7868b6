//! Employee directory
//!
//! The payroll workflow only reads from the directory; the CRUD side backs
//! the employee management tools.

use crate::models::{Employee, EmployeeDraft};
use crate::Result;
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryDirectory;
pub use sqlite::SqliteDirectory;

/// Trait for employee persistence
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// All employees, ordered by id.
    async fn list(&self) -> Result<Vec<Employee>>;

    async fn get(&self, id: i64) -> Result<Employee>;

    async fn create(&self, draft: EmployeeDraft) -> Result<Employee>;

    async fn update(&self, id: i64, draft: EmployeeDraft) -> Result<Employee>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn list_by_department(&self, department: &str) -> Result<Vec<Employee>>;

    async fn get_by_recipient(&self, recipient: &str) -> Result<Option<Employee>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|e| e.recipient == recipient))
    }
}
