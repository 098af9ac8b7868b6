//! SQLite-backed employee directory

use super::EmployeeDirectory;
use crate::error::AgentError;
use crate::models::{ensure_valid_id, Employee, EmployeeDraft};
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      first_name TEXT NOT NULL,
      last_name TEXT NOT NULL,
      recipient TEXT UNIQUE NOT NULL,
      wage REAL NOT NULL DEFAULT 0,
      department TEXT NOT NULL DEFAULT ''
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_employees_recipient ON employees(recipient)",
    "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department)",
];

const SELECT_COLUMNS: &str = "SELECT id, first_name, last_name, recipient, wage, department FROM employees";

pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    /// Opens (creating if needed) the database file and ensures the schema.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .max_lifetime(Duration::from_secs(5 * 60))
            .connect_with(options)
            .await
            .map_err(|e| AgentError::Database(format!("error opening database {}: {}", path, e)))?;

        let directory = Self { pool };
        directory.ensure_schema().await?;
        info!(path, "Employee directory backend: sqlite");
        Ok(directory)
    }

    /// Private in-memory database; a single long-lived connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let directory = Self { pool };
        directory.ensure_schema().await?;
        Ok(directory)
    }

    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AgentError::Database(format!("error creating employees table: {}", e)))?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn employee_from_row(row: &SqliteRow) -> Result<Employee> {
    Ok(Employee {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        recipient: row.try_get("recipient")?,
        wage: row.try_get("wage")?,
        department: row.try_get("department")?,
    })
}

fn map_write_error(error: sqlx::Error, recipient: &str) -> AgentError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AgentError::InvalidInput(format!("recipient {} already exists", recipient))
        }
        _ => AgentError::Database(error.to_string()),
    }
}

#[async_trait::async_trait]
impl EmployeeDirectory for SqliteDirectory {
    async fn list(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(employee_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Employee> {
        let id = ensure_valid_id(id)?;
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AgentError::NotFound("employee".to_string()))?;
        employee_from_row(&row)
    }

    async fn create(&self, draft: EmployeeDraft) -> Result<Employee> {
        draft.validate()?;

        let result = sqlx::query(
            "INSERT INTO employees (first_name, last_name, recipient, wage, department) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.recipient)
        .bind(draft.wage)
        .bind(&draft.department)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &draft.recipient))?;

        Ok(draft.into_employee(result.last_insert_rowid()))
    }

    async fn update(&self, id: i64, draft: EmployeeDraft) -> Result<Employee> {
        let id = ensure_valid_id(id)?;
        draft.validate()?;

        let result = sqlx::query(
            "UPDATE employees SET first_name = ?, last_name = ?, recipient = ?, wage = ?, department = ? WHERE id = ?",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.recipient)
        .bind(draft.wage)
        .bind(&draft.department)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &draft.recipient))?;

        if result.rows_affected() == 0 {
            return Err(AgentError::NotFound("employee".to_string()));
        }

        Ok(draft.into_employee(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let id = ensure_valid_id(id)?;
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AgentError::NotFound("employee".to_string()));
        }
        Ok(())
    }

    async fn list_by_department(&self, department: &str) -> Result<Vec<Employee>> {
        let rows = sqlx::query(&format!("{} WHERE department = ? ORDER BY id", SELECT_COLUMNS))
            .bind(department)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(employee_from_row).collect()
    }

    async fn get_by_recipient(&self, recipient: &str) -> Result<Option<Employee>> {
        let row = sqlx::query(&format!("{} WHERE recipient = ?", SELECT_COLUMNS))
            .bind(recipient)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(employee_from_row).transpose()
    }
}
