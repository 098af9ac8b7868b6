//! Core data models shared across the directory, payroll and analytics layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::Result;

//
// ================= Employee =================
//

/// Employee record as stored in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Unique payee handle, conventionally `@name`
    pub recipient: String,
    pub wage: f64,
    pub department: String,
}

/// Employee fields without an id, as accepted by create/update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmployeeDraft {
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub wage: f64,
    #[serde(default)]
    pub department: String,
}

impl EmployeeDraft {
    pub fn validate(&self) -> Result<()> {
        let blank = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("recipient", &self.recipient),
            ("department", &self.department),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(AgentError::InvalidInput(format!("{} cannot be empty", field)));
        }

        if !self.wage.is_finite() || self.wage < 0.0 {
            return Err(AgentError::InvalidInput("wage cannot be negative".to_string()));
        }

        Ok(())
    }

    pub fn into_employee(self, id: i64) -> Employee {
        Employee {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            recipient: self.recipient,
            wage: self.wage,
            department: self.department,
        }
    }
}

/// Rejects ids below 1 before they reach the store.
pub fn ensure_valid_id(id: i64) -> Result<i64> {
    if id < 1 {
        return Err(AgentError::InvalidInput(format!(
            "employee id must be positive, got {}",
            id
        )));
    }
    Ok(id)
}

//
// ================= Transactions =================
//

/// A transaction after tolerant parsing of the raw ledger record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedTransaction {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub note: Option<String>,
}

impl NormalizedTransaction {
    /// The memo text; a missing note reads as empty.
    pub fn note(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }
}

//
// ================= Payroll =================
//

pub const PAYROLL_CURRENCY: &str = "USD";

/// A proposed transfer. Built for confirmation, never executed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub recipient: String,
    pub amount: f64,
    pub currency: String,
    pub note: String,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}
