//! Payroll & Cash-Flow Agent
//!
//! Tools a conversational banking host can call:
//! - Payroll reconciliation: which employees have not been paid in the
//!   current window, and the payment requests that would settle them
//! - Cash-flow analytics: a daily OLS trend with forecasts, plus a
//!   segmenting projector that averages month-sized fits
//! - Employee directory management backed by SQLite
//!
//! PAYROLL:   FETCH → NORMALIZE → RECONCILE → BUILD REQUESTS
//! CASH FLOW: NORMALIZE → BUCKET BY DAY → FIT → REPORT

pub mod analytics;
pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod models;
pub mod payroll;
pub mod telemetry;
pub mod tools;

pub use error::{AgentError, Result};

// Re-export common types
pub use models::*;
