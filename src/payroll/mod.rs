//! Payroll reconciliation workflow
//!
//! FETCH (banking history) → NORMALIZE → RECONCILE against the directory →
//! BUILD payment requests. Nothing here sends money.

use crate::config::PayrollSettings;
use crate::directory::EmployeeDirectory;
use crate::executor::ToolExecutor;
use crate::ledger::{self, LedgerSchema};
use crate::models::{Employee, PaymentRequest};
use crate::Result;
use chrono::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod clock;
pub mod fetch;
pub mod reconcile;
pub mod requests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use fetch::fetch_transactions;
pub use reconcile::{payroll_marker, unpaid_recipients};
pub use requests::build_requests;

/// Caller identity and cancellation for one payroll call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub user_id: String,
    pub request_id: String,
    pub cancel: CancellationToken,
}

/// Outcome of one reconciliation pass over a single directory snapshot.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub employees: Vec<Employee>,
    pub unpaid: Vec<String>,
}

impl Reconciliation {
    pub fn payment_requests(&self) -> Vec<PaymentRequest> {
        build_requests(&self.unpaid, &self.employees)
    }
}

pub struct PayrollService {
    directory: Arc<dyn EmployeeDirectory>,
    executor: Arc<dyn ToolExecutor>,
    clock: Arc<dyn Clock>,
    settings: PayrollSettings,
}

impl PayrollService {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        executor: Arc<dyn ToolExecutor>,
        clock: Arc<dyn Clock>,
        settings: PayrollSettings,
    ) -> Self {
        Self {
            directory,
            executor,
            clock,
            settings,
        }
    }

    pub fn directory(&self) -> &Arc<dyn EmployeeDirectory> {
        &self.directory
    }

    /// Fetches recent history and determines who is still unpaid.
    pub async fn reconcile(&self, ctx: &CallContext) -> Result<Reconciliation> {
        let raw = fetch_transactions(
            self.executor.as_ref(),
            &ctx.user_id,
            &ctx.request_id,
            self.settings.fetch_limit,
            self.settings.upstream_timeout,
            &ctx.cancel,
        )
        .await?;

        let transactions = ledger::normalize_values(raw, LedgerSchema::Payroll);
        let employees = self.directory.list().await?;
        let now = self.clock.now();

        let unpaid = unpaid_recipients(
            &transactions,
            &employees,
            now,
            Duration::days(self.settings.window_days),
        );

        info!(
            request_id = %ctx.request_id,
            employees = employees.len(),
            unpaid = unpaid.len(),
            "Payroll reconciliation completed"
        );

        Ok(Reconciliation { employees, unpaid })
    }

    pub async fn unpaid(&self, ctx: &CallContext) -> Result<Vec<String>> {
        Ok(self.reconcile(ctx).await?.unpaid)
    }

    /// Payment requests for everyone still unpaid. Proposals only.
    pub async fn remaining_payroll(&self, ctx: &CallContext) -> Result<Vec<PaymentRequest>> {
        Ok(self.reconcile(ctx).await?.payment_requests())
    }
}
