//! Payroll reconciler
//!
//! A transfer counts as payroll when its note is exactly two
//! whitespace-separated tokens, `<recipient> <word>`. Any other note shape is
//! ignored, even if it mentions a recipient.

use crate::models::{Employee, NormalizedTransaction};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Recipient marked as paid by a payroll note, if the note has that shape.
pub fn payroll_marker(note: &str) -> Option<&str> {
    let mut tokens = note.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(recipient), Some(_), None) => Some(recipient),
        _ => None,
    }
}

/// Keeps transactions strictly newer than `now - window`.
pub fn within_window<'a>(
    transactions: &'a [NormalizedTransaction],
    now: DateTime<Utc>,
    window: Duration,
) -> impl Iterator<Item = &'a NormalizedTransaction> {
    let cutoff = now - window;
    transactions.iter().filter(move |tx| tx.timestamp > cutoff)
}

/// Recipients of current employees with no payroll marker inside the window,
/// in directory order and without duplicates.
pub fn unpaid_recipients(
    transactions: &[NormalizedTransaction],
    employees: &[Employee],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<String> {
    let paid: HashSet<&str> = within_window(transactions, now, window)
        .filter_map(|tx| payroll_marker(tx.note()))
        .collect();

    debug!(
        transactions = transactions.len(),
        paid_markers = paid.len(),
        employees = employees.len(),
        "Reconciling payroll"
    );

    let mut seen = HashSet::new();
    employees
        .iter()
        .map(|e| e.recipient.as_str())
        .filter(|recipient| !paid.contains(recipient))
        .filter(|recipient| seen.insert(*recipient))
        .map(str::to_string)
        .collect()
}
