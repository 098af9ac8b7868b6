//! Payment request builder
//!
//! Requests are proposals only; moving money needs a separate confirmation.

use crate::models::{Employee, PaymentRequest, PAYROLL_CURRENCY};

pub fn payroll_note(recipient: &str) -> String {
    format!("{} payroll", recipient)
}

/// One request per employee whose recipient is unpaid, in directory order.
pub fn build_requests(unpaid: &[String], employees: &[Employee]) -> Vec<PaymentRequest> {
    employees
        .iter()
        .filter(|e| unpaid.iter().any(|r| r == &e.recipient))
        .map(|e| PaymentRequest {
            recipient: e.recipient.clone(),
            amount: e.wage,
            currency: PAYROLL_CURRENCY.to_string(),
            note: payroll_note(&e.recipient),
        })
        .collect()
}
