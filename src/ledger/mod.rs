//! Transaction normalizer
//!
//! Turns loosely-shaped ledger records into `NormalizedTransaction`s.
//! Malformed records are dropped with a warning; nothing here aborts a batch.

use crate::models::NormalizedTransaction;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Which shape of record is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSchema {
    /// Banking history: RFC 3339 `createdAt`, amount not consulted.
    Payroll,
    /// Caller-supplied history: multi-format `date`, numeric `amount` required.
    CashFlow,
}

impl LedgerSchema {
    pub fn timestamp_field(self) -> &'static str {
        match self {
            LedgerSchema::Payroll => "createdAt",
            LedgerSchema::CashFlow => "date",
        }
    }
}

/// A record as it arrives: either an untyped JSON object or an
/// already-typed transaction that passes straight through.
#[derive(Debug, Clone)]
pub enum RawTransaction {
    Record(Map<String, Value>),
    Typed(NormalizedTransaction),
}

impl RawTransaction {
    /// Wraps a JSON value; non-objects are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(RawTransaction::Record(map)),
            _ => None,
        }
    }
}

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    MissingTimestamp { field: &'static str },
    BadTimestamp { field: &'static str, raw: String },
    BadAmount,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::MissingTimestamp { field } => {
                write!(f, "missing or non-string '{}'", field)
            }
            ParseWarning::BadTimestamp { field, raw } => {
                write!(f, "could not parse '{}' value '{}'", field, raw)
            }
            ParseWarning::BadAmount => write!(f, "invalid amount format"),
        }
    }
}

/// Normalizes a batch in input order, skipping (and logging) bad records.
pub fn normalize<I>(records: I, schema: LedgerSchema) -> Vec<NormalizedTransaction>
where
    I: IntoIterator<Item = RawTransaction>,
{
    let mut normalized = Vec::new();

    for (index, raw) in records.into_iter().enumerate() {
        match normalize_one(raw, schema) {
            Ok(tx) => normalized.push(tx),
            Err(warning) => {
                warn!(index, ?schema, "Skipping transaction: {}", warning);
            }
        }
    }

    debug!(kept = normalized.len(), ?schema, "Normalized transaction batch");
    normalized
}

/// Wraps every JSON object; anything else is dropped with a warning.
pub fn records_from_values(values: Vec<Value>) -> Vec<RawTransaction> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let raw = RawTransaction::from_value(value);
            if raw.is_none() {
                warn!(index, "Skipping transaction: record is not an object");
            }
            raw
        })
        .collect()
}

/// Convenience for JSON arrays straight off the wire.
pub fn normalize_values(values: Vec<Value>, schema: LedgerSchema) -> Vec<NormalizedTransaction> {
    normalize(records_from_values(values), schema)
}

pub fn normalize_one(
    raw: RawTransaction,
    schema: LedgerSchema,
) -> std::result::Result<NormalizedTransaction, ParseWarning> {
    let record = match raw {
        RawTransaction::Typed(tx) => return Ok(tx),
        RawTransaction::Record(record) => record,
    };

    let field = schema.timestamp_field();
    let text = record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ParseWarning::MissingTimestamp { field })?;

    let timestamp = match schema {
        LedgerSchema::Payroll => parse_rfc3339(text),
        LedgerSchema::CashFlow => parse_flexible_date(text),
    }
    .ok_or_else(|| ParseWarning::BadTimestamp {
        field,
        raw: text.to_string(),
    })?;

    let amount = match schema {
        LedgerSchema::CashFlow => record
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or(ParseWarning::BadAmount)?,
        LedgerSchema::Payroll => record.get("amount").and_then(lenient_amount).unwrap_or(0.0),
    };

    let note = match record.get("note") {
        Some(Value::String(note)) => Some(note.clone()),
        _ => None,
    };

    Ok(NormalizedTransaction {
        timestamp,
        amount,
        note,
    })
}

fn lenient_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Tries each accepted layout in order; the first that parses wins.
/// Zone-less layouts are read as UTC.
pub fn parse_flexible_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    for layout in ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt.and_utc());
        }
    }

    parse_rfc3339(text)
}
