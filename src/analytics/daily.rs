//! Daily aggregation of normalized transactions

use crate::models::NormalizedTransaction;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One calendar day (UTC) of activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// 1 for the earliest observed date; gaps are preserved, not filled.
    pub day_number: i64,
    pub amount: f64,
    pub count: usize,
}

/// Buckets by UTC calendar date, sorted ascending.
pub fn aggregate(transactions: &[NormalizedTransaction]) -> Vec<DayBucket> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for tx in transactions {
        let entry = by_date.entry(tx.timestamp.date_naive()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let Some(min_date) = by_date.keys().next().copied() else {
        return Vec::new();
    };

    by_date
        .into_iter()
        .map(|(date, (amount, count))| DayBucket {
            date,
            day_number: (date - min_date).num_days() + 1,
            amount,
            count,
        })
        .collect()
}
