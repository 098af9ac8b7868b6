//! Cash-flow report
//!
//! Fits one global model over the daily series and reports parameters,
//! trend, per-day residuals and forward predictions. Failures are returned
//! in-band as `{ "error": ... }`.

use super::daily::{aggregate, DayBucket};
use super::ols::OlsModel;
use super::projector::{segment_models, combine, Segment};
use crate::ledger::{normalize, records_from_values, LedgerSchema, RawTransaction};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub const DEFAULT_PREDICTION_DAYS: i64 = 7;
pub const TREND_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn classify(weight: f64) -> Self {
        if weight > TREND_THRESHOLD {
            Trend::Increasing
        } else if weight < -TREND_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub equation: String,
    pub weight: f64,
    pub bias: f64,
    pub r_squared: f64,
    pub mse: f64,
    pub rmse: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub trend: Trend,
    pub total_days: usize,
    pub total_amount: f64,
    pub total_transactions: usize,
    pub avg_amount_per_day: f64,
    pub avg_transactions_per_day: f64,
    pub min_daily_amount: f64,
    pub max_daily_amount: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub day: i64,
    pub date: NaiveDate,
    pub predicted_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    pub day: i64,
    pub date: NaiveDate,
    pub actual_amount: f64,
    pub predicted_amount: f64,
    pub residual: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowReport {
    pub model: ModelSummary,
    pub insights: Insights,
    pub predictions: Vec<Prediction>,
    pub historical_data: Vec<HistoricalPoint>,
}

/// Either a full report or an in-band error message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CashFlowOutcome {
    Report(Box<CashFlowReport>),
    Error { error: String },
}

impl CashFlowOutcome {
    fn error(message: impl Into<String>) -> Self {
        CashFlowOutcome::Error {
            error: message.into(),
        }
    }

    pub fn report(&self) -> Option<&CashFlowReport> {
        match self {
            CashFlowOutcome::Report(report) => Some(report.as_ref()),
            CashFlowOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CashFlowOutcome::Error { error } => Some(error.as_str()),
            CashFlowOutcome::Report(_) => None,
        }
    }
}

/// Rounds for display; `+ 0.0` folds a negative zero into zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale + 0.0
}

fn money(value: f64) -> f64 {
    round_to(value, 2)
}

/// Consecutive day numbers past the last observed one, with dates stepping
/// one calendar day at a time from the last observed date.
pub fn forecast(model: &OlsModel, last_day: i64, last_date: NaiveDate, days: i64) -> Vec<Prediction> {
    (1..=days)
        .map_while(|i| {
            let date = last_date.checked_add_days(Days::new(i as u64))?;
            let day = last_day + i;
            Some(Prediction {
                day,
                date,
                predicted_amount: money(model.predict(day as f64)),
            })
        })
        .collect()
}

pub fn analyze_values(transactions: Vec<Value>, days: i64) -> CashFlowOutcome {
    if transactions.is_empty() {
        return CashFlowOutcome::error("no transactions provided");
    }

    let raw = records_from_values(transactions);

    // Something was provided, just nothing usable.
    if raw.is_empty() {
        return CashFlowOutcome::error("no valid transactions after parsing");
    }
    analyze(raw, days)
}

pub fn analyze(transactions: Vec<RawTransaction>, days: i64) -> CashFlowOutcome {
    if transactions.is_empty() {
        return CashFlowOutcome::error("no transactions provided");
    }

    let days = if days <= 0 { DEFAULT_PREDICTION_DAYS } else { days };

    let normalized = normalize(transactions, LedgerSchema::CashFlow);
    if normalized.is_empty() {
        return CashFlowOutcome::error("no valid transactions after parsing");
    }

    let buckets = aggregate(&normalized);
    let xs: Vec<f64> = buckets.iter().map(|b| b.day_number as f64).collect();
    let ys: Vec<f64> = buckets.iter().map(|b| b.amount).collect();

    let model = match OlsModel::fit(&xs, &ys) {
        Ok(model) => model,
        Err(e) => return CashFlowOutcome::error(format!("failed to fit model: {}", e)),
    };

    let r_squared = model.r_squared(&xs, &ys);
    let mse = model.mse(&xs, &ys);
    let rmse = mse.sqrt();

    let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
        return CashFlowOutcome::error("no valid transactions after parsing");
    };

    let predictions = forecast(&model, last.day_number, last.date, days);
    let historical_data = buckets.iter().map(|b| historical_point(&model, b)).collect();
    let insights = summarize(&buckets, Trend::classify(model.weight), first.date, last.date);

    info!(
        buckets = buckets.len(),
        weight = model.weight,
        r_squared,
        trend = ?insights.trend,
        "Cash-flow analysis completed"
    );

    CashFlowOutcome::Report(Box::new(CashFlowReport {
        model: ModelSummary {
            equation: format!("y = {:.2} + {:.2}x", model.bias, model.weight),
            weight: money(model.weight),
            bias: money(model.bias),
            r_squared: round_to(r_squared, 4),
            mse: money(mse),
            rmse: money(rmse),
        },
        insights,
        predictions,
        historical_data,
    }))
}

fn historical_point(model: &OlsModel, bucket: &DayBucket) -> HistoricalPoint {
    let predicted = model.predict(bucket.day_number as f64);
    HistoricalPoint {
        day: bucket.day_number,
        date: bucket.date,
        actual_amount: money(bucket.amount),
        predicted_amount: money(predicted),
        residual: money(bucket.amount - predicted),
        transaction_count: bucket.count,
    }
}

fn summarize(buckets: &[DayBucket], trend: Trend, start: NaiveDate, end: NaiveDate) -> Insights {
    let total_days = buckets.len();
    let total_amount: f64 = buckets.iter().map(|b| b.amount).sum();
    let total_transactions: usize = buckets.iter().map(|b| b.count).sum();
    let min = buckets.iter().map(|b| b.amount).fold(f64::INFINITY, f64::min);
    let max = buckets.iter().map(|b| b.amount).fold(f64::NEG_INFINITY, f64::max);

    Insights {
        trend,
        total_days,
        total_amount: money(total_amount),
        total_transactions,
        avg_amount_per_day: money(total_amount / total_days as f64),
        avg_transactions_per_day: money(total_transactions as f64 / total_days as f64),
        min_daily_amount: money(min),
        max_daily_amount: money(max),
        date_range: DateRange { start, end },
    }
}

//
// ================= Segmented projection =================
//

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub weighted: bool,
    pub segments: Vec<Segment>,
    pub model: OlsModel,
    pub equation: String,
    pub trend: Trend,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProjectionOutcome {
    Report(Box<ProjectionReport>),
    Error { error: String },
}

/// `project_cash_flow` over raw JSON records; non-object entries are dropped.
pub fn project_values(transactions: Vec<Value>, weighted: bool, days: i64) -> ProjectionOutcome {
    let provided = transactions.len();
    let raw = records_from_values(transactions);

    if provided > 0 && raw.is_empty() {
        return ProjectionOutcome::Error {
            error: "no valid transactions after parsing".to_string(),
        };
    }
    project_cash_flow(raw, weighted, days)
}

/// Month-over-month slope averaging over the same daily series `analyze`
/// uses. Predictions extend from the last observed day.
pub fn project_cash_flow(transactions: Vec<RawTransaction>, weighted: bool, days: i64) -> ProjectionOutcome {
    let fail = |error: &str| ProjectionOutcome::Error {
        error: error.to_string(),
    };

    if transactions.is_empty() {
        return fail("no transactions provided");
    }
    let days = if days <= 0 { DEFAULT_PREDICTION_DAYS } else { days };

    let normalized = normalize(transactions, LedgerSchema::CashFlow);
    let buckets = aggregate(&normalized);
    let Some(last) = buckets.last() else {
        return fail("no valid transactions after parsing");
    };

    let segments = segment_models(&buckets);
    let models: Vec<OlsModel> = segments.iter().map(|s| s.model).collect();
    let model = match combine(&models, weighted) {
        Ok(model) => model,
        Err(e) => return fail(&format!("failed to fit model: {}", e)),
    };

    ProjectionOutcome::Report(Box::new(ProjectionReport {
        weighted,
        equation: format!("y = {:.2} + {:.2}x", model.bias, model.weight),
        trend: Trend::classify(model.weight),
        predictions: forecast(&model, last.day_number, last.date, days),
        segments,
        model,
    }))
}
