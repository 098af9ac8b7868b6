//! Cash-flow analytics
//!
//! NORMALIZE → BUCKET BY DAY → FIT → REPORT, plus the optional segmenting
//! projector for month-over-month slope averaging.

pub mod daily;
pub mod ols;
pub mod projector;
pub mod report;

pub use daily::{aggregate, DayBucket};
pub use ols::{FitError, OlsModel};
pub use projector::{combine, project, segment_models, Segment, SEGMENT_SIZE};
pub use report::{
    analyze, analyze_values, project_cash_flow, project_values, CashFlowOutcome, CashFlowReport,
    ProjectionOutcome, ProjectionReport, Trend,
};

