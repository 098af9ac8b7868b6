//! Segmenting projector
//!
//! Splits the daily series into windows of up to `SEGMENT_SIZE` buckets
//! (buckets, not calendar days), fits each window, and folds the surviving
//! fits into one projection model. Slopes may be recency-weighted; the
//! intercept is always a plain mean.

use super::daily::DayBucket;
use super::ols::{FitError, OlsModel};
use serde::Serialize;
use tracing::debug;

pub const SEGMENT_SIZE: usize = 30;

/// A fitted window and the day numbers it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub first_day: i64,
    pub last_day: i64,
    pub model: OlsModel,
}

/// Fits every window; windows that cannot be fitted are dropped.
pub fn segment_models(buckets: &[DayBucket]) -> Vec<Segment> {
    buckets
        .chunks(SEGMENT_SIZE)
        .filter_map(|window| {
            let xs: Vec<f64> = window.iter().map(|b| b.day_number as f64).collect();
            let ys: Vec<f64> = window.iter().map(|b| b.amount).collect();

            match OlsModel::fit(&xs, &ys) {
                Ok(model) => Some(Segment {
                    first_day: window.first()?.day_number,
                    last_day: window.last()?.day_number,
                    model,
                }),
                Err(e) => {
                    debug!(size = window.len(), error = %e, "Discarding segment");
                    None
                }
            }
        })
        .collect()
}

/// Folds chronological segment models into one. With `weighted`, segment
/// `i` of `k` contributes its slope with factor `(i + 1) / k`.
pub fn combine(models: &[OlsModel], weighted: bool) -> Result<OlsModel, FitError> {
    match models {
        [] => Err(FitError::NoSegments),
        [only] => Ok(*only),
        _ => {
            let k = models.len() as f64;
            let (mut sum_w, mut sum_factor, mut sum_b) = (0.0, 0.0, 0.0);

            for (i, model) in models.iter().enumerate() {
                let factor = if weighted { (i + 1) as f64 / k } else { 1.0 };
                sum_w += model.weight * factor;
                sum_factor += factor;
                sum_b += model.bias;
            }

            Ok(OlsModel {
                weight: sum_w / sum_factor,
                bias: sum_b / k,
            })
        }
    }
}

pub fn project(buckets: &[DayBucket], weighted: bool) -> Result<OlsModel, FitError> {
    let models: Vec<OlsModel> = segment_models(buckets).iter().map(|s| s.model).collect();
    combine(&models, weighted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn buckets_from<F: Fn(i64) -> f64>(days: i64, amount: F) -> Vec<DayBucket> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (1..=days)
            .map(|day| DayBucket {
                date: start.checked_add_days(Days::new((day - 1) as u64)).unwrap(),
                day_number: day,
                amount: amount(day),
                count: 1,
            })
            .collect()
    }

    fn two_slopes(day: i64) -> f64 {
        if day <= 30 {
            day as f64
        } else {
            30.0 + 3.0 * (day - 30) as f64
        }
    }

    #[test]
    fn test_uniform_average_of_slopes() {
        let buckets = buckets_from(60, two_slopes);
        let segments = segment_models(&buckets);
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[1].first_day, segments[1].last_day), (31, 60));

        let model = project(&buckets, false).unwrap();
        assert!((model.weight - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_recency_weighted_slopes() {
        let buckets = buckets_from(60, two_slopes);
        let model = project(&buckets, true).unwrap();
        let expected = (1.0 * 0.5 + 3.0 * 1.0) / 1.5;
        assert!((model.weight - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bias_is_never_weighted() {
        let models = [
            OlsModel { weight: 1.0, bias: 10.0 },
            OlsModel { weight: 3.0, bias: 40.0 },
        ];
        let uniform = combine(&models, false).unwrap();
        let weighted = combine(&models, true).unwrap();
        assert_eq!(uniform.bias, 25.0);
        assert_eq!(weighted.bias, 25.0);
    }

    #[test]
    fn test_single_segment_returned_as_is() {
        let buckets = buckets_from(10, |d| 5.0 + 2.0 * d as f64);
        let model = project(&buckets, true).unwrap();
        assert!((model.weight - 2.0).abs() < 1e-9);
        assert!((model.bias - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_singleton_tail_window_discarded() {
        // 31 buckets: the last window holds one bucket and cannot be fitted.
        let buckets = buckets_from(31, |d| d as f64);
        assert_eq!(segment_models(&buckets).len(), 1);
        assert!((project(&buckets, false).unwrap().weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_fittable() {
        let buckets = buckets_from(1, |_| 3.0);
        assert_eq!(project(&buckets, false), Err(FitError::NoSegments));
        assert_eq!(project(&[], true), Err(FitError::NoSegments));
    }
}
