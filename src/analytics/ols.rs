//! Single-variable ordinary least squares
//!
//! Closed form:
//!   weight = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)
//!   bias   = (Σy − weight·Σx) / n

use serde::Serialize;
use thiserror::Error;

/// Below this the normal equations are treated as singular.
pub const DEGENERATE_DENOMINATOR: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("x and y must have the same length ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("need at least one data point")]
    Empty,

    #[error("data is too uniform")]
    Degenerate,

    #[error("no segment produced a usable model")]
    NoSegments,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OlsModel {
    pub weight: f64,
    pub bias: f64,
}

impl OlsModel {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        if xs.len() != ys.len() {
            return Err(FitError::LengthMismatch {
                x: xs.len(),
                y: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(FitError::Empty);
        }

        let n = xs.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(ys) {
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
        }

        let denominator = n * sum_x2 - sum_x * sum_x;
        if denominator.abs() < DEGENERATE_DENOMINATOR {
            return Err(FitError::Degenerate);
        }

        let weight = (n * sum_xy - sum_x * sum_y) / denominator;
        let bias = (sum_y - weight * sum_x) / n;

        Ok(Self { weight, bias })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    pub fn predict_batch(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }

    /// Coefficient of determination. A flat `ys` (zero total variance)
    /// yields 0, never 1 or NaN.
    pub fn r_squared(&self, xs: &[f64], ys: &[f64]) -> f64 {
        if ys.is_empty() {
            return 0.0;
        }

        let mean_y = ys.iter().sum::<f64>() / ys.len() as f64;
        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (&x, &y) in xs.iter().zip(ys) {
            ss_res += (y - self.predict(x)).powi(2);
            ss_tot += (y - mean_y).powi(2);
        }

        if ss_tot == 0.0 {
            return 0.0;
        }

        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    }

    /// Mean squared residual.
    pub fn mse(&self, xs: &[f64], ys: &[f64]) -> f64 {
        if ys.is_empty() {
            return 0.0;
        }
        let sum: f64 = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| (y - self.predict(x)).powi(2))
            .sum();
        sum / ys.len() as f64
    }

    pub fn rmse(&self, xs: &[f64], ys: &[f64]) -> f64 {
        self.mse(xs, ys).sqrt()
    }
}
