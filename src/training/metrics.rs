//! Regression metrics.
//!
//! Metrics accumulate in `f64` regardless of the `f32` data to keep large
//! sums stable.

use ndarray::ArrayView1;

/// Evaluation metric interface.
pub trait MetricFn {
    /// Compute the metric over a batch of predictions.
    fn compute(&self, predictions: &[f32], targets: ArrayView1<'_, f32>) -> f64;

    /// Whether larger values indicate a better model.
    fn higher_is_better(&self) -> bool;

    /// Metric name, as reported in logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// MAE (Mean Absolute Error)
// =============================================================================

/// Mean Absolute Error: `mean(|pred - label|)`
///
/// Lower is better. More robust to outliers than RMSE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl MetricFn for Mae {
    fn compute(&self, predictions: &[f32], targets: ArrayView1<'_, f32>) -> f64 {
        let n = predictions.len();
        debug_assert_eq!(n, targets.len());
        if n == 0 {
            return 0.0;
        }

        let sum_ae: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &l)| ((p as f64) - (l as f64)).abs())
            .sum();

        sum_ae / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

// =============================================================================
// RMSE (Root Mean Squared Error)
// =============================================================================

/// Root Mean Squared Error: `sqrt(mean((pred - label)²))`
///
/// Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl MetricFn for Rmse {
    fn compute(&self, predictions: &[f32], targets: ArrayView1<'_, f32>) -> f64 {
        let n = predictions.len();
        debug_assert_eq!(n, targets.len());
        if n == 0 {
            return 0.0;
        }

        let sum_sq: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &l)| {
                let diff = (p as f64) - (l as f64);
                diff * diff
            })
            .sum();

        (sum_sq / n as f64).sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}
