//! Objective (loss) functions.
//!
//! Performance-focused implementations over slices. Predictions and
//! gradients are indexed by sample, matching the trainer's cached
//! prediction buffer.

use ndarray::ArrayView1;

use super::GradientPair;

/// Loss function interface for training.
///
/// An objective turns the current predictions into per-sample gradient
/// statistics, and supplies the base score that prediction starts from.
pub trait ObjectiveFn {
    /// Compute gradient/hessian pairs for all samples.
    fn compute_gradients_into(
        &self,
        predictions: &[f32],
        targets: ArrayView1<'_, f32>,
        grad_hess: &mut [GradientPair],
    );

    /// Compute the base score (initial prediction) from the targets.
    fn base_score(&self, targets: ArrayView1<'_, f32>) -> f32;

    /// Objective name, as reported in logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Squared Loss
// =============================================================================

/// Squared error loss (L2 loss) for regression.
///
/// - Loss: `0.5 * (pred - target)²`
/// - Gradient: `pred - target`
/// - Hessian: `1.0`
/// - Base score: target mean
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredLoss;

impl ObjectiveFn for SquaredLoss {
    fn compute_gradients_into(
        &self,
        predictions: &[f32],
        targets: ArrayView1<'_, f32>,
        grad_hess: &mut [GradientPair],
    ) {
        debug_assert_eq!(predictions.len(), targets.len());
        debug_assert_eq!(predictions.len(), grad_hess.len());

        for ((gh, &pred), &target) in grad_hess.iter_mut().zip(predictions).zip(targets.iter()) {
            gh.grad = pred - target;
            gh.hess = 1.0;
        }
    }

    fn base_score(&self, targets: ArrayView1<'_, f32>) -> f32 {
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }

        let sum: f64 = targets.iter().map(|&y| y as f64).sum();
        (sum / n as f64) as f32
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}
