//! GBDT trainer: the boosting loop.
//!
//! Orchestrates gradient computation, tree growing, and prediction updates.
//! Use [`GBDTTrainer::train`] to train a forest from a binned dataset.

use ndarray::ArrayView1;

use crate::data::BinnedDataset;
use crate::repr::Forest;
use crate::utils::Parallelism;

use super::grower::{GrowerParams, TreeGrower};
use super::logger::TrainingLogger;
use super::metrics::MetricFn;
use super::objectives::ObjectiveFn;
use super::{Gradients, Verbosity};

// =============================================================================
// GBDTParams
// =============================================================================

/// Parameters for GBDT training.
#[derive(Clone, Debug)]
pub struct GBDTParams {
    /// Number of boosting rounds (trees to train).
    pub n_trees: u32,
    /// Learning rate (shrinkage).
    pub learning_rate: f32,
    /// Maximum tree depth.
    pub max_depth: u32,
    /// L2 regularization on leaf weights.
    pub lambda: f32,
    /// Minimum hessian sum required in each child.
    pub min_child_weight: f32,
    /// Minimum gain required to keep a split.
    pub min_gain: f32,
    /// Verbosity level for training output.
    pub verbosity: Verbosity,
}

impl Default for GBDTParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
            min_gain: 0.0,
            verbosity: Verbosity::default(),
        }
    }
}

impl GBDTParams {
    /// Convert to GrowerParams for the tree grower.
    fn to_grower_params(&self) -> GrowerParams {
        GrowerParams {
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
            min_gain: self.min_gain,
        }
    }
}

// =============================================================================
// TrainError
// =============================================================================

/// Errors from training input validation.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("target count {n_targets} does not match sample count {n_samples}")]
    TargetLengthMismatch { n_targets: usize, n_samples: usize },

    #[error("training set is empty")]
    EmptyDataset,

    #[error("target contains a non-finite value at row {row}")]
    NonFiniteTarget { row: usize },
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// GBDT Trainer.
pub struct GBDTTrainer<O: ObjectiveFn, M: MetricFn> {
    /// Objective function.
    objective: O,
    /// Metric reported by the training logger.
    metric: M,
    /// Training parameters.
    params: GBDTParams,
}

impl<O: ObjectiveFn, M: MetricFn> GBDTTrainer<O, M> {
    /// Create a new GBDT trainer.
    pub fn new(objective: O, metric: M, params: GBDTParams) -> Self {
        Self { objective, metric, params }
    }

    /// Get reference to parameters.
    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    /// Train a forest.
    ///
    /// **Note:** This method does NOT create a thread pool. The caller must
    /// set up parallelism via [`run_with_threads`](crate::run_with_threads)
    /// if desired.
    pub fn train(
        &self,
        dataset: &BinnedDataset,
        targets: ArrayView1<'_, f32>,
        parallelism: Parallelism,
    ) -> Result<Forest, TrainError> {
        let n_rows = dataset.n_samples();

        if n_rows == 0 {
            return Err(TrainError::EmptyDataset);
        }
        if targets.len() != n_rows {
            return Err(TrainError::TargetLengthMismatch {
                n_targets: targets.len(),
                n_samples: n_rows,
            });
        }
        if let Some(row) = targets.iter().position(|y| !y.is_finite()) {
            return Err(TrainError::NonFiniteTarget { row });
        }

        let grower = TreeGrower::new(dataset, self.params.to_grower_params(), parallelism);
        let mut gradients = Gradients::new(n_rows);

        let base_score = self.objective.base_score(targets);
        let mut predictions = vec![base_score; n_rows];
        let mut forest = Forest::new().with_base_score(base_score);

        let mut logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.params.n_trees as usize);

        for round in 0..self.params.n_trees as usize {
            self.objective
                .compute_gradients_into(&predictions, targets, gradients.pairs_mut());

            let grown = grower.grow(gradients.pairs());

            // O(n) prediction update from the grower's leaf assignments.
            for (value, rows) in &grown.leaf_assignments {
                for &row in rows {
                    predictions[row as usize] += value;
                }
            }

            forest.push_tree(grown.tree);

            if logger.should_log(round) {
                let value = self.metric.compute(&predictions, targets);
                logger.log_round(round, self.metric.name(), value);
            }
        }

        logger.finish_training();

        Ok(forest)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::training::{Mae, Rmse, SquaredLoss};
    use ndarray::{Array1, Array2};

    fn make_dataset(values: &[f32], targets: &[f32]) -> (BinnedDataset, Array1<f32>) {
        let n = values.len();
        let features = Array2::from_shape_vec((1, n), values.to_vec()).unwrap();
        let ds = Dataset::new(
            features,
            Array1::from_vec(targets.to_vec()),
            vec!["x".into()],
        );
        (BinnedDataset::from_dataset(&ds, 256), Array1::from_vec(targets.to_vec()))
    }

    #[test]
    fn test_params_default() {
        let params = GBDTParams::default();

        assert_eq!(params.n_trees, 100);
        assert!((params.learning_rate - 0.3).abs() < 1e-6);
        assert_eq!(params.max_depth, 6);
        assert!((params.lambda - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_train_single_tree() {
        let (dataset, targets) =
            make_dataset(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0]);

        let params = GBDTParams { n_trees: 1, ..Default::default() };
        let trainer = GBDTTrainer::new(SquaredLoss, Rmse, params);
        let forest = trainer
            .train(&dataset, targets.view(), Parallelism::Sequential)
            .unwrap();

        assert_eq!(forest.n_trees(), 1);
    }

    #[test]
    fn test_train_reduces_error() {
        let values: Vec<f32> = (0..64).map(|i| (i % 16) as f32).collect();
        let targets: Vec<f32> = values.iter().map(|&v| 3.0 * v + 1.0).collect();
        let (dataset, targets_arr) = make_dataset(&values, &targets);

        let trainer = GBDTTrainer::new(
            SquaredLoss,
            Mae,
            GBDTParams { n_trees: 50, learning_rate: 0.3, ..Default::default() },
        );
        let forest = trainer
            .train(&dataset, targets_arr.view(), Parallelism::Sequential)
            .unwrap();

        let samples = Array2::from_shape_vec((values.len(), 1), values.clone()).unwrap();
        let mut predictions = vec![0.0; values.len()];
        forest.predict_into(samples.view(), Parallelism::Sequential, &mut predictions);

        let mae = Mae.compute(&predictions, targets_arr.view());
        assert!(mae < 0.5, "expected near-exact fit, got mae {}", mae);
    }

    #[test]
    fn test_base_score_is_target_mean() {
        let (dataset, targets) = make_dataset(&[1.0, 2.0], &[4.0, 6.0]);

        let trainer =
            GBDTTrainer::new(SquaredLoss, Rmse, GBDTParams { n_trees: 1, ..Default::default() });
        let forest = trainer
            .train(&dataset, targets.view(), Parallelism::Sequential)
            .unwrap();

        assert!((forest.base_score() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_train_empty_dataset() {
        let (dataset, targets) = make_dataset(&[], &[]);

        let trainer = GBDTTrainer::new(SquaredLoss, Rmse, GBDTParams::default());
        let result = trainer.train(&dataset, targets.view(), Parallelism::Sequential);

        assert!(matches!(result, Err(TrainError::EmptyDataset)));
    }

    #[test]
    fn test_train_target_length_mismatch() {
        let (dataset, _) = make_dataset(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        let short_targets = Array1::from_vec(vec![1.0f32]);

        let trainer = GBDTTrainer::new(SquaredLoss, Rmse, GBDTParams::default());
        let result = trainer.train(&dataset, short_targets.view(), Parallelism::Sequential);

        assert!(matches!(
            result,
            Err(TrainError::TargetLengthMismatch { n_targets: 1, n_samples: 3 })
        ));
    }

    #[test]
    fn test_train_non_finite_target() {
        let (dataset, _) = make_dataset(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        let bad_targets = Array1::from_vec(vec![1.0f32, f32::NAN, 3.0]);

        let trainer = GBDTTrainer::new(SquaredLoss, Rmse, GBDTParams::default());
        let result = trainer.train(&dataset, bad_targets.view(), Parallelism::Sequential);

        assert!(matches!(result, Err(TrainError::NonFiniteTarget { row: 1 })));
    }
}
