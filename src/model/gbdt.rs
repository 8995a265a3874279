//! GBDT model implementation.
//!
//! High-level wrapper around [`Forest`] with training and prediction.
//! Access components via [`forest()`](GBDTModel::forest), [`meta()`](GBDTModel::meta),
//! and [`config()`](GBDTModel::config).

use ndarray::{Array1, ArrayView2};

use crate::data::{BinnedDataset, Dataset};
use crate::repr::Forest;
use crate::training::{GBDTParams, GBDTTrainer, Mae, SquaredLoss, TrainError};
use crate::utils::run_with_threads;

use super::{GBDTConfig, ModelMeta};

/// High-level GBDT regression model with training and prediction.
pub struct GBDTModel {
    /// The underlying forest.
    forest: Forest,
    /// Model metadata.
    meta: ModelMeta,
    /// Training configuration.
    config: GBDTConfig,
}

impl GBDTModel {
    /// Create a model from a forest and metadata.
    ///
    /// Use this when reconstructing models, or for quick testing. For
    /// training new models, prefer [`GBDTModel::train`].
    pub fn from_forest(forest: Forest, meta: ModelMeta) -> Self {
        Self { forest, meta, config: GBDTConfig::default() }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get reference to the underlying forest.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Get reference to model metadata.
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Get reference to training configuration.
    pub fn config(&self) -> &GBDTConfig {
        &self.config
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Train a new GBDT model.
    ///
    /// Bins the dataset, then runs the boosting loop under a thread pool
    /// sized by `n_threads`.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Training data (features and targets)
    /// * `config` - Training configuration
    /// * `n_threads` - Thread count: 0 = auto, 1 = sequential, >1 = exact count
    pub fn train(
        dataset: &Dataset,
        config: GBDTConfig,
        n_threads: usize,
    ) -> Result<Self, TrainError> {
        run_with_threads(n_threads, |parallelism| {
            let binned = BinnedDataset::from_dataset(dataset, config.max_bins);

            let params = GBDTParams {
                n_trees: config.n_trees,
                learning_rate: config.learning_rate,
                max_depth: config.max_depth,
                lambda: config.lambda,
                min_child_weight: config.min_child_weight,
                min_gain: config.min_gain,
                verbosity: config.verbosity,
            };

            let trainer = GBDTTrainer::new(SquaredLoss, Mae, params);
            let forest = trainer.train(&binned, dataset.targets(), parallelism)?;

            let meta = ModelMeta {
                n_features: dataset.n_features(),
                feature_names: Some(dataset.feature_names().to_vec()),
            };

            Ok(Self { forest, meta, config })
        })
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict for multiple rows.
    ///
    /// # Arguments
    ///
    /// * `features` - Feature matrix with shape `[n_samples, n_features]` (sample-major)
    /// * `n_threads` - Thread count: 0 = auto, 1 = sequential, >1 = exact count
    pub fn predict(&self, features: ArrayView2<'_, f32>, n_threads: usize) -> Array1<f32> {
        let n_rows = features.nrows();
        if n_rows == 0 {
            return Array1::zeros(0);
        }

        let mut output = vec![0.0f32; n_rows];
        run_with_threads(n_threads, |parallelism| {
            self.forest.predict_into(features, parallelism, &mut output);
        });

        Array1::from_vec(output)
    }
}

impl std::fmt::Debug for GBDTModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GBDTModel")
            .field("n_trees", &self.forest.n_trees())
            .field("n_features", &self.meta.n_features)
            .field("base_score", &self.forest.base_score())
            .finish()
    }
}
