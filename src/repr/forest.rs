//! Canonical forest representation (collection of trees).

use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::utils::Parallelism;

use super::tree::{Tree, TreeValidationError};

/// Rows handled per work unit in batch prediction.
const PREDICT_CHUNK: usize = 512;

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
}

/// Forest of decision trees for single-output regression.
///
/// Prediction accumulates the base score plus one leaf value per tree.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f32,
}

impl Forest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self { trees: Vec::new(), base_score: 0.0 }
    }

    /// Set the base score (the prediction of an empty forest).
    pub fn with_base_score(mut self, base_score: f32) -> Self {
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Get the base score.
    #[inline]
    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Validate structural invariants for every tree.
    ///
    /// Intended for debug checks, tests, and the exporter.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx: i, error })?;
        }
        Ok(())
    }

    /// Predict for a single sample.
    pub fn predict_row(&self, sample: ArrayView1<'_, f32>) -> f32 {
        let mut output = self.base_score;
        for tree in &self.trees {
            let leaf = tree.traverse_to_leaf(sample);
            output += tree.leaf_value(leaf);
        }
        output
    }

    /// Predict for a batch of samples, writing into a pre-allocated buffer.
    ///
    /// # Arguments
    ///
    /// * `features` - Sample-major matrix `[n_samples, n_features]`
    /// * `parallelism` - Sequential or Parallel iteration hint
    /// * `output` - Must have length `n_samples`
    ///
    /// # Panics
    ///
    /// Panics if `output.len() != features.nrows()`.
    pub fn predict_into(
        &self,
        features: ArrayView2<'_, f32>,
        parallelism: Parallelism,
        output: &mut [f32],
    ) {
        let n_rows = features.nrows();
        assert_eq!(output.len(), n_rows, "output buffer must have length n_samples");

        let work = output
            .chunks_mut(PREDICT_CHUNK)
            .zip(features.axis_chunks_iter(Axis(0), PREDICT_CHUNK));

        parallelism.maybe_par_bridge_for_each(work, |(out_chunk, rows)| {
            for (out, row) in out_chunk.iter_mut().zip(rows.rows()) {
                *out = self.predict_row(row);
            }
        });
    }
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}
