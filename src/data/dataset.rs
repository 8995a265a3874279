//! Dataset container.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// The in-memory table every pipeline stage works against.
///
/// # Storage Layout
///
/// Features are stored in **feature-major** layout: `[n_features, n_samples]`.
/// Each feature's values across all samples are contiguous in memory.
/// Targets are a single vector of length `n_samples`.
///
/// # Example
///
/// ```
/// use gridboost::data::Dataset;
/// use ndarray::array;
///
/// // Feature-major format: 2 features, 3 samples
/// let features = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
/// let targets = array![0.0, 1.0, 0.0];
/// let ds = Dataset::new(features, targets, vec!["a".into(), "b".into()]);
///
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_features(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature data: `[n_features, n_samples]` (feature-major).
    features: Array2<f32>,
    /// Target values: length = n_samples.
    targets: Array1<f32>,
    /// Feature names, in column order.
    feature_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset from feature-major data.
    ///
    /// # Panics
    ///
    /// Debug-asserts that sample counts match between features and targets,
    /// and that one name is given per feature.
    pub fn new(features: Array2<f32>, targets: Array1<f32>, feature_names: Vec<String>) -> Self {
        debug_assert_eq!(
            features.ncols(),
            targets.len(),
            "targets must have same sample count as features"
        );
        debug_assert_eq!(
            features.nrows(),
            feature_names.len(),
            "feature_names must have one entry per feature"
        );

        Self { features, targets, feature_names }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.ncols()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    /// Feature names in column order.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature matrix view, `[n_features, n_samples]`.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// All values of one feature, contiguous across samples.
    #[inline]
    pub fn feature(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.features.row(idx)
    }

    /// Target vector view.
    #[inline]
    pub fn targets(&self) -> ArrayView1<'_, f32> {
        self.targets.view()
    }

    /// Copy the features into sample-major layout `[n_samples, n_features]`.
    ///
    /// This is the layout prediction consumes.
    pub fn samples(&self) -> Array2<f32> {
        self.features.t().to_owned()
    }

    /// Gather a new dataset containing only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        let features = self.features.select(Axis(1), indices);
        let targets = self.targets.select(Axis(0), indices);
        Self {
            features,
            targets,
            feature_names: self.feature_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn make_dataset() -> Dataset {
        let features = array![[1.0, 2.0, 3.0, 4.0], [10.0, 20.0, 30.0, 40.0]];
        let targets = array![0.1, 0.2, 0.3, 0.4];
        Dataset::new(features, targets, vec!["x0".into(), "x1".into()])
    }

    #[test]
    fn accessors() {
        let ds = make_dataset();
        assert_eq!(ds.n_samples(), 4);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.feature_names(), &["x0".to_string(), "x1".to_string()]);
        assert_eq!(ds.feature(1).as_slice().unwrap(), &[10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn samples_is_transposed() {
        let ds = make_dataset();
        let samples = ds.samples();
        assert_eq!(samples.dim(), (4, 2));
        assert_eq!(samples.row(2).as_slice().unwrap(), &[3.0, 30.0]);
    }

    #[test]
    fn select_rows_gathers_in_order() {
        let ds = make_dataset();
        let subset = ds.select_rows(&[3, 1]);
        assert_eq!(subset.n_samples(), 2);
        assert_eq!(subset.feature(0).as_slice().unwrap(), &[4.0, 2.0]);
        assert_eq!(subset.targets().as_slice().unwrap(), &[0.4, 0.2]);
    }
}
