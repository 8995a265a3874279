//! Gradient histograms for split finding.
//!
//! Bins are plain structs of `f64` sums rather than anything fancier;
//! the accumulation loop vectorizes well and the feature-parallel strategy
//! keeps threads on disjoint output ranges.

use crate::data::BinnedDataset;
use crate::utils::Parallelism;

use super::GradientPair;

/// One histogram bin: summed gradient statistics for samples landing in it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistogramBin {
    pub grad_sum: f64,
    pub hess_sum: f64,
    pub count: u32,
}

/// Build per-feature histograms over the given rows.
///
/// Returns one `Vec<HistogramBin>` per feature, sized to that feature's bin
/// count. Parallelizes over features; each feature's accumulation is
/// sequential over `rows`.
pub fn build_histograms(
    dataset: &BinnedDataset,
    grad_hess: &[GradientPair],
    rows: &[u32],
    parallelism: Parallelism,
) -> Vec<Vec<HistogramBin>> {
    debug_assert_eq!(grad_hess.len(), dataset.n_samples());

    parallelism.maybe_par_map(0..dataset.n_features(), |feature| {
        let bins = dataset.feature_bins(feature);
        let mut histogram = vec![HistogramBin::default(); dataset.mapper(feature).n_bins()];

        for &row in rows {
            let gh = grad_hess[row as usize];
            let bin = &mut histogram[bins[row as usize] as usize];
            bin.grad_sum += gh.grad as f64;
            bin.hess_sum += gh.hess as f64;
            bin.count += 1;
        }

        histogram
    })
}
