//! Quantile binning for histogram-based training.
//!
//! Raw feature values are mapped to small integer bin indices once, up
//! front; the tree grower then only ever touches `u8` bins. Split thresholds
//! are recovered from the bin boundaries when trees are written out, so the
//! fitted model predicts directly from raw feature values.

use ndarray::Array2;

use super::Dataset;

/// Upper limit on bins per feature. Bin indices must fit in a `u8`.
pub const MAX_BINS: usize = 256;

// =============================================================================
// BinMapper
// =============================================================================

/// Per-feature mapping between raw values and bin indices.
///
/// A mapper with `k` cut points defines `k + 1` bins. Bin `i` holds values
/// `v` with `cuts[i - 1] <= v < cuts[i]`; NaN maps to bin 0 and traversal
/// handles it through each split's default direction.
#[derive(Debug, Clone)]
pub struct BinMapper {
    /// Sorted ascending cut points between adjacent bins.
    cuts: Vec<f32>,
}

impl BinMapper {
    /// Build a mapper from the observed values of one feature.
    ///
    /// If the feature has at most `max_bins` distinct finite values, every
    /// distinct value gets its own bin (cuts at midpoints). Otherwise cut
    /// points are placed at evenly spaced sample quantiles.
    ///
    /// # Panics
    ///
    /// Panics if `max_bins` is outside `2..=MAX_BINS`.
    pub fn from_values(values: &[f32], max_bins: usize) -> Self {
        assert!(
            (2..=MAX_BINS).contains(&max_bins),
            "max_bins must be in 2..={}, got {}",
            MAX_BINS,
            max_bins
        );

        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("values are finite"));
        if sorted.is_empty() {
            return Self { cuts: Vec::new() };
        }

        // Distinct values with multiplicities, in ascending order.
        let mut distinct: Vec<(f32, usize)> = Vec::new();
        for &v in &sorted {
            match distinct.last_mut() {
                Some((d, count)) if *d == v => *count += 1,
                _ => distinct.push((v, 1)),
            }
        }

        let mut cuts = Vec::new();
        if distinct.len() <= max_bins {
            for pair in distinct.windows(2) {
                cuts.push(midpoint(pair[0].0, pair[1].0));
            }
        } else {
            // Greedy quantile cuts: close a bin once it holds its share of
            // samples, always cutting between distinct values.
            let stride = (sorted.len() as f64 / max_bins as f64).ceil() as usize;
            let mut in_bin = 0usize;
            for (i, &(v, count)) in distinct.iter().enumerate() {
                in_bin += count;
                if in_bin >= stride && i + 1 < distinct.len() && cuts.len() < max_bins - 1 {
                    cuts.push(midpoint(v, distinct[i + 1].0));
                    in_bin = 0;
                }
            }
        }

        Self { cuts }
    }

    /// Number of bins this mapper produces.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.cuts.len() + 1
    }

    /// Map a raw value to its bin index. NaN maps to bin 0.
    #[inline]
    pub fn bin_for_value(&self, value: f32) -> u8 {
        if value.is_nan() {
            return 0;
        }
        self.cuts.partition_point(|&c| c <= value) as u8
    }

    /// The split threshold separating bins `..=bin` from the rest.
    ///
    /// A raw value `v` satisfies `v < threshold_for_bin(b)` exactly when
    /// `bin_for_value(v) <= b`, which is what ties histogram splits back to
    /// numeric tree thresholds.
    ///
    /// # Panics
    ///
    /// Panics if `bin` is the last bin (there is no cut above it).
    #[inline]
    pub fn threshold_for_bin(&self, bin: u8) -> f32 {
        self.cuts[bin as usize]
    }
}

#[inline]
fn midpoint(a: f32, b: f32) -> f32 {
    ((a as f64 + b as f64) / 2.0) as f32
}

// =============================================================================
// BinnedDataset
// =============================================================================

/// A dataset pre-binned for histogram construction.
///
/// Bin indices are stored feature-major (`[n_features, n_samples]`), so each
/// feature's bins are contiguous, matching the histogram accumulation loop.
#[derive(Debug, Clone)]
pub struct BinnedDataset {
    bins: Array2<u8>,
    mappers: Vec<BinMapper>,
}

impl BinnedDataset {
    /// Bin every feature of a dataset.
    pub fn from_dataset(dataset: &Dataset, max_bins: usize) -> Self {
        let n_features = dataset.n_features();
        let n_samples = dataset.n_samples();

        let mappers: Vec<BinMapper> = (0..n_features)
            .map(|f| {
                let values = dataset
                    .feature(f)
                    .to_slice()
                    .expect("feature rows should be contiguous");
                BinMapper::from_values(values, max_bins)
            })
            .collect();

        let mut bins = Array2::zeros((n_features, n_samples));
        for (f, mapper) in mappers.iter().enumerate() {
            let feature = dataset.feature(f);
            for (bin, &value) in bins.row_mut(f).iter_mut().zip(feature.iter()) {
                *bin = mapper.bin_for_value(value);
            }
        }

        Self { bins, mappers }
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.bins.nrows()
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.bins.ncols()
    }

    /// Bin indices for one feature, contiguous across samples.
    #[inline]
    pub fn feature_bins(&self, feature: usize) -> &[u8] {
        self.bins
            .row(feature)
            .to_slice()
            .expect("bin rows should be contiguous")
    }

    /// The mapper used for one feature.
    #[inline]
    pub fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }
}
