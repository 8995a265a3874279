//! Deterministic train/test splitting.

use rand::prelude::*;

use super::Dataset;

/// Split a dataset into train and test partitions.
///
/// Row indices are shuffled with a seeded [`StdRng`], and the first
/// `round(test_fraction × N)` shuffled rows become the test side. The same
/// seed always produces the same partition, so evaluation is reproducible.
///
/// Every row lands on exactly one side. Output row order is the shuffle
/// order, not the input order.
///
/// # Panics
///
/// Panics if `test_fraction` is outside `[0, 1)`.
pub fn train_test_split(dataset: &Dataset, test_fraction: f32, seed: u64) -> (Dataset, Dataset) {
    assert!(
        (0.0..1.0).contains(&test_fraction),
        "test_fraction must be in [0, 1), got {}",
        test_fraction
    );

    let n = dataset.n_samples();
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let test_len = ((n as f32) * test_fraction).round() as usize;
    let test_len = test_len.min(n);
    let (test, train) = idx.split_at(test_len);

    (dataset.select_rows(train), dataset.select_rows(test))
}
