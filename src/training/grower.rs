//! Depth-wise tree growing over binned data.
//!
//! The grower expands a frontier of nodes one depth level at a time. For
//! each node it builds gradient histograms over the node's rows, scans every
//! feature's bins for the best split, and partitions the rows into the two
//! children. Nodes that cannot be split become leaves with the Newton step
//! weight `-G / (H + λ)`, scaled by the learning rate.

use crate::data::BinnedDataset;
use crate::repr::{MutableTree, NodeId, Tree};
use crate::utils::Parallelism;

use super::histogram::build_histograms;
use super::GradientPair;

// =============================================================================
// GrowerParams
// =============================================================================

/// Parameters controlling tree growth.
#[derive(Clone, Debug)]
pub struct GrowerParams {
    /// Maximum tree depth (root = depth 0).
    pub max_depth: u32,
    /// Learning rate (shrinkage) applied to leaf weights.
    pub learning_rate: f32,
    /// L2 regularization on leaf weights.
    pub lambda: f32,
    /// Minimum hessian sum required in each child.
    pub min_child_weight: f32,
    /// Minimum gain required to keep a split.
    pub min_gain: f32,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            learning_rate: 0.3,
            lambda: 1.0,
            min_child_weight: 1.0,
            min_gain: 0.0,
        }
    }
}

// =============================================================================
// TreeGrower
// =============================================================================

/// A fully grown tree plus the rows that ended in each leaf.
///
/// The leaf assignments let the trainer update its cached train predictions
/// in O(n) without re-traversing the tree.
pub struct GrownTree {
    pub tree: Tree,
    /// `(leaf_value, rows)` for every leaf.
    pub leaf_assignments: Vec<(f32, Vec<u32>)>,
}

/// The best split found for one node.
struct SplitCandidate {
    feature: usize,
    bin: u8,
    gain: f64,
    left_grad: f64,
    left_hess: f64,
    right_grad: f64,
    right_hess: f64,
}

/// A frontier node awaiting expansion.
struct NodeWork {
    node: NodeId,
    rows: Vec<u32>,
    grad_sum: f64,
    hess_sum: f64,
}

/// Histogram-based depth-wise tree grower.
pub struct TreeGrower<'a> {
    dataset: &'a BinnedDataset,
    params: GrowerParams,
    parallelism: Parallelism,
}

impl<'a> TreeGrower<'a> {
    pub fn new(dataset: &'a BinnedDataset, params: GrowerParams, parallelism: Parallelism) -> Self {
        Self { dataset, params, parallelism }
    }

    /// Grow one tree against the current gradients.
    pub fn grow(&self, grad_hess: &[GradientPair]) -> GrownTree {
        debug_assert_eq!(grad_hess.len(), self.dataset.n_samples());

        let rows: Vec<u32> = (0..self.dataset.n_samples() as u32).collect();
        let (grad_sum, hess_sum) = sum_gradients(grad_hess, &rows);

        let mut tree = MutableTree::new();
        let mut leaf_assignments = Vec::new();

        let mut frontier = vec![NodeWork { node: 0, rows, grad_sum, hess_sum }];
        let mut depth = 0u32;

        while !frontier.is_empty() {
            let at_max_depth = depth >= self.params.max_depth;
            let mut next = Vec::new();

            for work in frontier {
                let split = if at_max_depth || work.rows.len() < 2 {
                    None
                } else {
                    self.find_best_split(&work, grad_hess)
                };

                match split {
                    None => {
                        let value = self.leaf_weight(work.grad_sum, work.hess_sum);
                        tree.make_leaf(work.node, value);
                        leaf_assignments.push((value, work.rows));
                    }
                    Some(split) => {
                        let (left_rows, right_rows) =
                            self.partition_rows(work.rows, split.feature, split.bin);

                        let left = tree.push_node();
                        let right = tree.push_node();
                        let threshold =
                            self.dataset.mapper(split.feature).threshold_for_bin(split.bin);
                        tree.make_split(
                            work.node,
                            split.feature as u32,
                            threshold,
                            true,
                            left,
                            right,
                        );

                        next.push(NodeWork {
                            node: left,
                            rows: left_rows,
                            grad_sum: split.left_grad,
                            hess_sum: split.left_hess,
                        });
                        next.push(NodeWork {
                            node: right,
                            rows: right_rows,
                            grad_sum: split.right_grad,
                            hess_sum: split.right_hess,
                        });
                    }
                }
            }

            frontier = next;
            depth += 1;
        }

        GrownTree { tree: tree.freeze(), leaf_assignments }
    }

    /// Scan all features' histogram bins for the highest-gain split.
    fn find_best_split(&self, work: &NodeWork, grad_hess: &[GradientPair]) -> Option<SplitCandidate> {
        let histograms =
            build_histograms(self.dataset, grad_hess, &work.rows, self.parallelism);

        let lambda = self.params.lambda as f64;
        let min_child_weight = self.params.min_child_weight as f64;
        let parent_score = score(work.grad_sum, work.hess_sum, lambda);
        let n_rows = work.rows.len() as u32;

        let mut best: Option<SplitCandidate> = None;

        for (feature, histogram) in histograms.iter().enumerate() {
            let mut left_grad = 0.0f64;
            let mut left_hess = 0.0f64;
            let mut left_count = 0u32;

            // A cut after the last bin sends everything left; stop before it.
            for (bin, entry) in histogram.iter().enumerate().take(histogram.len() - 1) {
                left_grad += entry.grad_sum;
                left_hess += entry.hess_sum;
                left_count += entry.count;

                if left_count == 0 || left_count == n_rows {
                    continue;
                }

                let right_grad = work.grad_sum - left_grad;
                let right_hess = work.hess_sum - left_hess;

                if left_hess < min_child_weight || right_hess < min_child_weight {
                    continue;
                }

                let gain = 0.5
                    * (score(left_grad, left_hess, lambda)
                        + score(right_grad, right_hess, lambda)
                        - parent_score);

                if gain <= self.params.min_gain as f64 {
                    continue;
                }

                if best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        bin: bin as u8,
                        gain,
                        left_grad,
                        left_hess,
                        right_grad,
                        right_hess,
                    });
                }
            }
        }

        best
    }

    /// Move rows into left/right children of a split on `feature` at `bin`.
    fn partition_rows(&self, rows: Vec<u32>, feature: usize, bin: u8) -> (Vec<u32>, Vec<u32>) {
        let bins = self.dataset.feature_bins(feature);
        let mut left = Vec::with_capacity(rows.len() / 2);
        let mut right = Vec::with_capacity(rows.len() / 2);

        for row in rows {
            if bins[row as usize] <= bin {
                left.push(row);
            } else {
                right.push(row);
            }
        }

        (left, right)
    }

    /// Newton step leaf weight with L2 regularization and shrinkage.
    fn leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f32 {
        let denom = hess_sum + self.params.lambda as f64;
        if denom <= 0.0 {
            return 0.0;
        }
        (-(grad_sum / denom) * self.params.learning_rate as f64) as f32
    }
}

/// Structure score `G² / (H + λ)`.
#[inline]
fn score(grad_sum: f64, hess_sum: f64, lambda: f64) -> f64 {
    let denom = hess_sum + lambda;
    if denom <= 0.0 { 0.0 } else { grad_sum * grad_sum / denom }
}

fn sum_gradients(grad_hess: &[GradientPair], rows: &[u32]) -> (f64, f64) {
    rows.iter().fold((0.0, 0.0), |(g, h), &row| {
        let gh = grad_hess[row as usize];
        (g + gh.grad as f64, h + gh.hess as f64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use ndarray::{Array1, Array2};

    fn binned_from_feature(values: &[f32]) -> BinnedDataset {
        let n = values.len();
        let features = Array2::from_shape_vec((1, n), values.to_vec()).unwrap();
        let ds = Dataset::new(features, Array1::zeros(n), vec!["x".into()]);
        BinnedDataset::from_dataset(&ds, 256)
    }

    fn gradients_for_targets(targets: &[f32]) -> Vec<GradientPair> {
        // First-round gradients for squared loss starting from prediction 0.
        targets
            .iter()
            .map(|&y| GradientPair { grad: -y, hess: 1.0 })
            .collect()
    }

    #[test]
    fn splits_a_step_function() {
        // Two clusters: x < 5 has target 0, x >= 5 has target 10.
        let values: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let targets: Vec<f32> = values.iter().map(|&v| if v < 5.0 { 0.0 } else { 10.0 }).collect();

        let binned = binned_from_feature(&values);
        let grad_hess = gradients_for_targets(&targets);

        let params = GrowerParams {
            max_depth: 1,
            learning_rate: 1.0,
            lambda: 0.0,
            min_child_weight: 0.0,
            ..Default::default()
        };
        let grower = TreeGrower::new(&binned, params, Parallelism::Sequential);
        let grown = grower.grow(&grad_hess);

        // One split, two leaves.
        assert_eq!(grown.tree.n_nodes(), 3);
        assert!(!grown.tree.is_leaf(0));
        assert!(grown.tree.split_threshold(0) > 4.0);
        assert!(grown.tree.split_threshold(0) < 5.0);

        // With lr=1 and lambda=0 the leaves recover the cluster means.
        let left = grown.tree.left_child(0);
        let right = grown.tree.right_child(0);
        assert!((grown.tree.leaf_value(left) - 0.0).abs() < 1e-5);
        assert!((grown.tree.leaf_value(right) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn constant_target_grows_single_leaf() {
        let values: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let targets = vec![3.0f32; 8];

        let binned = binned_from_feature(&values);
        let grad_hess = gradients_for_targets(&targets);

        let grower =
            TreeGrower::new(&binned, GrowerParams::default(), Parallelism::Sequential);
        let grown = grower.grow(&grad_hess);

        // No gain anywhere: the root stays a leaf.
        assert_eq!(grown.tree.n_nodes(), 1);
        assert!(grown.tree.is_leaf(0));
    }

    #[test]
    fn max_depth_zero_is_a_stump_value() {
        let values: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let targets: Vec<f32> = values.clone();

        let binned = binned_from_feature(&values);
        let grad_hess = gradients_for_targets(&targets);

        let params = GrowerParams { max_depth: 0, ..Default::default() };
        let grower = TreeGrower::new(&binned, params, Parallelism::Sequential);
        let grown = grower.grow(&grad_hess);

        assert_eq!(grown.tree.n_nodes(), 1);
    }

    #[test]
    fn leaf_assignments_cover_all_rows() {
        let values: Vec<f32> = (0..32).map(|i| (i % 7) as f32).collect();
        let targets: Vec<f32> = values.iter().map(|&v| v * 2.0).collect();

        let binned = binned_from_feature(&values);
        let grad_hess = gradients_for_targets(&targets);

        let params = GrowerParams { max_depth: 3, ..Default::default() };
        let grower = TreeGrower::new(&binned, params, Parallelism::Sequential);
        let grown = grower.grow(&grad_hess);

        let mut seen = vec![false; 32];
        for (_, rows) in &grown.leaf_assignments {
            for &row in rows {
                assert!(!seen[row as usize], "row {} in two leaves", row);
                seen[row as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));

        // Assignments agree with traversal.
        let samples = Array2::from_shape_vec(
            (32, 1),
            values.clone(),
        )
        .unwrap();
        for (value, rows) in &grown.leaf_assignments {
            for &row in rows {
                let leaf = grown.tree.traverse_to_leaf(samples.row(row as usize));
                assert_eq!(grown.tree.leaf_value(leaf), *value);
            }
        }

        assert!(grown.tree.validate().is_ok());
    }

    #[test]
    fn min_child_weight_blocks_tiny_children() {
        let values = vec![0.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let targets = vec![10.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

        let binned = binned_from_feature(&values);
        let grad_hess = gradients_for_targets(&targets);

        // The only useful split isolates a single row; forbid it.
        let params = GrowerParams { min_child_weight: 2.0, ..Default::default() };
        let grower = TreeGrower::new(&binned, params, Parallelism::Sequential);
        let grown = grower.grow(&grad_hess);

        assert_eq!(grown.tree.n_nodes(), 1);
    }
}
