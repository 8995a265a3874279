//! Training infrastructure for gradient boosting.
//!
//! - [`Gradients`]: per-sample gradient/hessian storage
//! - [`ObjectiveFn`] / [`SquaredLoss`]: loss functions
//! - [`MetricFn`] / [`Mae`], [`Rmse`]: evaluation metrics
//! - [`TreeGrower`]: histogram-based depth-wise tree construction
//! - [`GBDTTrainer`]: the boosting loop
//! - [`TrainingLogger`], [`Verbosity`]: optional progress output

mod grower;
mod histogram;
mod logger;
mod metrics;
mod objectives;
mod trainer;

pub use grower::{GrownTree, GrowerParams, TreeGrower};
pub use histogram::{HistogramBin, build_histograms};
pub use logger::{TrainingLogger, Verbosity};
pub use metrics::{Mae, MetricFn, Rmse};
pub use objectives::{ObjectiveFn, SquaredLoss};
pub use trainer::{GBDTParams, GBDTTrainer, TrainError};

/// Gradient/hessian pair for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradientPair {
    pub grad: f32,
    pub hess: f32,
}

/// Gradient buffer, recomputed at the start of every boosting round.
#[derive(Debug, Clone)]
pub struct Gradients {
    pairs: Vec<GradientPair>,
}

impl Gradients {
    /// Allocate a zeroed buffer for `n_samples` samples.
    pub fn new(n_samples: usize) -> Self {
        Self { pairs: vec![GradientPair::default(); n_samples] }
    }

    #[inline]
    pub fn pairs(&self) -> &[GradientPair] {
        &self.pairs
    }

    #[inline]
    pub fn pairs_mut(&mut self) -> &mut [GradientPair] {
        &mut self.pairs
    }
}
