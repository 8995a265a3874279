//! gridboost: gradient boosted trees for carbon intensity forecasting.
//!
//! Native Rust implementation of histogram-based gradient boosted decision
//! tree regression, with CSV data loading, deterministic train/test
//! splitting, and export of fitted models to ONNX.
//!
//! # Key Types
//!
//! - [`Dataset`] - Column-named tabular data (feature-major)
//! - [`GBDTModel`] / [`GBDTConfig`] - High-level model with train/predict
//! - [`Mae`] / [`Rmse`] - Evaluation metrics
//! - [`export_onnx`] - Serialize a fitted model as an ONNX tree ensemble
//!
//! # Training
//!
//! Use `GBDTConfig::builder()` to configure, then `GBDTModel::train()`.
//! See the [`model`] module for details.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod data;
pub mod export;
pub mod model;
pub mod repr;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{ConfigError, GBDTConfig, GBDTModel, ModelMeta};

// Data types (loading, splitting, binning)
pub use data::{BinnedDataset, Dataset, LoadError, load_csv, train_test_split};

// Training types (objectives, metrics, errors)
pub use training::{Mae, MetricFn, ObjectiveFn, Rmse, SquaredLoss, TrainError, Verbosity};

// Export
pub use export::{ExportError, export_onnx};

// Shared utilities
pub use utils::{Parallelism, run_with_threads};
