//! High-level GBDT configuration with builder pattern.
//!
//! [`GBDTConfig`] provides a unified configuration for GBDT model training.
//! It uses the `bon` crate for builder pattern generation with validation.
//!
//! # Example
//!
//! ```
//! use gridboost::GBDTConfig;
//!
//! // All defaults
//! let config = GBDTConfig::builder().build().unwrap();
//!
//! // Customize hyperparameters
//! let config = GBDTConfig::builder()
//!     .n_trees(1000)
//!     .learning_rate(0.03)
//!     .max_depth(7)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;

use crate::data::MAX_BINS;
use crate::training::Verbosity;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Learning rate must be positive.
    InvalidLearningRate(f32),
    /// Number of trees must be at least 1.
    InvalidNTrees,
    /// Tree depth must be at least 1.
    InvalidMaxDepth,
    /// Bin count must be in `2..=MAX_BINS`.
    InvalidMaxBins(usize),
    /// Invalid regularization parameter.
    InvalidRegularization { field: &'static str, value: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLearningRate(v) => {
                write!(f, "learning_rate must be positive, got {}", v)
            }
            Self::InvalidNTrees => write!(f, "n_trees must be at least 1"),
            Self::InvalidMaxDepth => write!(f, "max_depth must be at least 1"),
            Self::InvalidMaxBins(v) => {
                write!(f, "max_bins must be in 2..={}, got {}", MAX_BINS, v)
            }
            Self::InvalidRegularization { field, value } => {
                write!(f, "{} must be non-negative, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// GBDTConfig
// =============================================================================

/// High-level configuration for GBDT model training.
///
/// The builder pattern (via `bon`) provides a fluent API with validation at
/// build time.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct GBDTConfig {
    // === Boosting parameters ===
    /// Number of boosting rounds (trees to train). Default: 100.
    #[builder(default = 100)]
    pub n_trees: u32,

    /// Learning rate (shrinkage). Default: 0.3.
    ///
    /// Smaller values require more trees but often produce better models.
    /// Typical values: 0.01 - 0.3.
    #[builder(default = 0.3)]
    pub learning_rate: f32,

    // === Tree structure ===
    /// Maximum tree depth. Default: 6.
    #[builder(default = 6)]
    pub max_depth: u32,

    // === Regularization ===
    /// L2 regularization on leaf weights. Default: 1.0.
    #[builder(default = 1.0)]
    pub lambda: f32,

    /// Minimum hessian sum required in each child. Default: 1.0.
    #[builder(default = 1.0)]
    pub min_child_weight: f32,

    /// Minimum gain required to keep a split. Default: 0.0.
    #[builder(default = 0.0)]
    pub min_gain: f32,

    // === Binning ===
    /// Maximum histogram bins per feature. Default: 256.
    #[builder(default = 256)]
    pub max_bins: usize,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: g_b_d_t_config_builder::IsComplete> GBDTConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `learning_rate <= 0`
    /// - `n_trees == 0` or `max_depth == 0`
    /// - `max_bins` outside `2..=MAX_BINS`
    /// - Negative regularization parameters
    pub fn build(self) -> Result<GBDTConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl GBDTConfig {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if !(2..=MAX_BINS).contains(&self.max_bins) {
            return Err(ConfigError::InvalidMaxBins(self.max_bins));
        }
        if self.lambda < 0.0 {
            return Err(ConfigError::InvalidRegularization {
                field: "lambda",
                value: self.lambda,
            });
        }
        if self.min_child_weight < 0.0 {
            return Err(ConfigError::InvalidRegularization {
                field: "min_child_weight",
                value: self.min_child_weight,
            });
        }
        if self.min_gain < 0.0 {
            return Err(ConfigError::InvalidRegularization {
                field: "min_gain",
                value: self.min_gain,
            });
        }

        Ok(())
    }
}

impl Default for GBDTConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GBDTConfig::builder().build();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert_eq!(config.n_trees, 100);
        assert!((config.learning_rate - 0.3).abs() < 1e-6);
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.max_bins, 256);
    }

    #[test]
    fn test_invalid_learning_rate_zero() {
        let result = GBDTConfig::builder().learning_rate(0.0).build();
        assert!(matches!(result, Err(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn test_invalid_learning_rate_negative() {
        let result = GBDTConfig::builder().learning_rate(-0.1).build();
        assert!(matches!(result, Err(ConfigError::InvalidLearningRate(_))));
    }

    #[test]
    fn test_learning_rate_greater_than_one_is_valid() {
        // > 1.0 is allowed (unusual but XGBoost permits it)
        let result = GBDTConfig::builder().learning_rate(1.5).build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_n_trees_zero() {
        let result = GBDTConfig::builder().n_trees(0).build();
        assert!(matches!(result, Err(ConfigError::InvalidNTrees)));
    }

    #[test]
    fn test_invalid_max_depth_zero() {
        let result = GBDTConfig::builder().max_depth(0).build();
        assert!(matches!(result, Err(ConfigError::InvalidMaxDepth)));
    }

    #[test]
    fn test_invalid_max_bins() {
        let result = GBDTConfig::builder().max_bins(1).build();
        assert!(matches!(result, Err(ConfigError::InvalidMaxBins(1))));

        let result = GBDTConfig::builder().max_bins(1000).build();
        assert!(matches!(result, Err(ConfigError::InvalidMaxBins(1000))));
    }

    #[test]
    fn test_invalid_negative_lambda() {
        let result = GBDTConfig::builder().lambda(-1.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegularization { field: "lambda", .. })
        ));
    }

    #[test]
    fn test_config_default_trait() {
        let config = GBDTConfig::default();
        assert_eq!(config.n_trees, 100);
    }

    #[test]
    fn test_error_display() {
        let err = GBDTConfig::builder().learning_rate(0.0).build().unwrap_err();
        assert!(err.to_string().contains("learning_rate"));
    }
}
