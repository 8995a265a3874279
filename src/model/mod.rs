//! High-level model API.

mod config;
mod gbdt;
mod meta;

pub use config::{ConfigError, GBDTConfig};
pub use gbdt::GBDTModel;
pub use meta::ModelMeta;
