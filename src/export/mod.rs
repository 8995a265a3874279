//! ONNX export of fitted models.
//!
//! The exporter writes a fitted [`GBDTModel`](crate::GBDTModel) as a single
//! `ai.onnx.ml` `TreeEnsembleRegressor` node, so any ONNX runtime can serve
//! the model without this crate.

pub mod onnx;
pub mod proto;

pub use onnx::{ExportError, OnnxExporter, export_onnx};
