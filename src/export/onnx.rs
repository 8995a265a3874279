//! Conversion of fitted models to ONNX tree ensembles.
//!
//! A [`Forest`](crate::repr::Forest) maps directly onto the `ai.onnx.ml`
//! `TreeEnsembleRegressor` operator: every tree node becomes one entry in
//! the operator's flattened node tables, and leaf values become target
//! weights. Splits are `BRANCH_LT` (`value < threshold` takes the true
//! branch), matching tree traversal exactly, and the missing-value flag
//! carries each node's default direction.

use std::path::{Path, PathBuf};

use prost::Message;

use crate::model::GBDTModel;
use crate::repr::{ForestValidationError, TreeValidationError};

use super::proto::{
    AttributeProto, AttributeType, ELEM_TYPE_FLOAT, GraphProto, ModelProto, NodeProto,
    OperatorSetIdProto, TensorShapeProto, TypeProto, ValueInfoProto, tensor_shape_proto,
    type_proto,
};

/// Graph input tensor name.
const INPUT_NAME: &str = "float_input";
/// Graph output tensor name.
const OUTPUT_NAME: &str = "variable";
/// Symbolic name of the dynamic batch dimension.
const BATCH_DIM: &str = "N";

/// Errors from converting or writing a model.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The model has no trained trees to export.
    #[error("model has no trained trees")]
    EmptyForest,

    /// A tree's structure cannot be represented as an ensemble table.
    #[error("tree {tree} failed structural validation: {error:?}")]
    InvalidTree { tree: usize, error: TreeValidationError },

    /// The output file could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// ONNX model exporter.
///
/// Holds the producer metadata stamped into the artifact; the defaults are
/// right for almost every caller.
#[derive(Debug, Clone)]
pub struct OnnxExporter {
    /// ONNX IR version to declare.
    pub ir_version: i64,
    /// Default-domain opset version.
    pub opset_version: i64,
    /// `ai.onnx.ml` opset version.
    pub ml_opset_version: i64,
    /// Producer name.
    pub producer_name: String,
    /// Producer version.
    pub producer_version: String,
}

impl Default for OnnxExporter {
    fn default() -> Self {
        Self {
            ir_version: 8,
            opset_version: 15,
            ml_opset_version: 3,
            producer_name: "gridboost".to_string(),
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl OnnxExporter {
    /// Create an exporter with default metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a fitted model into an ONNX model proto.
    ///
    /// # Errors
    ///
    /// Fails if the forest is empty or any tree fails structural validation;
    /// a malformed tree must not be written out.
    pub fn model_to_proto(&self, model: &GBDTModel) -> Result<ModelProto, ExportError> {
        let forest = model.forest();
        if forest.n_trees() == 0 {
            return Err(ExportError::EmptyForest);
        }
        forest.validate().map_err(|err| {
            let ForestValidationError::InvalidTree { tree_idx, error } = err;
            ExportError::InvalidTree { tree: tree_idx, error }
        })?;

        let n_features = model.meta().n_features;

        // Flattened node tables, one entry per node across all trees.
        let mut nodes_treeids: Vec<i64> = Vec::new();
        let mut nodes_nodeids: Vec<i64> = Vec::new();
        let mut nodes_featureids: Vec<i64> = Vec::new();
        let mut nodes_modes: Vec<Vec<u8>> = Vec::new();
        let mut nodes_values: Vec<f32> = Vec::new();
        let mut nodes_truenodeids: Vec<i64> = Vec::new();
        let mut nodes_falsenodeids: Vec<i64> = Vec::new();
        let mut nodes_missing_value_tracks_true: Vec<i64> = Vec::new();

        // One target entry per leaf.
        let mut target_treeids: Vec<i64> = Vec::new();
        let mut target_nodeids: Vec<i64> = Vec::new();
        let mut target_ids: Vec<i64> = Vec::new();
        let mut target_weights: Vec<f32> = Vec::new();

        for (tree_id, tree) in forest.trees().enumerate() {
            for node in 0..tree.n_nodes() as u32 {
                nodes_treeids.push(tree_id as i64);
                nodes_nodeids.push(node as i64);

                if tree.is_leaf(node) {
                    nodes_modes.push(b"LEAF".to_vec());
                    nodes_featureids.push(0);
                    nodes_values.push(0.0);
                    nodes_truenodeids.push(0);
                    nodes_falsenodeids.push(0);
                    nodes_missing_value_tracks_true.push(0);

                    target_treeids.push(tree_id as i64);
                    target_nodeids.push(node as i64);
                    target_ids.push(0);
                    target_weights.push(tree.leaf_value(node));
                } else {
                    nodes_modes.push(b"BRANCH_LT".to_vec());
                    nodes_featureids.push(tree.split_index(node) as i64);
                    nodes_values.push(tree.split_threshold(node));
                    // value < threshold takes the true branch (= left child)
                    nodes_truenodeids.push(tree.left_child(node) as i64);
                    nodes_falsenodeids.push(tree.right_child(node) as i64);
                    nodes_missing_value_tracks_true.push(tree.default_left(node) as i64);
                }
            }
        }

        let node = NodeProto {
            input: vec![INPUT_NAME.to_string()],
            output: vec![OUTPUT_NAME.to_string()],
            name: "TreeEnsembleRegressor".to_string(),
            op_type: "TreeEnsembleRegressor".to_string(),
            domain: "ai.onnx.ml".to_string(),
            attribute: vec![
                attr_string("aggregate_function", "SUM"),
                attr_floats("base_values", vec![forest.base_score()]),
                attr_int("n_targets", 1),
                attr_ints("nodes_falsenodeids", nodes_falsenodeids),
                attr_ints("nodes_featureids", nodes_featureids),
                attr_ints("nodes_missing_value_tracks_true", nodes_missing_value_tracks_true),
                attr_strings("nodes_modes", nodes_modes),
                attr_ints("nodes_nodeids", nodes_nodeids),
                attr_ints("nodes_treeids", nodes_treeids),
                attr_ints("nodes_truenodeids", nodes_truenodeids),
                attr_floats("nodes_values", nodes_values),
                attr_string("post_transform", "NONE"),
                attr_ints("target_ids", target_ids),
                attr_ints("target_nodeids", target_nodeids),
                attr_ints("target_treeids", target_treeids),
                attr_floats("target_weights", target_weights),
            ],
            ..Default::default()
        };

        let graph = GraphProto {
            node: vec![node],
            name: "gridboost_tree_ensemble".to_string(),
            input: vec![tensor_value_info(INPUT_NAME, n_features as i64)],
            output: vec![tensor_value_info(OUTPUT_NAME, 1)],
            ..Default::default()
        };

        Ok(ModelProto {
            ir_version: self.ir_version,
            producer_name: self.producer_name.clone(),
            producer_version: self.producer_version.clone(),
            model_version: 1,
            graph: Some(graph),
            opset_import: vec![
                OperatorSetIdProto {
                    domain: "ai.onnx.ml".to_string(),
                    version: self.ml_opset_version,
                },
                OperatorSetIdProto { domain: String::new(), version: self.opset_version },
            ],
            ..Default::default()
        })
    }

    /// Convert and write the model, fully overwriting any existing file.
    pub fn export(&self, model: &GBDTModel, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let proto = self.model_to_proto(model)?;
        std::fs::write(path, proto.encode_to_vec()).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Export a fitted model to `path` with default exporter metadata.
pub fn export_onnx(model: &GBDTModel, path: impl AsRef<Path>) -> Result<(), ExportError> {
    OnnxExporter::new().export(model, path)
}

// =============================================================================
// Helpers
// =============================================================================

/// A float tensor value info with a dynamic batch dimension.
fn tensor_value_info(name: &str, width: i64) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: ELEM_TYPE_FLOAT,
                shape: Some(TensorShapeProto {
                    dim: vec![
                        tensor_shape_proto::Dimension {
                            value: Some(tensor_shape_proto::dimension::Value::DimParam(
                                BATCH_DIM.to_string(),
                            )),
                        },
                        tensor_shape_proto::Dimension {
                            value: Some(tensor_shape_proto::dimension::Value::DimValue(width)),
                        },
                    ],
                }),
            })),
        }),
        ..Default::default()
    }
}

fn attr_int(name: &str, value: i64) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        i: value,
        r#type: AttributeType::Int as i32,
        ..Default::default()
    }
}

fn attr_ints(name: &str, values: Vec<i64>) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        ints: values,
        r#type: AttributeType::Ints as i32,
        ..Default::default()
    }
}

fn attr_floats(name: &str, values: Vec<f32>) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        floats: values,
        r#type: AttributeType::Floats as i32,
        ..Default::default()
    }
}

fn attr_string(name: &str, value: &str) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        s: value.as_bytes().to_vec(),
        r#type: AttributeType::String as i32,
        ..Default::default()
    }
}

fn attr_strings(name: &str, values: Vec<Vec<u8>>) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        strings: values,
        r#type: AttributeType::Strings as i32,
        ..Default::default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelMeta;
    use crate::repr::{Forest, MutableTree};

    fn make_model() -> GBDTModel {
        // x0 < 0.5 ? -1.0 : 1.0
        let mut tree = MutableTree::new();
        let left = tree.push_node();
        let right = tree.push_node();
        tree.make_split(0, 0, 0.5, true, left, right);
        tree.make_leaf(left, -1.0);
        tree.make_leaf(right, 1.0);

        let mut forest = Forest::new().with_base_score(0.25);
        forest.push_tree(tree.freeze());

        GBDTModel::from_forest(forest, ModelMeta::for_regression(2))
    }

    fn find_attr<'a>(node: &'a NodeProto, name: &str) -> &'a AttributeProto {
        node.attribute
            .iter()
            .find(|a| a.name == name)
            .unwrap_or_else(|| panic!("missing attribute {}", name))
    }

    #[test]
    fn node_tables_match_tree() {
        let model = make_model();
        let proto = OnnxExporter::new().model_to_proto(&model).unwrap();

        let graph = proto.graph.as_ref().unwrap();
        assert_eq!(graph.node.len(), 1);
        let node = &graph.node[0];
        assert_eq!(node.op_type, "TreeEnsembleRegressor");
        assert_eq!(node.domain, "ai.onnx.ml");
        assert_eq!(node.input, vec!["float_input".to_string()]);

        assert_eq!(find_attr(node, "nodes_treeids").ints, vec![0, 0, 0]);
        assert_eq!(find_attr(node, "nodes_nodeids").ints, vec![0, 1, 2]);
        assert_eq!(
            find_attr(node, "nodes_modes").strings,
            vec![b"BRANCH_LT".to_vec(), b"LEAF".to_vec(), b"LEAF".to_vec()]
        );
        assert_eq!(find_attr(node, "nodes_truenodeids").ints, vec![1, 0, 0]);
        assert_eq!(find_attr(node, "nodes_falsenodeids").ints, vec![2, 0, 0]);
        assert_eq!(find_attr(node, "nodes_values").floats, vec![0.5, 0.0, 0.0]);

        // Two leaves, one target weight each.
        assert_eq!(find_attr(node, "target_nodeids").ints, vec![1, 2]);
        assert_eq!(find_attr(node, "target_weights").floats, vec![-1.0, 1.0]);
        assert_eq!(find_attr(node, "base_values").floats, vec![0.25]);
    }

    #[test]
    fn input_shape_is_dynamic_batch() {
        let model = make_model();
        let proto = OnnxExporter::new().model_to_proto(&model).unwrap();

        let graph = proto.graph.as_ref().unwrap();
        let input = &graph.input[0];
        assert_eq!(input.name, "float_input");

        let Some(TypeProto { value: Some(type_proto::Value::TensorType(tensor)) }) =
            &input.r#type
        else {
            panic!("input must declare a tensor type");
        };
        assert_eq!(tensor.elem_type, ELEM_TYPE_FLOAT);

        let dims = &tensor.shape.as_ref().unwrap().dim;
        assert_eq!(dims.len(), 2);
        assert!(matches!(
            dims[0].value,
            Some(tensor_shape_proto::dimension::Value::DimParam(ref p)) if p == "N"
        ));
        assert!(matches!(
            dims[1].value,
            Some(tensor_shape_proto::dimension::Value::DimValue(2))
        ));
    }

    #[test]
    fn opsets_declare_ml_domain() {
        let model = make_model();
        let proto = OnnxExporter::new().model_to_proto(&model).unwrap();
        assert!(proto.opset_import.iter().any(|o| o.domain == "ai.onnx.ml"));
    }

    #[test]
    fn empty_forest_is_rejected() {
        let model = GBDTModel::from_forest(Forest::new(), ModelMeta::for_regression(1));
        let err = OnnxExporter::new().model_to_proto(&model).unwrap_err();
        assert!(matches!(err, ExportError::EmptyForest));
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let mut bad = MutableTree::new();
        bad.make_leaf(0, 1.0);
        bad.push_node(); // unreachable node

        let mut forest = Forest::new();
        forest.push_tree(bad.freeze());
        let model = GBDTModel::from_forest(forest, ModelMeta::for_regression(1));

        let err = OnnxExporter::new().model_to_proto(&model).unwrap_err();
        assert!(matches!(err, ExportError::InvalidTree { tree: 0, .. }));
    }

    #[test]
    fn export_overwrites_existing_file() {
        let model = make_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");

        std::fs::write(&path, b"stale contents").unwrap();
        export_onnx(&model, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        assert_ne!(bytes, b"stale contents");

        // The written bytes decode back to the same proto.
        let decoded = ModelProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, OnnxExporter::new().model_to_proto(&model).unwrap());
    }
}
