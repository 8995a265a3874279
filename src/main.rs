//! Carbon intensity model training pipeline.
//!
//! Loads `training_data.csv`, holds out 20% of the rows with a fixed seed,
//! trains a gradient boosted tree regressor on the rest, reports holdout
//! MAE, and writes the fitted model to `grid_model.onnx`.
//!
//! Everything is pinned: file paths, the feature list, the split seed, and
//! the hyperparameters. Any stage failure aborts the run.

use gridboost::{
    ConfigError, ExportError, GBDTConfig, GBDTModel, LoadError, Mae, MetricFn, TrainError,
    export_onnx, load_csv, train_test_split,
};

const TRAINING_DATA: &str = "training_data.csv";
const MODEL_OUT: &str = "grid_model.onnx";

const FEATURES: [&str; 6] = [
    "hour",
    "month",
    "day_of_week",
    "temperature",
    "solar_radiation",
    "wind_speed",
];
const TARGET: &str = "carbon_intensity";

const TEST_FRACTION: f32 = 0.2;
const SPLIT_SEED: u64 = 42;

const N_TREES: u32 = 1000;
const LEARNING_RATE: f32 = 0.03;
const MAX_DEPTH: u32 = 7;

/// All threads the machine has.
const N_THREADS: usize = 0;

#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

fn main() -> Result<(), PipelineError> {
    let dataset = load_csv(TRAINING_DATA, &FEATURES, TARGET)?;
    let (train, test) = train_test_split(&dataset, TEST_FRACTION, SPLIT_SEED);

    println!(
        "Training carbon intensity model on {} rows ({} held out)...",
        train.n_samples(),
        test.n_samples()
    );

    let config = GBDTConfig::builder()
        .n_trees(N_TREES)
        .learning_rate(LEARNING_RATE)
        .max_depth(MAX_DEPTH)
        .build()?;
    let model = GBDTModel::train(&train, config, N_THREADS)?;

    let predictions = model.predict(test.samples().view(), N_THREADS);
    let mae = Mae.compute(
        predictions.as_slice().expect("predictions should be contiguous"),
        test.targets(),
    );
    println!("Holdout MAE: {mae:.2}");

    println!("Converting to ONNX...");
    export_onnx(&model, MODEL_OUT)?;
    println!("Model written to {MODEL_OUT}");

    Ok(())
}
