//! CSV loading into a [`Dataset`].
//!
//! Reads a comma-separated file with a header row, selecting the requested
//! feature columns and target column by name. Any other columns are ignored.

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};

use super::Dataset;

/// Errors from reading a tabular file into a [`Dataset`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed CSV.
    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("column '{name}' not found in {path}")]
    MissingColumn { name: String, path: PathBuf },

    /// A cell in a required column did not parse as a number.
    #[error("non-numeric value '{value}' in column '{column}' at data row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// The file has a header but no data rows.
    #[error("{path} contains no data rows")]
    Empty { path: PathBuf },
}

/// Load a CSV file into a [`Dataset`].
///
/// The header row is required. `feature_names` selects the feature columns in
/// the order the resulting feature matrix will use; `target_name` selects the
/// target column.
pub fn load_csv(
    path: impl AsRef<Path>,
    feature_names: &[&str],
    target_name: &str,
) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv { path: path.to_path_buf(), source })?
        .clone();

    let column_index = |name: &str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| LoadError::MissingColumn {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    };

    let feature_cols: Vec<usize> = feature_names
        .iter()
        .map(|name| column_index(name))
        .collect::<Result<_, _>>()?;
    let target_col = column_index(target_name)?;

    // Column-major accumulation matches the Dataset's feature-major layout.
    let mut columns: Vec<Vec<f32>> = vec![Vec::new(); feature_cols.len()];
    let mut targets: Vec<f32> = Vec::new();

    let parse_cell = |record: &csv::StringRecord,
                      col: usize,
                      name: &str,
                      row: usize|
     -> Result<f32, LoadError> {
        let raw = record.get(col).unwrap_or("");
        raw.trim().parse::<f32>().map_err(|_| LoadError::InvalidValue {
            column: name.to_string(),
            row,
            value: raw.to_string(),
        })
    };

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        for (slot, (&col, &name)) in feature_cols.iter().zip(feature_names).enumerate() {
            columns[slot].push(parse_cell(&record, col, name, row)?);
        }
        targets.push(parse_cell(&record, target_col, target_name, row)?);
    }

    let n_samples = targets.len();
    if n_samples == 0 {
        return Err(LoadError::Empty { path: path.to_path_buf() });
    }

    let n_features = columns.len();
    let flat: Vec<f32> = columns.into_iter().flatten().collect();
    let features = Array2::from_shape_vec((n_features, n_samples), flat)
        .expect("per-column lengths are equal by construction");

    Ok(Dataset::new(
        features,
        Array1::from_vec(targets),
        feature_names.iter().map(|s| s.to_string()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn loads_selected_columns() {
        let file = write_csv("a,b,c,y\n1,2,3,10\n4,5,6,20\n");
        let ds = load_csv(file.path(), &["c", "a"], "y").unwrap();

        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 2);
        // Column order follows the requested order, not the file order.
        assert_eq!(ds.feature(0).as_slice().unwrap(), &[3.0, 6.0]);
        assert_eq!(ds.feature(1).as_slice().unwrap(), &[1.0, 4.0]);
        assert_eq!(ds.targets().as_slice().unwrap(), &[10.0, 20.0]);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let file = write_csv("a,junk,y\n1,zzz,10\n2,zzz,20\n");
        let ds = load_csv(file.path(), &["a"], "y").unwrap();
        assert_eq!(ds.n_samples(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv("/nonexistent/file.csv", &["a"], "y").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn missing_target_column() {
        let file = write_csv("a,b\n1,2\n");
        let err = load_csv(file.path(), &["a"], "carbon_intensity").unwrap_err();
        match err {
            LoadError::MissingColumn { name, .. } => assert_eq!(name, "carbon_intensity"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_cell() {
        let file = write_csv("a,y\n1,10\nbad,20\n");
        let err = load_csv(file.path(), &["a"], "y").unwrap_err();
        match err {
            LoadError::InvalidValue { column, row, value } => {
                assert_eq!(column, "a");
                assert_eq!(row, 1);
                assert_eq!(value, "bad");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn header_only_file_is_empty() {
        let file = write_csv("a,y\n");
        let err = load_csv(file.path(), &["a"], "y").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }
}
