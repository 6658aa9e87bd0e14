//! A minimal labeled table backing the tabular import factories
use std::path::Path;

use nalgebra::DMatrix;

use crate::data_sets::DataSetError;

/// Tabular container with row index labels and column labels
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Row labels (the first CSV column)
    pub index: Vec<String>,
    /// Column labels
    pub columns: Vec<String>,
    /// Cell values, shape (index.len(), columns.len())
    pub values: DMatrix<f64>,
}

impl Frame {
    /// Create a new frame, checking that the value shape matches the labels
    pub fn new(
        index: Vec<String>,
        columns: Vec<String>,
        values: DMatrix<f64>,
    ) -> Result<Frame, DataSetError> {
        if values.shape() != (index.len(), columns.len()) {
            return Err(DataSetError::ShapeMismatch {
                expected: (index.len(), columns.len()),
                found: values.shape(),
            });
        }
        Ok(Frame {
            index,
            columns,
            values,
        })
    }

    /// Position of a column by label
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == label)
    }

    /// Read a comma separated values file, with the first column as the row index
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Frame, DataSetError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let columns: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|header| header.trim().to_string())
            .collect();

        let mut index = Vec::new();
        let mut cells: Vec<f64> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let label = record.get(0).unwrap_or("").trim().to_string();
            if record.len() != columns.len() + 1 {
                return Err(DataSetError::RaggedRow(label));
            }
            for field in record.iter().skip(1) {
                let value = field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| DataSetError::InvalidNumber {
                        value: field.to_string(),
                    })?;
                cells.push(value);
            }
            index.push(label);
        }

        let values = DMatrix::from_row_slice(index.len(), columns.len(), &cells);
        Frame::new(index, columns, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_data(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join(file)
    }

    #[test]
    fn shape_checked() {
        let result = Frame::new(
            vec!["r1".to_string()],
            vec!["c1".to_string(), "c2".to_string()],
            DMatrix::from_row_slice(1, 1, &[1.0]),
        );
        assert!(matches!(result, Err(DataSetError::ShapeMismatch { .. })));
    }

    #[test]
    fn read_csv() {
        let frame = Frame::from_csv(test_data("expression.csv")).unwrap();
        assert_eq!(frame.index, vec!["G1", "G2"]);
        assert_eq!(frame.columns, vec!["T1", "T2", "T1 T2 p-value"]);
        assert!((frame.values[(0, 0)] - 10.0).abs() < 1e-12);
        assert!((frame.values[(1, 2)] - 0.048).abs() < 1e-12);
        assert_eq!(frame.column_index("T2"), Some(1));
        assert_eq!(frame.column_index("T9"), None);
    }
}
