//! Tabular data with named, heterogeneous columns.
//!
//! A [`Frame`] is column-major: every column holds one [`FeatureValue`] per row.
//! It is what training reads from CSV and what inference builds from a single
//! reconciled record.
//!
//! # Example
//!
//! ```rust
//! use house_price_rs::dataset::{FeatureValue, Frame};
//!
//! let frame = Frame::from_row(
//!     vec!["GrLivArea".to_string(), "Neighborhood".to_string()],
//!     vec![FeatureValue::Int(1500), FeatureValue::from("NAmes")],
//! )
//! .unwrap();
//! assert_eq!(frame.shape(), (1, 2));
//! ```

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;

pub mod csv;
mod value;

pub use self::csv::{read_csv, read_csv_from_reader, NA_TOKENS};
pub use value::FeatureValue;

/// Error type for dataset construction and loading.
#[derive(Debug)]
pub enum DatasetError {
    /// Columns of different lengths, or a row with the wrong width.
    Shape(String),
    /// A named column does not exist.
    MissingColumn(String),
    /// Two columns share a name.
    DuplicateColumn(String),
    /// The CSV reader rejected the input.
    Csv(String),
    /// I/O error while opening the source.
    Io(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Shape(msg) => write!(f, "Shape error: {}", msg),
            DatasetError::MissingColumn(name) => write!(f, "Missing column: {}", name),
            DatasetError::DuplicateColumn(name) => write!(f, "Duplicate column: {}", name),
            DatasetError::Csv(msg) => write!(f, "CSV error: {}", msg),
            DatasetError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err.to_string())
    }
}

impl From<::csv::Error> for DatasetError {
    fn from(err: ::csv::Error) -> Self {
        DatasetError::Csv(err.to_string())
    }
}

/// Inferred storage kind of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing cell is a number.
    Numeric,
    /// At least one non-missing cell is a string.
    Categorical,
}

/// Column-major table of named columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<FeatureValue>>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame from named columns. All columns must have the same length
    /// and names must be unique.
    pub fn new(names: Vec<String>, columns: Vec<Vec<FeatureValue>>) -> Result<Self, DatasetError> {
        if names.len() != columns.len() {
            return Err(DatasetError::Shape(format!(
                "{} names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }
        let n_rows = columns.first().map(Vec::len).unwrap_or(0);
        if let Some((name, col)) = names
            .iter()
            .zip(&columns)
            .find(|(_, col)| col.len() != n_rows)
        {
            return Err(DatasetError::Shape(format!(
                "column {} has {} rows, expected {}",
                name,
                col.len(),
                n_rows
            )));
        }
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Build a frame from row-major records.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<FeatureValue>>) -> Result<Self, DatasetError> {
        let mut columns: Vec<Vec<FeatureValue>> = (0..names.len())
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DatasetError::Shape(format!(
                    "row {} has {} fields, expected {}",
                    r,
                    row.len(),
                    names.len()
                )));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Self::new(names, columns)
    }

    /// Build a single-row frame.
    pub fn from_row(names: Vec<String>, row: Vec<FeatureValue>) -> Result<Self, DatasetError> {
        Self::from_rows(names, vec![row])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn column(&self, idx: usize) -> &[FeatureValue] {
        &self.columns[idx]
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[FeatureValue]> {
        self.position(name).map(|idx| self.column(idx))
    }

    /// Numeric if every non-missing cell is a number. An all-missing column
    /// counts as numeric.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let categorical = self.columns[idx]
            .iter()
            .any(|v| matches!(v, FeatureValue::Str(_)));
        if categorical {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        }
    }

    /// Names of all columns of the given kind, in frame order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        (0..self.n_cols())
            .filter(|&idx| self.column_kind(idx) == kind)
            .map(|idx| self.names[idx].clone())
            .collect()
    }

    /// New frame holding the given columns, in the given order.
    pub fn select(&self, indices: &[usize]) -> Frame {
        Frame {
            names: indices.iter().map(|&i| self.names[i].clone()).collect(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            n_rows: self.n_rows,
        }
    }

    /// New frame holding the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| rows.iter().map(|&r| col[r].clone()).collect())
                .collect(),
            n_rows: rows.len(),
        }
    }

    /// Remove a column and return its values.
    pub fn drop_column(&mut self, name: &str) -> Result<Vec<FeatureValue>, DatasetError> {
        let idx = self
            .position(name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    /// Replace the values of every column in place.
    pub fn map_columns<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &mut Vec<FeatureValue>),
    {
        for (idx, col) in self.columns.iter_mut().enumerate() {
            f(idx, col);
        }
    }

    /// Dense `f64` view. Missing cells become NaN; a string cell yields the
    /// `(row, column)` it was found at.
    pub fn to_matrix(&self) -> Result<Array2<f64>, (usize, usize)> {
        let mut out = Array2::<f64>::zeros((self.n_rows, self.n_cols()));
        for (c, col) in self.columns.iter().enumerate() {
            for (r, value) in col.iter().enumerate() {
                out[[r, c]] = match value {
                    FeatureValue::Int(v) => *v as f64,
                    FeatureValue::Float(v) => *v,
                    FeatureValue::Null => f64::NAN,
                    FeatureValue::Str(_) => return Err((r, c)),
                };
            }
        }
        Ok(out)
    }
}

/// Shuffle row indices with a seeded RNG and split them into
/// `(train, test)` frames. `test_size` is the held-out fraction, rounded up.
pub fn train_test_split(frame: &Frame, test_size: f64, seed: u64) -> (Frame, Frame) {
    let n = frame.n_rows();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let (test_idx, train_idx) = indices.split_at(n_test.min(n));
    (frame.take_rows(train_idx), frame.take_rows(test_idx))
}
