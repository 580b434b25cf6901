use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by table validation, normalization, skeleton construction
/// and format dispatch.
#[derive(Error, Debug)]
pub enum TableError {
    /// The value is not a well-formed table (ragged index tuples, column
    /// count mismatches, an index without levels, ...).
    #[error("not a tabular value: {0}")]
    NotATable(String),

    #[error(
        "table contains {count} missing value(s) but the schema is not nullable \
         (first at row {row}, column {column})"
    )]
    Nullability {
        count: usize,
        row: usize,
        column: usize,
    },

    #[error("index levels are incorrect: expected {expected:?} but got {actual:?}")]
    IndexSchema {
        expected: Vec<String>,
        actual: Vec<Option<String>>,
    },

    #[error("column levels are incorrect: expected {expected:?} but got {actual:?}")]
    ColumnSchema {
        expected: Vec<String>,
        actual: Vec<Option<String>>,
    },

    #[error("file type `{requested}` not supported; supported types are {supported:?}")]
    UnsupportedFormat {
        requested: String,
        supported: Vec<&'static str>,
    },

    /// The format is known but was not compiled into this build.
    #[error("file type `{0}` is not available in this build (enable the `{0}` feature)")]
    FormatUnavailable(&'static str),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("level `{0}` appears more than once in a schema")]
    DuplicateLevel(String),

    /// Layout metadata stored alongside a table is missing pieces or corrupt.
    #[error("invalid table layout: {0}")]
    Layout(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "h5")]
    #[error("{0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;

pub(crate) trait IoResultExt<T> {
    /// Attach the offending path to an I/O error.
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| TableError::Io {
            path: path.into(),
            source,
        })
    }
}
