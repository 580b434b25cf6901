//! On-disk formats and the read/write dispatch over them.
//!
//! Every format is a `load`/`store` pair behind [`TableFormat`]. Dispatch is
//! an exhaustive match on [`Format`], so a new format is a new variant plus
//! one impl.

pub mod arrow;
pub mod csv;
pub mod feather;
pub mod h5;
pub mod parquet;

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};
use tracing::{debug, instrument};

use crate::error::{Result, TableError};
use crate::fs::{ensure_parent_dir, publish};
use crate::schema::{normalize, TableSchema};
use crate::table::Table;

/// Closed set of supported storage formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    H5,
    Feather,
    #[default]
    Parquet,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Csv, Format::H5, Format::Feather, Format::Parquet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::H5 => "h5",
            Format::Feather => "feather",
            Format::Parquet => "parquet",
        }
    }

    /// Whether this build can read and write the format.
    pub fn is_available(&self) -> bool {
        match self {
            Format::H5 => cfg!(feature = "h5"),
            _ => true,
        }
    }

    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(Format::as_str).collect()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "h5" | "hdf5" => Ok(Format::H5),
            "feather" => Ok(Format::Feather),
            "parquet" => Ok(Format::Parquet),
            _ => Err(TableError::UnsupportedFormat {
                requested: s.to_string(),
                supported: Format::supported(),
            }),
        }
    }
}

/// What a reader is told up front. Only formats that lose level metadata
/// (CSV) need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub row_levels: usize,
    pub col_levels: usize,
}

impl LoadOptions {
    pub fn for_schema(schema: &TableSchema) -> Self {
        Self {
            row_levels: schema.row_levels().positional_count(),
            col_levels: schema.col_levels().positional_count(),
        }
    }
}

/// A `load`/`store` pair for one on-disk format. Neither side validates;
/// [`read`] and [`write`] wrap them with normalization.
pub trait TableFormat {
    const FORMAT: Format;

    fn load(path: &Path, options: &LoadOptions) -> Result<Table>;

    fn store(table: &Table, path: &Path) -> Result<()>;
}

fn load_raw(format: Format, path: &Path, options: &LoadOptions) -> Result<Table> {
    match format {
        Format::Csv => csv::CsvFormat::load(path, options),
        Format::H5 => h5::H5Format::load(path, options),
        Format::Feather => feather::FeatherFormat::load(path, options),
        Format::Parquet => parquet::ParquetFormat::load(path, options),
    }
}

fn store_raw(format: Format, table: &Table, path: &Path) -> Result<()> {
    match format {
        Format::Csv => csv::CsvFormat::store(table, path),
        Format::H5 => h5::H5Format::store(table, path),
        Format::Feather => feather::FeatherFormat::store(table, path),
        Format::Parquet => parquet::ParquetFormat::store(table, path),
    }
}

/// Load the table at `path` in the schema's format and normalize it.
#[instrument(level = "debug", skip_all, fields(format = %schema.format(), path = %path.as_ref().display()))]
pub fn read(schema: &TableSchema, path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let raw = load_raw(schema.format(), path, &LoadOptions::for_schema(schema))?;
    debug!(rows = raw.nrows(), cols = raw.ncols(), "loaded table");
    normalize(raw, schema)
}

/// Normalize `table` and store it at `path` in the schema's format.
///
/// The parent directory is created when missing. The file only appears at
/// `path` once it has been written completely.
#[instrument(level = "debug", skip_all, fields(format = %schema.format(), path = %path.as_ref().display()))]
pub fn write(schema: &TableSchema, table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let table = normalize(table.clone(), schema)?;
    if !schema.format().is_available() {
        return Err(TableError::FormatUnavailable(schema.format().as_str()));
    }
    ensure_parent_dir(path)?;
    publish(path, |tmp| store_raw(schema.format(), &table, tmp))?;
    debug!(rows = table.nrows(), cols = table.ncols(), "stored table");
    Ok(())
}

/// [`read`] with the format given by name, overriding the schema's.
pub fn read_as(schema: &TableSchema, format: &str, path: impl AsRef<Path>) -> Result<Table> {
    let format: Format = format.parse()?;
    read(&schema.with_format(format), path)
}

/// [`write`] with the format given by name, overriding the schema's.
/// Unknown names fail before anything is created on disk.
pub fn write_as(
    schema: &TableSchema,
    format: &str,
    table: &Table,
    path: impl AsRef<Path>,
) -> Result<()> {
    let format: Format = format.parse()?;
    write(&schema.with_format(format), table, path)
}
