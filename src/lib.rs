//! Typed descriptors for labeled two-dimensional tables with hierarchical
//! row and column indexes.
//!
//! A [`TableSchema`] says which index levels a table carries, whether it may
//! hold missing values, and which on-disk [`Format`] it lives in. Reading and
//! writing through a schema always normalizes: level names are set, both axes
//! are sorted and the result is validated.

pub mod error;
pub mod formats;
pub mod fs;
pub mod schema;
pub mod table;

pub use error::{Result, TableError};
pub use formats::h5::H5_KEY;
pub use formats::{read, read_as, write, write_as, Format, LoadOptions, TableFormat};
pub use schema::{
    check_col_levels, check_row_levels, init_skeleton, normalize, validate, LevelEnum, Levels,
    RowSource, TableSchema, TableSchemaBuilder, TableSchemaConfig,
};
pub use table::{MultiIndex, Scalar, Table};
