// src/schema/validate.rs

use tracing::trace;

use super::{Levels, TableSchema};
use crate::error::{Result, TableError};
use crate::table::Table;

/// Check `table` against `schema` without touching it.
///
/// Checks run in order: table structure, nullability, row levels, column
/// levels. The first failure is returned.
pub fn validate(table: &Table, schema: &TableSchema) -> Result<()> {
    table.check_consistency()?;
    if !schema.nullable() {
        check_not_null(table)?;
    }
    check_row_levels(table, schema.row_levels().clone())?;
    check_col_levels(table, schema.col_levels().clone())?;
    Ok(())
}

/// Relabel both indexes with the schema's level names, sort both axes, then
/// [`validate`].
///
/// Relabeling only assigns names: the level counts must already agree with
/// the schema.
pub fn normalize(mut table: Table, schema: &TableSchema) -> Result<Table> {
    table.check_consistency()?;

    if let Some(names) = schema.row_levels().names() {
        if table.index().nlevels() != names.len() {
            return Err(TableError::IndexSchema {
                expected: names.to_vec(),
                actual: table.index().names().to_vec(),
            });
        }
        table
            .index_mut()
            .set_names(schema.row_levels().index_names(names.len()))?;
    }
    if let Some(names) = schema.col_levels().names() {
        if table.columns().nlevels() != names.len() {
            return Err(TableError::ColumnSchema {
                expected: names.to_vec(),
                actual: table.columns().names().to_vec(),
            });
        }
        table
            .columns_mut()
            .set_names(schema.col_levels().index_names(names.len()))?;
    }

    table.sort_rows();
    table.sort_columns();
    trace!(rows = table.nrows(), cols = table.ncols(), "normalized table");

    validate(&table, schema)?;
    Ok(table)
}

/// Fails when the row index names differ from `levels` (exact, ordered).
/// A single name is a one-level schema.
pub fn check_row_levels(table: &Table, levels: impl Into<Levels>) -> Result<()> {
    let levels = levels.into();
    let actual = table.index().names();
    match levels.names() {
        Some(expected) if !levels.matches(actual) => Err(TableError::IndexSchema {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }),
        _ => Ok(()),
    }
}

/// Column-side twin of [`check_row_levels`].
pub fn check_col_levels(table: &Table, levels: impl Into<Levels>) -> Result<()> {
    let levels = levels.into();
    let actual = table.columns().names();
    match levels.names() {
        Some(expected) if !levels.matches(actual) => Err(TableError::ColumnSchema {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }),
        _ => Ok(()),
    }
}

fn check_not_null(table: &Table) -> Result<()> {
    let mut positions = table.missing_positions();
    match positions.next() {
        Some((row, column)) => Err(TableError::Nullability {
            count: 1 + positions.count(),
            row,
            column,
        }),
        None => Ok(()),
    }
}
