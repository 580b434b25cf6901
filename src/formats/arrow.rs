// src/formats/arrow.rs

//! Bridge between [`Table`] and Arrow [`RecordBatch`].
//!
//! Row-index levels become the leading columns of the batch and data columns
//! follow. Level names, column label tuples and cell encodings travel as JSON
//! under the schema metadata key [`META_KEY_LAYOUT`]:
//!
//! | Field                   | Meaning                                    |
//! |-------------------------|--------------------------------------------|
//! | `__index_level_{i}__`   | keys of row level `i`                      |
//! | `__column_{j}__`        | cells of data column `j`                   |
//!
//! A batch without the layout key (written by some other tool) is read as a
//! plain table: positional row keys, one column level named by field.

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::error::{Result, TableError};
use crate::table::{MultiIndex, Scalar, Table};

/// Schema metadata key holding the JSON [`Layout`].
pub const META_KEY_LAYOUT: &str = "structured_table.layout";

const LAYOUT_VERSION: u32 = 1;

/// How the cells of one Arrow column map back to [`Scalar`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellEncoding {
    Bool,
    Int64,
    Float64,
    Utf8,
    /// Every cell missing.
    Null,
    /// Heterogeneous cells, each stored as a JSON-encoded scalar.
    Mixed,
}

impl CellEncoding {
    /// Narrowest encoding that round-trips every value in `values`.
    pub fn infer(values: &[Scalar]) -> Self {
        let mut found: Option<CellEncoding> = None;
        for v in values {
            let enc = match v {
                Scalar::Null => continue,
                Scalar::Bool(_) => CellEncoding::Bool,
                Scalar::Int(_) => CellEncoding::Int64,
                Scalar::Float(_) => CellEncoding::Float64,
                Scalar::Str(_) => CellEncoding::Utf8,
            };
            match found {
                None => found = Some(enc),
                Some(prev) if prev != enc => return CellEncoding::Mixed,
                _ => {}
            }
        }
        found.unwrap_or(CellEncoding::Null)
    }

    fn data_type(&self) -> DataType {
        match self {
            CellEncoding::Bool => DataType::Boolean,
            CellEncoding::Int64 => DataType::Int64,
            CellEncoding::Float64 => DataType::Float64,
            CellEncoding::Utf8 | CellEncoding::Null | CellEncoding::Mixed => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnLayout {
    label: Vec<Scalar>,
    encoding: CellEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layout {
    version: u32,
    row_levels: Vec<Option<String>>,
    row_encodings: Vec<CellEncoding>,
    col_levels: Vec<Option<String>>,
    columns: Vec<ColumnLayout>,
}

/// Convert a table into a single record batch carrying its layout metadata.
pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch> {
    table.check_consistency()?;
    let index = table.index();

    let mut fields = Vec::with_capacity(index.nlevels() + table.ncols());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    let mut row_encodings = Vec::with_capacity(index.nlevels());

    for level in 0..index.nlevels() {
        let keys = index.level_values(level);
        let encoding = CellEncoding::infer(&keys);
        fields.push(Field::new(
            format!("__index_level_{}__", level),
            encoding.data_type(),
            true,
        ));
        arrays.push(encode_cells(&keys, encoding)?);
        row_encodings.push(encoding);
    }

    let mut columns = Vec::with_capacity(table.ncols());
    for (j, (label, cells)) in table
        .columns()
        .tuples()
        .iter()
        .zip(table.data())
        .enumerate()
    {
        let encoding = CellEncoding::infer(cells);
        fields.push(Field::new(
            format!("__column_{}__", j),
            encoding.data_type(),
            true,
        ));
        arrays.push(encode_cells(cells, encoding)?);
        columns.push(ColumnLayout {
            label: label.clone(),
            encoding,
        });
    }

    let layout = Layout {
        version: LAYOUT_VERSION,
        row_levels: index.names().to_vec(),
        row_encodings,
        col_levels: table.columns().names().to_vec(),
        columns,
    };
    let metadata = HashMap::from([(META_KEY_LAYOUT.to_string(), serde_json::to_string(&layout)?)]);

    let schema = Arc::new(ArrowSchema::new(fields).with_metadata(metadata));
    RecordBatch::try_new(schema, arrays).map_err(Into::into)
}

/// Rebuild a table from a record batch. Not normalized.
pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table> {
    match batch.schema().metadata().get(META_KEY_LAYOUT) {
        Some(json) => {
            let layout: Layout = serde_json::from_str(json)
                .map_err(|e| TableError::Layout(format!("unreadable layout metadata: {}", e)))?;
            from_layout(batch, layout)
        }
        None => from_plain_batch(batch),
    }
}

/// Concatenate batches read from one file into one batch.
pub fn concat(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    arrow::compute::concat_batches(schema, batches).map_err(Into::into)
}

fn from_layout(batch: &RecordBatch, layout: Layout) -> Result<Table> {
    if layout.version != LAYOUT_VERSION {
        return Err(TableError::Layout(format!(
            "unsupported layout version {}",
            layout.version
        )));
    }
    let nrow_levels = layout.row_levels.len();
    if layout.row_encodings.len() != nrow_levels {
        return Err(TableError::Layout(
            "row level names and encodings disagree".into(),
        ));
    }
    if batch.num_columns() != nrow_levels + layout.columns.len() {
        return Err(TableError::Layout(format!(
            "expected {} field(s), found {}",
            nrow_levels + layout.columns.len(),
            batch.num_columns()
        )));
    }

    let mut levels = Vec::with_capacity(nrow_levels);
    for (i, encoding) in layout.row_encodings.iter().enumerate() {
        levels.push(decode_cells(batch.column(i), *encoding)?);
    }
    let tuples: Vec<Vec<Scalar>> = (0..batch.num_rows())
        .map(|r| levels.iter().map(|l| l[r].clone()).collect())
        .collect();
    let index = MultiIndex::new(layout.row_levels, tuples)?;

    let mut labels = Vec::with_capacity(layout.columns.len());
    let mut data = Vec::with_capacity(layout.columns.len());
    for (j, col) in layout.columns.into_iter().enumerate() {
        data.push(decode_cells(batch.column(nrow_levels + j), col.encoding)?);
        labels.push(col.label);
    }
    let columns = MultiIndex::new(layout.col_levels, labels)?;

    Table::new(index, columns, data)
}

fn from_plain_batch(batch: &RecordBatch) -> Result<Table> {
    let schema = batch.schema();
    let index = MultiIndex::from_keys((0..batch.num_rows()).map(|i| Scalar::Int(i as i64)));
    let columns = MultiIndex::from_keys(schema.fields().iter().map(|f| f.name().as_str()));
    let data = batch
        .columns()
        .iter()
        .map(decode_any)
        .collect::<Result<Vec<_>>>()?;
    Table::new(index, columns, data)
}

fn encode_cells(values: &[Scalar], encoding: CellEncoding) -> Result<ArrayRef> {
    let array: ArrayRef = match encoding {
        CellEncoding::Bool => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Scalar::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        CellEncoding::Int64 => Arc::new(
            values
                .iter()
                .map(Scalar::as_i64)
                .collect::<Int64Array>(),
        ),
        CellEncoding::Float64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Scalar::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        CellEncoding::Utf8 => Arc::new(
            values
                .iter()
                .map(Scalar::as_str)
                .collect::<StringArray>(),
        ),
        CellEncoding::Null => Arc::new(StringArray::new_null(values.len())),
        CellEncoding::Mixed => {
            let encoded = values
                .iter()
                .map(|v| match v {
                    Scalar::Null => Ok(None),
                    other => serde_json::to_string(other).map(Some),
                })
                .collect::<std::result::Result<Vec<Option<String>>, _>>()?;
            Arc::new(StringArray::from(encoded))
        }
    };
    Ok(array)
}

fn decode_cells(array: &ArrayRef, encoding: CellEncoding) -> Result<Vec<Scalar>> {
    let mismatch = || {
        TableError::Layout(format!(
            "column declared as {:?} but stored as {:?}",
            encoding,
            array.data_type()
        ))
    };
    let cells: Vec<Scalar> = match encoding {
        CellEncoding::Bool => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .ok_or_else(mismatch)?
            .iter()
            .map(Scalar::from)
            .collect(),
        CellEncoding::Int64 => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(mismatch)?
            .iter()
            .map(Scalar::from)
            .collect(),
        CellEncoding::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(mismatch)?
            .iter()
            .map(Scalar::from)
            .collect(),
        CellEncoding::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(mismatch)?
            .iter()
            .map(Scalar::from)
            .collect(),
        CellEncoding::Null => vec![Scalar::Null; array.len()],
        CellEncoding::Mixed => array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(mismatch)?
            .iter()
            .map(|v| match v {
                None => Ok(Scalar::Null),
                Some(json) => serde_json::from_str(json).map_err(|e| {
                    TableError::Layout(format!("bad mixed cell {:?}: {}", json, e))
                }),
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(cells)
}

/// Decode a column of any common Arrow type, casting to the nearest scalar kind.
fn decode_any(array: &ArrayRef) -> Result<Vec<Scalar>> {
    let (target, encoding) = match array.data_type() {
        DataType::Null => return Ok(vec![Scalar::Null; array.len()]),
        DataType::Boolean => (DataType::Boolean, CellEncoding::Bool),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => (DataType::Int64, CellEncoding::Int64),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            (DataType::Float64, CellEncoding::Float64)
        }
        _ => (DataType::Utf8, CellEncoding::Utf8),
    };
    let casted = cast(array, &target)?;
    decode_cells(&casted, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_table() -> Table {
        let index = MultiIndex::new(
            vec![Some("subject".into()), Some("frame".into())],
            vec![
                vec![Scalar::from("s1"), Scalar::Int(0)],
                vec![Scalar::from("s1"), Scalar::Int(1)],
            ],
        )
        .unwrap();
        let columns = MultiIndex::new(
            vec![Some("bodypart".into()), Some("coord".into())],
            vec![
                vec![Scalar::from("nose"), Scalar::from("x")],
                vec![Scalar::from("nose"), Scalar::from("flag")],
                vec![Scalar::from("nose"), Scalar::from("note")],
                vec![Scalar::from("nose"), Scalar::from("empty")],
            ],
        )
        .unwrap();
        Table::new(
            index,
            columns,
            vec![
                vec![Scalar::Float(1.5), Scalar::Null],
                vec![Scalar::Bool(true), Scalar::Bool(false)],
                vec![Scalar::Int(3), Scalar::from("three")],
                vec![Scalar::Null, Scalar::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_encoding() {
        assert_eq!(CellEncoding::infer(&[Scalar::Int(1), Scalar::Null]), CellEncoding::Int64);
        assert_eq!(
            CellEncoding::infer(&[Scalar::Int(1), Scalar::Float(1.0)]),
            CellEncoding::Mixed
        );
        assert_eq!(CellEncoding::infer(&[Scalar::Null]), CellEncoding::Null);
        assert_eq!(CellEncoding::infer(&[]), CellEncoding::Null);
    }

    #[test]
    fn test_batch_layout() {
        let batch = table_to_record_batch(&mixed_table()).unwrap();
        assert_eq!(batch.num_columns(), 6);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), "__index_level_0__");
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Float64);
        assert!(batch.schema().metadata().contains_key(META_KEY_LAYOUT));
    }

    #[test]
    fn test_batch_back_to_table() {
        let table = mixed_table();
        let batch = table_to_record_batch(&table).unwrap();
        assert_eq!(record_batch_to_table(&batch).unwrap(), table);
    }

    #[test]
    fn test_plain_batch_gets_positional_index() {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("a", DataType::Int32, true),
            Field::new("b", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(arrow::array::Int32Array::from(vec![Some(7), None])),
                Arc::new(StringArray::from(vec!["x", "y"])),
            ],
        )
        .unwrap();
        let table = record_batch_to_table(&batch).unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.index().level_values(0), vec![Scalar::Int(0), Scalar::Int(1)]);
        assert_eq!(table.cell(1, 0), Some(&Scalar::Null));
        assert_eq!(table.cell(0, 1), Some(&Scalar::from("x")));
    }
}
