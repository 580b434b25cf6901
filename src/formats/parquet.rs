// src/formats/parquet.rs

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, io::BufWriter, path::Path};
use tracing::debug;

use super::arrow::{concat, record_batch_to_table, table_to_record_batch};
use super::{Format, LoadOptions, TableFormat};
use crate::error::{IoResultExt, Result};
use crate::table::Table;

const BATCH_SIZE: usize = 8192;

pub struct ParquetFormat;

impl TableFormat for ParquetFormat {
    const FORMAT: Format = Format::Parquet;

    fn load(path: &Path, _options: &LoadOptions) -> Result<Table> {
        let file = File::open(path).at_path(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.with_batch_size(BATCH_SIZE).build()?;

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch?);
        }
        debug!(format = %Self::FORMAT, batches = batches.len(), "read record batches");
        record_batch_to_table(&concat(&schema, &batches)?)
    }

    fn store(table: &Table, path: &Path) -> Result<()> {
        let batch = table_to_record_batch(table)?;
        let file = File::create(path).at_path(path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{MultiIndex, Scalar};
    use tempfile::tempdir;

    #[test]
    fn test_store_then_load_raw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let table = Table::new(
            MultiIndex::new(vec![Some("frame".into())], vec![vec![Scalar::Int(2)], vec![Scalar::Int(1)]])
                .unwrap(),
            MultiIndex::from_keys(["x"]),
            vec![vec![Scalar::Float(0.25), Scalar::Null]],
        )
        .unwrap();
        ParquetFormat::store(&table, &path).unwrap();
        let opts = LoadOptions {
            row_levels: 1,
            col_levels: 1,
        };
        // Raw load keeps the stored order; sorting belongs to normalization.
        assert_eq!(ParquetFormat::load(&path, &opts).unwrap(), table);
    }
}
