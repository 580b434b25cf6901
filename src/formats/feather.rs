// src/formats/feather.rs

//! Feather v2, i.e. the Arrow IPC file format.

use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};
use tracing::debug;

use super::arrow::{concat, record_batch_to_table, table_to_record_batch};
use super::{Format, LoadOptions, TableFormat};
use crate::error::{IoResultExt, Result};
use crate::table::Table;

pub struct FeatherFormat;

impl TableFormat for FeatherFormat {
    const FORMAT: Format = Format::Feather;

    fn load(path: &Path, _options: &LoadOptions) -> Result<Table> {
        let file = File::open(path).at_path(path)?;
        let reader = FileReader::try_new(BufReader::new(file), None)?;
        let schema = reader.schema();

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
        let mut writer = FileWriter::try_new(BufWriter::new(file), &batch.schema())?;
        writer.write(&batch)?;
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MultiIndex;
    use tempfile::tempdir;

    #[test]
    fn test_zero_row_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.feather");
        let table = Table::with_index(
            MultiIndex::empty(vec![Some("frame".into())]),
            vec![Some("feature".into())],
        );
        FeatherFormat::store(&table, &path).unwrap();
        let opts = LoadOptions {
            row_levels: 1,
            col_levels: 1,
        };
        let back = FeatherFormat::load(&path, &opts).unwrap();
        assert_eq!(back.shape(), (0, 0));
        assert_eq!(back.columns().names(), &[Some("feature".to_string())]);
        assert_eq!(back, table);
    }
}
