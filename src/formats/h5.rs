// src/formats/h5.rs

//! HDF5 storage: one file holds exactly one dataset, under [`H5_KEY`], whose
//! bytes are the table's Arrow IPC stream.
//!
//! Needs the native HDF5 library, so it is only compiled in with the `h5`
//! feature. Without it both directions fail with
//! [`TableError::FormatUnavailable`](crate::TableError::FormatUnavailable).

use std::path::Path;

use super::{Format, LoadOptions, TableFormat};
use crate::error::Result;
use crate::table::Table;

/// Dataset key shared by the reader and the writer.
pub const H5_KEY: &str = "data";

pub struct H5Format;

#[cfg(feature = "h5")]
impl TableFormat for H5Format {
    const FORMAT: Format = Format::H5;

    fn load(path: &Path, _options: &LoadOptions) -> Result<Table> {
        use arrow::ipc::reader::StreamReader;
        use std::io::Cursor;
        use tracing::debug;

        use super::arrow::{concat, record_batch_to_table};

        let file = hdf5::File::open(path)?;
        let bytes: Vec<u8> = file.dataset(H5_KEY)?.read_raw::<u8>()?;
        let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch?);
        }
        debug!(format = %Self::FORMAT, batches = batches.len(), "read record batches");
        record_batch_to_table(&concat(&schema, &batches)?)
    }

    fn store(table: &Table, path: &Path) -> Result<()> {
        use arrow::ipc::writer::StreamWriter;

        use super::arrow::table_to_record_batch;

        let batch = table_to_record_batch(table)?;
        let mut bytes = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut bytes, &batch.schema())?;
            writer.write(&batch)?;
            writer.finish()?;
        }

        let file = hdf5::File::create(path)?;
        file.new_dataset_builder()
            .with_data(bytes.as_slice())
            .create(H5_KEY)?;
        Ok(())
    }
}

#[cfg(not(feature = "h5"))]
impl TableFormat for H5Format {
    const FORMAT: Format = Format::H5;

    fn load(_path: &Path, _options: &LoadOptions) -> Result<Table> {
        Err(crate::error::TableError::FormatUnavailable(Self::FORMAT.as_str()))
    }

    fn store(_table: &Table, _path: &Path) -> Result<()> {
        Err(crate::error::TableError::FormatUnavailable(Self::FORMAT.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{MultiIndex, Scalar};
    use tempfile::tempdir;

    fn sample() -> Table {
        Table::new(
            MultiIndex::from_keys([0, 1]),
            MultiIndex::from_keys(["x", "y"]),
            vec![
                vec![Scalar::Float(1.0), Scalar::Float(2.0)],
                vec![Scalar::from("a"), Scalar::Null],
            ],
        )
        .unwrap()
    }

    #[cfg(feature = "h5")]
    #[test]
    fn test_single_dataset_under_fixed_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.h5");
        H5Format::store(&sample(), &path).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        assert_eq!(file.member_names().unwrap(), vec![H5_KEY.to_string()]);

        let opts = LoadOptions {
            row_levels: 1,
            col_levels: 1,
        };
        assert_eq!(H5Format::load(&path, &opts).unwrap(), sample());
    }

    #[cfg(not(feature = "h5"))]
    #[test]
    fn test_unavailable_without_feature() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.h5");
        assert!(matches!(
            H5Format::store(&sample(), &path),
            Err(crate::error::TableError::FormatUnavailable("h5"))
        ));
        assert!(!path.exists());
    }
}
